use keeper_core::{config::AppConfig, error::Result, lock::AliasLocks, registry::DbRegistry};
use std::path::Path;

use crate::cli::Commands;
use crate::commands;

pub struct CliApp {
    pub config: AppConfig,
    pub registry: DbRegistry,
    pub locks: AliasLocks,
}

impl CliApp {
    /// 使用智能配置查找初始化CLI应用
    pub fn new_with_auto_config() -> Result<Self> {
        let config = AppConfig::find_and_load_config()?;
        Ok(Self::with_config(config))
    }

    /// 从指定路径加载配置
    pub fn new_with_config_file(path: &Path) -> Result<Self> {
        let config = AppConfig::load_from_file(path)?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            registry: DbRegistry::new(),
            locks: AliasLocks::new(),
        }
    }

    /// 运行应用命令
    pub async fn run(&self, command: Commands) -> Result<()> {
        let result = self.run_command(command).await;

        // 进程退出前统一关闭连接池
        self.registry.close_all().await;
        result
    }

    async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Init { .. } => unreachable!(), // 已经在 main.rs 中处理
            Commands::Backup { alias } => commands::run_backup(self, alias.as_deref()).await,
            Commands::Restore {
                alias,
                file,
                user,
                yes,
            } => commands::run_restore(self, &alias, &file, user.as_deref(), yes).await,
            Commands::Cron => commands::run_cron(self).await,
            Commands::List { alias } => commands::run_list(self, alias.as_deref()),
            Commands::Status => commands::run_status(self),
        }
    }
}
