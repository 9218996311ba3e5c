use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DB Keeper CLI - MySQL 备份、恢复与定时调度工具
#[derive(Parser)]
#[command(name = "keeper-cli")]
#[command(about = "MySQL 数据库备份与恢复工具")]
#[command(version)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 首次使用时初始化，生成默认配置文件
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 立即对指定数据库执行一次备份
    Backup {
        /// 数据库别名（缺省时使用配置中的 default）
        alias: Option<String>,
    },
    /// 从备份文件恢复数据库（受角色授权约束）
    Restore {
        /// 数据库别名
        alias: String,
        /// 备份文件路径（.sql / .sql.gz / .enc）
        file: PathBuf,
        /// 以配置中的哪个用户身份执行（检查其角色是否许可 restore）
        #[arg(long)]
        user: Option<String>,
        /// 跳过交互确认
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// 执行一次调度tick（由外部定时任务每分钟调用一次）
    Cron,
    /// 列出本地备份制品
    List {
        /// 只看某个别名（缺省列出全部）
        alias: Option<String>,
    },
    /// 显示配置摘要与外部工具发现状态
    Status,
}
