use keeper_core::{
    config::AppConfig,
    constants::{backup, config},
    error::{KeeperError, Result},
};
use std::path::Path;
use tracing::info;

/// 初始化：写出带示例数据库的默认配置并创建备份目录
pub async fn run_init(force: bool) -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() && !force {
        return Err(KeeperError::config(format!(
            "配置文件 {} 已存在，使用 --force 覆盖",
            path.display()
        )));
    }

    let app_config = AppConfig::example();
    app_config.save_to_file(path)?;
    tokio::fs::create_dir_all(backup::DEFAULT_DIR).await?;

    info!("✅ 已生成配置文件: {}", path.display());
    info!("✅ 已创建备份目录: {}", backup::DEFAULT_DIR);
    info!("💡 下一步:");
    info!("   1. 编辑 {} 中的数据库连接信息", path.display());
    info!("   2. 如需加密，填入base64编码的32字节密钥");
    info!("   3. 在系统crontab中加入每分钟一次的调度触发:");
    info!("      * * * * * keeper-cli cron");
    Ok(())
}
