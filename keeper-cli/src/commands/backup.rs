use crate::app::CliApp;
use keeper_core::{backup::BackupEngine, error::Result, offsite::NullOffsite};
use tracing::{error, info};

/// 对单个别名立即执行一次备份
pub async fn run_backup(app: &CliApp, alias: Option<&str>) -> Result<()> {
    let alias = app.config.resolve_alias(alias)?;

    info!("💾 开始备份数据库: {alias}");
    info!("   备份目录: {}/{alias}", app.config.backup.dir);
    if !app.config.performance.skip_tables.is_empty() {
        info!("   跳过规则: {:?}", app.config.performance.skip_tables);
    }

    let offsite = NullOffsite;
    let engine = BackupEngine::new(&app.config, &app.registry, &app.locks, &offsite)?;

    match engine.run(alias).await {
        Ok(artifact) => {
            info!("🎉 备份创建成功！");
            info!("   制品文件: {}", artifact.path.display());
            info!("   创建时间: {}", artifact.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            info!("   文件大小: {}", format_size(artifact.size));
            info!("   SHA-256: {}", artifact.sha256);
            if artifact.encrypted {
                info!("   🔒 已加密（明文副本保留在本地）");
            }
            Ok(())
        }
        Err(e) => {
            error!("❌ 备份失败: {e}");
            info!("💡 请检查:");
            info!("   - 备份目录是否有写入权限");
            info!("   - 数据库连接信息是否正确");
            info!("   - 磁盘空间是否充足");
            Err(e)
        }
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes > 1024 * 1024 * 1024 {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes > 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes > 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
