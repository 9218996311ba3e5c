use crate::app::CliApp;
use crate::commands::backup::format_size;
use keeper_core::{error::Result, tool};
use std::path::Path;
use tracing::{info, warn};

/// 显示配置摘要与外部工具发现状态
pub fn run_status(app: &CliApp) -> Result<()> {
    let config = &app.config;

    info!("📋 DB Keeper 状态");
    info!("=================");

    info!("数据库 ({} 个):", config.databases.len());
    for (alias, profile) in &config.databases {
        let default_mark = if config.default.as_deref() == Some(alias) {
            " (默认)"
        } else {
            ""
        };
        info!(
            "   {alias}{default_mark}: {}:{}/{}",
            profile.host, profile.port, profile.name
        );
    }

    info!("备份: 目录={} 压缩={} 保留={}",
        config.backup.dir, config.backup.compress, config.rotation.keep);
    info!("加密: {}", if config.security.encryption.enabled { "启用" } else { "禁用" });
    info!("恢复: {}", if config.restore.enabled { "启用" } else { "禁用" });

    if config.schedule.enabled {
        info!("调度: 启用 ({} 个任务)", config.schedule.jobs.len());
        for job in &config.schedule.jobs {
            info!("   {} <- \"{}\"", job.db, job.cron);
        }
        if config.schedule.digest.enabled {
            info!("   每日摘要: {}", config.schedule.digest.time);
        }
    } else {
        info!("调度: 禁用");
    }

    // 外部工具发现
    match tool::locate_mysqldump(&config.performance) {
        Some(path) => info!("mysqldump: ✅ {}", path.display()),
        None => info!("mysqldump: ❌ 未发现（备份将走流式回退路径）"),
    }
    match tool::locate_mysql(&config.restore) {
        Some(path) => info!("mysql: ✅ {}", path.display()),
        None => info!("mysql: ❌ 未发现（无法执行恢复）"),
    }

    Ok(())
}

/// 列出本地备份制品
pub fn run_list(app: &CliApp, alias: Option<&str>) -> Result<()> {
    let aliases: Vec<String> = match alias {
        Some(a) => vec![a.to_string()],
        None => app.config.databases.keys().cloned().collect(),
    };

    let mut total = 0usize;
    for alias in &aliases {
        let dir = Path::new(&app.config.backup.dir).join(alias);
        if !dir.is_dir() {
            info!("📦 {alias}: 暂无备份");
            continue;
        }

        let mut artifacts: Vec<(String, u64)> = std::fs::read_dir(&dir)?
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if is_artifact(&name) {
                    let size = entry.metadata().ok()?.len();
                    Some((name, size))
                } else {
                    None
                }
            })
            .collect();

        // 最新在前
        artifacts.sort_by(|a, b| b.0.cmp(&a.0));

        if artifacts.is_empty() {
            info!("📦 {alias}: 暂无备份");
            continue;
        }

        info!("📦 {alias} ({} 个制品):", artifacts.len());
        for (name, size) in &artifacts {
            let sidecar_mark = if dir.join(format!("{name}.sha256")).exists() {
                ""
            } else {
                "  ⚠️ 缺少sha256 sidecar"
            };
            info!("   {:<12} {name}{sidecar_mark}", format_size(*size));
            total += 1;
        }
    }

    if total == 0 && alias.is_none() {
        warn!("没有找到任何备份制品");
        info!("💡 使用以下命令创建备份:");
        info!("   keeper-cli backup <别名>");
    }

    Ok(())
}

fn is_artifact(name: &str) -> bool {
    name.ends_with(".sql") || name.ends_with(".sql.gz") || name.ends_with(".enc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_artifact() {
        assert!(is_artifact("dump_a_20240101_000000.sql"));
        assert!(is_artifact("dump_a_20240101_000000.sql.gz"));
        assert!(is_artifact("dump_a_20240101_000000.sql.gz.enc"));
        assert!(!is_artifact("dump_a_20240101_000000.sql.sha256"));
        assert!(!is_artifact("notes.txt"));
    }
}
