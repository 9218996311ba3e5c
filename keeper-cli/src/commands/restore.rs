use crate::app::CliApp;
use keeper_core::{
    auth::role_allows,
    error::{KeeperError, Result},
    restore::RestoreEngine,
};
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

/// 从备份文件恢复数据库。
/// 指定 `--user` 时按配置中的角色表检查 restore 权限。
pub async fn run_restore(
    app: &CliApp,
    alias: &str,
    file: &Path,
    user: Option<&str>,
    yes: bool,
) -> Result<()> {
    if let Some(username) = user {
        let account = app
            .config
            .security
            .users
            .get(username)
            .ok_or_else(|| KeeperError::auth(format!("未知用户: {username}")))?;

        if !role_allows(&app.config.security.roles, &account.role, "restore") {
            return Err(KeeperError::auth(format!(
                "用户 {username}（角色 {}）无权执行恢复",
                account.role
            )));
        }
        info!("🔑 用户 {username} 通过角色授权检查");
    }

    if !yes {
        warn!("⚠️  此操作将覆盖数据库 {alias} 的当前数据!");
        print!("确认从 {} 恢复 (y/N): ", file.display());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim().to_lowercase() != "y" {
            warn!("操作已取消");
            return Ok(());
        }
    }

    info!("开始恢复操作...");

    let engine = RestoreEngine::new(&app.config, &app.locks)?;
    engine.restore(alias, file).await?;

    info!("✅ 恢复完成: {alias}");
    Ok(())
}
