//! 多阶段登录流程与角色授权。
//!
//! 状态机：AwaitingUser -> AwaitingPassword -> (AwaitingTotp ->) Authenticated，
//! 转移单向，每一步由一次校验把关，状态保存在会话中。

use crate::config::SecurityConfig;
use crate::crypto::totp;
use crate::error::{KeeperError, Result};
use crate::session::{LoginStage, Session};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use std::collections::HashMap;

/// 用户名阶段：暂存用户名，进入口令阶段。
/// 此阶段不校验用户是否存在，避免用户名枚举。
pub fn submit_username(session: &mut Session, username: &str) -> Result<LoginStage> {
    if session.stage != LoginStage::AwaitingUser {
        return Err(KeeperError::auth("当前不在用户名阶段"));
    }

    session.pending_user = Some(username.to_string());
    session.stage = LoginStage::AwaitingPassword;
    Ok(session.stage)
}

/// 口令阶段：argon2校验口令。
/// 通过后若该用户配置了TOTP种子则进入验证码阶段，否则直接认证完成；
/// 失败时状态不变。
pub fn submit_password(
    security: &SecurityConfig,
    session: &mut Session,
    password: &str,
) -> Result<LoginStage> {
    if session.stage != LoginStage::AwaitingPassword {
        return Err(KeeperError::auth("当前不在口令阶段"));
    }

    let username = session
        .pending_user
        .clone()
        .ok_or_else(|| KeeperError::auth("会话中没有待验证的用户"))?;

    let Some(account) = security.users.get(&username) else {
        return Err(KeeperError::auth("无效的凭据"));
    };

    let parsed = PasswordHash::new(&account.pass_hash)
        .map_err(|e| KeeperError::config(format!("用户 {username} 的口令哈希无法解析: {e}")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(KeeperError::auth("无效的凭据"));
    }

    session.user = Some(username.clone());
    session.role = Some(account.role.clone());
    session.stage = if account.totp.is_some() {
        LoginStage::AwaitingTotp
    } else {
        LoginStage::Authenticated
    };
    Ok(session.stage)
}

/// TOTP阶段：按RFC 6238校验验证码（默认±1时间步窗口）。
pub fn submit_totp(
    security: &SecurityConfig,
    session: &mut Session,
    code: &str,
) -> Result<LoginStage> {
    if session.stage != LoginStage::AwaitingTotp {
        return Err(KeeperError::auth("当前不在TOTP阶段"));
    }

    let username = session
        .user
        .clone()
        .ok_or_else(|| KeeperError::auth("会话中没有已通过口令的用户"))?;

    let secret = security
        .users
        .get(&username)
        .and_then(|a| a.totp.as_deref())
        .ok_or_else(|| KeeperError::auth("该用户未配置TOTP"))?;

    if !totp::verify(secret, code)? {
        return Err(KeeperError::auth("验证码错误"));
    }

    session.stage = LoginStage::Authenticated;
    Ok(session.stage)
}

/// 角色是否许可某操作；许可列表中出现 "*" 表示全部放行。
pub fn role_allows(roles: &HashMap<String, Vec<String>>, role: &str, action: &str) -> bool {
    roles
        .get(role)
        .map(|perms| perms.iter().any(|p| p == "*" || p == action))
        .unwrap_or(false)
}
