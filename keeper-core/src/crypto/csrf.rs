//! CSRF令牌：会话期内生成一次、每个变更请求常数时间校验。

use crate::constants::crypto::CSRF_TOKEN_BYTES;
use crate::error::{KeeperError, Result};
use crate::session::Session;
use aes_gcm::aead::OsRng;
use aes_gcm::aead::rand_core::RngCore;
use subtle::ConstantTimeEq;

/// 返回会话的CSRF令牌；不存在时生成128位随机值并持久化到会话。
/// 同一会话内多次调用返回同一个值。
pub fn token(session: &mut Session) -> &str {
    session
        .csrf
        .get_or_insert_with(|| {
            let mut raw = [0u8; CSRF_TOKEN_BYTES];
            OsRng.fill_bytes(&mut raw);
            hex_encode(&raw)
        })
        .as_str()
}

/// 常数时间比较提交值与会话令牌。
/// 令牌缺失或不匹配都是硬失败，调用方必须在任何变更动作之前校验。
pub fn check(session: &Session, submitted: Option<&str>) -> Result<()> {
    let (Some(expected), Some(submitted)) = (session.csrf.as_deref(), submitted) else {
        return Err(KeeperError::Csrf);
    };

    if bool::from(expected.as_bytes().ct_eq(submitted.as_bytes())) {
        Ok(())
    } else {
        Err(KeeperError::Csrf)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_stable() {
        let mut session = Session::new();
        let first = token(&mut session).to_string();
        let second = token(&mut session).to_string();

        assert_eq!(first, second);
        assert_eq!(first.len(), CSRF_TOKEN_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_differ_across_sessions() {
        let mut a = Session::new();
        let mut b = Session::new();
        assert_ne!(token(&mut a), token(&mut b));
    }

    #[test]
    fn test_check() {
        let mut session = Session::new();
        let t = token(&mut session).to_string();

        assert!(check(&session, Some(&t)).is_ok());
        assert!(check(&session, Some("deadbeef")).is_err());
        assert!(check(&session, None).is_err());

        // 未发放过令牌的会话任何提交都不通过
        let empty = Session::new();
        assert!(check(&empty, Some(&t)).is_err());
    }
}
