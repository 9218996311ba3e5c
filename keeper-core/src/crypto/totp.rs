//! RFC 6238 时间一次性口令校验。
//!
//! 秘钥为标准字母表的Base32文本，`=` 起的填充被截断；
//! 验证时允许 ±window 个30秒时间步的偏移。

use crate::constants::totp::{DEFAULT_WINDOW, STEP_SECS};
use crate::error::{KeeperError, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// RFC 4648 标准字母表Base32解码。
/// 遇到 `=` 即停止，末尾不足8位的bit被丢弃；非法字符报错。
fn base32_decode(encoded: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded.len() * 5 / 8);
    let mut buf: u64 = 0;
    let mut bits = 0u32;

    for c in encoded.to_ascii_uppercase().bytes() {
        if c == b'=' {
            break;
        }
        let value = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| KeeperError::crypto(format!("TOTP秘钥包含非法Base32字符: {}", c as char)))?;

        buf = (buf << 5) | value as u64;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buf >> bits) as u8);
        }
    }

    Ok(out)
}

/// HOTP动态截断：HMAC-SHA1末字节低4位定位偏移，
/// 取4字节大端整数（屏蔽最高位），模1e6后补零到6位。
fn hotp(key: &[u8], counter: u64) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| KeeperError::crypto(format!("HMAC初始化失败: {e}")))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);

    Ok(format!("{:06}", binary % 1_000_000))
}

/// 给定Unix时间对应的6位验证码。
pub(crate) fn code_at(secret: &str, unix_time: i64) -> Result<String> {
    let key = base32_decode(secret)?;
    hotp(&key, (unix_time / STEP_SECS) as u64)
}

/// 在指定时刻校验验证码，允许 ±window 个时间步。
pub fn verify_at(secret: &str, code: &str, unix_time: i64, window: i64) -> Result<bool> {
    let key = base32_decode(secret)?;
    let step = unix_time / STEP_SECS;

    for offset in -window..=window {
        let expected = hotp(&key, (step + offset) as u64)?;
        if bool::from(expected.as_bytes().ct_eq(code.as_bytes())) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// 以当前系统时间校验验证码（默认窗口±1步）。
pub fn verify(secret: &str, code: &str) -> Result<bool> {
    verify_at(secret, code, chrono::Utc::now().timestamp(), DEFAULT_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 附录B的参考秘钥："12345678901234567890" 的Base32
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_base32_decode() {
        assert_eq!(base32_decode(RFC_SECRET).unwrap(), b"12345678901234567890");
        // 小写与填充
        assert_eq!(base32_decode("mzxw6===").unwrap(), b"foo");
        assert!(base32_decode("ABC1").is_err()); // '1' 不在字母表中
        assert_eq!(base32_decode("").unwrap(), b"");
    }

    #[test]
    fn test_rfc6238_vector() {
        // unix 59s -> T=1，RFC参考值 94287082 的低6位
        assert_eq!(code_at(RFC_SECRET, 59).unwrap(), "287082");
    }

    #[test]
    fn test_window_acceptance() {
        // T=1；窗口±1接受 T-1..=T+1 对应的验证码
        let t_minus_1 = hotp(b"12345678901234567890", 0).unwrap();
        let t_plus_1 = hotp(b"12345678901234567890", 2).unwrap();
        let t_plus_2 = hotp(b"12345678901234567890", 3).unwrap();

        assert!(verify_at(RFC_SECRET, "287082", 59, 1).unwrap());
        assert!(verify_at(RFC_SECRET, &t_minus_1, 59, 1).unwrap());
        assert!(verify_at(RFC_SECRET, &t_plus_1, 59, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, &t_plus_2, 59, 1).unwrap());
    }

    #[test]
    fn test_wrong_code_rejected() {
        assert!(!verify_at(RFC_SECRET, "000000", 59, 1).unwrap());
        assert!(!verify_at(RFC_SECRET, "28708", 59, 1).unwrap()); // 长度不符
    }

    #[test]
    fn test_malformed_secret_is_error() {
        assert!(verify_at("!!!!", "287082", 59, 1).is_err());
    }
}
