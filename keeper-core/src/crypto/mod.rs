//! 加密子系统：制品AEAD加密、RFC-6238 TOTP、CSRF令牌。

pub mod aead;
pub mod csrf;
pub mod totp;

pub use aead::EncryptionKey;
