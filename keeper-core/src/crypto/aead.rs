//! AES-256-GCM 制品加密。
//!
//! 密文布局：96位随机nonce ‖ GCM密文（含认证标签）。
//! nonce同时作为附加认证数据参与封装。

use crate::constants::crypto::{KEY_LEN, NONCE_LEN};
use crate::error::{KeeperError, Result};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng, Payload},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 进程级对称密钥，初始化时加载一次，此后只读。
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    raw: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// 从base64解码密钥；解出的长度必须恰好32字节，否则初始化失败。
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeeperError::config(format!("加密密钥不是合法的base64: {e}")))?;

        let raw: [u8; KEY_LEN] = decoded
            .try_into()
            .map_err(|_| KeeperError::config("加密密钥解码后必须恰好32字节"))?;

        Ok(Self { raw })
    }

    /// 封装明文：返回 nonce ‖ 密文，每次调用生成新的nonce。
    pub fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.raw)
            .map_err(|e| KeeperError::crypto(format!("初始化加密器失败: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plain,
                    aad: &nonce_bytes,
                },
            )
            .map_err(|e| KeeperError::crypto(format!("加密失败: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// 打开密文。认证不通过（篡改、密钥不符、截断）不返回任何明文。
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() <= NONCE_LEN {
            return Err(KeeperError::crypto("密文过短，缺少nonce"));
        }
        let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new_from_slice(&self.raw)
            .map_err(|e| KeeperError::crypto(format!("初始化加密器失败: {e}")))?;

        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: sealed,
                    aad: nonce_bytes,
                },
            )
            .map_err(|_| KeeperError::crypto("解密失败: 认证不通过"))
    }
}
