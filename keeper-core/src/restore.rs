//! 恢复引擎：把制品装载回目标库。
//!
//! 管线：读取 -> 按需解密 -> 按需解压 -> 临时文件 -> mysql 子进程。
//! 任何一步失败都是硬失败，不会部分应用；临时文件在所有退出
//! 路径上随作用域清理。

use crate::config::AppConfig;
use crate::crypto::EncryptionKey;
use crate::error::{KeeperError, Result};
use crate::lock::AliasLocks;
use crate::tool;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

pub struct RestoreEngine<'a> {
    config: &'a AppConfig,
    locks: &'a AliasLocks,
    key: Option<EncryptionKey>,
}

impl<'a> RestoreEngine<'a> {
    /// 构建引擎；启用加密时在这里加载并校验密钥。
    pub fn new(config: &'a AppConfig, locks: &'a AliasLocks) -> Result<Self> {
        let key = if config.security.encryption.enabled {
            Some(EncryptionKey::from_base64(&config.security.encryption.key)?)
        } else {
            None
        };

        Ok(Self { config, locks, key })
    }

    /// 把 `src` 指向的制品恢复到别名对应的库。
    /// 前置条件：配置启用恢复、源文件存在；加密/压缩从文件名后缀推断。
    pub async fn restore(&self, alias: &str, src: &Path) -> Result<()> {
        if !self.config.restore.enabled {
            return Err(KeeperError::config("恢复功能已在配置中禁用"));
        }

        let profile = self.config.profile(alias)?;

        if !src.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("备份文件不存在: {}", src.display()),
            )
            .into());
        }

        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let encrypted = name.ends_with(".enc");
        let compressed = name.ends_with(".gz") || name.ends_with(".gz.enc");

        let lock = self.locks.for_alias(alias);
        let _guard = lock.lock().await;

        tracing::info!(
            "开始恢复 {alias} <- {} (加密: {encrypted}, 压缩: {compressed})",
            src.display()
        );

        let mut bytes = tokio::fs::read(src).await?;
        if encrypted {
            let key = self
                .key
                .as_ref()
                .ok_or_else(|| KeeperError::config("恢复加密制品需要启用加密并配置密钥"))?;
            bytes = key.decrypt(&bytes)?;
        }

        let mysql_bin = tool::locate_mysql(&self.config.restore)
            .ok_or_else(|| KeeperError::config("未找到 mysql 客户端"))?;

        let profile = profile.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let sql = if compressed {
                let mut decoder = GzDecoder::new(&bytes[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                out
            } else {
                bytes
            };

            // 作用域结束即删除，覆盖成功与所有错误路径
            let mut scratch = NamedTempFile::new()?;
            scratch.write_all(&sql)?;
            scratch.flush()?;

            let stdin = File::open(scratch.path())?;
            let output = Command::new(&mysql_bin)
                .arg(format!("--host={}", profile.host))
                .arg(format!("--port={}", profile.port))
                .arg(format!("--user={}", profile.user))
                .arg(format!("--password={}", profile.pass))
                .arg(&profile.name)
                .stdin(Stdio::from(stdin))
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()?;

            if !output.status.success() {
                return Err(KeeperError::tool(
                    output.status.code().unwrap_or(-1),
                    format!(
                        "mysql 退出异常: {}",
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                ));
            }
            Ok(())
        })
        .await??;

        tracing::info!("恢复完成: {alias}");
        Ok(())
    }
}
