//! 异地推送协作方接口。
//!
//! 对象存储/rclone/SFTP等传输由协作方实现；推送尽力而为，
//! 失败不影响本次备份的主结果。

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait OffsiteStore: Send + Sync {
    /// 把完成的制品推送到异地，`alias` 作为远端子目录键
    async fn push(&self, file: &Path, alias: &str) -> Result<()>;
}

/// 默认实现：不做任何推送
pub struct NullOffsite;

#[async_trait]
impl OffsiteStore for NullOffsite {
    async fn push(&self, file: &Path, alias: &str) -> Result<()> {
        tracing::debug!("未配置异地存储，跳过推送: {} ({alias})", file.display());
        Ok(())
    }
}
