//! 通知协作方接口。
//!
//! 多渠道投递（邮件/短信/webhook）完全是协作方的事，
//! 核心只约定调用面；投递失败由调用点记日志吞掉。

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str, success: bool) -> Result<()>;
}

/// 默认实现：只写tracing日志，不对外投递
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str, success: bool) -> Result<()> {
        if success {
            tracing::info!("通知: {subject}\n{body}");
        } else {
            tracing::warn!("通知(失败事件): {subject}\n{body}");
        }
        Ok(())
    }
}
