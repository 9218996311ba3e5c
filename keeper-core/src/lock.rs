//! 别名粒度的互斥锁。
//!
//! 同一别名的 backup/restore 在持锁期间串行执行；不同别名互不阻塞。
//! 阻塞式获取：外部定时触发重叠时后到者等待而不是报错。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct AliasLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AliasLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取某别名的锁句柄，惰性创建。
    /// 调用方 `lock().await` 持有到操作结束。
    pub fn for_alias(&self, alias: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(alias.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_alias_same_lock() {
        let locks = AliasLocks::new();
        let a = locks.for_alias("primary");
        let b = locks.for_alias("primary");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_different_alias_independent() {
        let locks = AliasLocks::new();
        let a = locks.for_alias("primary");
        let b = locks.for_alias("replica");

        // 持有 primary 的同时 replica 可立即获取
        let _guard_a = a.lock().await;
        let guard_b = b.try_lock();
        assert!(guard_b.is_ok());
    }

    #[tokio::test]
    async fn test_same_alias_blocks() {
        let locks = AliasLocks::new();
        let a = locks.for_alias("primary");
        let _guard = a.lock().await;

        let again = locks.for_alias("primary");
        assert!(again.try_lock().is_err());
    }
}
