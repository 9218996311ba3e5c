//! 显式连接注册表：别名 -> 连接池。
//!
//! 首次使用时建池，进程退出前 `close_all` 统一关闭；
//! 由调用方以引用传入引擎操作，取代全局键控缓存。

use crate::config::DatabaseProfile;
use crate::error::Result;
use dashmap::DashMap;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

#[derive(Default)]
pub struct DbRegistry {
    pools: DashMap<String, MySqlPool>,
}

impl DbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取某别名的连接池，不存在时按连接信息建池并登记。
    pub async fn pool(&self, alias: &str, profile: &DatabaseProfile) -> Result<MySqlPool> {
        if let Some(existing) = self.pools.get(alias) {
            return Ok(existing.clone());
        }

        tracing::debug!("为别名 {alias} 建立连接池: {}:{}", profile.host, profile.port);

        let options = MySqlConnectOptions::new()
            .host(&profile.host)
            .port(profile.port)
            .username(&profile.user)
            .password(&profile.pass)
            .database(&profile.name)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;

        let entry = self
            .pools
            .entry(alias.to_string())
            .or_insert_with(|| pool);
        Ok(entry.clone())
    }

    /// 关闭全部连接池（进程关停路径）。
    pub async fn close_all(&self) {
        for entry in self.pools.iter() {
            entry.value().close().await;
        }
        self.pools.clear();
    }
}
