use crate::constants::{backup, config, cron};
use crate::error::{KeeperError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// 未指定别名时使用的默认库
    #[serde(default)]
    pub default: Option<String>,
    /// 别名 -> 连接信息
    #[serde(default)]
    pub databases: HashMap<String, DatabaseProfile>,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
}

/// 单个数据库的连接信息（只读，外部提供）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseProfile {
    pub host: String,
    pub port: u16,
    /// schema 名
    pub name: String,
    pub user: String,
    pub pass: String,
}

/// 备份制品相关配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackupConfig {
    /// 备份根目录，每个别名一个子目录
    pub dir: String,
    /// 是否gzip压缩
    pub compress: bool,
    /// 制品文件名前缀
    pub prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: backup::DEFAULT_DIR.to_string(),
            compress: true,
            prefix: backup::DEFAULT_PREFIX.to_string(),
        }
    }
}

/// 轮换策略
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RotationConfig {
    /// 每个别名保留的最新制品数量
    pub keep: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            keep: config::DEFAULT_KEEP,
        }
    }
}

/// 安全相关配置：制品加密、用户与角色
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub encryption: EncryptionConfig,
    /// 用户名 -> 账号信息
    #[serde(default)]
    pub users: HashMap<String, UserAccount>,
    /// 角色 -> 许可的操作列表，"*" 表示全部
    #[serde(default)]
    pub roles: HashMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EncryptionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// base64编码的32字节密钥，进程级，加载一次
    #[serde(default)]
    pub key: String,
}

/// 配置中声明的用户账号
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserAccount {
    /// argon2 口令哈希
    pub pass_hash: String,
    pub role: String,
    /// Base32 TOTP种子；缺省表示该用户不启用TOTP
    #[serde(default)]
    pub totp: Option<String>,
}

/// 调度器配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduleConfig {
    pub enabled: bool,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
    #[serde(default)]
    pub digest: DigestConfig,
    /// 追加写的调度日志路径
    pub log_file: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jobs: Vec::new(),
            digest: DigestConfig::default(),
            log_file: cron::LOG_FILE_NAME.to_string(),
        }
    }
}

/// 一条调度任务：{别名, cron表达式}，每次tick重新求值
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobConfig {
    pub db: String,
    pub cron: String,
}

/// 每日摘要通知配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DigestConfig {
    pub enabled: bool,
    /// 发送时刻，"HH:MM"
    pub time: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time: "06:00".to_string(),
        }
    }
}

/// 恢复功能配置
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RestoreConfig {
    #[serde(default)]
    pub enabled: bool,
    /// mysql 客户端路径；缺省时走固定位置/PATH探测
    #[serde(default)]
    pub mysql_path: Option<String>,
}

/// 转储性能与跳过规则配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// 跳过的表：以 "/" 开头按正则匹配，否则大小写不敏感的字面量
    #[serde(default)]
    pub skip_tables: Vec<String>,
    /// 可用时是否优先走 mysqldump 快速路径
    pub prefer_mysqldump: bool,
    /// mysqldump 路径；缺省时走固定位置/PATH探测
    #[serde(default)]
    pub mysqldump_path: Option<String>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            skip_tables: Vec::new(),
            prefer_mysqldump: true,
            mysqldump_path: None,
        }
    }
}

/// 流式转储的调优参数
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TuningConfig {
    /// 单条多行INSERT的行数
    pub chunk_size: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            chunk_size: config::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：config.toml -> keeper.toml -> .keeper.toml
    pub fn find_and_load_config() -> Result<Self> {
        for config_file in config::CONFIG_CANDIDATES {
            if Path::new(config_file).exists() {
                tracing::info!("找到配置文件: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        Err(KeeperError::ConfigNotFound)
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// 取指定别名的连接信息
    pub fn profile(&self, alias: &str) -> Result<&DatabaseProfile> {
        self.databases
            .get(alias)
            .ok_or_else(|| KeeperError::config(format!("未知的数据库别名: {alias}")))
    }

    /// 未显式指定别名时解析默认库
    pub fn resolve_alias<'a>(&'a self, alias: Option<&'a str>) -> Result<&'a str> {
        match alias {
            Some(a) => Ok(a),
            None => self
                .default
                .as_deref()
                .ok_or_else(|| KeeperError::config("未指定别名，且配置中没有 default 项")),
        }
    }

    /// 生成一份带示例数据库的初始配置
    pub fn example() -> Self {
        let mut databases = HashMap::new();
        databases.insert(
            "primary".to_string(),
            DatabaseProfile {
                host: "localhost".to_string(),
                port: 3306,
                name: "prod_db".to_string(),
                user: "prod".to_string(),
                pass: "prod_pw".to_string(),
            },
        );

        let mut roles = HashMap::new();
        roles.insert("admin".to_string(), vec!["*".to_string()]);
        roles.insert(
            "maintainer".to_string(),
            vec![
                "view".to_string(),
                "backup".to_string(),
                "upload".to_string(),
                "restore".to_string(),
            ],
        );
        roles.insert(
            "viewer".to_string(),
            vec!["view".to_string(), "download".to_string(), "logs".to_string()],
        );

        Self {
            databases,
            default: Some("primary".to_string()),
            schedule: ScheduleConfig {
                enabled: true,
                jobs: vec![JobConfig {
                    db: "primary".to_string(),
                    cron: cron::DEFAULT_BACKUP_CRON.to_string(),
                }],
                digest: DigestConfig {
                    enabled: true,
                    time: "06:00".to_string(),
                },
                log_file: cron::LOG_FILE_NAME.to_string(),
            },
            security: SecurityConfig {
                roles,
                ..SecurityConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml_src = r#"
            default = "primary"

            [databases.primary]
            host = "localhost"
            port = 3306
            name = "prod_db"
            user = "prod"
            pass = "prod_pw"

            [backup]
            dir = "backups"
            compress = true
            prefix = "dump_"

            [rotation]
            keep = 7

            [performance]
            skip_tables = ["/^log_/", "sessions"]
            prefer_mysqldump = false
        "#;

        let cfg: AppConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.profile("primary").unwrap().port, 3306);
        assert_eq!(cfg.rotation.keep, 7);
        assert_eq!(cfg.performance.skip_tables.len(), 2);
        assert!(!cfg.performance.prefer_mysqldump);
        // 未出现的段落落到默认值
        assert_eq!(cfg.tuning.chunk_size, 1000);
        assert!(!cfg.schedule.enabled);
        assert!(!cfg.restore.enabled);
    }

    #[test]
    fn test_resolve_alias() {
        let cfg = AppConfig::example();
        assert_eq!(cfg.resolve_alias(None).unwrap(), "primary");
        assert_eq!(cfg.resolve_alias(Some("other")).unwrap(), "other");

        let empty = AppConfig::default();
        assert!(empty.resolve_alias(None).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = AppConfig::example();
        cfg.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.default.as_deref(), Some("primary"));
        assert_eq!(loaded.schedule.jobs.len(), 1);
        assert_eq!(loaded.schedule.jobs[0].cron, "0 2 * * *");
    }
}
