//! 备份引擎：生成一个可携带的schema快照制品。
//!
//! 策略在调用时按可用性与偏好二选一：mysqldump 快速路径，
//! 或始终可用的流式回退。两者之后的处理相同：sha256 sidecar、
//! 轮换、可选AEAD加密、尽力而为的异地推送。

use crate::config::AppConfig;
use crate::constants::backup::{ENCRYPTED_SUFFIX, SIDECAR_SUFFIX, TIMESTAMP_FORMAT};
use crate::crypto::EncryptionKey;
use crate::dump::{self, DumpWriter};
use crate::error::Result;
use crate::lock::AliasLocks;
use crate::offsite::OffsiteStore;
use crate::registry::DbRegistry;
use crate::retention;
use crate::skip::SkipFilter;
use crate::tool;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// 一次完成的备份制品（写成后不可变）
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    pub alias: String,
    /// 最终交付的文件：启用加密时为 `.enc` 副本
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub compressed: bool,
    pub encrypted: bool,
    pub size: u64,
    /// 明文制品的十六进制SHA-256（与sidecar一致）
    pub sha256: String,
}

impl BackupArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 调用时选定的转储策略
enum DumpStrategy {
    External(PathBuf),
    Streaming,
}

pub struct BackupEngine<'a> {
    config: &'a AppConfig,
    registry: &'a DbRegistry,
    locks: &'a AliasLocks,
    offsite: &'a dyn OffsiteStore,
    key: Option<EncryptionKey>,
}

impl<'a> BackupEngine<'a> {
    /// 构建引擎。启用加密时立即加载并校验进程级密钥，
    /// 密钥不合法在这里失败，而不是在第一次备份时。
    pub fn new(
        config: &'a AppConfig,
        registry: &'a DbRegistry,
        locks: &'a AliasLocks,
        offsite: &'a dyn OffsiteStore,
    ) -> Result<Self> {
        let key = if config.security.encryption.enabled {
            Some(EncryptionKey::from_base64(&config.security.encryption.key)?)
        } else {
            None
        };

        Ok(Self {
            config,
            registry,
            locks,
            offsite,
            key,
        })
    }

    /// 对单个别名执行一次完整备份，返回制品描述。
    /// 全程持有该别名的锁；同别名的并发调用在此串行化。
    pub async fn run(&self, alias: &str) -> Result<BackupArtifact> {
        let profile = self.config.profile(alias)?;
        let lock = self.locks.for_alias(alias);
        let _guard = lock.lock().await;

        let dir = Path::new(&self.config.backup.dir).join(alias);
        tokio::fs::create_dir_all(&dir).await?;

        let created_at = Utc::now();
        let compress = self.config.backup.compress;
        let file_name = artifact_file_name(
            &self.config.backup.prefix,
            alias,
            created_at,
            compress,
        );
        let path = dir.join(&file_name);

        let pool = self.registry.pool(alias, profile).await?;
        let tables = dump::list_base_tables(&pool).await?;
        let filter = SkipFilter::new(&self.config.performance.skip_tables);

        let strategy = self.select_strategy();
        match strategy {
            DumpStrategy::External(bin) => {
                tracing::info!("使用 mysqldump 快速路径备份 {alias}: {}", bin.display());

                let skipped: Vec<String> = tables
                    .iter()
                    .filter(|t| filter.matches(t.as_str()))
                    .cloned()
                    .collect();
                let profile = profile.clone();
                let out_path = path.clone();
                tokio::task::spawn_blocking(move || {
                    dump::run_mysqldump_blocking(&bin, &profile, &skipped, &out_path, compress)
                })
                .await??;
            }
            DumpStrategy::Streaming => {
                tracing::info!("使用流式回退路径备份 {alias}");

                let kept: Vec<String> = tables
                    .iter()
                    .filter(|t| !filter.matches(t.as_str()))
                    .cloned()
                    .collect();
                let writer = DumpWriter::create(&path, compress)?;
                dump::stream_dump(
                    &pool,
                    writer,
                    &profile.name,
                    &kept,
                    self.config.tuning.chunk_size,
                )
                .await?;
            }
        }

        // 后处理：sidecar -> 轮换 -> 加密 -> 推送
        let sha256 = write_sha256_sidecar(&path).await?;
        retention::enforce(&dir, self.config.rotation.keep);

        let (final_path, encrypted) = match &self.key {
            Some(key) => (encrypt_artifact(&path, key).await?, true),
            None => (path.clone(), false),
        };

        if let Err(e) = self.offsite.push(&final_path, alias).await {
            tracing::warn!("异地推送失败（不影响本次备份）: {e}");
        }

        let size = tokio::fs::metadata(&final_path).await?.len();
        tracing::info!(
            "备份完成: {} ({} 字节)",
            final_path.display(),
            size
        );

        Ok(BackupArtifact {
            alias: alias.to_string(),
            path: final_path,
            created_at,
            compressed: compress,
            encrypted,
            size,
            sha256,
        })
    }

    /// 策略选择：偏好开启且工具可发现才走快速路径；
    /// 工具缺席不是错误，静默回退。
    fn select_strategy(&self) -> DumpStrategy {
        if self.config.performance.prefer_mysqldump {
            if let Some(bin) = tool::locate_mysqldump(&self.config.performance) {
                return DumpStrategy::External(bin);
            }
            tracing::debug!("未发现 mysqldump，回退到流式路径");
        }
        DumpStrategy::Streaming
    }
}

/// 制品文件名：前缀、别名、秒级UTC时间戳；扩展名反映压缩。
/// 字典序即时间序，轮换依赖这一点。
pub fn artifact_file_name(
    prefix: &str,
    alias: &str,
    created_at: DateTime<Utc>,
    compress: bool,
) -> String {
    format!(
        "{prefix}{alias}_{}.sql{}",
        created_at.format(TIMESTAMP_FORMAT),
        if compress { ".gz" } else { "" }
    )
}

/// 流式计算文件SHA-256并写出 `{artifact}.sha256` sidecar（hex + 换行）。
/// 返回十六进制摘要。
pub async fn write_sha256_sidecar(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let hash = hasher.finalize();
    let hex = format!("{hash:x}");

    let sidecar = sidecar_path(path);
    tokio::fs::write(&sidecar, format!("{hex}\n")).await?;
    Ok(hex)
}

pub fn sidecar_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.{SIDECAR_SUFFIX}", path.display()))
}

/// 把写成的制品整体AEAD加密为 `{artifact}.enc`；明文副本保留在本地。
async fn encrypt_artifact(path: &Path, key: &EncryptionKey) -> Result<PathBuf> {
    let plain = tokio::fs::read(path).await?;
    let sealed = key.encrypt(&plain)?;

    let enc_path = PathBuf::from(format!("{}.{ENCRYPTED_SUFFIX}", path.display()));
    tokio::fs::write(&enc_path, sealed).await?;
    Ok(enc_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use chrono::TimeZone;

    #[test]
    fn test_artifact_file_name() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 7).unwrap();
        assert_eq!(
            artifact_file_name("dump_", "primary", t, true),
            "dump_primary_20240305_235907.sql.gz"
        );
        assert_eq!(
            artifact_file_name("dump_", "primary", t, false),
            "dump_primary_20240305_235907.sql"
        );
    }

    #[test]
    fn test_file_names_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 11, 1, 8, 0, 0).unwrap();
        let a = artifact_file_name("dump_", "a", early, true);
        let b = artifact_file_name("dump_", "a", late, true);
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_sha256_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump_a_20240101_000000.sql");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let hex = write_sha256_sidecar(&path).await.unwrap();
        assert_eq!(
            hex,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let sidecar = std::fs::read_to_string(sidecar_path(&path)).unwrap();
        assert_eq!(sidecar, format!("{hex}\n"));
    }

    #[tokio::test]
    async fn test_encrypt_artifact_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump_a_20240101_000000.sql");
        tokio::fs::write(&path, b"CREATE TABLE t (id INT);").await.unwrap();

        let key = EncryptionKey::from_base64(&STANDARD.encode([3u8; 32])).unwrap();
        let enc = encrypt_artifact(&path, &key).await.unwrap();

        assert_eq!(
            enc.file_name().unwrap().to_string_lossy(),
            "dump_a_20240101_000000.sql.enc"
        );
        // 明文副本保留
        assert!(path.exists());

        let sealed = std::fs::read(&enc).unwrap();
        assert_eq!(key.decrypt(&sealed).unwrap(), b"CREATE TABLE t (id INT);");
    }

    #[test]
    fn test_engine_rejects_bad_key_at_init() {
        let mut config = AppConfig::example();
        config.security.encryption.enabled = true;
        config.security.encryption.key = "dG9vc2hvcnQ=".to_string(); // "tooshort"

        let registry = DbRegistry::new();
        let locks = AliasLocks::new();
        let offsite = crate::offsite::NullOffsite;

        assert!(BackupEngine::new(&config, &registry, &locks, &offsite).is_err());
    }
}
