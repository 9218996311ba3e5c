//! 调度循环：由外部定时器每分钟触发一次tick。
//!
//! tick内部顺序执行全部到期任务；单个任务失败只记入日志，
//! 不影响同一tick内的其他任务。tick自身不去重，每分钟至多
//! 调用一次是部署侧要保证的外部不变量。

use crate::backup::BackupEngine;
use crate::config::AppConfig;
use crate::cron::cron_match;
use crate::error::Result;
use crate::notify::Notifier;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub struct SchedulerLoop<'a> {
    config: &'a AppConfig,
    engine: &'a BackupEngine<'a>,
    notifier: &'a dyn Notifier,
}

impl<'a> SchedulerLoop<'a> {
    pub fn new(
        config: &'a AppConfig,
        engine: &'a BackupEngine<'a>,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            engine,
            notifier,
        }
    }

    /// 执行一次tick：跑到期任务、追加结果日志、按时发送每日摘要。
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<()> {
        let schedule = &self.config.schedule;
        if !schedule.enabled {
            return Ok(());
        }

        let log_path = Path::new(&schedule.log_file);

        for job in &schedule.jobs {
            if !cron_match(&job.cron, now) {
                continue;
            }

            // 任务间隔离：失败写日志后继续跑兄弟任务
            let line = match self.engine.run(&job.db).await {
                Ok(artifact) => {
                    format!("{} OK {} {}", now.to_rfc3339(), job.db, artifact.file_name())
                }
                Err(e) => {
                    tracing::error!("调度任务 {} 失败: {e}", job.db);
                    format!("{} FAIL {} {e}", now.to_rfc3339(), job.db)
                }
            };

            if let Err(e) = append_line(log_path, &line) {
                tracing::warn!("写调度日志失败: {e}");
            }
        }

        // 每日摘要：到点且当天有记录才发送
        if schedule.digest.enabled
            && now.format("%H:%M").to_string() == schedule.digest.time
        {
            let today = now.format("%Y-%m-%d").to_string();
            let content = fs::read_to_string(log_path).unwrap_or_default();
            let lines = digest_lines(&content, &today);

            if !lines.is_empty() {
                let subject = format!("Backup Digest {today}");
                if let Err(e) = self
                    .notifier
                    .notify(&subject, &lines.join("\n"), true)
                    .await
                {
                    tracing::warn!("摘要通知发送失败: {e}");
                }
            }
        }

        Ok(())
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

/// 以字面日期前缀（YYYY-MM-DD）筛选当天的日志行
fn digest_lines<'l>(content: &'l str, date_prefix: &str) -> Vec<&'l str> {
    content
        .lines()
        .filter(|l| l.starts_with(date_prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::AliasLocks;
    use crate::offsite::NullOffsite;
    use crate::registry::DbRegistry;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, bool)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, subject: &str, body: &str, success: bool) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string(), success));
            Ok(())
        }
    }

    #[test]
    fn test_digest_lines_filter() {
        let content = "2024-01-01T02:00:00+00:00 OK primary dump_primary_20240101_020000.sql.gz\n\
                       2024-01-02T02:00:00+00:00 FAIL primary 数据库错误: 连接超时\n\
                       2024-01-02T03:00:00+00:00 OK replica dump_replica_20240102_030000.sql.gz\n";

        let lines = digest_lines(content, "2024-01-02");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("FAIL primary"));
        assert!(lines[1].contains("OK replica"));

        assert!(digest_lines(content, "2024-01-03").is_empty());
    }

    #[test]
    fn test_append_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.log");

        append_line(&path, "first").unwrap();
        append_line(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_disabled_scheduler_is_noop() {
        let config = AppConfig::default(); // schedule.enabled = false
        let registry = DbRegistry::new();
        let locks = AliasLocks::new();
        let offsite = NullOffsite;
        let engine = BackupEngine::new(&config, &registry, &locks, &offsite).unwrap();
        let notifier = RecordingNotifier {
            sent: Mutex::new(Vec::new()),
        };

        let loop_ = SchedulerLoop::new(&config, &engine, &notifier);
        loop_
            .tick(Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap())
            .await
            .unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_digest_sends_only_todays_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("scheduler.log");
        fs::write(
            &log_path,
            "2024-01-01T02:00:00+00:00 OK primary dump_primary_20240101_020000.sql.gz\n\
             2024-01-02T02:00:00+00:00 OK primary dump_primary_20240102_020000.sql.gz\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.schedule.enabled = true;
        config.schedule.digest.enabled = true;
        config.schedule.digest.time = "06:00".to_string();
        config.schedule.log_file = log_path.to_string_lossy().to_string();

        let registry = DbRegistry::new();
        let locks = AliasLocks::new();
        let offsite = NullOffsite;
        let engine = BackupEngine::new(&config, &registry, &locks, &offsite).unwrap();
        let notifier = RecordingNotifier {
            sent: Mutex::new(Vec::new()),
        };

        let loop_ = SchedulerLoop::new(&config, &engine, &notifier);
        loop_
            .tick(Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap())
            .await
            .unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (subject, body, success) = &sent[0];
        assert_eq!(subject, "Backup Digest 2024-01-02");
        assert!(body.contains("20240102"));
        assert!(!body.contains("2024-01-01"));
        assert!(*success);
    }

    #[tokio::test]
    async fn test_digest_skipped_off_schedule() {
        let mut config = AppConfig::default();
        config.schedule.enabled = true;
        config.schedule.digest.enabled = true;
        config.schedule.digest.time = "06:00".to_string();

        let registry = DbRegistry::new();
        let locks = AliasLocks::new();
        let offsite = NullOffsite;
        let engine = BackupEngine::new(&config, &registry, &locks, &offsite).unwrap();
        let notifier = RecordingNotifier {
            sent: Mutex::new(Vec::new()),
        };

        let loop_ = SchedulerLoop::new(&config, &engine, &notifier);
        // 06:01 不等于配置的 06:00，摘要不发送
        loop_
            .tick(Utc.with_ymd_and_hms(2024, 1, 2, 6, 1, 0).unwrap())
            .await
            .unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
