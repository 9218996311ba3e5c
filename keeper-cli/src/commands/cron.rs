use crate::app::CliApp;
use keeper_core::{
    backup::BackupEngine, error::Result, notify::LogNotifier, offsite::NullOffsite,
    scheduler::SchedulerLoop,
};
use tracing::info;

/// 执行一次调度tick。
/// 由外部定时任务（如系统crontab）每分钟调用一次；
/// 同一分钟内的重复调用由部署侧避免。
pub async fn run_cron(app: &CliApp) -> Result<()> {
    if !app.config.schedule.enabled {
        info!("调度器未启用，tick跳过");
        return Ok(());
    }

    info!("⏰ 执行调度tick ({} 个任务)", app.config.schedule.jobs.len());

    let offsite = NullOffsite;
    let notifier = LogNotifier;
    let engine = BackupEngine::new(&app.config, &app.registry, &app.locks, &offsite)?;
    let scheduler = SchedulerLoop::new(&app.config, &engine, &notifier);

    scheduler.tick(chrono::Utc::now()).await
}
