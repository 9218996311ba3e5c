mod backup;
mod cron;
mod restore;
mod status;

// Backup commands
pub use backup::run_backup;

// Restore commands
pub use restore::run_restore;

// Scheduler commands
pub use cron::run_cron;

// Status commands
pub use status::{run_list, run_status};
