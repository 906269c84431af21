//! Background jobs.

mod scheduler;

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::JobSchedulerError;

use notepad_core::services::ModerationService;

pub use scheduler::{Scheduler, SchedulerConfig};

/// Start the scheduler with the job that clears lapsed `blocked_until` stamps.
///
/// Expired blocks are already ignored at request time; the sweep only keeps
/// the stored state (and the admin listing) tidy.
pub async fn start_block_sweep(
    config: SchedulerConfig,
    moderation: Arc<ModerationService>,
) -> Result<Scheduler, JobSchedulerError> {
    let scheduler = Scheduler::new(config).await?;
    let schedule = scheduler.config().block_sweep_cron.clone();

    scheduler
        .add_cron(&schedule, move || {
            let moderation = moderation.clone();
            async move {
                if let Err(e) = moderation.sweep_expired_blocks(Utc::now()).await {
                    tracing::error!(error = %e, "Expired block sweep failed");
                }
            }
        })
        .await?;

    scheduler.start().await?;
    Ok(scheduler)
}
