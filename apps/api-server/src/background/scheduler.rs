//! Cron-style job scheduler using tokio-cron-scheduler.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::{flag_var, parse_var};

/// Every minute, on the minute.
const DEFAULT_BLOCK_SWEEP_CRON: &str = "0 * * * * *";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
    /// Six-field cron expression (with seconds) for the expired-block sweep.
    pub block_sweep_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_sweep_cron: DEFAULT_BLOCK_SWEEP_CRON.to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: flag_var("SCHEDULER_ENABLED", true),
            block_sweep_cron: parse_var("BLOCK_SWEEP_CRON", DEFAULT_BLOCK_SWEEP_CRON.to_string()),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Add a cron job.
    ///
    /// # Example
    /// ```ignore
    /// scheduler.add_cron("0 0 * * * *", || async {
    ///     tracing::info!("Running hourly job");
    /// }).await?;
    /// ```
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
