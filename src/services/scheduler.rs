use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::services::low_stock::{LowStockReporter, ReportOutcome};

/// Six-field cron (with seconds) firing once a day at `hour:minute`.
#[must_use]
pub fn daily_cron(hour: u32, minute: u32) -> String {
    format!("0 {minute} {hour} * * *")
}

pub struct Scheduler {
    reporter: Arc<LowStockReporter>,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(reporter: Arc<LowStockReporter>) -> Self {
        Self {
            reporter,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Registers the daily low-stock job and blocks until [`Self::stop`].
    pub async fn start(&self) -> Result<()> {
        let config = self.reporter.config();
        if !config.enabled {
            info!("Low-stock report is disabled in config");
            return Ok(());
        }

        let (hour, minute) = config.parse_report_time()?;
        let tz = config.parse_timezone()?;
        let cron_expr = daily_cron(hour, minute);

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        let reporter = Arc::clone(&self.reporter);
        let running = Arc::clone(&self.running);
        let job = Job::new_async_tz(cron_expr.as_str(), tz, move |_uuid, _lock| {
            let reporter = Arc::clone(&reporter);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_report(&reporter).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!(
            cron = %cron_expr,
            timezone = %config.timezone,
            "Low-stock report scheduled"
        );

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<ReportOutcome> {
        info!("Running manual low-stock report...");
        self.reporter.run(Utc::now()).await
    }
}

async fn run_report(reporter: &LowStockReporter) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "low_stock_report", "Starting scheduled low-stock report");

    // Failures are logged and left for the next daily tick.
    if let Err(e) = reporter.run(Utc::now()).await {
        error!(event = "job_failed", job_name = "low_stock_report", error = %e, "Scheduled low-stock report failed");
    }

    info!(
        event = "job_finished",
        job_name = "low_stock_report",
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Scheduled low-stock report finished"
    );
}
