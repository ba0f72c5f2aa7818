use std::sync::Arc;

use anyhow::Context;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use super::WeatherMailJob;

/// Wrap the weather mail job into a cron job running on `schedule`
///
/// `schedule` uses the six-field cron syntax with seconds, e.g. `0 0 * * * *` for hourly.
pub fn schedule_weather_mail(
    job: Arc<WeatherMailJob>,
    schedule: &str,
) -> Result<Job, JobSchedulerError> {
    Job::new_async(schedule, move |_uuid, _lock| {
        let job = job.clone();

        Box::pin(async move {
            tracing::info!("Starting scheduled weather mail job");

            match job.run().await {
                Ok(report) => tracing::info!(
                    sent = report.sent,
                    skipped = report.skipped,
                    failed = report.failed,
                    "Weather mail job completed"
                ),
                Err(error) => tracing::error!(
                    error.cause_chain = ?error,
                    "Weather mail job failed"
                ),
            }
        })
    })
}

/// Start a scheduler that runs the weather mail job on `schedule`
///
/// The returned scheduler keeps running in the background until shut down.
pub async fn start_scheduler(job: WeatherMailJob, schedule: &str) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create job scheduler")?;

    let cron_job = schedule_weather_mail(Arc::new(job), schedule)
        .with_context(|| format!("Invalid weather mail schedule {:?}", schedule))?;

    scheduler
        .add(cron_job)
        .await
        .context("Failed to add weather mail job")?;
    scheduler
        .start()
        .await
        .context("Failed to start job scheduler")?;

    tracing::info!(schedule, "Weather mail job scheduled");

    Ok(scheduler)
}
