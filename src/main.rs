use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use sqlx::postgres::PgPoolOptions;

use weathermail::app;
use weathermail::client::{EmailClient, EmailMailer, WeatherApiClient};
use weathermail::job::{start_scheduler, WeatherMailJob};
use weathermail::repo::PgSubscriptionRepo;
use weathermail::service::{SubscriptionService, WeatherService};
use weathermail::settings::Settings;
use weathermail::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_subscriber()?;

    let settings = Settings::load()?;
    let base_url = settings.app.base_url()?;

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(settings.database.with_db());

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let email_client = EmailClient::new(
        settings.email.sender()?,
        settings.email.api_timeout(),
        settings.email.api_base_url()?,
        settings.email.api_auth_token(),
    )?;
    let weather_client = WeatherApiClient::new(
        settings.weather.api_timeout(),
        settings.weather.api_base_url()?,
        settings.weather.api_key(),
    )?;

    let subscriptions = SubscriptionService::new(
        Arc::new(PgSubscriptionRepo::new(pool)),
        Arc::new(EmailMailer::new(email_client, base_url.clone())?),
    );
    let weather = WeatherService::new(Arc::new(weather_client));

    // Held for the lifetime of the server so scheduled ticks keep firing
    let _scheduler = if settings.scheduler.enabled() {
        let job = WeatherMailJob::new(
            subscriptions.clone(),
            weather.clone(),
            base_url,
            settings.scheduler.task_timeout(),
        );
        Some(start_scheduler(job, settings.scheduler.cron()).await?)
    } else {
        tracing::info!("Weather mail scheduler disabled");
        None
    };

    let listener = TcpListener::bind(settings.app.addr())
        .with_context(|| format!("Failed to bind to {:?}", settings.app.addr()))?;
    tracing::info!(addr = ?listener.local_addr()?, "Listening");

    app::run(listener, subscriptions, weather)?
        .await
        .context("Failed to run app")
}
