use std::time::Duration;

use anyhow::Context;

use chrono::{DateTime, Utc};

use tokio::time::timeout;

use url::Url;

use crate::model::{Subscription, Weather};
use crate::service::{SubscriptionResult, SubscriptionService, WeatherService};

/// Counters for a single run of [`WeatherMailJob`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Updates delivered
    pub sent: usize,
    /// Subscriptions that were not due yet
    pub skipped: usize,
    /// Subscriptions whose weather fetch or delivery failed
    pub failed: usize,
}

enum Outcome {
    Sent,
    Skipped,
    Failed,
}

/// Sends weather updates to every confirmed subscriber that is due
///
/// Each subscription is handled on its own: a failing city lookup or a bounced
/// email is logged and the run moves on to the next subscriber. Delivery is
/// at-least-once, `last_sent_at` is only stamped after a successful send.
pub struct WeatherMailJob {
    subscriptions: SubscriptionService,
    weather: WeatherService,
    /// Public URL of this service, used to build unsubscribe links
    base_url: Url,
    /// Upper bound for each weather fetch and each email send
    task_timeout: Duration,
}

impl WeatherMailJob {
    pub fn new(
        subscriptions: SubscriptionService,
        weather: WeatherService,
        base_url: Url,
        task_timeout: Duration,
    ) -> Self {
        Self {
            subscriptions,
            weather,
            base_url,
            task_timeout,
        }
    }

    /// Run one tick now
    pub async fn run(&self) -> SubscriptionResult<TickReport> {
        self.run_at(Utc::now()).await
    }

    /// Run one tick, using `now` for every throttling decision and timestamp
    ///
    /// Only a failure to load the confirmed subscriptions fails the tick.
    #[tracing::instrument(name = "Run weather mail job", skip(self))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> SubscriptionResult<TickReport> {
        let subscriptions = self.subscriptions.get_all_confirmed().await?;

        let mut report = TickReport::default();
        for subscription in subscriptions {
            match self.notify(subscription, now).await {
                Outcome::Sent => report.sent += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        Ok(report)
    }

    #[tracing::instrument(
        name = "Notify subscriber",
        skip_all,
        fields(subscription.id = %subscription.id, city = %subscription.city)
    )]
    async fn notify(&self, mut subscription: Subscription, now: DateTime<Utc>) -> Outcome {
        if !subscription.is_due(now) {
            return Outcome::Skipped;
        }

        let weather = match timeout(self.task_timeout, self.weather.get_weather(&subscription.city)).await {
            Ok(Ok(weather)) => weather,
            Ok(Err(error)) => {
                tracing::warn!(error.cause_chain = ?error, "Failed to get weather");
                return Outcome::Failed;
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.task_timeout, "Timed out getting weather");
                return Outcome::Failed;
            }
        };

        let body = match self.update_body(&subscription, &weather) {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(error.cause_chain = ?error, "Failed to compose weather update");
                return Outcome::Failed;
            }
        };

        match timeout(
            self.task_timeout,
            self.subscriptions.send_weather_update(&subscription.email, &body),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::warn!(error.cause_chain = ?error, "Failed to send weather update");
                return Outcome::Failed;
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.task_timeout, "Timed out sending weather update");
                return Outcome::Failed;
            }
        }

        // The email is out, a failed write here only means it may be sent again next tick
        subscription.last_sent_at = Some(now);
        if let Err(error) = self.subscriptions.update(&subscription).await {
            tracing::warn!(error.cause_chain = ?error, "Failed to update last sent time");
        }

        Outcome::Sent
    }

    /// Plain text body of a weather update, ending with the unsubscribe link
    fn update_body(&self, subscription: &Subscription, weather: &Weather) -> anyhow::Result<String> {
        let unsubscribe_link = self
            .base_url
            .join(&format!("api/unsubscribe/{}", subscription.unsubscribe_token))
            .context("Failed to build unsubscribe link")?;

        Ok(format!(
            "Hello!\n\nWeather in {}:\nTemperature: {:.1}°C\nHumidity: {}%\nDescription: {}\n\nTo unsubscribe: {}",
            subscription.city,
            weather.temperature,
            weather.humidity,
            weather.description,
            unsubscribe_link,
        ))
    }
}
