use uuid::Uuid;

use chrono::{DateTime, Duration, Utc};

use serde::Serialize;

use crate::domain::{CityName, EmailAddress, Frequency};

/// Minimum time between two `daily` updates.
/// Kept below 24h so a late cron tick does not push a subscriber into the next day.
pub const DAILY_THROTTLE_HOURS: i64 = 23;

/// New Subscription request, validated at the HTTP boundary
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub email: EmailAddress,
    pub city: CityName,
    pub frequency: Frequency,
}

/// A subscription about to be inserted, with its freshly issued tokens
#[derive(Debug, Clone)]
pub struct SubscriptionDraft {
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub confirm_token: String,
    pub unsubscribe_token: String,
}

/// Stored Subscription record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    /// ID of the subscription
    pub id: Uuid,
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    /// `false` until the confirmation link has been followed
    pub confirmed: bool,
    #[serde(skip_serializing)]
    pub confirm_token: String,
    #[serde(skip_serializing)]
    pub unsubscribe_token: String,
    /// Creation and update timestamps
    /// NOTE: Auto-set and updated by the database
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Time of the last weather update that was successfully sent
    pub last_sent_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Whether a weather update should go out at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.frequency {
            // The hourly cron cadence is the throttle
            Frequency::Hourly => true,
            Frequency::Daily => match self.last_sent_at {
                Some(last_sent_at) => now - last_sent_at >= Duration::hours(DAILY_THROTTLE_HOURS),
                None => true,
            },
        }
    }
}
