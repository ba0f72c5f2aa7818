mod subscriptions;
mod weather;

pub use subscriptions::{NewSubscription, Subscription, SubscriptionDraft, DAILY_THROTTLE_HOURS};
pub use weather::Weather;
