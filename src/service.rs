mod subscriptions;
mod weather;

pub use subscriptions::{SubscriptionError, SubscriptionResult, SubscriptionService};
pub use weather::WeatherService;
