use std::sync::Arc;

use crate::client::{WeatherError, WeatherProvider};
use crate::model::Weather;

/// Current weather lookups, straight from the provider with no caching
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub async fn get_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        self.provider.get_weather(city).await
    }
}
