use std::time::Duration;

use anyhow::Context;

use reqwest::{Client, StatusCode};

use serde::Deserialize;

use secrecy::Secret;

use url::Url;

use crate::model::Weather;

/// weatherapi.com error code for "No matching location found"
const NO_MATCHING_LOCATION: u32 = 1006;

/// Errors surfaced by a weather provider
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("No weather data found for city {0:?}")]
    CityNotFound(String),
    #[error("Weather provider responded with status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("Failed to fetch weather")]
    Request(#[from] reqwest::Error),
}

/// Source of current weather conditions
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get_weather(&self, city: &str) -> Result<Weather, WeatherError>;
}

/// REST client for the weatherapi.com `current.json` endpoint
#[derive(Debug)]
pub struct WeatherApiClient {
    client: Client,

    api_current_url: Url,
    api_key: Secret<String>,
}

impl WeatherApiClient {
    pub fn new(
        api_timeout: Duration,
        api_base_url: Url,
        api_key: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_current_url = api_base_url
            .join("current.json")
            .context("Failed to create current weather endpoint URL")?;

        Ok(Self {
            client,
            api_current_url,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl WeatherProvider for WeatherApiClient {
    #[tracing::instrument(name = "Fetch current weather", skip(self))]
    async fn get_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        use secrecy::ExposeSecret;

        let res = self
            .client
            .get(self.api_current_url.clone())
            .query(&[("key", self.api_key.expose_secret().as_str()), ("q", city)])
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::BAD_REQUEST {
            // The API reports unknown locations as a 400 with a specific error code
            let body: ApiErrorResponse = res.json().await?;
            if body.error.code == NO_MATCHING_LOCATION {
                return Err(WeatherError::CityNotFound(city.to_string()));
            }
            tracing::warn!(code = body.error.code, message = %body.error.message, "Weather API rejected request");
            return Err(WeatherError::UnexpectedStatus(status));
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "Non-success status from weather API");
            return Err(WeatherError::UnexpectedStatus(status));
        }

        let body: CurrentWeatherResponse = res.json().await?;

        Ok(body.into())
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    humidity: u8,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl From<CurrentWeatherResponse> for Weather {
    fn from(value: CurrentWeatherResponse) -> Self {
        Self {
            temperature: value.current.temp_c,
            humidity: value.current.humidity,
            description: value.current.condition.text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u32,
    #[serde(default)]
    message: String,
}
