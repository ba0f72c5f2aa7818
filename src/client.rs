mod email_client;
mod mailer;
mod weather_client;

pub use email_client::{Email, EmailClient};
pub use mailer::{EmailMailer, Mailer};
pub use weather_client::{WeatherApiClient, WeatherError, WeatherProvider};

#[cfg(test)]
pub use mailer::MockMailer;
#[cfg(test)]
pub use weather_client::MockWeatherProvider;
