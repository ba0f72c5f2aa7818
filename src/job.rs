mod scheduler;
mod weather_mail;

pub use scheduler::{schedule_weather_mail, start_scheduler};
pub use weather_mail::{TickReport, WeatherMailJob};
