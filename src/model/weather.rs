use serde::{Deserialize, Serialize};

/// Current weather conditions for a city
///
/// Produced fresh on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: u8,
    pub description: String,
}
