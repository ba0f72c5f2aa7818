use std::fmt;
use std::str::FromStr;

use regex::Regex;

use unicode_segmentation::UnicodeSegmentation;

const MAX_LEN: usize = 100;

/// A city name as typed by the user, used verbatim when querying the weather provider
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CityName(String);

impl FromStr for CityName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lazy_static::lazy_static! {
            static ref LATIN_ONLY: Regex = Regex::new(r"^[A-Za-z\s-]+$").unwrap();
        }

        let value = value.trim();

        if value.is_empty() {
            return Err("City cannot be empty".into());
        }
        if value.graphemes(true).count() > MAX_LEN {
            return Err("City name too long".into());
        }
        if !LATIN_ONLY.is_match(value) {
            return Err("City must be in Latin letters".into());
        }

        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for CityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
