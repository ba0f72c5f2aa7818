use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use rand::rngs::OsRng;
use rand::RngCore;

use regex::Regex;

/// Number of random bytes behind every subscription token (256 bits)
pub const TOKEN_BYTES: usize = 32;

lazy_static::lazy_static! {
    // 32 bytes encode to 43 unpadded URL-safe base64 characters
    static ref TOKEN_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{43}$").unwrap();
}

/// Errors that can occur when issuing or parsing tokens
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is of invalid format")]
    InvalidFormat,
    #[error("Failed to read from the OS random source")]
    Random(#[from] rand::Error),
}

/// Wrapper for token results
pub type TokenResult<T> = Result<T, TokenError>;

/// Generate a fresh, unguessable subscription token
///
/// Every call draws [`TOKEN_BYTES`] from the operating system CSPRNG, so two
/// tokens issued for the same subscription are independent.
pub fn generate_token() -> TokenResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// A confirmation or unsubscribe token received from a user supplied link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken(String);

impl FromStr for SubscriptionToken {
    type Err = TokenError;

    fn from_str(token: &str) -> TokenResult<Self> {
        if !TOKEN_REGEX.is_match(token) {
            Err(TokenError::InvalidFormat)
        } else {
            Ok(Self(token.to_string()))
        }
    }
}

impl AsRef<str> for SubscriptionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
