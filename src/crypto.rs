mod token;

pub use token::{generate_token, SubscriptionToken, TokenError, TokenResult, TOKEN_BYTES};
