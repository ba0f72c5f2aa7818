use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::client::WeatherError;
use crate::service::SubscriptionError;

pub type RestResult<T> = Result<T, RestError>;

/// Errors returned by the REST controllers, rendered as `{"error": "<message>"}`
#[derive(Debug, Error)]
pub enum RestError {
    #[error("{0}")]
    ParseError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal server error")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<SubscriptionError> for RestError {
    fn from(e: SubscriptionError) -> Self {
        use SubscriptionError as E;
        match e {
            E::AlreadyExists => Self::Conflict(e.to_string()),
            E::NotFound => Self::NotFound(e.to_string()),
            E::AlreadyConfirmed => Self::BadRequest(e.to_string()),
            E::UpdateFailed(_) | E::TokenGeneration(_) | E::SendEmail(_) | E::Storage(_) => {
                tracing::error!(error.cause_chain = ?e, "Subscription operation failed");
                Self::InternalError(e.to_string())
            }
        }
    }
}

impl From<WeatherError> for RestError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::CityNotFound(_) => Self::NotFound("City not found".into()),
            WeatherError::UnexpectedStatus(_) | WeatherError::Request(_) => {
                tracing::error!(error.cause_chain = ?e, "Weather lookup failed");
                Self::Unavailable("Weather service unavailable".into())
            }
        }
    }
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
