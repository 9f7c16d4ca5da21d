use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::EmailAddress;
use crate::subscription_service::SubscriptionError;
use crate::utils::error_chain_fmt;

/// Error type shared by the subscription endpoints
#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    SubscriptionError(#[from] SubscriptionError),
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// JSON body of every error response
#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::SubscriptionError(e) => match e {
                SubscriptionError::UnknownUser => StatusCode::NOT_FOUND,
                SubscriptionError::AlreadySubscribed(_)
                | SubscriptionError::ConcurrentModification => StatusCode::CONFLICT,
                SubscriptionError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal causes are only logged, never returned to the caller
        let error = if status.is_server_error() {
            "Something went wrong".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { error })
    }
}

/// Parse a user-supplied email address
pub fn parse_email(email: String) -> Result<EmailAddress, ApiError> {
    EmailAddress::parse(email).map_err(ApiError::ValidationError)
}
