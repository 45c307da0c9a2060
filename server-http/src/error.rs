use crate::api::ErrorResponse;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};
use turnstile::auth::AuthError;

/// Failure signalled by a handler in a route's chain.
///
/// Returning one of these stops the chain. The conversion into a response
/// below is the only place chain failures are logged.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Expected a JSON request body")]
    UnsupportedMediaType,

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Handler '{handler}' expected {missing} from an earlier handler")]
    MissingContext {
        handler: &'static str,
        missing: &'static str,
    },

    #[error("No handler produced a response")]
    ChainExhausted,
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::InvalidBody(_) | HandlerError::Validation(_) => StatusCode::BAD_REQUEST,
            HandlerError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HandlerError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HandlerError::Auth(e) if e.is_conflict() => StatusCode::CONFLICT,
            HandlerError::Auth(AuthError::UserNotFound) => StatusCode::NOT_FOUND,
            HandlerError::Auth(_)
            | HandlerError::MissingContext { .. }
            | HandlerError::ChainExhausted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status.is_server_error() {
            error!("Request failed: {}", self);
            ErrorResponse::new("Internal server error")
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
            match self {
                HandlerError::Validation(ValidationError { errors }) => {
                    ErrorResponse::with_details("Validation failed", errors)
                }
                other => ErrorResponse::new(other.to_string()),
            }
        };

        (status, Json(body)).into_response()
    }
}
