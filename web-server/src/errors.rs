// web-server/src/errors.rs
use actix_web::{http::header, http::StatusCode, HttpResponse, ResponseError};
use common::models::session::ErrorBody;
use common::models::ValidationErrors;
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

/// Failures surfaced by the relay, the proxy and their middleware.
///
/// Every variant renders as a JSON body with an `error` message; nothing
/// here carries token material.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Unauthorized origin")]
    UnauthorizedOrigin,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Logout failed")]
    LogoutFailed,
    #[error("Backend unreachable")]
    NetworkUnreachable,
    #[error("Validation failed")]
    Validation(ValidationErrors),
    #[error("Malformed backend response")]
    MalformedBackendResponse,
    #[error("Not authenticated")]
    NotAuthenticated { redirect: String },
    #[error("Unknown resource")]
    UnknownResource,
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after: u64 },
}

impl From<BackendError> for RelayError {
    fn from(err: BackendError) -> Self {
        tracing::error!("Backend call failed: {}", err);
        RelayError::NetworkUnreachable
    }
}

impl From<ValidationErrors> for RelayError {
    fn from(errors: ValidationErrors) -> Self {
        RelayError::Validation(errors)
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::UnauthorizedOrigin => StatusCode::FORBIDDEN,
            RelayError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            RelayError::LogoutFailed => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::NetworkUnreachable => StatusCode::BAD_GATEWAY,
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::MalformedBackendResponse => StatusCode::BAD_GATEWAY,
            RelayError::NotAuthenticated { .. } => StatusCode::UNAUTHORIZED,
            RelayError::UnknownResource => StatusCode::NOT_FOUND,
            RelayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            RelayError::Validation(errors) => builder.json(json!({
                "error": self.to_string(),
                "messages": errors,
            })),
            RelayError::NotAuthenticated { redirect } => {
                builder.json(ErrorBody::new(self.to_string()).with_redirect(redirect.clone()))
            }
            RelayError::RateLimited { retry_after } => builder
                .append_header((header::RETRY_AFTER, retry_after.to_string()))
                .json(ErrorBody::new(self.to_string())),
            _ => builder.json(ErrorBody::new(self.to_string())),
        }
    }
}
