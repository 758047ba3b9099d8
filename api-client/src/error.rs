// api-client/src/error.rs
use common::models::ValidationErrors;
use thiserror::Error;

/// Everything a query or mutation can come back with instead of data.
///
/// `Clone` so one in-flight result can be handed to every caller waiting
/// on the same key.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The session context has no CSRF token, or the query has no id yet
    #[error("request disabled until a session is available")]
    Disabled,
    #[error("not authenticated, continue at {redirect_to}")]
    Unauthorized { redirect_to: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid form: {0}")]
    Validation(ValidationErrors),
    #[error("query cache unavailable: {0}")]
    Cache(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<actix::MailboxError> for ApiError {
    fn from(err: actix::MailboxError) -> Self {
        ApiError::Cache(err.to_string())
    }
}

impl ApiError {
    /// True for the errors the page should answer by going to the login route
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}
