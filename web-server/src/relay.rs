// web-server/src/relay.rs
use common::models::session::{
    BackendLoginResponse, LoginCredentials, LogoutResponse, SessionCredential, SignupRequest,
    CSRF_TOKEN_COOKIE,
};
use common::models::ValidationErrors;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::backend::{BackendApi, BackendReply};
use crate::cookies::extract_cookie_value;
use crate::errors::RelayError;

/// A session the backend just issued, ready to become cookies
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub credential: SessionCredential,
    pub user: Value,
}

pub type SessionResult = Result<EstablishedSession, RelayError>;
pub type LogoutResult = Result<LogoutResponse, RelayError>;
pub type SignupResult = Result<BackendReply, RelayError>;

/// Server-side intermediary between the browser and the backend auth
/// endpoints. Holds no session state of its own.
#[derive(Clone)]
pub struct SessionRelay {
    backend: Arc<dyn BackendApi>,
    app_origin: String,
}

impl SessionRelay {
    pub fn new(backend: Arc<dyn BackendApi>, app_origin: impl Into<String>) -> Self {
        Self {
            backend,
            app_origin: app_origin.into(),
        }
    }

    /// A missing `Origin` header counts as a mismatch
    pub fn verify_origin(&self, origin: Option<&str>) -> Result<(), RelayError> {
        match origin {
            Some(origin) if origin.trim_end_matches('/') == self.app_origin => Ok(()),
            other => {
                tracing::warn!("Rejected request from origin {:?}", other);
                Err(RelayError::UnauthorizedOrigin)
            }
        }
    }

    pub async fn post_login(&self, origin: Option<&str>, body: &[u8]) -> SessionResult {
        self.verify_origin(origin)?;

        let credentials: LoginCredentials = parse_form(body)?;
        credentials.validate()?;

        let reply = self.backend.login(&credentials).await?;
        if !reply.is_success() {
            tracing::info!("Backend rejected login with status {}", reply.status);
            return Err(RelayError::InvalidCredentials);
        }

        let parsed: BackendLoginResponse = reply.json().map_err(|e| {
            tracing::error!("Could not decode backend login response: {}", e);
            RelayError::MalformedBackendResponse
        })?;

        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::error!("Backend login response carried no access token");
                RelayError::MalformedBackendResponse
            })?;

        let csrf_token = extract_cookie_value(&reply.set_cookies, CSRF_TOKEN_COOKIE);
        if csrf_token.is_none() {
            tracing::warn!("Backend login set no CSRF cookie; mutations will be refused");
        }

        let login = credentials
            .username
            .as_deref()
            .or(credentials.email.as_deref());
        tracing::info!("Login relayed for {:?}", login);

        Ok(EstablishedSession {
            credential: SessionCredential::new(access_token, csrf_token),
            user: parsed.user,
        })
    }

    /// Forward the browser's session to the backend logout. Any failure
    /// leaves the caller's cookies in place.
    pub async fn post_logout(&self, credential: Option<&SessionCredential>) -> LogoutResult {
        let reply = self.backend.logout(credential).await.map_err(|e| {
            tracing::error!("Logout error: {}", e);
            RelayError::LogoutFailed
        })?;

        if !reply.is_success() {
            tracing::error!("Backend logout returned status {}", reply.status);
            return Err(RelayError::LogoutFailed);
        }

        Ok(LogoutResponse {
            message: "Logged out successfully".to_string(),
        })
    }

    /// Backend status and body come back unchanged once the local checks pass
    pub async fn post_signup(&self, origin: Option<&str>, body: &[u8]) -> SignupResult {
        self.verify_origin(origin)?;

        let request: SignupRequest = parse_form(body)?;
        request.validate()?;

        let reply = self.backend.signup(&request).await?;
        tracing::info!("Signup relayed with backend status {}", reply.status);
        Ok(reply)
    }
}

fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, RelayError> {
    serde_json::from_slice(body).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("body", format!("Invalid JSON body: {}", e));
        RelayError::Validation(errors)
    })
}
