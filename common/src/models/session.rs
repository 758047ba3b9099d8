// common/src/models/session.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::validation::ValidationErrors;
use crate::utils::is_blank;

/// Cookie carrying the backend access token; never readable by page script
pub const ACCESS_TOKEN_COOKIE: &str = "access_token_cookie";
/// Cookie carrying the CSRF token the page echoes back on mutations
pub const CSRF_TOKEN_COOKIE: &str = "csrf_token_cookie";
/// Header the backend expects the CSRF token in
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Credential pair issued by the backend for one authenticated session
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub access_token: String,
    /// Absent when the backend did not set a CSRF cookie
    pub csrf_token: Option<String>,
}

impl SessionCredential {
    pub fn new(access_token: String, csrf_token: Option<String>) -> Self {
        Self { access_token, csrf_token }
    }

    /// Rebuild from cookie values. The CSRF token alone is not a session.
    pub fn from_cookies(access_token: Option<&str>, csrf_token: Option<&str>) -> Option<Self> {
        let access_token = access_token.filter(|v| !v.is_empty())?;
        Some(Self {
            access_token: access_token.to_string(),
            csrf_token: csrf_token
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        })
    }
}

// Tokens stay out of logs
impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("access_token", &"<redacted>")
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Login form body; either identifier works
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl LoginCredentials {
    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: None,
            password: Some(password.into()),
        }
    }

    /// Presence checks only; format is the backend's call
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if is_blank(self.username.as_deref()) && is_blank(self.email.as_deref()) {
            errors.add("username", "Username or email is required");
        }
        if self.password.as_deref().map(str::is_empty).unwrap_or(true) {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Signup form body
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if is_blank(self.username.as_deref()) {
            errors.add("username", "Username is required");
        }
        if is_blank(self.email.as_deref()) {
            errors.add("email", "Email is required");
        }
        if self.password.as_deref().map(str::is_empty).unwrap_or(true) {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Body of a successful backend `/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct BackendLoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Value,
}

/// Relay response to a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub data: Value,
}

/// Relay response to a successful logout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Error body shared by the relay and the proxy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    /// Where the browser should go to recover, set on unauthorized responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), redirect: None }
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_requires_access_token() {
        assert!(SessionCredential::from_cookies(None, Some("csrf")).is_none());
        assert!(SessionCredential::from_cookies(Some(""), Some("csrf")).is_none());

        let credential = SessionCredential::from_cookies(Some("jwt"), Some("")).unwrap();
        assert_eq!(credential.access_token, "jwt");
        assert_eq!(credential.csrf_token, None);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let credential = SessionCredential::new("secret-jwt".into(), Some("secret-csrf".into()));
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("secret-jwt"));
        assert!(!rendered.contains("secret-csrf"));

        let login = LoginCredentials::with_username("a", "hunter2");
        assert!(!format!("{:?}", login).contains("hunter2"));
    }

    #[test]
    fn test_login_accepts_email_or_username() {
        assert!(LoginCredentials::with_username("a", "b").validate().is_ok());

        let by_email = LoginCredentials {
            username: None,
            email: Some("a@example.com".into()),
            password: Some("b".into()),
        };
        assert!(by_email.validate().is_ok());

        let errors = LoginCredentials::default().validate().unwrap_err();
        assert!(errors.get("username").is_some());
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn test_login_serializes_only_present_fields() {
        let body = serde_json::to_value(LoginCredentials::with_username("a", "b")).unwrap();
        assert_eq!(body, serde_json::json!({"username": "a", "password": "b"}));
    }

    #[test]
    fn test_signup_requires_all_fields() {
        let errors = SignupRequest {
            username: Some("alice".into()),
            email: Some("  ".into()),
            password: None,
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("username").is_none());
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
    }
}
