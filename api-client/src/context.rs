// api-client/src/context.rs
use common::models::session::{CSRF_HEADER, CSRF_TOKEN_COOKIE};
use reqwest::header::COOKIE;
use reqwest::RequestBuilder;
use std::fmt;

/// Request-scoped session view, built once per page load from the
/// browser's cookies.
///
/// The cookie header is replayed verbatim the way a browser would attach
/// it. The CSRF token is the only value the client reads out of it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    cookie_header: Option<String>,
    csrf_token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header such as `a=1; csrf_token_cookie=x`
    pub fn from_cookie_header(header: &str) -> Self {
        let header = header.trim();
        let csrf_token = header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| name.trim() == CSRF_TOKEN_COOKIE)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            cookie_header: Some(header.to_string()).filter(|h| !h.is_empty()),
            csrf_token,
        }
    }

    /// Rebuild the browser's cookie header from `Set-Cookie` values
    pub fn from_set_cookies(set_cookies: &[String]) -> Self {
        let pairs: Vec<&str> = set_cookies
            .iter()
            .filter_map(|c| c.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.split_once('=').map(|(_, v)| !v.is_empty()).unwrap_or(false))
            .collect();
        Self::from_cookie_header(&pairs.join("; "))
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Hooks needing auth stay disabled without a CSRF token
    pub fn is_authenticated(&self) -> bool {
        self.csrf_token.is_some()
    }

    /// The signing header, present only when a token is known
    pub fn csrf_header(&self) -> Option<(&'static str, &str)> {
        self.csrf_token().map(|token| (CSRF_HEADER, token))
    }

    /// Attach cookies, plus the CSRF header when `sign` is set
    pub fn apply(&self, mut builder: RequestBuilder, sign: bool) -> RequestBuilder {
        if let Some(cookies) = &self.cookie_header {
            builder = builder.header(COOKIE, cookies.as_str());
        }
        if sign {
            if let Some((name, token)) = self.csrf_header() {
                builder = builder.header(name, token);
            }
        }
        builder
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("has_cookies", &self.cookie_header.is_some())
            .field("has_csrf_token", &self.csrf_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_csrf_from_cookie_header() {
        let ctx =
            SessionContext::from_cookie_header("access_token_cookie=jwt; csrf_token_cookie=tok");
        assert_eq!(ctx.csrf_token(), Some("tok"));
        assert_eq!(ctx.csrf_header(), Some(("X-CSRF-TOKEN", "tok")));
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn test_no_header_without_token() {
        let ctx = SessionContext::from_cookie_header("access_token_cookie=jwt; csrf_token_cookie=");
        assert_eq!(ctx.csrf_header(), None);
        assert!(!ctx.is_authenticated());
        assert!(!SessionContext::anonymous().is_authenticated());
    }

    #[test]
    fn test_from_set_cookies_skips_cleared_values() {
        let ctx = SessionContext::from_set_cookies(&[
            "access_token_cookie=jwt; HttpOnly; Path=/; Max-Age=300".to_string(),
            "csrf_token_cookie=tok; Path=/; SameSite=Strict".to_string(),
        ]);
        assert_eq!(ctx.csrf_token(), Some("tok"));

        let cleared = SessionContext::from_set_cookies(&[
            "access_token_cookie=; Path=/; Max-Age=0".to_string(),
            "csrf_token_cookie=; Path=/; Max-Age=0".to_string(),
        ]);
        assert_eq!(cleared, SessionContext::anonymous());
    }

    #[test]
    fn test_debug_hides_values() {
        let ctx = SessionContext::from_cookie_header("csrf_token_cookie=secret");
        assert!(!format!("{:?}", ctx).contains("secret"));
    }
}
