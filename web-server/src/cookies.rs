// web-server/src/cookies.rs
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use common::models::session::{SessionCredential, ACCESS_TOKEN_COOKIE, CSRF_TOKEN_COOKIE};
use common::CookieConfig;

/// Builds the two session cookies with one consistent set of flags
#[derive(Debug, Clone)]
pub struct SessionCookies {
    ttl_seconds: i64,
    secure: bool,
    csrf_http_only: bool,
}

impl SessionCookies {
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            ttl_seconds: config.ttl_seconds,
            secure: config.secure,
            csrf_http_only: config.csrf_http_only,
        }
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
        max_age: CookieDuration,
    ) -> Cookie<'static> {
        Cookie::build(name, value)
            .path("/")
            .secure(self.secure)
            .http_only(http_only)
            .same_site(SameSite::Strict)
            .max_age(max_age)
            .finish()
    }

    /// Access token cookie; always http-only
    pub fn access_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(
            ACCESS_TOKEN_COOKIE,
            token.to_string(),
            true,
            CookieDuration::seconds(self.ttl_seconds),
        )
    }

    pub fn csrf_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(
            CSRF_TOKEN_COOKIE,
            token.to_string(),
            self.csrf_http_only,
            CookieDuration::seconds(self.ttl_seconds),
        )
    }

    /// Cookies for a fresh session. The CSRF cookie only ever travels
    /// together with an access cookie.
    pub fn issue(&self, credential: &SessionCredential) -> Vec<Cookie<'static>> {
        let mut cookies = vec![self.access_cookie(&credential.access_token)];
        if let Some(csrf) = &credential.csrf_token {
            cookies.push(self.csrf_cookie(csrf));
        }
        cookies
    }

    /// Expired, empty copies of both cookies with matching path and flags
    pub fn clear(&self) -> Vec<Cookie<'static>> {
        vec![
            self.build(ACCESS_TOKEN_COOKIE, String::new(), true, CookieDuration::ZERO),
            self.build(CSRF_TOKEN_COOKIE, String::new(), self.csrf_http_only, CookieDuration::ZERO),
        ]
    }
}

/// Find a cookie's value among raw `Set-Cookie` header values.
///
/// Header values may be joined with commas, so pairs are split on both
/// `,` and `;` before matching the key.
pub fn extract_cookie_value(set_cookie_headers: &[String], name: &str) -> Option<String> {
    set_cookie_headers
        .iter()
        .flat_map(|header| header.split(|c| c == ',' || c == ';'))
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}
