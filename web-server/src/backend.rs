// web-server/src/backend.rs
use actix_web::web::Bytes;
use async_trait::async_trait;
use common::models::session::{
    LoginCredentials, SessionCredential, SignupRequest, ACCESS_TOKEN_COOKIE, CSRF_HEADER,
    CSRF_TOKEN_COOKIE,
};
use common::Config;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum BackendError {
    /// The call failed before any response arrived
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Methods the proxy forwards; everything else is rejected by routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMethod {
    Get,
    Post,
    Put,
}

impl ForwardMethod {
    /// State-mutating requests must carry the CSRF header
    pub fn is_mutation(self) -> bool {
        !matches!(self, ForwardMethod::Get)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            ForwardMethod::Get => reqwest::Method::GET,
            ForwardMethod::Post => reqwest::Method::POST,
            ForwardMethod::Put => reqwest::Method::PUT,
        }
    }
}

impl fmt::Display for ForwardMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

/// A browser request on its way to the backend
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: ForwardMethod,
    /// Backend path segments, e.g. `["expenses", "3"]`
    pub segments: Vec<String>,
    pub query: Option<String>,
    pub credential: SessionCredential,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// What came back from the backend, kept raw for relaying
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: u16,
    /// Every `Set-Cookie` header value, in order
    pub set_cookies: Vec<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// The finance backend as seen from the relay and proxy
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<BackendReply, BackendError>;

    async fn logout(
        &self,
        credential: Option<&SessionCredential>,
    ) -> Result<BackendReply, BackendError>;

    async fn signup(&self, request: &SignupRequest) -> Result<BackendReply, BackendError>;

    async fn forward(&self, request: ForwardRequest) -> Result<BackendReply, BackendError>;
}

/// reqwest-backed implementation talking to the configured backend
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(
            &config.backend_url,
            Duration::from_secs(config.backend_timeout_seconds),
        )
    }

    fn url(&self, path: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}{}?{}", self.base_url, path, q),
            None => format!("{}{}", self.base_url, path),
        }
    }

    /// Segments are appended one by one, so none of them can climb out of
    /// the base path
    fn segment_url(
        &self,
        segments: &[String],
        query: Option<&str>,
    ) -> Result<Url, BackendError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<BackendReply, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        tracing::debug!("Backend replied with status {}", status);

        Ok(BackendReply {
            status,
            set_cookies,
            content_type,
            body,
        })
    }
}

/// Attach the session the way the backend reads it: cookies plus bearer,
/// and the CSRF header when signing.
fn with_credential(
    builder: RequestBuilder,
    credential: &SessionCredential,
    sign: bool,
) -> RequestBuilder {
    let mut cookie = format!("{}={}", ACCESS_TOKEN_COOKIE, credential.access_token);
    if let Some(csrf) = &credential.csrf_token {
        cookie.push_str(&format!("; {}={}", CSRF_TOKEN_COOKIE, csrf));
    }

    let mut builder = builder
        .header(COOKIE, cookie)
        .bearer_auth(&credential.access_token);

    if sign {
        if let Some(csrf) = &credential.csrf_token {
            builder = builder.header(CSRF_HEADER, csrf.as_str());
        }
    }
    builder
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<BackendReply, BackendError> {
        let builder = self
            .client
            .post(self.url("/auth/login", None))
            .json(credentials);
        self.send(builder).await
    }

    async fn logout(
        &self,
        credential: Option<&SessionCredential>,
    ) -> Result<BackendReply, BackendError> {
        let mut builder = self
            .client
            .post(self.url("/auth/logout", None))
            .json(&serde_json::json!({}));
        if let Some(credential) = credential {
            builder = with_credential(builder, credential, true);
        }
        self.send(builder).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<BackendReply, BackendError> {
        let builder = self
            .client
            .post(self.url("/auth/signup", None))
            .json(request);
        self.send(builder).await
    }

    async fn forward(&self, request: ForwardRequest) -> Result<BackendReply, BackendError> {
        let url = self.segment_url(&request.segments, request.query.as_deref())?;
        let mut builder = self.client.request(request.method.as_reqwest(), url);
        builder = with_credential(builder, &request.credential, request.method.is_mutation());

        if request.method.is_mutation() {
            let content_type = request
                .content_type
                .as_deref()
                .unwrap_or("application/json");
            builder = builder.header(CONTENT_TYPE, content_type).body(request.body);
        }
        self.send(builder).await
    }
}
