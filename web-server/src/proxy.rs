// web-server/src/proxy.rs
use actix_web::{http::Method, http::StatusCode, web, HttpRequest, HttpResponse};
use common::models::resource::ResourceKind;
use common::models::session::{SessionCredential, ACCESS_TOKEN_COOKIE, CSRF_TOKEN_COOKIE};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::{BackendApi, BackendReply, ForwardMethod, ForwardRequest};
use crate::errors::RelayError;
use crate::state::AppState;

/// Forwards page data requests to the backend, signing mutations with the
/// CSRF token taken from the browser's cookie.
#[derive(Clone)]
pub struct BackendProxy {
    backend: Arc<dyn BackendApi>,
    login_path: String,
}

impl BackendProxy {
    pub fn new(backend: Arc<dyn BackendApi>, login_path: impl Into<String>) -> Self {
        Self {
            backend,
            login_path: login_path.into(),
        }
    }

    fn not_authenticated(&self) -> RelayError {
        RelayError::NotAuthenticated {
            redirect: self.login_path.clone(),
        }
    }

    /// `tail` is the backend path without its leading slash. Only plain
    /// segments under a known resource are forwarded.
    pub async fn forward(
        &self,
        method: ForwardMethod,
        tail: &str,
        query: Option<String>,
        credential: Option<SessionCredential>,
        content_type: Option<String>,
        body: web::Bytes,
    ) -> Result<BackendReply, RelayError> {
        let segments = backend_segments(tail).ok_or_else(|| {
            tracing::warn!("Refusing to proxy path {:?}", tail);
            RelayError::UnknownResource
        })?;
        let resource = ResourceKind::from_backend_segment(&segments[0]).ok_or_else(|| {
            tracing::debug!("Refusing to proxy unknown resource {:?}", segments[0]);
            RelayError::UnknownResource
        })?;

        let credential = credential.ok_or_else(|| self.not_authenticated())?;
        if method.is_mutation() && credential.csrf_token.is_none() {
            tracing::warn!("Unsigned {} to {} refused: no CSRF cookie", method, resource);
            return Err(self.not_authenticated());
        }

        let reply = self
            .backend
            .forward(ForwardRequest {
                method,
                segments,
                query,
                credential,
                content_type,
                body,
            })
            .await?;

        if reply.status == StatusCode::UNAUTHORIZED.as_u16() {
            tracing::info!("Backend rejected session for {}", resource);
            return Err(self.not_authenticated());
        }
        Ok(reply)
    }
}

/// Split a tail into path segments. Empty and dot segments, plain or
/// percent-encoded, are refused.
fn backend_segments(tail: &str) -> Option<Vec<String>> {
    let segments: Vec<String> = tail
        .trim_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    let traverses = segments.iter().any(|segment| {
        let plain = segment.to_ascii_lowercase().replace("%2e", ".");
        plain.is_empty() || plain == "." || plain == ".."
    });
    if traverses {
        None
    } else {
        Some(segments)
    }
}

fn forward_method(method: &Method) -> Option<ForwardMethod> {
    match *method {
        Method::GET => Some(ForwardMethod::Get),
        Method::POST => Some(ForwardMethod::Post),
        Method::PUT => Some(ForwardMethod::Put),
        _ => None,
    }
}

/// Relay the backend reply with its status, content type and body intact
pub fn into_response(reply: BackendReply) -> HttpResponse {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    if let Some(content_type) = reply.content_type {
        builder.content_type(content_type);
    }
    builder.body(reply.body)
}

async fn proxy_request(
    req: HttpRequest,
    tail: web::Path<String>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, RelayError> {
    let method = forward_method(req.method()).ok_or(RelayError::UnknownResource)?;
    let credential = SessionCredential::from_cookies(
        req.cookie(ACCESS_TOKEN_COOKIE).as_ref().map(|c| c.value()),
        req.cookie(CSRF_TOKEN_COOKIE).as_ref().map(|c| c.value()),
    );
    let query = Some(req.query_string().to_string()).filter(|q| !q.is_empty());
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let span = tracing::info_span!(
        "proxy",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %tail.as_str()
    );

    async move {
        let reply = state
            .proxy
            .forward(method, tail.as_str(), query, credential, content_type, body)
            .await?;
        tracing::debug!("Proxied with status {}", reply.status);
        Ok(into_response(reply))
    }
    .instrument(span)
    .await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/backend/{tail:.*}")
            .route(web::get().to(proxy_request))
            .route(web::post().to(proxy_request))
            .route(web::put().to(proxy_request)),
    );
}
