// web-server/src/api/auth.rs
use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse, Responder};
use common::models::session::{
    LoginResponse, SessionCredential, ACCESS_TOKEN_COOKIE, CSRF_TOKEN_COOKIE,
};
use serde_json::json;

use crate::errors::RelayError;
use crate::proxy::into_response;
use crate::state::AppState;

#[get("/")]
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Finance Tracker Web API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn origin(req: &HttpRequest) -> Option<&str> {
    req.headers().get(header::ORIGIN).and_then(|v| v.to_str().ok())
}

// Exchange credentials with the backend and re-issue the session as cookies
#[post("/login")]
pub async fn login(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, RelayError> {
    let session = state.relay.post_login(origin(&req), &body).await?;

    let mut response = HttpResponse::Ok();
    for cookie in state.cookies.issue(&session.credential) {
        response.cookie(cookie);
    }

    tracing::info!("Session established");
    Ok(response.json(LoginResponse {
        success: true,
        data: session.user,
    }))
}

// Cookies are cleared only once the backend confirms the logout
#[post("/logout")]
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, RelayError> {
    let credential = SessionCredential::from_cookies(
        req.cookie(ACCESS_TOKEN_COOKIE).as_ref().map(|c| c.value()),
        req.cookie(CSRF_TOKEN_COOKIE).as_ref().map(|c| c.value()),
    );

    let body = state.relay.post_logout(credential.as_ref()).await?;

    let mut response = HttpResponse::Ok();
    for cookie in state.cookies.clear() {
        response.cookie(cookie);
    }

    tracing::info!("Session cleared");
    Ok(response.json(body))
}

#[post("/signup")]
pub async fn signup(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, RelayError> {
    let reply = state.relay.post_signup(origin(&req), &body).await?;
    Ok(into_response(reply))
}
