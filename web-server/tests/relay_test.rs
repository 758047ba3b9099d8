// web-server/tests/relay_test.rs
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::models::session::{ACCESS_TOKEN_COOKIE, CSRF_TOKEN_COOKIE};
use common::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use web_server::backend::HttpBackend;
use web_server::AppState;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORIGIN: &str = "http://localhost:3000";

fn state_for(server: &MockServer, tweak: impl FnOnce(&mut Config)) -> web::Data<AppState> {
    let mut config = Config {
        backend_url: server.uri(),
        ..Config::default()
    };
    tweak(&mut config);
    let backend = HttpBackend::from_config(&config).unwrap();
    web::Data::new(AppState::new(&config, Arc::new(backend)).unwrap())
}

macro_rules! app {
    ($state:expr) => {{
        let state = $state.clone();
        test::init_service(
            App::new()
                .wrap(state.route_guard())
                .wrap(state.rate_limiter())
                .configure(move |cfg| web_server::configure(cfg, state.clone())),
        )
        .await
    }};
}

fn login_request(origin: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/login")
        .insert_header((header::ORIGIN, origin))
        .set_json(json!({"username": "a", "password": "b"}))
}

async fn mount_login_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrf_token_cookie=csrf-1; Path=/; HttpOnly")
                .set_body_json(json!({
                    "access_token": "jwt-1",
                    "user": {"id": 1, "username": "a"}
                })),
        )
        .mount(server)
        .await;
}

#[actix_web::test]
async fn test_mismatched_origin_gets_no_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app!(state_for(&server, |_| {}));

    let resp = test::call_service(&app, login_request("http://evil.example").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.response().cookies().count(), 0);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Unauthorized origin"}));
}

#[actix_web::test]
async fn test_login_relays_csrf_cookie() {
    let server = MockServer::start().await;
    mount_login_success(&server).await;
    let app = app!(state_for(&server, |_| {}));

    let resp = test::call_service(&app, login_request(ORIGIN).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookies: Vec<Cookie<'static>> = resp.response().cookies().map(|c| c.into_owned()).collect();
    let access = cookies.iter().find(|c| c.name() == ACCESS_TOKEN_COOKIE).unwrap();
    let csrf = cookies.iter().find(|c| c.name() == CSRF_TOKEN_COOKIE).unwrap();

    assert_eq!(access.value(), "jwt-1");
    assert_eq!(access.http_only(), Some(true));
    assert_eq!(csrf.value(), "csrf-1");
    assert_eq!(csrf.same_site(), Some(SameSite::Strict));
    assert_eq!(csrf.max_age(), Some(CookieDuration::seconds(300)));
    assert_eq!(csrf.path(), Some("/"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"success": true, "data": {"id": 1, "username": "a"}}));
}

#[actix_web::test]
async fn test_backend_rejection_maps_to_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"msg": "Bad username or password"})),
        )
        .mount(&server)
        .await;
    let app = app!(state_for(&server, |_| {}));

    let resp = test::call_service(&app, login_request(ORIGIN).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.response().cookies().count(), 0);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Invalid credentials"}));
}

#[actix_web::test]
async fn test_logout_keeps_cookies_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = app!(state_for(&server, |_| {}));

    let req = test::TestRequest::post()
        .uri("/api/logout")
        .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "jwt-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.response().cookies().count(), 0);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Logout failed"}));
}

#[actix_web::test]
async fn test_logout_clears_cookies_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header_eq("X-CSRF-TOKEN", "csrf-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msg": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    let app = app!(state_for(&server, |_| {}));

    let req = test::TestRequest::post()
        .uri("/api/logout")
        .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "jwt-1"))
        .cookie(Cookie::new(CSRF_TOKEN_COOKIE, "csrf-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cleared: Vec<Cookie<'static>> = resp.response().cookies().map(|c| c.into_owned()).collect();
    assert_eq!(cleared.len(), 2);
    for cookie in &cleared {
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"message": "Logged out successfully"}));
}

#[actix_web::test]
async fn test_guard_redirects_between_partitions() {
    let server = MockServer::start().await;
    let app = app!(state_for(&server, |_| {}));

    let req = test::TestRequest::get().uri("/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");

    let req = test::TestRequest::get()
        .uri("/login")
        .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "jwt-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
}

#[actix_web::test]
async fn test_signup_passes_backend_reply_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "User created"})))
        .mount(&server)
        .await;
    let app = app!(state_for(&server, |_| {}));

    let req = test::TestRequest::post()
        .uri("/api/signup")
        .insert_header((header::ORIGIN, ORIGIN))
        .set_json(json!({"username": "al", "email": "al@example.com", "password": "pw"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User created");
}

#[actix_web::test]
async fn test_login_attempts_are_rate_limited() {
    let server = MockServer::start().await;
    mount_login_success(&server).await;
    let app = app!(state_for(&server, |config| config.rate_limit.max_attempts = 1));

    let resp = test::call_service(&app, login_request(ORIGIN).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, login_request(ORIGIN).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
}
