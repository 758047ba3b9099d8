// api-client/tests/client_test.rs
use actix::{Actor, ActorContext};
use api_client::cache::{CacheKey, GetCacheMetrics, GetCached};
use api_client::{
    ApiError, Endpoints, FinanceClient, QueryCacheActor, QueryKey, ResourceList, SessionContext,
};
use common::models::finance::{DebtUpdateParams, ExpenseCreateParams};
use common::models::resource::PersonalTab;
use common::models::session::LoginCredentials;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIES: &str = "access_token_cookie=jwt-1; csrf_token_cookie=csrf-1";

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        api_base: server.uri(),
        relay_base: server.uri(),
        origin: "http://localhost:3000".to_string(),
        login_path: "/login".to_string(),
    }
}

fn client_for(server: &MockServer, cookies: &str) -> FinanceClient {
    FinanceClient::new(
        reqwest::Client::new(),
        endpoints(server),
        SessionContext::from_cookie_header(cookies),
        QueryCacheActor::new().start(),
    )
}

fn lunch() -> ExpenseCreateParams {
    ExpenseCreateParams {
        amount: 12.5,
        description: "Lunch".to_string(),
        category_id: Some(2),
        date: Some("2026-10-01".to_string()),
    }
}

fn empty_page() -> serde_json::Value {
    json!({"items": [], "total": 0, "pages": 0, "current_page": 1})
}

#[actix::test]
async fn test_sequential_creates_each_invalidate_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/expenses"))
        .and(header("X-CSRF-TOKEN", "csrf-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    client.create_expense(&lunch()).await.unwrap();
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 1);

    client.create_expense(&lunch()).await.unwrap();
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 2);
}

#[actix::test]
async fn test_no_csrf_token_disables_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server, "access_token_cookie=jwt-1");

    assert_eq!(client.expense_statistics().await.unwrap_err(), ApiError::Disabled);
    assert_eq!(client.create_expense(&lunch()).await.unwrap_err(), ApiError::Disabled);
}

#[actix::test]
async fn test_invalid_form_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    let params = ExpenseCreateParams {
        amount: 0.0,
        description: "ab".to_string(),
        category_id: None,
        date: None,
    };
    match client.create_expense(&params).await.unwrap_err() {
        ApiError::Validation(errors) => {
            assert!(errors.get("amount").is_some());
            assert!(errors.get("description").is_some());
            assert!(errors.get("category_id").is_some());
            assert!(errors.get("date").is_some());
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 0);
}

#[actix::test]
async fn test_concurrent_identical_queries_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expenses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(empty_page())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    let filters = Default::default();
    let (a, b) = futures_util::join!(client.expenses(&filters), client.expenses(&filters));
    assert!(a.unwrap().is_empty());
    assert!(b.unwrap().is_empty());
}

#[actix::test]
async fn test_categories_are_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expenses/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Food"}])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    assert_eq!(client.expense_categories().await.unwrap().len(), 1);
    assert_eq!(client.expense_categories().await.unwrap()[0].name, "Food");
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.hits, 1);
}

#[actix::test]
async fn test_unauthorized_maps_to_login_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/insights"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "Token has expired"})))
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    let err = client.insights().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized { redirect_to: "/login".to_string() });
    assert!(err.is_unauthorized());
}

#[actix::test]
async fn test_tab_dispatch_picks_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/incomes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 3, "amount": 2500.0, "source": "Salary", "date": "2026-10-01"}],
            "total": 1, "pages": 1, "current_page": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    match client.list_for_tab(PersonalTab::Income).await.unwrap() {
        ResourceList::Incomes(page) => assert_eq!(page.items[0].source, "Salary"),
        other => panic!("expected incomes, got {:?}", other),
    }
}

#[actix::test]
async fn test_debt_update_invalidates_list_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/debts/4"))
        .and(body_json(json!({"is_paid": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    let params = DebtUpdateParams {
        is_paid: Some(true),
        ..Default::default()
    };
    client.update_debt(4, &params).await.unwrap();
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 2);

    client.refresh_debt(4).await.unwrap();
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 3);
}

#[actix::test]
async fn test_login_builds_context_from_relay_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(header("Origin", "http://localhost:3000"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header(
                    "set-cookie",
                    "access_token_cookie=jwt-2; HttpOnly; Path=/; Max-Age=300",
                )
                .append_header("set-cookie", "csrf_token_cookie=csrf-2; Path=/; Max-Age=300")
                .set_body_json(json!({"success": true, "data": {"id": 1}})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let outcome = client
        .login(&LoginCredentials::with_username("a", "b"))
        .await
        .unwrap();
    assert_eq!(outcome.user["id"], 1);
    assert_eq!(outcome.context.csrf_token(), Some("csrf-2"));
    assert!(client.with_context(outcome.context).context().is_authenticated());
}

#[actix::test]
async fn test_rejected_login_reports_relay_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let err = client
        .login(&LoginCredentials::with_username("a", "b"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status { status: 401, message: "Invalid credentials".to_string() }
    );
}

const ALICE: &str = "access_token_cookie=jwt-alice; csrf_token_cookie=csrf-alice";
const BOB: &str = "access_token_cookie=jwt-bob; csrf_token_cookie=csrf-bob";

async fn mount_for(server: &MockServer, cookies: &str, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("cookie", cookies))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn salary_page(source: &str) -> serde_json::Value {
    json!({
        "items": [{"id": 1, "amount": 100.0, "source": source, "date": "2026-10-01"}],
        "total": 1, "pages": 1, "current_page": 1
    })
}

#[actix::test]
async fn test_sessions_sharing_a_client_get_their_own_data() {
    let server = MockServer::start().await;
    mount_for(&server, ALICE, "/incomes", salary_page("alice-salary")).await;
    mount_for(&server, BOB, "/incomes", salary_page("bob-salary")).await;
    let categories = "/expenses/categories";
    mount_for(&server, ALICE, categories, json!([{"id": 1, "name": "alice-cat"}])).await;
    mount_for(&server, BOB, categories, json!([{"id": 2, "name": "bob-cat"}])).await;

    let shared = client_for(&server, "");
    let alice = shared.with_context(SessionContext::from_cookie_header(ALICE));
    let bob = shared.with_context(SessionContext::from_cookie_header(BOB));

    let filters = Default::default();
    let (a, b) = futures_util::join!(alice.incomes(&filters), bob.incomes(&filters));
    assert_eq!(a.unwrap().items[0].source, "alice-salary");
    assert_eq!(b.unwrap().items[0].source, "bob-salary");

    assert_eq!(alice.expense_categories().await.unwrap()[0].name, "alice-cat");
    assert_eq!(bob.expense_categories().await.unwrap()[0].name, "bob-cat");
    // Both now cached per session
    assert_eq!(alice.expense_categories().await.unwrap()[0].name, "alice-cat");
    assert_eq!(bob.expense_categories().await.unwrap()[0].name, "bob-cat");
}

#[actix::test]
async fn test_logout_clears_session_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expenses/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Food"}])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(header("X-CSRF-TOKEN", "csrf-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "access_token_cookie=; Path=/; Max-Age=0")
                .set_body_json(json!({"message": "Logged out successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    client.expense_categories().await.unwrap();
    let key = CacheKey::new("csrf-1", QueryKey::expense_categories());
    assert!(client.cache().send(GetCached { key: key.clone() }).await.unwrap().is_some());

    let response = client.logout().await.unwrap();
    assert_eq!(response.message, "Logged out successfully");
    assert_eq!(client.cache().send(GetCached { key }).await.unwrap(), None);
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 1);

    // The stale entry is refetched, not served
    client.expense_categories().await.unwrap();
}

#[actix::test]
async fn test_rejected_logout_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Not authenticated"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);

    let err = client.logout().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized { redirect_to: "/login".to_string() });
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 0);
}

#[actix::test]
async fn test_login_invalidates_every_cached_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expenses/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Food"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "csrf_token_cookie=csrf-2; Path=/")
                .set_body_json(json!({"success": true, "data": {"id": 1}})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server, COOKIES);
    let other = client.with_context(SessionContext::from_cookie_header(ALICE));
    client.expense_categories().await.unwrap();
    other.expense_categories().await.unwrap();

    client
        .login(&LoginCredentials::with_username("a", "b"))
        .await
        .unwrap();

    for session in ["csrf-1", "csrf-alice"] {
        let key = CacheKey::new(session, QueryKey::expense_categories());
        assert_eq!(client.cache().send(GetCached { key }).await.unwrap(), None);
    }
    let metrics = client.cache().send(GetCacheMetrics).await.unwrap();
    assert_eq!(metrics.invalidations, 1);
}

#[actix::test]
async fn test_write_succeeds_when_cache_is_gone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;
    let cache = QueryCacheActor::create(|ctx| {
        ctx.stop();
        QueryCacheActor::new()
    });
    actix_rt::time::sleep(Duration::from_millis(20)).await;
    let client = FinanceClient::new(
        reqwest::Client::new(),
        endpoints(&server),
        SessionContext::from_cookie_header(COOKIES),
        cache,
    );

    let err = client.invalidate(QueryKey::any()).await.unwrap_err();
    assert!(matches!(err, ApiError::Cache(_)));
    let created = client.create_expense(&lunch()).await.unwrap();
    assert_eq!(created["id"], 9);
}
