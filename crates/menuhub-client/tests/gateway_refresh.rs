#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test: panics are the assertion mechanism")]

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use menuhub_client::store::{FULLNAME_KEY, REFRESH_KEY, SESSION_KEY};
use menuhub_client::{
    CancellationToken, ClientConfig, ClientError, CredentialStore, MemoryStore, MenuClient,
    Method, PageQuery, RequestOptions,
};
use menuhub_types::Credential;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE: &str = "/workspace/businesses";
const REFRESH: &str = "/auth/refresh-token";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn envelope(data: Value) -> Value {
    json!({ "data": data, "isSuccess": true, "messages": [], "errors": [] })
}

fn grant(token: &str, refresh_token: &str) -> Value {
    json!({
        "accessToken": {
            "token": token,
            "expireAt": now() + 3_600,
            "refreshToken": refresh_token,
            "refreshTokenExpireAt": now() + 604_800
        },
        "fullname": "Demo"
    })
}

fn empty_page() -> Value {
    envelope(json!({
        "items": [], "page": 1, "pageSize": 10, "totalCount": 0,
        "totalPages": 0, "hasPrevious": false, "hasNext": false
    }))
}

fn credential(token: &str, refresh_token: &str) -> Credential {
    Credential {
        access_token: token.to_string(),
        access_token_expires_at: now() + 3_600,
        refresh_token: refresh_token.to_string(),
        refresh_token_expires_at: now() + 604_800,
    }
}

fn seeded_store(token: &str, refresh_token: &str) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_credential(&credential(token, refresh_token), Some("Demo")))
}

fn client_for(server: &MockServer, store: Arc<MemoryStore>) -> MenuClient {
    MenuClient::new(ClientConfig::new(server.uri()), store).expect("client builds")
}

async fn mount_resource(server: &MockServer, token: &str, status: u16, expect: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(empty_page())
    } else {
        ResponseTemplate::new(status).set_body_json(json!({ "message": "token expired" }))
    };
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(template)
        .expect(expect)
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, from: &str, response: ResponseTemplate, expect: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({ "refreshToken": from })))
        .respond_with(response)
        .expect(expect)
        .mount(server)
        .await;
}

fn assert_session_cleared(store: &MemoryStore) {
    assert!(store.load().expect("store readable").is_none(), "session should be gone");
    let surfaces = store.snapshot();
    for key in [SESSION_KEY, REFRESH_KEY, FULLNAME_KEY] {
        assert!(!surfaces.storage.contains_key(key), "storage key {key} survived");
    }
    assert!(surfaces.cookies.is_empty(), "cookies survived: {:?}", surfaces.cookies);
}

#[tokio::test]
async fn test_login_persists_credential_on_both_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signin-password"))
        .and(body_json(json!({ "username": "demo", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(grant("T1", "R1"))))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_for(&server, store.clone());

    let credential = client.login("demo", "secret").await.expect("login succeeds");
    assert_eq!(credential.access_token, "T1");
    assert_eq!(credential.refresh_token, "R1");

    let surfaces = store.snapshot();
    assert_eq!(surfaces.storage.get(SESSION_KEY).map(String::as_str), Some("T1"));
    assert_eq!(surfaces.storage.get(REFRESH_KEY).map(String::as_str), Some("R1"));
    assert_eq!(surfaces.storage.get(FULLNAME_KEY).map(String::as_str), Some("Demo"));

    let session_cookie =
        surfaces.cookies.iter().find(|c| c.name == SESSION_KEY).expect("sessionId cookie");
    assert_eq!(session_cookie.value, "T1");
    assert_eq!(session_cookie.path, "/");
    assert_eq!(session_cookie.expires_at, credential.access_token_expires_at);
    assert!(surfaces.cookies.iter().any(|c| c.name == REFRESH_KEY && c.value == "R1"));
}

#[tokio::test]
async fn test_login_with_bad_credentials_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signin-password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "data": null,
            "isSuccess": false,
            "message": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_for(&server, store.clone());

    let err = client.login("demo", "wrong").await.expect_err("login must fail");
    assert!(err.is_auth_terminal(), "expected authentication error, got {err:?}");
    assert!(err.to_string().contains("Invalid username or password"));
    assert!(store.load().expect("store readable").is_none());
}

#[tokio::test]
async fn test_login_unsuccessful_envelope_on_ok_status_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signin-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "isSuccess": false,
            "message": "Invalid username or password"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_for(&server, store.clone());

    let err = client.login("demo", "wrong").await.expect_err("login must fail");
    assert!(err.is_auth_terminal(), "expected authentication error, got {err:?}");
    assert!(err.to_string().contains("Invalid username or password"), "got {err}");
    assert!(store.load().expect("store readable").is_none());
    assert!(store.snapshot().cookies.is_empty());
}

#[tokio::test]
async fn test_bearer_prefix_is_never_doubled() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 200, 2).await;

    for stored in ["T1", "Bearer T1"] {
        let client = client_for(&server, seeded_store(stored, "R1"));
        client
            .list_businesses(&PageQuery::default())
            .await
            .unwrap_or_else(|e| panic!("stored {stored:?}: {e}"));
    }

    let requests = server.received_requests().await.expect("recording enabled");
    for request in requests {
        let auth = request.headers.get("authorization").and_then(|v| v.to_str().ok());
        assert_eq!(auth, Some("Bearer T1"));
    }
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 1).await;
    mount_resource(&server, "T2", 200, 1).await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(envelope(grant("T2", "R2"))),
        1,
    )
    .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());

    let page = client.list_businesses(&PageQuery::default()).await.expect("replay succeeds");
    assert!(page.is_success);

    let session = store.load().expect("store readable").expect("session kept");
    assert_eq!(session.access_token.as_deref(), Some("T2"));
    assert_eq!(session.refresh_token.as_deref(), Some("R2"));
    assert_eq!(session.fullname.as_deref(), Some("Demo"));
    assert!(session.access_expires_at.is_some(), "cookie mirrored with expiry");
    assert!(!client.refresh_coordinator().is_refreshing());
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 3).await;
    mount_resource(&server, "T2", 200, 3).await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200)
            .set_body_json(envelope(grant("T2", "R2")))
            .set_delay(Duration::from_millis(300)),
        1,
    )
    .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());
    let query = PageQuery::default();

    let results = join_all((0..3).map(|_| client.list_businesses(&query))).await;

    for (i, result) in results.into_iter().enumerate() {
        result.unwrap_or_else(|e| panic!("request {i} failed: {e}"));
    }
    assert_eq!(client.refresh_coordinator().refreshes_started(), 1);
    assert_eq!(store.access_token().expect("store readable").as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_failed_refresh_clears_session_and_rejects_everyone() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 3).await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(401)
            .set_body_json(json!({ "message": "refresh token revoked" }))
            .set_delay(Duration::from_millis(300)),
        1,
    )
    .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());
    let query = PageQuery::default();

    let (a, b, c) = tokio::join!(
        client.list_businesses(&query),
        client.list_businesses(&query),
        client.list_businesses(&query),
    );

    let errors: Vec<ClientError> = [a, b, c]
        .into_iter()
        .map(|r| r.expect_err("every caller must be rejected"))
        .collect();
    for err in &errors {
        assert!(err.is_auth_terminal(), "expected authentication error, got {err:?}");
        assert_eq!(err.to_string(), errors[0].to_string(), "all callers see the same error");
    }
    assert!(errors[0].to_string().contains("refresh token revoked"));
    assert_session_cleared(&store);
}

#[tokio::test]
async fn test_refresh_server_error_rejects_queued_callers() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 2).await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(500)
            .set_body_json(json!({ "message": "refresh backend down" }))
            .set_delay(Duration::from_millis(300)),
        1,
    )
    .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());
    let query = PageQuery::default();

    let results = join_all((0..2).map(|_| client.list_businesses(&query))).await;

    let errors: Vec<ClientError> = results
        .into_iter()
        .map(|r| r.expect_err("a failed refresh rejects every caller"))
        .collect();
    for err in &errors {
        assert!(err.is_auth_terminal(), "expected authentication error, got {err:?}");
        assert_eq!(err.to_string(), errors[0].to_string(), "all callers see the same error");
    }
    assert!(errors[0].to_string().contains("refresh backend down"), "got {}", errors[0]);
    assert_eq!(client.refresh_coordinator().refreshes_started(), 1);
    assert!(!client.refresh_coordinator().is_refreshing());
    assert_session_cleared(&store);
}

#[tokio::test]
async fn test_second_unauthorized_after_replay_is_final() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        "R1",
        ResponseTemplate::new(200).set_body_json(envelope(grant("T2", "R2"))),
        1,
    )
    .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());

    let err = client
        .list_businesses(&PageQuery::default())
        .await
        .expect_err("second 401 must not be retried");
    assert!(err.is_auth_terminal());
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.refresh_coordinator().refreshes_started(), 1);
    assert_eq!(store.access_token().expect("store readable").as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_missing_refresh_token_terminates_without_calling_server() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.set_access_token("T1");
    let client = client_for(&server, store.clone());

    let err = client
        .list_businesses(&PageQuery::default())
        .await
        .expect_err("no refresh token, no session");
    assert!(err.is_auth_terminal());
    assert!(err.to_string().contains("no refresh token"));
    assert_session_cleared(&store);
}

#[tokio::test]
async fn test_store_is_reread_on_every_request() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 200, 1).await;
    mount_resource(&server, "T9", 200, 1).await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());
    let query = PageQuery::default();

    client.list_businesses(&query).await.expect("first call uses T1");

    store.set_access_token("T9");
    client.list_businesses(&query).await.expect("second call sees T9");

    // Logout from elsewhere: the next call goes out without credentials.
    store.clear().expect("clear");
    let err = client.list_businesses(&query).await.expect_err("no session left");
    assert!(err.is_auth_terminal());

    let requests = server.received_requests().await.expect("recording enabled");
    let last = requests.last().expect("three requests");
    assert!(last.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_request_that_raced_a_refresh_replays_without_refreshing_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    mount_resource(&server, "T2", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());

    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.list_businesses(&PageQuery::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.save(&credential("T2", "R2"), None).expect("save");

    in_flight.await.expect("task joins").expect("replayed with rotated token");
    assert_eq!(client.refresh_coordinator().refreshes_started(), 0);
}

#[tokio::test]
async fn test_refresh_accepts_unwrapped_grant() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 1).await;
    mount_resource(&server, "T2", 200, 1).await;
    mount_refresh(&server, "R1", ResponseTemplate::new(200).set_body_json(grant("T2", "R2")), 1)
        .await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());

    client.list_businesses(&PageQuery::default()).await.expect("replay succeeds");
    assert_eq!(store.refresh_token().expect("store readable").as_deref(), Some("R2"));
}

#[tokio::test]
async fn test_malformed_refresh_response_terminates_session() {
    let server = MockServer::start().await;
    mount_resource(&server, "T1", 401, 1).await;
    mount_refresh(&server, "R1", ResponseTemplate::new(200).set_body_string("<html>oops"), 1).await;

    let store = seeded_store("T1", "R1");
    let client = client_for(&server, store.clone());

    let err = client
        .list_businesses(&PageQuery::default())
        .await
        .expect_err("malformed refresh must fail");
    assert!(err.is_auth_terminal());
    assert!(err.to_string().contains("malformed refresh response"));
    assert_session_cleared(&store);
}

#[tokio::test]
async fn test_client_errors_are_surfaced_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/panel/categories"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "data": null,
            "isSuccess": false,
            "message": "Invalid category",
            "messages": ["Title is required"],
            "errors": ["title"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, seeded_store("T1", "R1"));

    let err = client
        .post::<Value, _>("/panel/categories", &json!({ "title": "" }), RequestOptions::new())
        .await
        .expect_err("422 surfaces");
    match err {
        ClientError::Validation(failure) => {
            assert_eq!(failure.status, 422);
            assert_eq!(failure.message.as_deref(), Some("Invalid category"));
            assert_eq!(failure.messages, vec!["Title is required".to_string()]);
            assert_eq!(failure.errors, vec!["title".to_string()]);
        },
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = client.list_businesses(&PageQuery::default()).await.expect_err("503 surfaces");
    assert!(matches!(err, ClientError::Server(ref f) if f.status == 503), "got {err:?}");
}

#[tokio::test]
async fn test_cancelled_request_returns_promptly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server, seeded_store("T1", "R1"));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = client
        .request::<Value>(Method::GET, RESOURCE, None, RequestOptions::new().cancel_with(cancel))
        .await;

    assert!(matches!(result, Err(ClientError::Cancelled)), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = MenuClient::new(
        ClientConfig { connect_timeout_secs: 1, timeout_secs: 2, ..ClientConfig::new("http://127.0.0.1:9") },
        seeded_store("T1", "R1"),
    )
    .expect("client builds");

    let err = client.list_businesses(&PageQuery::default()).await.expect_err("nothing listens");
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
}
