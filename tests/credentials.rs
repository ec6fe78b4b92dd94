mod common;

use common::{clear_network_env, spawn_stub, test_spec, test_http_with_spec, StubResponse, ENV_LOCK};
use opsbridge::endpoints::{AuthScheme, PaginationConfig};
use serde_json::json;

#[tokio::test]
async fn client_credentials_are_exchanged_once_and_cached() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();
    std::env::set_var("API_CLIENT_ID", "cid-1");
    std::env::set_var("API_CLIENT_SECRET", "shh");

    let server = spawn_stub(vec![
        StubResponse::json(200, json!({"access_token": "tok-1", "token_type": "Bearer"})),
        StubResponse::json(200, json!({"ok": true})),
        StubResponse::json(200, json!({"ok": true})),
    ])
    .await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.auth.scheme = AuthScheme::OAuth2;
    let http = test_http_with_spec(spec);

    http.get_with_retry("/a").await.expect("first call");
    http.get_with_retry("/b").await.expect("second call");

    let requests = server.requests();
    assert_eq!(requests.len(), 3, "one exchange plus two API calls");
    assert!(requests[0].starts_with("POST /oauth2/token"));
    assert!(requests[0].contains("grant_type=client_credentials"));
    assert!(requests[0].contains("client_id=cid-1"));
    assert!(requests[1].to_lowercase().contains("authorization: bearer tok-1"));
    assert!(
        requests[2].to_lowercase().contains("authorization: bearer tok-1"),
        "second call must reuse the cached token, not exchange again"
    );

    clear_network_env();
}

#[tokio::test]
async fn static_token_wins_over_exchange() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();
    std::env::set_var("BEARER_TOKEN", "stat-1");
    std::env::set_var("API_TOKEN", "stat-2");
    std::env::set_var("API_CLIENT_ID", "cid-1");
    std::env::set_var("API_CLIENT_SECRET", "shh");

    let server = spawn_stub(vec![StubResponse::json(200, json!({"ok": true}))]).await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.auth.scheme = AuthScheme::OAuth2;
    let http = test_http_with_spec(spec);

    http.get_with_retry("/a").await.expect("call");
    let requests = server.requests();
    assert_eq!(requests.len(), 1, "no exchange when a static token exists");
    assert!(
        requests[0].to_lowercase().contains("authorization: bearer stat-1"),
        "BEARER_TOKEN has the highest priority"
    );

    clear_network_env();
}

#[tokio::test]
async fn failed_exchange_proceeds_unauthenticated() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();
    std::env::set_var("API_CLIENT_ID", "cid-1");
    std::env::set_var("API_CLIENT_SECRET", "shh");

    let server = spawn_stub(vec![
        StubResponse::text(500, "exchange broken"),
        StubResponse::json(200, json!({"ok": true})),
    ])
    .await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.auth.scheme = AuthScheme::OAuth2;
    let http = test_http_with_spec(spec);

    let result = http.get_with_retry("/a").await.expect("call must proceed");
    assert_eq!(result["ok"], true);
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(
        !requests[1].to_lowercase().contains("authorization:"),
        "a failed exchange must not attach a credential"
    );

    clear_network_env();
}

#[tokio::test]
async fn exchange_without_access_token_field_is_swallowed() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();
    std::env::set_var("API_CLIENT_ID", "cid-1");
    std::env::set_var("API_CLIENT_SECRET", "shh");

    let server = spawn_stub(vec![
        StubResponse::json(200, json!({"token_type": "Bearer"})),
        StubResponse::json(200, json!({"ok": true})),
    ])
    .await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.auth.scheme = AuthScheme::OAuth2;
    let http = test_http_with_spec(spec);

    let result = http.get_with_retry("/a").await.expect("call must proceed");
    assert_eq!(result["ok"], true);
    assert!(!server.requests()[1].to_lowercase().contains("authorization:"));

    clear_network_env();
}

#[tokio::test]
async fn basic_scheme_encodes_user_and_pass() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();
    std::env::set_var("BASIC_USER", "ops");
    std::env::set_var("BASIC_PASS", "hunter2");

    let server = spawn_stub(vec![StubResponse::json(200, json!({"ok": true}))]).await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.auth.scheme = AuthScheme::Basic;
    let http = test_http_with_spec(spec);

    http.get_with_retry("/a").await.expect("call");
    // base64("ops:hunter2")
    assert!(server.requests()[0]
        .to_lowercase()
        .contains("authorization: basic b3bzomh1bnrlcji="));

    clear_network_env();
}

#[tokio::test]
async fn api_key_scheme_uses_configured_header() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();
    std::env::set_var("API_KEY", "k-123");

    let server = spawn_stub(vec![StubResponse::json(200, json!({"ok": true}))]).await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.auth.scheme = AuthScheme::ApiKey;
    spec.auth.header = Some("X-Api-Key".to_string());
    let http = test_http_with_spec(spec);

    http.get_with_retry("/a").await.expect("call");
    assert!(server.requests()[0].to_lowercase().contains("x-api-key: k-123"));

    clear_network_env();
}
