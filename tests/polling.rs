mod common;

use common::{clear_network_env, spawn_stub, test_spec, test_http_with_spec, StubResponse, ENV_LOCK};
use opsbridge::endpoints::{JobStatusConfig, PaginationConfig};
use opsbridge::services::poll::{poll_job, PollOptions};
use serde_json::{json, Map};

fn job_status() -> JobStatusConfig {
    JobStatusConfig {
        path_template: "/jobs/{jobId}".to_string(),
        label_field: Some("name".to_string()),
        status_field: "status".to_string(),
        success_values: vec!["done".to_string()],
        failure_values: vec!["failed".to_string()],
    }
}

fn job_params() -> Map<String, serde_json::Value> {
    let mut params = Map::new();
    params.insert("jobId".to_string(), json!("j-1"));
    params
}

fn fast_opts() -> PollOptions {
    PollOptions {
        interval_ms: 10,
        timeout_ms: 2_000,
    }
}

#[tokio::test]
async fn polling_returns_on_a_terminal_success_status() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();

    let server = spawn_stub(vec![
        StubResponse::json(200, json!({"status": "running"})),
        StubResponse::json(200, json!({"status": "done", "name": "cleanup"})),
    ])
    .await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.job_status = Some(job_status());
    let http = test_http_with_spec(spec);

    let result = poll_job(&http, &job_params(), fast_opts()).await.expect("poll");
    assert_eq!(result["status"], "done");
    assert_eq!(result["label"], "cleanup");
    assert_eq!(server.request_count(), 2);
    assert!(server.requests()[0].starts_with("GET /jobs/j-1"));
}

#[tokio::test]
async fn polling_raises_on_a_terminal_failure_status() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();

    let server = spawn_stub(vec![StubResponse::json(
        200,
        json!({"status": "failed", "detail": "disk full"}),
    )])
    .await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.job_status = Some(job_status());
    let http = test_http_with_spec(spec);

    let err = poll_job(&http, &job_params(), fast_opts()).await.unwrap_err();
    assert_eq!(err.code, "POLL_FAILED");
    assert_eq!(
        err.details.unwrap()["data"]["detail"], "disk full",
        "the last payload must ride along for diagnostics"
    );
}

#[tokio::test]
async fn polling_times_out_between_iterations() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();

    let server = spawn_stub(vec![]).await;
    for _ in 0..8 {
        server.enqueue(StubResponse::json(200, json!({"status": "running"})));
    }
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.job_status = Some(job_status());
    let http = test_http_with_spec(spec);

    let err = poll_job(
        &http,
        &job_params(),
        PollOptions {
            interval_ms: 10,
            timeout_ms: 25,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, "POLL_TIMEOUT");
    assert_eq!(err.details.unwrap()["data"]["status"], "running");
}

#[tokio::test]
async fn polling_without_configuration_fails_before_the_network() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();

    let server = spawn_stub(vec![]).await;
    let http = test_http_with_spec(test_spec(&server.base_url, PaginationConfig::none()));

    let err = poll_job(&http, &job_params(), fast_opts()).await.unwrap_err();
    assert_eq!(err.code, "INVALID_PARAMS");
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn polling_with_missing_identifiers_surfaces_the_gap() {
    let _guard = ENV_LOCK.lock().await;
    clear_network_env();

    let server = spawn_stub(vec![]).await;
    let mut spec = test_spec(&server.base_url, PaginationConfig::none());
    spec.job_status = Some(job_status());
    let http = test_http_with_spec(spec);

    let err = poll_job(&http, &Map::new(), fast_opts()).await.unwrap_err();
    assert_eq!(err.code, "MISSING_PARAMETER");
    assert_eq!(server.request_count(), 0);
}
