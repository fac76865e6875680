//! Tests for the HTTP transport module

use super::*;
use crate::config::ApiConfig;
use crate::error::Error;
use std::collections::HashMap;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base: &str) -> ApiConfig {
    ApiConfig {
        base_url: base.to_string(),
        retry_sleep_seconds: 0,
        rate_limit: None,
        ..ApiConfig::default()
    }
}

#[tokio::test]
async fn test_get_json_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/animal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meta": {"items_total": 1},
            "items": []
        })))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(&test_config(&mock_server.uri()));
    let data = transport
        .get_json(
            &format!("{}/v1/animal", mock_server.uri()),
            &[],
            &HashMap::new(),
        )
        .await
        .unwrap();

    assert_eq!(data["meta"]["items_total"], 1);
}

#[tokio::test]
async fn test_params_and_headers_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/appointment"))
        .and(query_param("limit", "200"))
        .and(query_param("active", "true"))
        .and(header("Authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(&test_config(&mock_server.uri()));
    let params = vec![
        ("limit".to_string(), "200".to_string()),
        ("active".to_string(), "true".to_string()),
    ];
    let mut headers = HashMap::new();
    headers.insert("Authorization".to_string(), "Bearer abc123".to_string());

    let data = transport
        .get_json(
            &format!("{}/v2/appointment", mock_server.uri()),
            &params,
            &headers,
        )
        .await
        .unwrap();

    assert_eq!(data["ok"], true);
}

#[tokio::test]
async fn test_retries_once_then_succeeds() {
    let mock_server = MockServer::start().await;

    // First call returns 500, retry succeeds.
    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(&test_config(&mock_server.uri()));
    let data = transport
        .get_json(
            &format!("{}/v1/flaky", mock_server.uri()),
            &[],
            &HashMap::new(),
        )
        .await
        .unwrap();

    assert_eq!(data["ok"], true);
}

#[tokio::test]
async fn test_second_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(&test_config(&mock_server.uri()));
    let err = transport
        .get_json(
            &format!("{}/v1/broken", mock_server.uri()),
            &[],
            &HashMap::new(),
        )
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "down for maintenance");
        }
        other => panic!("Expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_errors_get_the_same_single_retry() {
    let mock_server = MockServer::start().await;

    // 404 is treated exactly like a server error: one retry, then fatal.
    Mock::given(method("GET"))
        .and(path("/v1/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::new(&test_config(&mock_server.uri()));
    let err = transport
        .get_json(
            &format!("{}/v1/missing", mock_server.uri()),
            &[],
            &HashMap::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_rate_limiter_enabled_by_default() {
    let config = ApiConfig::default();
    let transport = HttpTransport::new(&config);
    assert!(transport.has_rate_limiter());

    let config = ApiConfig {
        rate_limit: None,
        ..ApiConfig::default()
    };
    let transport = HttpTransport::new(&config);
    assert!(!transport.has_rate_limiter());
}

#[test]
fn test_transport_debug() {
    let transport = HttpTransport::new(&ApiConfig::default());
    let debug_str = format!("{transport:?}");
    assert!(debug_str.contains("HttpTransport"));
    assert!(debug_str.contains("retry_sleep"));
}
