//! Tests for the HTTP client module

use super::*;
use crate::auth::{AuthConfig, SessionLogin};
use crate::error::Error;
use crate::types::BackoffType;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retries() -> HttpClientConfigBuilder {
    HttpClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
}

fn client() -> HttpClient {
    HttpClient::with_config(fast_retries().build()).unwrap()
}

fn backoff_client(backoff_type: BackoffType, max: Duration) -> HttpClient {
    let config = HttpClientConfig::builder()
        .backoff(backoff_type, Duration::from_millis(100), max)
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_config_defaults() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.backoff_type, BackoffType::Exponential);
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::default()));
    assert!(config.user_agent.starts_with("docsheet/"));
}

#[test]
fn test_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(120))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .rate_limit(RateLimiterConfig::per_second(2))
        .header("X-Client", "docsheet")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(120));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(2, 2)));
    assert_eq!(config.default_headers["X-Client"], "docsheet");
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[tokio::test]
async fn test_post_json_sends_body_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/StorageService/Run"))
        .and(header("X-Client", "docsheet"))
        .and(body_json(json!({"Variables": {"ids": ["a"]}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ouputData": [{"id": "a"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::with_config(fast_retries().header("X-Client", "docsheet").build())
        .unwrap();
    let data: Value = client
        .post_json(
            &format!("{}/StorageService/Run", server.uri()),
            &json!({"Variables": {"ids": ["a"]}}),
        )
        .await
        .unwrap();

    assert_eq!(data["ouputData"][0]["id"], "a");
}

#[tokio::test]
async fn test_other_methods_carry_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/items"))
        .and(body_json(json!({"ids": [1]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let data: Value = client()
        .request_json(
            reqwest::Method::PUT,
            &format!("{}/items", server.uri()),
            &json!({"ids": [1]}),
        )
        .await
        .unwrap();
    assert_eq!(data, json!([]));
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client()
        .post(&format!("{}/missing", server.uri()), &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_server_error_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let response = client()
        .post(&format!("{}/flaky", server.uri()), &json!({}))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_rate_limited_waits_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let response = client()
        .post(&format!("{}/limited", server.uri()), &json!({}))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(4)
        .mount(&server)
        .await;

    let err = client()
        .post(&format!("{}/down", server.uri()), &json!({}))
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "Server error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_response_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let err = client()
        .post_json::<Value>(&format!("{}/html", server.uri()), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_session_login_once_for_many_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/run"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let client = HttpClient::with_auth(
        fast_retries().build(),
        AuthConfig::Session(SessionLogin {
            url: format!("{}/login", server.uri()),
            method: reqwest::Method::POST,
            body: json!({"user": "u"}),
            token_path: "token".to_string(),
            expires_in_path: None,
        }),
    )
    .unwrap();
    assert!(client.has_authenticator());

    for _ in 0..2 {
        let value: Value = client
            .post_json(&format!("{}/run", server.uri()), &json!({}))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }
}

#[test]
fn test_anonymous_auth_adds_no_authenticator() {
    let client = HttpClient::with_auth(fast_retries().build(), AuthConfig::None).unwrap();
    assert!(!client.has_authenticator());
}

#[test]
fn test_calculate_backoff_constant() {
    let client = backoff_client(BackoffType::Constant, Duration::from_secs(10));

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_linear() {
    let client = backoff_client(BackoffType::Linear, Duration::from_secs(10));

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_capped() {
    let client = backoff_client(BackoffType::Exponential, Duration::from_millis(500));

    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));
    assert_eq!(client.calculate_backoff(40), Duration::from_millis(500));
}

#[test]
fn test_debug_and_rate_limiter() {
    let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
    assert!(format!("{client:?}").contains("HttpClient"));
    assert!(client.has_rate_limiter());
    assert!(!backoff_client(BackoffType::Constant, Duration::from_secs(1)).has_rate_limiter());
}
