//! Tests for the HTTP transport module

use super::*;
use crate::auth::StaticCredential;
use crate::error::Error;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, auto_retry: bool) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(Url::parse(&server.uri()).unwrap())
        .auto_retry(auto_retry)
        .build();
    HttpClient::with_config(config).unwrap()
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert!(config.base_url.is_none());
    assert!(config.connect_timeout.is_none());
    assert!(config.auto_retry);
    assert_eq!(
        config.default_headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url(Url::parse("https://acme.zendesk.com/api/v2").unwrap())
        .connect_timeout(Duration::from_secs(60))
        .auto_retry(false)
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(
        config.base_url.unwrap().as_str(),
        "https://acme.zendesk.com/api/v2"
    );
    assert_eq!(config.connect_timeout, Some(Duration::from_secs(60)));
    assert!(!config.auto_retry);
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.default_headers["User-Agent"], "test-agent/1.0");
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::new().unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("config"));
}

// ============================================================================
// Verbs
// ============================================================================

#[tokio::test]
async fn test_get_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/views.json"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"views":[]}"#))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let cancel = CancellationToken::new();
    let body = client.get(&cancel, "/views.json?page=2").await.unwrap();

    assert_eq!(body.as_ref(), br#"{"views":[]}"#);
}

#[tokio::test]
async fn test_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tickets/1.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ticket": {"id": 1, "subject": "Help"}})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let data: serde_json::Value = client
        .get_json(&CancellationToken::new(), "/tickets/1.json")
        .await
        .unwrap();

    assert_eq!(data["ticket"]["subject"], "Help");
}

#[tokio::test]
async fn test_get_rejects_201() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created?"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let err = client
        .get(&CancellationToken::new(), "/odd.json")
        .await
        .unwrap_err();

    assert_eq!(err.api().unwrap().status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_default_and_instance_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me.json"))
        .and(header("Content-Type", "application/json"))
        .and(header("User-Agent", "acme-sync/2.0"))
        .and(header("X-On-Behalf-Of", "agent@acme.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = client_for(&mock_server, true);
    client.set_header("user-agent", "acme-sync/2.0");
    client.set_header("X-On-Behalf-Of", "agent@acme.com");

    client
        .get(&CancellationToken::new(), "/me.json")
        .await
        .unwrap();

    // A second client still carries the stock defaults
    let other = client_for(&mock_server, true);
    assert!(other.config().default_headers["User-Agent"].starts_with("helpdesk-client/"));
}

#[tokio::test]
async fn test_bearer_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer oauth-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        client_for(&mock_server, true).with_credential(StaticCredential::bearer("oauth-token"));
    client
        .get(&CancellationToken::new(), "/me.json")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_basic_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header(
            "Authorization",
            "Basic YWdlbnRAZXhhbXBsZS5jb206czNjcmV0",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true)
        .with_credential(StaticCredential::basic("agent@example.com", "s3cret"));
    client
        .get(&CancellationToken::new(), "/me.json")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_post_sends_json_and_accepts_201() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/macros.json"))
        .and(body_json(serde_json::json!({"macro": {"title": "Close"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "macro": {"id": 360, "title": "Close"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let body = client
        .post(
            &CancellationToken::new(),
            "/macros.json",
            &serde_json::json!({"macro": {"title": "Close"}}),
        )
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["macro"]["id"], 360);
}

#[tokio::test]
async fn test_put_accepts_204_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/webhooks/01F.json"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let body = client
        .put(
            &CancellationToken::new(),
            "/webhooks/01F.json",
            &serde_json::json!({"webhook": {"status": "inactive"}}),
        )
        .await
        .unwrap();

    assert!(body.is_empty());
}

#[tokio::test]
async fn test_patch_accepts_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/webhooks/01F.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let body = client
        .patch(
            &CancellationToken::new(),
            "/webhooks/01F.json",
            &serde_json::json!({"webhook": {"name": "n"}}),
        )
        .await
        .unwrap();

    assert_eq!(body.as_ref(), b"{}");
}

#[tokio::test]
async fn test_delete_204() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/triggers/7.json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let result = client
        .delete(&CancellationToken::new(), "/triggers/7.json")
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_delete_500_preserves_body() {
    let mock_server = MockServer::start().await;
    let error_body = r#"{"error":"InternalError","description":"Something broke"}"#;

    Mock::given(method("DELETE"))
        .and(path("/triggers/7.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string(error_body))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let err = client
        .delete(&CancellationToken::new(), "/triggers/7.json")
        .await
        .unwrap_err();

    let api = err.api().expect("api error");
    assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(api.body().as_ref(), error_body.as_bytes());
    assert_eq!(err.to_string(), format!("500: {error_body}"));
}

#[tokio::test]
async fn test_delete_200_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let err = client
        .delete(&CancellationToken::new(), "/triggers/7.json")
        .await
        .unwrap_err();

    assert_eq!(err.api().unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_404_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tickets/404.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let err = client
        .get(&CancellationToken::new(), "/tickets/404.json")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api(_)));
    assert_eq!(err.api().unwrap().body_text(), "Not found");
}

#[tokio::test]
async fn test_transport_trait_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let transport: &dyn Transport = &client;
    transport
        .delete(&CancellationToken::new(), "/tags.json")
        .await
        .unwrap();
}

// ============================================================================
// URLs and transport failures
// ============================================================================

#[tokio::test]
async fn test_absolute_url_on_base_origin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/groups.json"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(Url::parse(&format!("{}/api/v2", mock_server.uri())).unwrap())
        .build();
    let client = HttpClient::with_config(config).unwrap();

    client
        .get(
            &CancellationToken::new(),
            &format!("{}/api/v2/groups.json?page=3", mock_server.uri()),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_foreign_origin_never_gets_credentials() {
    let home = MockServer::start().await;
    let foreign = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&home)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&foreign)
        .await;

    let client = client_for(&home, true)
        .with_credential(StaticCredential::basic("agent@acme.com", "s3cret"));
    let err = client
        .get(
            &CancellationToken::new(),
            &format!("{}/steal", foreign.uri()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
    assert!(foreign.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_base_url_keeps_its_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/groups.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(Url::parse(&format!("{}/api/v2", mock_server.uri())).unwrap())
        .build();
    let client = HttpClient::with_config(config).unwrap();

    client
        .get(&CancellationToken::new(), "/groups.json")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_base_url() {
    let client = HttpClient::new().unwrap();
    let err = client
        .get(&CancellationToken::new(), "/groups.json")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_connection_failure_is_not_retried() {
    // Bind and drop a listener so the port is closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = HttpClientConfig::builder()
        .base_url(Url::parse(&format!("http://{addr}")).unwrap())
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client
        .get(&CancellationToken::new(), "/groups.json")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_cancelled_before_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.get(&cancel, "/groups.json").await.unwrap_err();
    assert!(err.is_cancelled());
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_rate_limit_auto_retry() {
    let mock_server = MockServer::start().await;

    // First call returns 429 with retry-after
    Mock::given(method("GET"))
        .and(path("/limited.json"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    // Second call succeeds
    Mock::given(method("GET"))
        .and(path("/limited.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let start = Instant::now();
    let body = client
        .get(&CancellationToken::new(), "/limited.json")
        .await
        .unwrap();

    assert_eq!(body.as_ref(), b"ok");
    // Zero advertised seconds still waits out the safety margin
    assert!(start.elapsed() >= SAFETY_MARGIN);
    assert_eq!(client.last_retry_wait(), None);
}

#[tokio::test]
async fn test_rate_limit_auto_retry_waits_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "3")
                .insert_header("ratelimit-reset", "3")
                .set_body_string(r#"{"error":"TooManyRequests"}"#),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let start = Instant::now();
    let result = client.get(&CancellationToken::new(), "/test").await;

    assert!(result.is_ok());
    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_rate_limit_retries_write_verbs_with_same_body() {
    let mock_server = MockServer::start().await;
    let payload = serde_json::json!({"tag": "vip"});

    Mock::given(method("POST"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    client
        .post(&CancellationToken::new(), "/tags.json", &payload)
        .await
        .unwrap();

    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_rate_limit_manual_mode() {
    let mock_server = MockServer::start().await;
    let error_body = r#"{"error":"TooManyRequests"}"#;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "3")
                .insert_header("ratelimit-reset", "3")
                .set_body_string(error_body),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, false);
    let start = Instant::now();
    let err = client
        .get(&CancellationToken::new(), "/test")
        .await
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(err.is_rate_limited());

    let api = err.api().unwrap();
    assert_eq!(api.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(api.headers().get("retry-after").unwrap(), "3");
    assert_eq!(api.body().as_ref(), error_body.as_bytes());
    assert_eq!(client.last_retry_wait(), Some(Duration::from_secs(4)));
}

#[tokio::test]
async fn test_rate_limit_manual_mode_delete() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(429).insert_header("ratelimit-reset", "12"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, false);
    let err = client
        .delete(&CancellationToken::new(), "/users/1.json")
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert_eq!(client.last_retry_wait(), Some(Duration::from_secs(13)));
}

#[tokio::test]
async fn test_rate_limit_wait_cancelled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, true);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = client.get(&cancel, "/slow.json").await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(err.api().is_none());
    assert!(start.elapsed() < Duration::from_secs(10));
}
