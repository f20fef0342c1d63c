//! Tests for the auth module

use super::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_bearer_header() {
    let credential = StaticCredential::bearer("my-token");
    let client = reqwest::Client::new();
    let req = authorize(client.get("https://example.com/api"), &credential);

    let built = req.build().unwrap();
    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Bearer my-token"
    );
}

#[test]
fn test_basic_header() {
    let credential = StaticCredential::basic("agent@example.com", "s3cret");
    let client = reqwest::Client::new();
    let req = authorize(client.get("https://example.com/api"), &credential);

    let built = req.build().unwrap();
    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Basic YWdlbnRAZXhhbXBsZS5jb206czNjcmV0"
    );
}

/// A caller-defined credential kind, as resource code would supply
struct ApiTokenCredential {
    email: String,
    token: String,
}

impl Credential for ApiTokenCredential {
    fn is_bearer(&self) -> bool {
        false
    }

    fn secret(&self) -> &str {
        &self.token
    }

    fn email(&self) -> &str {
        &self.email
    }
}

#[tokio::test]
async fn test_custom_credential_reaches_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header(
            "Authorization",
            "Basic YWdlbnRAZXhhbXBsZS5jb20vdG9rZW46YWJjMTIz",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let credential = ApiTokenCredential {
        email: "agent@example.com/token".to_string(),
        token: "abc123".to_string(),
    };
    let client = reqwest::Client::new();
    let req = authorize(client.get(format!("{}/me", mock_server.uri())), &credential);
    let response = req.send().await.unwrap();

    assert_eq!(response.status(), 200);
}

#[test]
fn test_debug_hides_secret() {
    let credential = StaticCredential::basic("agent@example.com", "s3cret");
    let debug_str = format!("{credential:?}");
    assert!(debug_str.contains("agent@example.com"));
    assert!(!debug_str.contains("s3cret"));
}
