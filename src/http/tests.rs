//! Tests for the HTTP transport module

use super::*;
use crate::error::Error;
use crate::lanes::LaneRequest;
use crate::types::StringMap;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    HttpTransport::new(config).unwrap()
}

fn lane(entity: &str, page: u64) -> LaneRequest {
    LaneRequest::new(entity, StringMap::new())
        .with_cursor_key("p")
        .with_cursor(page)
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.rate_limit.is_none());
    assert!(config.user_agent.starts_with("lanepager/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .rate_limit(RateLimiterConfig::new(5, 5))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, "https://api.example.com");
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(5, 5)));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_build_url_joins_entity_and_params() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/v3/")
        .build();
    let transport = HttpTransport::new(config).unwrap();

    let mut params = StringMap::new();
    params.insert("category_id".to_string(), "12".to_string());
    let request = LaneRequest::new("item", params)
        .with_cursor_key("p")
        .with_cursor(3);

    let url = transport.build_url(&request).unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.example.com/v3/item?category_id=12&p=3"
    );
}

#[test]
fn test_build_url_without_params() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/v3")
        .build();
    let transport = HttpTransport::new(config).unwrap();

    let url = transport
        .build_url(&LaneRequest::new("/category", StringMap::new()))
        .unwrap();
    assert_eq!(url.as_str(), "https://api.example.com/v3/category");
}

#[test]
fn test_invalid_base_url() {
    let config = HttpClientConfig::builder().base_url("not a url").build();
    let result = HttpTransport::new(config);
    assert!(matches!(result, Err(Error::InvalidUrl(_))));
}

#[tokio::test]
async fn test_fetch_sends_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let response = transport.fetch(&lane("item", 2)).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body_text(), r#"[{"id":1}]"#);
}

#[tokio::test]
async fn test_fetch_passes_error_statuses_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("p", "1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);

    let missing = transport.fetch(&lane("item", 1)).await.unwrap();
    assert_eq!(missing.status, 404);

    let busy = transport.fetch(&lane("item", 2)).await.unwrap();
    assert_eq!(busy.status, 503);
    assert_eq!(busy.body_text(), "busy");
}

#[tokio::test]
async fn test_fetch_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .and(header("Authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .header("Authorization", "Bearer token")
        .no_rate_limit()
        .build();
    let transport = HttpTransport::new(config).unwrap();

    let response = transport.fetch(&lane("item", 1)).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_batch_fetch_is_positional() {
    let mock_server = MockServer::start().await;

    for page in 1..=3u64 {
        Mock::given(method("GET"))
            .and(path("/item"))
            .and(query_param("p", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"page": page}]))
                    // later pages answer first
                    .set_delay(Duration::from_millis(60 - page * 20)),
            )
            .mount(&mock_server)
            .await;
    }

    let transport = transport_for(&mock_server);
    let requests = vec![lane("item", 1), lane("item", 2), lane("item", 3)];
    let responses = transport.batch_fetch(&requests).await.unwrap();

    let bodies: Vec<String> = responses.iter().map(|r| r.body_text()).collect();
    assert_eq!(
        bodies,
        vec![r#"[{"page":1}]"#, r#"[{"page":2}]"#, r#"[{"page":3}]"#]
    );
}

#[tokio::test]
async fn test_connection_failure_is_transient() {
    // nothing listens on this port once the server is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let config = HttpClientConfig::builder()
        .base_url(uri)
        .timeout(Duration::from_secs(2))
        .no_rate_limit()
        .build();
    let transport = HttpTransport::new(config).unwrap();

    let err = transport.fetch(&lane("item", 1)).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_with_rate_limiter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();
    let transport = HttpTransport::new(config).unwrap();
    assert!(transport.has_rate_limiter());

    let requests = vec![lane("item", 1), lane("item", 2), lane("item", 3)];
    let responses = transport.batch_fetch(&requests).await.unwrap();
    assert_eq!(responses.len(), 3);
}

#[test]
fn test_http_transport_debug() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .build();
    let transport = HttpTransport::new(config).unwrap();
    let debug_str = format!("{transport:?}");
    assert!(debug_str.contains("HttpTransport"));
    assert!(debug_str.contains("api.example.com"));
}
