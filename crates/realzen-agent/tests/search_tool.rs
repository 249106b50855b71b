
use std::num::NonZeroUsize;
use std::time::Duration;

use realzen_agent::ConfigurationBuilder;
use realzen_agent::core::tool::{ErrorKind, Tool};
use realzen_agent::tools::{PropertySearchTool, PropertyType, SearchParameters};
use realzen_agent_test_model::StubServer;
use tokio::net::TcpListener;

fn tool(endpoint: &str, max_results: usize) -> PropertySearchTool {
    let config = ConfigurationBuilder::new()
        .with_rapidapi_key("rapid-test-key")
        .with_max_search_results(NonZeroUsize::new(max_results).unwrap())
        .with_http_timeout(Duration::from_secs(5))
        .build();
    PropertySearchTool::new(&config)
        .unwrap()
        .with_endpoint(endpoint)
}

const FIVE_RESULTS: &str = r#"{"results":[{"zpid":1},{"zpid":2},{"zpid":3},{"zpid":4},{"zpid":5}],"totalResultCount":5}"#;

#[tokio::test]
async fn test_search_sends_query_and_truncates() {
    let server = StubServer::respond("200 OK", FIVE_RESULTS).await;
    let tool = tool(&server.url("/search"), 3);

    let params = SearchParameters::new("Austin, TX").with_types([PropertyType::Condo]);
    let results = tool.search(params).await.unwrap();
    let zpids: Vec<_> = results.iter().map(|r| r["zpid"].as_u64().unwrap()).collect();
    assert_eq!(zpids, [1, 2, 3]);

    let request = server.request().await;
    let request_line = request.lines().next().unwrap();
    assert!(request_line.starts_with("GET /search?location=Austin%2C+TX&output=json&"));
    assert!(request_line.contains("isSingleFamily=false"));
    assert!(request_line.contains("isCondo=true"));
    let headers = request.to_ascii_lowercase();
    assert!(headers.contains("x-rapidapi-key: rapid-test-key"));
    assert!(headers.contains("x-rapidapi-host: zillow56.p.rapidapi.com"));
}

#[tokio::test]
async fn test_limit_below_maximum() {
    let server = StubServer::respond("200 OK", FIVE_RESULTS).await;
    let tool = tool(&server.url("/search"), 10);

    let params = SearchParameters::new("Austin, TX").with_limit(2);
    let output = tool.execute(params).await.unwrap();
    assert_eq!(output, r#"[{"zpid":1},{"zpid":2}]"#);
}

#[tokio::test]
async fn test_rejected_key() {
    for status in ["401 Unauthorized", "403 Forbidden"] {
        let server =
            StubServer::respond(status, r#"{"message":"You are not subscribed"}"#).await;
        let err = tool(&server.url("/search"), 10)
            .search(SearchParameters::new("Austin, TX"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthConfiguration, "{status}");
    }
}

#[tokio::test]
async fn test_server_error() {
    let server = StubServer::respond("503 Service Unavailable", "{}").await;
    let err = tool(&server.url("/search"), 10)
        .search(SearchParameters::new("Austin, TX"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_missing_results() {
    let server = StubServer::respond("200 OK", r#"{"message":"no such location"}"#).await;
    let err = tool(&server.url("/search"), 10)
        .search(SearchParameters::new("Atlantis"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamSchema);
}

#[tokio::test]
async fn test_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = tool(&format!("http://{addr}/search"), 10)
        .search(SearchParameters::new("Austin, TX"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
