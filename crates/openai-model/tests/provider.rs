use std::future::poll_fn;
use std::pin::pin;
use std::time::Duration;

use realzen_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use realzen_agent_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use realzen_agent_test_model::StubServer;

fn provider(base_url: &str) -> OpenAIProvider {
    let config = OpenAIConfigBuilder::with_api_key("sk-test")
        .with_model("test-model")
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5))
        .build();
    OpenAIProvider::new(config).unwrap()
}

fn request() -> ModelRequest {
    ModelRequest {
        messages: vec![ModelMessage::User("Hi".to_owned())],
        tools: vec![],
    }
}

#[tokio::test]
async fn test_completion_round_trip() {
    let server = StubServer::respond_with(
        "200 OK",
        "application/json; charset=utf-8",
        r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"Hello!"},"finish_reason":"stop"}]}"#,
    )
    .await;

    let provider = provider(&server.url("/v1"));
    assert_eq!(provider.model_name(), "test-model");
    let resp = provider.send_request(&request()).await.unwrap();
    let mut resp = pin!(resp);
    let mut events = vec![];
    while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
        .await
        .unwrap()
    {
        events.push(event);
    }
    assert_eq!(
        events,
        [
            ModelResponseEvent::MessageDelta("Hello!".to_owned()),
            ModelResponseEvent::Completed(ModelFinishReason::Stop),
        ]
    );
    assert_eq!(resp.make_opaque_message().unwrap().id(), "chatcmpl-1");

    let raw_request = server.request().await;
    assert!(raw_request.starts_with("POST /v1/chat/completions "));
    assert!(
        raw_request
            .to_ascii_lowercase()
            .contains("authorization: bearer sk-test")
    );
    assert!(raw_request.contains(r#""model":"test-model""#));
    assert!(raw_request.contains(r#""stream":false"#));
}

#[tokio::test]
async fn test_unauthorized_is_authentication() {
    let server =
        StubServer::respond("401 Unauthorized", r#"{"error":{"message":"bad key"}}"#)
            .await;

    let err = provider(&server.url("/v1"))
        .send_request(&request())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.message().contains("bad key"));
}

#[tokio::test]
async fn test_rate_limited() {
    let server = StubServer::respond("429 Too Many Requests", "{}").await;

    let err = provider(&server.url("/v1"))
        .send_request(&request())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
}

#[tokio::test]
async fn test_unexpected_content_type() {
    let server =
        StubServer::respond_with("200 OK", "text/html", "<html></html>").await;

    let err = provider(&server.url("/v1"))
        .send_request(&request())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(err.message().contains("content type"));
}
