use std::time::{Duration, Instant};

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rattan_client::{with_header, Client, ClientConfig, ClientError};
use rattan_core::{ChatCompletionRequest, ChatMessage};

/// Config pointed at the mock server, retries off so error paths are
/// observed directly
fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(server.uri())
        .with_api_key("sk-test")
        .with_max_retries(0)
}

fn chat_request(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(model).with_message(ChatMessage::user("hello"))
}

fn completion_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "object": "chat.completion",
        "created": 1700000000,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "hi there"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
    })
}

#[tokio::test]
async fn test_batch_posts_json_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"model": "test-model", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_json("batch-1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::with_config(test_config(&server)).unwrap();
    let response = client
        .create_batch_chat_completion(chat_request("test-model"), vec![])
        .await
        .unwrap();

    assert_eq!(response.id, "batch-1");
    assert_eq!(response.text().as_deref(), Some("hi there"));
}

#[tokio::test]
async fn test_request_header_option_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .and(header("x-request-id", "r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_json("batch-1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::with_config(test_config(&server)).unwrap();
    client
        .create_batch_chat_completion(
            chat_request("test-model"),
            vec![with_header("X-Request-Id", "r-1")],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_auth_error_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = Client::with_config(test_config(&server)).unwrap();
    let err = client
        .create_batch_chat_completion(chat_request("test-model"), vec![])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Auth(ref message) if message == "bad key"));
}

#[tokio::test]
async fn test_rate_limit_error_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = Client::with_config(test_config(&server)).unwrap();
    let err = client
        .create_batch_chat_completion(chat_request("test-model"), vec![])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RateLimited(_)));
}

#[tokio::test]
async fn test_api_error_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = Client::with_config(test_config(&server)).unwrap();
    let err = client
        .create_batch_chat_completion(chat_request("test-model"), vec![])
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_cap_bounds_inflight_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(150))
                .set_body_json(completion_json("batch-1")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server).with_batch_max_parallel(1);
    let client = Client::with_config(config).unwrap();

    let started = Instant::now();
    let (first, second) = tokio::join!(
        client.create_batch_chat_completion(chat_request("test-model"), vec![]),
        client.create_batch_chat_completion(chat_request("test-model"), vec![]),
    );
    first.unwrap();
    second.unwrap();

    // With a single permit the second request cannot start until the
    // first finishes, so the pair takes at least two server delays.
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_uncapped_batch_requests_run_concurrently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_json(completion_json("batch-1")),
        )
        .expect(4)
        .mount(&server)
        .await;

    let config = test_config(&server).with_batch_max_parallel(0);
    let client = Client::with_config(config).unwrap();

    let started = Instant::now();
    let calls = (0..4).map(|_| client.create_batch_chat_completion(chat_request("test-model"), vec![]));
    let results = futures::future::join_all(calls).await;
    for result in results {
        result.unwrap();
    }

    // Four requests at 200ms each would need 800ms serially
    assert!(started.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_chat_completion_stream_decodes_sse() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"id\":\"c-1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\n\n",
        "data: {\"id\":\"c-1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = Client::with_config(test_config(&server)).unwrap();
    let mut stream = client
        .create_chat_completion_stream(chat_request("test-model"), vec![])
        .await
        .unwrap();

    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        if let Some(content) = chunk.unwrap().content() {
            text.push_str(content);
        }
    }
    assert_eq!(text, "Hello");
}
