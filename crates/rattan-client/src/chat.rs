use std::pin::Pin;

use futures::{Stream, StreamExt};
use rattan_core::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::options::{with_body, RequestOption};
use crate::transport::{ApiCall, ResourceType, SseStream};

/// Endpoint suffix for chat completions
pub const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";

/// Marker ending an SSE completion stream
const STREAM_DONE: &str = "[DONE]";

/// Typed stream of chat completion chunks
pub type ChatCompletionStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

impl Client {
    /// API call to create a chat completion for the given messages.
    ///
    /// Streaming requests are rejected before anything is sent, use
    /// [`create_chat_completion_stream`](Self::create_chat_completion_stream)
    /// instead.
    pub async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
        options: Vec<RequestOption>,
    ) -> Result<ChatCompletionResponse> {
        if request.is_stream() {
            return Err(ClientError::StreamNotSupported);
        }
        self.post_completion(
            self.dispatcher(),
            CHAT_COMPLETIONS_SUFFIX,
            ResourceType::Endpoint,
            &request,
            options,
        )
        .await
    }

    /// API call to create a streaming chat completion.
    ///
    /// The stream flag is forced on before dispatch. Chunks are yielded
    /// until the server sends the `[DONE]` marker.
    pub async fn create_chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
        mut options: Vec<RequestOption>,
    ) -> Result<ChatCompletionStream> {
        let mut request = request;
        request.stream = true;

        let body = serde_json::to_value(&request)?;
        options.push(with_body(body));

        let call = ApiCall::post(
            self.full_url(CHAT_COMPLETIONS_SUFFIX),
            ResourceType::Endpoint,
            request.model(),
            options,
        );
        let events = self.dispatcher().dispatch_stream(call).await?;
        Ok(decode_chunk_stream(events))
    }
}

/// Decode SSE data payloads into typed chunks, ending at `[DONE]`
fn decode_chunk_stream(events: SseStream) -> ChatCompletionStream {
    let stream = events
        .take_while(|event| {
            let done = matches!(event, Ok(data) if data.trim() == STREAM_DONE);
            futures::future::ready(!done)
        })
        .filter_map(|event| async move {
            match event {
                Ok(data) => {
                    let payload = data.trim();
                    if payload.is_empty() {
                        return None;
                    }
                    match serde_json::from_str::<ChatCompletionChunk>(payload) {
                        Ok(chunk) => Some(Ok(chunk)),
                        Err(e) => Some(Err(ClientError::Decode(e))),
                    }
                }
                Err(e) => Some(Err(e)),
            }
        });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn canned(events: Vec<Result<String>>) -> SseStream {
        Box::pin(stream::iter(events))
    }

    #[tokio::test]
    async fn test_decode_stream_stops_at_done() {
        let mut chunks = decode_chunk_stream(canned(vec![
            Ok(r#"{"id":"c-1","choices":[{"index":0,"delta":{"content":"Hel"}}]}"#.to_string()),
            Ok(r#"{"id":"c-1","choices":[{"index":0,"delta":{"content":"lo"}}]}"#.to_string()),
            Ok(STREAM_DONE.to_string()),
            Ok(r#"{"id":"after-done"}"#.to_string()),
        ]));

        assert_eq!(chunks.next().await.unwrap().unwrap().content(), Some("Hel"));
        assert_eq!(chunks.next().await.unwrap().unwrap().content(), Some("lo"));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_decode_stream_skips_empty_payloads() {
        let mut chunks = decode_chunk_stream(canned(vec![
            Ok(String::new()),
            Ok(r#"{"id":"c-1","choices":[{"index":0,"delta":{"content":"hi"}}]}"#.to_string()),
        ]));

        assert_eq!(chunks.next().await.unwrap().unwrap().content(), Some("hi"));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_decode_stream_reports_bad_json() {
        let mut chunks = decode_chunk_stream(canned(vec![Ok("not json".to_string())]));

        let err = chunks.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_stream_propagates_transport_errors() {
        let mut chunks = decode_chunk_stream(canned(vec![Err(ClientError::Stream(
            "connection reset".to_string(),
        ))]));

        let err = chunks.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Stream(_)));
    }
}
