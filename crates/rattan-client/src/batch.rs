use rattan_core::{ChatCompletionRequest, ChatCompletionResponse};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::options::RequestOption;
use crate::transport::ResourceType;

/// Endpoint suffix for batch chat completions
pub const BATCH_CHAT_COMPLETIONS_SUFFIX: &str = "/batch/chat/completions";

impl Client {
    /// API call to create a batch completion for the chat messages.
    ///
    /// Batch requests ride the connection-capped batch transport and may
    /// be held server-side until capacity frees up. Streaming is not
    /// available on this endpoint, a streaming request is rejected
    /// before anything is sent.
    pub async fn create_batch_chat_completion(
        &self,
        request: ChatCompletionRequest,
        options: Vec<RequestOption>,
    ) -> Result<ChatCompletionResponse> {
        if request.is_stream() {
            return Err(ClientError::StreamNotSupported);
        }
        self.post_completion(
            self.batch_dispatcher(),
            BATCH_CHAT_COMPLETIONS_SUFFIX,
            ResourceType::Endpoint,
            &request,
            options,
        )
        .await
    }
}
