use rattan_core::{ChatCompletionRequest, ChatCompletionResponse};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::options::RequestOption;
use crate::transport::ResourceType;

/// Endpoint suffix for bot chat completions
pub const BOT_CHAT_COMPLETIONS_SUFFIX: &str = "/bots/chat/completions";

impl Client {
    /// API call to create a chat completion through a bot.
    ///
    /// The request's model field carries the bot id. Streaming requests
    /// are rejected before anything is sent.
    pub async fn create_bot_chat_completion(
        &self,
        request: ChatCompletionRequest,
        options: Vec<RequestOption>,
    ) -> Result<ChatCompletionResponse> {
        if request.is_stream() {
            return Err(ClientError::StreamNotSupported);
        }
        self.post_completion(
            self.dispatcher(),
            BOT_CHAT_COMPLETIONS_SUFFIX,
            ResourceType::Bot,
            &request,
            options,
        )
        .await
    }
}
