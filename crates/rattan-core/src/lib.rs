pub mod chat;
pub mod types;

pub use chat::{
    ChatChoice, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatDelta,
    ChunkChoice, StreamOptions, Usage,
};
pub use types::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
