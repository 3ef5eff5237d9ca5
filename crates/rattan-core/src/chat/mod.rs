pub mod chunk;
pub mod request;
pub mod response;

pub use chunk::{ChatCompletionChunk, ChatDelta, ChunkChoice};
pub use request::{ChatCompletionRequest, StreamOptions};
pub use response::{ChatChoice, ChatCompletionResponse, Usage};
