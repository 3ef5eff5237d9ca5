pub mod batch;
pub mod bot;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod options;
pub mod transport;

// Re-export core types
pub use batch::BATCH_CHAT_COMPLETIONS_SUFFIX;
pub use bot::BOT_CHAT_COMPLETIONS_SUFFIX;
pub use chat::{ChatCompletionStream, CHAT_COMPLETIONS_SUFFIX};
pub use client::Client;
pub use config::{AuthConfig, ClientConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::{ClientError, Result};
pub use options::{with_body, with_header, RequestOption, RequestOptions};
pub use transport::{ApiCall, Dispatcher, HttpDispatcher, ResourceType, SseStream};
