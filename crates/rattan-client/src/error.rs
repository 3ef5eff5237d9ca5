use thiserror::Error;

/// Unified error type for all client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Returned before any request is sent when a streaming request is
    /// handed to a non-streaming method.
    #[error("streaming is not supported by this method, use create_chat_completion_stream")]
    StreamNotSupported,

    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
