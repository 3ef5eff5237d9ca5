pub mod content;
pub mod message;

pub use content::{ContentPart, ImageUrl, MessageContent};
pub use message::{ChatMessage, Role};
