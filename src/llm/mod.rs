pub mod anthropic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicClient;

/// Returned in place of model output when a response carries no text block.
pub const NO_TEXT_FALLBACK: &str = "Не удалось получить текстовый ответ от API";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// First text-typed content block, if the response had one.
    pub text: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    pub fn text_or_fallback(&self) -> &str {
        self.text.as_deref().unwrap_or(NO_TEXT_FALLBACK)
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request needs at least one message")]
    EmptyConversation,

    #[error("failed to send request to completion API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("completion API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse completion API response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Runs one chat completion. `system` falls back to the provider's default
    /// instruction when `None`.
    async fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        max_tokens: u32,
    ) -> Result<LlmResponse, CompletionError>;
}
