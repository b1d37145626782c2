use std::sync::Arc;

use anyhow::Result;

use crate::llm::{CompletionProvider, LlmResponse, Message};

const SYSTEM_PROMPT: &str =
    "Составь информативный и полезный ответ на основе предоставленного контекста.";

#[derive(Clone)]
pub struct Synthesizer {
    llm: Arc<dyn CompletionProvider>,
    max_tokens: u32,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn CompletionProvider>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    pub async fn synthesize(&self, context: &str) -> Result<(String, LlmResponse)> {
        let user_message = format!(
            "Контекст: {}\n\nСоставь финальный ответ для пользователя на основе этого контекста.",
            context
        );

        let response = self
            .llm
            .complete(&[Message::user(user_message)], Some(SYSTEM_PROMPT), self.max_tokens)
            .await?;

        Ok((response.text_or_fallback().to_string(), response))
    }
}
