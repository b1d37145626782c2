use std::sync::Arc;

use anyhow::Result;

use crate::llm::{CompletionProvider, LlmResponse, Message};
use crate::search::{results_for_prompt, SearchResult};

const SYSTEM_PROMPT: &str =
    "Твоя задача - проанализировать результаты поиска и выделить наиболее важную информацию.";

/// Condenses one step's search results against the context gathered so far.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn CompletionProvider>,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn CompletionProvider>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    pub async fn summarize(
        &self,
        results: &[SearchResult],
        context: &str,
    ) -> Result<(String, LlmResponse)> {
        let user_message = format!(
            "Контекст: {}\n\nРезультаты поиска: {}\n\n\
             Проанализируй эти результаты и выдели ключевую информацию, относящуюся к контексту.",
            context,
            results_for_prompt(results)?
        );

        let response = self
            .llm
            .complete(&[Message::user(user_message)], Some(SYSTEM_PROMPT), self.max_tokens)
            .await?;

        Ok((response.text_or_fallback().to_string(), response))
    }
}
