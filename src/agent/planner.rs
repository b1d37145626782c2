use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use crate::classify::{classify_needs_search, extract_search_query};
use crate::llm::{CompletionProvider, LlmResponse, Message};

const SYSTEM_PROMPT: &str =
    "Ты помощник, который анализирует запросы и составляет план действий для ответа на них.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub description: String,
    pub needs_search: bool,
    /// Empty unless `needs_search`.
    pub query: String,
}

impl PlanStep {
    pub fn from_line(line: &str) -> Self {
        let description = line.trim().to_string();
        let needs_search = classify_needs_search(&description);
        let query = if needs_search {
            extract_search_query(&description)
        } else {
            String::new()
        };

        Self {
            description,
            needs_search,
            query,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// One step per non-blank line, keeping at most `max_steps`.
    pub fn parse(text: &str, max_steps: usize) -> Self {
        let mut steps: Vec<PlanStep> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(PlanStep::from_line)
            .collect();

        if steps.len() > max_steps {
            warn!(
                steps = steps.len(),
                max_steps, "plan is longer than allowed, dropping the tail"
            );
            steps.truncate(max_steps);
        }

        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn search_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.needs_search).count()
    }
}

#[derive(Clone)]
pub struct Planner {
    llm: Arc<dyn CompletionProvider>,
    max_tokens: u32,
    max_steps: usize,
}

impl Planner {
    pub fn new(llm: Arc<dyn CompletionProvider>, max_tokens: u32, max_steps: usize) -> Self {
        Self {
            llm,
            max_tokens,
            max_steps,
        }
    }

    pub async fn plan(&self, query: &str) -> Result<(Plan, LlmResponse)> {
        let user_message = format!(
            "Запрос пользователя: {}\n\nСоставь план действий для ответа на этот запрос. \
             Если нужен поиск, укажи это явно.",
            query
        );

        let response = self
            .llm
            .complete(&[Message::user(user_message)], Some(SYSTEM_PROMPT), self.max_tokens)
            .await?;

        // No text block means nothing to execute; synthesis runs on the seed context.
        let plan = match response.text.as_deref() {
            Some(text) => Plan::parse(text, self.max_steps),
            None => Plan::default(),
        };

        Ok((plan, response))
    }
}
