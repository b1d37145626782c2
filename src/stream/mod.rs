//! Turns one chat turn into a stream of chunks.
//!
//! A placeholder goes out before any upstream call. The answer follows one
//! chunk per line once it is complete, then the stream closes. Failures never
//! reach the transport: they become a single apology chunk and a normal close,
//! with the detail going only to the log.

pub mod chunk;

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::agent::Agent;
use crate::classify::is_direct_search;
use crate::llm::{CompletionProvider, Message, Role};
use crate::search::{results_for_prompt, SearchMetadata, SearchOptions, SearchProvider};

pub use chunk::{ChunkWriter, ResponseStream, StreamChunk};

const DIRECT_SEARCH_SYSTEM_PROMPT: &str = "Ты AI-помощник с доступом к поисковым результатам. \
Твоя задача - давать точные, полезные ответы на запросы пользователей на русском языке.";

/// Sent when the answer has no text block or only whitespace.
pub const NO_TEXT_REPLY: &str = "Не удалось получить текстовый ответ от модели.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One search, one completion over the raw results.
    DirectSearch,
    /// Plan, per-step searches, final synthesis.
    Agent,
}

impl Mode {
    pub fn for_query(query: &str) -> Self {
        if is_direct_search(query) {
            Mode::DirectSearch
        } else {
            Mode::Agent
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Mode::DirectSearch => "Выполняем поиск...",
            Mode::Agent => "Обрабатываю ваш запрос...",
        }
    }

    pub fn apology(self) -> &'static str {
        match self {
            Mode::DirectSearch => {
                "Произошла ошибка при выполнении поиска. Пожалуйста, попробуйте позже."
            }
            Mode::Agent => {
                "Произошла ошибка при обработке вашего запроса. Пожалуйста, попробуйте позже."
            }
        }
    }
}

/// Inbound chat request as sent by the UI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub system: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("user message is missing or empty")]
    MissingUserMessage,
}

/// A validated request: the last user message plus what preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub history: Vec<Message>,
    pub query: String,
    pub system: Option<String>,
}

impl ChatTurn {
    pub fn from_request(request: ChatRequest) -> Result<Self, RequestValidationError> {
        let ChatRequest {
            mut messages,
            system,
        } = request;

        let index = messages
            .iter()
            .rposition(|m| m.role == Role::User)
            .ok_or(RequestValidationError::MissingUserMessage)?;
        let query = messages[index].content.trim().to_string();
        if query.is_empty() {
            return Err(RequestValidationError::MissingUserMessage);
        }
        messages.truncate(index);

        Ok(Self {
            history: messages,
            query,
            system: system.filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn mode(&self) -> Mode {
        Mode::for_query(&self.query)
    }
}

#[derive(Clone)]
pub struct ResponseStreamer {
    llm: Arc<dyn CompletionProvider>,
    search: Arc<dyn SearchProvider>,
    agent: Agent,
    max_tokens: u32,
}

impl ResponseStreamer {
    pub fn new(
        llm: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchProvider>,
        agent: Agent,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            search,
            agent,
            max_tokens,
        }
    }

    /// Opens a stream for `turn`. The placeholder is already queued when this
    /// returns; the rest is produced by a spawned task that runs to completion
    /// even if the stream is dropped. A panicking run still ends with the
    /// apology chunk.
    pub fn stream_response(&self, turn: ChatTurn) -> ResponseStream {
        let mode = turn.mode();
        let (writer, stream) = ResponseStream::channel();
        writer.status(mode.placeholder());

        let fallback = writer.fallback();
        let streamer = self.clone();
        let run = tokio::spawn(async move {
            streamer.drive(turn, mode, writer).await;
        });
        tokio::spawn(async move {
            match run.await {
                Ok(()) => fallback.close(),
                Err(e) => {
                    error!(?mode, error = %e, "response task aborted");
                    fallback.fail(mode.apology());
                }
            }
        });

        stream
    }

    async fn drive(&self, turn: ChatTurn, mode: Mode, writer: ChunkWriter) {
        info!(?mode, query = %turn.query, "streaming response");

        let outcome = match mode {
            Mode::DirectSearch => self.direct_search(&turn, &writer).await,
            Mode::Agent => self.agent_answer(&turn, &writer).await,
        };

        match outcome {
            Ok(text) if text.trim().is_empty() => {
                warn!(?mode, "answer is blank, sending the fixed reply");
                writer.content_lines(NO_TEXT_REPLY);
                writer.close();
            }
            Ok(text) => {
                writer.content_lines(&text);
                writer.close();
            }
            Err(e) => {
                error!(?mode, error = %format!("{:#}", e), "response failed");
                writer.fail(mode.apology());
            }
        }
    }

    async fn direct_search(&self, turn: &ChatTurn, writer: &ChunkWriter) -> Result<String> {
        let results = self
            .search
            .search(&turn.query, &SearchOptions::default())
            .await?;

        let prompt = format!(
            "Вот мой запрос: \"{}\"\n\nИ вот результаты поиска: {}\n\n\
             Пожалуйста, ответь на мой запрос на основе этих результатов. \
             Будь краток и информативен. Ответ давай на русском языке.",
            turn.query,
            results_for_prompt(&results)?
        );
        writer.set_metadata(SearchMetadata {
            query: turn.query.clone(),
            results,
        });

        let mut messages = turn.history.clone();
        messages.push(Message::user(prompt));
        let system = turn.system.as_deref().unwrap_or(DIRECT_SEARCH_SYSTEM_PROMPT);

        let response = self
            .llm
            .complete(&messages, Some(system), self.max_tokens)
            .await?;

        Ok(response.text.unwrap_or_else(|| NO_TEXT_REPLY.to_string()))
    }

    async fn agent_answer(&self, turn: &ChatTurn, writer: &ChunkWriter) -> Result<String> {
        let run = self.agent.run(&turn.query).await?;

        if let Some(last) = run.searches.into_iter().last() {
            writer.set_metadata(last);
        }
        Ok(run.response)
    }
}
