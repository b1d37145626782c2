//! Web search through Perplexity.
//!
//! The provider answers either with a structured `results` list or with free
//! generated text; the latter is cut into records by [`segment_into_results`].

pub mod perplexity;
pub mod segment;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use perplexity::PerplexityClient;
pub use segment::segment_into_results;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Always non-empty.
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchResult {
    pub fn from_snippet(snippet: impl Into<String>) -> Self {
        Self {
            title: None,
            url: None,
            snippet: snippet.into(),
            source: None,
        }
    }
}

/// The query and what it returned, as shown next to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    #[default]
    Technical,
    General,
    News,
    Writing,
}

impl FromStr for Focus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(Self::Technical),
            "general" => Ok(Self::General),
            "news" => Ok(Self::News),
            "writing" => Ok(Self::Writing),
            other => anyhow::bail!("unknown search focus: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    /// `POST /search`, structured results.
    Search,
    /// `POST /chat/completions`, free text to segment.
    Chat,
}

impl FromStr for SearchBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(Self::Search),
            "chat" => Ok(Self::Chat),
            other => anyhow::bail!("unknown search backend: {}", other),
        }
    }
}

/// Per-call hints. Unset fields take the client's configured defaults.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub focus: Option<Focus>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("failed to send request to search API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("search API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse search API response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Stated in place of an empty result list so prompts never see a bare `[]`.
pub const NO_RESULTS_NOTE: &str = "по запросу ничего не найдено";

/// Results as embedded into a completion prompt.
pub fn results_for_prompt(results: &[SearchResult]) -> serde_json::Result<String> {
    if results.is_empty() {
        return Ok(NO_RESULTS_NOTE.to_string());
    }
    serde_json::to_string(results)
}

/// Host part of a URL without a leading `www.`.
pub(crate) fn source_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
