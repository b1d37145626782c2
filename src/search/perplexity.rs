use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    segment_into_results, source_from_url, Focus, SearchBackend, SearchError, SearchOptions,
    SearchProvider, SearchResult,
};
use crate::config::Config;

const DEFAULT_SYSTEM_PROMPT: &str = "Ты поисковый ассистент. Найди актуальную информацию по запросу \
и перечисли найденные источники списком: заголовок, ссылка и краткое описание.";
const DEFAULT_TEMPERATURE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct PerplexityClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    backend: SearchBackend,
    focus: Focus,
    source_filter: String,
}

#[derive(Debug, Serialize)]
struct StructuredRequest<'a> {
    query: &'a str,
    model: &'a str,
    focus: Focus,
    source_filter: &'a str,
    include_citations: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Either response shape; whichever field is present wins.
#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    results: Option<Vec<RawResult>>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    title: Option<String>,
    url: Option<String>,
    snippet: Option<String>,
    content: Option<String>,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl PerplexityClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, backend: SearchBackend) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            backend,
            focus: Focus::default(),
            source_filter: "reliable_sources_only".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.perplexity_api_key,
            &config.perplexity_base_url,
            &config.search_model,
            config.search_backend,
        )
        .with_focus(config.search_focus)
        .with_source_filter(&config.source_filter)
    }

    pub fn with_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_source_filter(mut self, source_filter: &str) -> Self {
        self.source_filter = source_filter.to_string();
        self
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, SearchError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(SearchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(SearchError::Decode)
    }
}

#[async_trait]
impl SearchProvider for PerplexityClient {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let response = match self.backend {
            SearchBackend::Search => {
                let request = StructuredRequest {
                    query,
                    model: &self.model,
                    focus: options.focus.unwrap_or(self.focus),
                    source_filter: &self.source_filter,
                    include_citations: true,
                };
                self.send("/search", &request).await?
            }
            SearchBackend::Chat => {
                let system = options
                    .system_prompt
                    .as_deref()
                    .unwrap_or(DEFAULT_SYSTEM_PROMPT);
                let request = ChatRequest {
                    model: &self.model,
                    messages: [
                        ChatMessage {
                            role: "system",
                            content: system,
                        },
                        ChatMessage {
                            role: "user",
                            content: query,
                        },
                    ],
                    temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                };
                self.send("/chat/completions", &request).await?
            }
        };

        let results = into_results(response);
        info!(query, count = results.len(), "search finished");
        Ok(results)
    }
}

fn into_results(response: ApiResponse) -> Vec<SearchResult> {
    if let Some(raw) = response.results {
        return raw.into_iter().filter_map(RawResult::into_result).collect();
    }

    match response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
    {
        Some(text) => {
            debug!(chars = text.len(), "segmenting free-form search answer");
            segment_into_results(&text)
        }
        None => Vec::new(),
    }
}

impl RawResult {
    fn into_result(self) -> Option<SearchResult> {
        let title = non_blank(self.title);
        let url = non_blank(self.url);
        let snippet = non_blank(self.snippet)
            .or_else(|| non_blank(self.content))
            .or_else(|| title.clone())?;
        let source = non_blank(self.source).or_else(|| url.as_deref().and_then(source_from_url));

        Some(SearchResult {
            title,
            url,
            snippet,
            source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
