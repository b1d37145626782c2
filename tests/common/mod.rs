//! Deterministic provider doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use agentic_chat::agent::{Agent, AgentSettings};
use agentic_chat::llm::{CompletionError, CompletionProvider, LlmResponse, Message};
use agentic_chat::routes::AppState;
use agentic_chat::search::{SearchError, SearchOptions, SearchProvider, SearchResult};
use agentic_chat::stream::ResponseStreamer;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(&'static str),
    NoText,
    Fail,
    Panic,
}

#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub messages: Vec<Message>,
    pub system: Option<String>,
}

impl CompletionCall {
    pub fn last_content(&self) -> &str {
        &self.messages.last().expect("call without messages").content
    }
}

/// Answers completions from a fixed script, in order.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<CompletionCall>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        _max_tokens: u32,
    ) -> Result<LlmResponse, CompletionError> {
        self.calls.lock().unwrap().push(CompletionCall {
            messages: messages.to_vec(),
            system: system.map(str::to_string),
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(LlmResponse {
                text: Some(text.to_string()),
                input_tokens: 10,
                output_tokens: 5,
            }),
            Some(Reply::NoText) => Ok(LlmResponse::default()),
            Some(Reply::Fail) => Err(CompletionError::Status {
                status: 500,
                body: "upstream exploded".to_string(),
            }),
            Some(Reply::Panic) => panic!("scripted completion panicked"),
            None => Err(CompletionError::Status {
                status: 599,
                body: "script exhausted".to_string(),
            }),
        }
    }
}

/// Returns the same results for every query, or fails every time.
pub struct StubSearch {
    results: Option<Vec<SearchResult>>,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn returning(results: Vec<SearchResult>) -> Arc<Self> {
        Arc::new(Self {
            results: Some(results),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            results: None,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(
        &self,
        query: &str,
        _options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.results {
            Some(results) => Ok(results.clone()),
            None => Err(SearchError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        }
    }
}

pub fn cat_results() -> Vec<SearchResult> {
    vec![SearchResult {
        title: Some("Кошки".to_string()),
        url: Some("https://example.com/cats".to_string()),
        snippet: "Кошки спят до 16 часов в сутки.".to_string(),
        source: Some("example.com".to_string()),
    }]
}

pub fn agent(llm: &Arc<ScriptedCompletion>, search: &Arc<StubSearch>) -> Agent {
    Agent::new(llm.clone(), search.clone(), AgentSettings::default())
}

pub fn streamer(llm: &Arc<ScriptedCompletion>, search: &Arc<StubSearch>) -> ResponseStreamer {
    ResponseStreamer::new(llm.clone(), search.clone(), agent(llm, search), 1024)
}

pub fn app_state(llm: &Arc<ScriptedCompletion>, search: &Arc<StubSearch>) -> AppState {
    AppState {
        streamer: streamer(llm, search),
        search: search.clone(),
    }
}
