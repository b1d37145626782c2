//! Chat backend that answers through Claude and, for search-flavoured queries,
//! grounds the answer in Perplexity web search.

pub mod agent;
pub mod classify;
pub mod config;
pub mod instrumentation;
pub mod llm;
pub mod routes;
pub mod search;
pub mod stream;

use std::sync::Arc;

use anyhow::Result;

use agent::{Agent, AgentSettings};
use config::Config;
use instrumentation::RunLogger;
use llm::{AnthropicClient, CompletionProvider};
use routes::AppState;
use search::{PerplexityClient, SearchProvider};
use stream::ResponseStreamer;

/// Builds the provider clients once and wires them into the shared state.
pub fn build_state(config: &Config) -> Result<AppState> {
    let llm: Arc<dyn CompletionProvider> = Arc::new(AnthropicClient::new(
        &config.anthropic_api_key,
        &config.anthropic_base_url,
        &config.completion_model,
    ));
    let search: Arc<dyn SearchProvider> = Arc::new(PerplexityClient::from_config(config));

    let mut agent = Agent::new(llm.clone(), search.clone(), AgentSettings::from(config));
    if let Some(dir) = &config.run_log_dir {
        agent = agent.with_logger(RunLogger::new(dir)?);
    }

    Ok(AppState {
        streamer: ResponseStreamer::new(llm, search.clone(), agent, config.max_tokens),
        search,
    })
}
