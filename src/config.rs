use anyhow::{Context, Result};

use crate::search::{Focus, SearchBackend};

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub completion_model: String,
    pub max_tokens: u32,
    pub perplexity_api_key: String,
    pub perplexity_base_url: String,
    pub search_model: String,
    pub search_backend: SearchBackend,
    pub search_focus: Focus,
    pub source_filter: String,
    pub max_plan_steps: usize,
    pub bind_addr: String,
    pub run_log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        Ok(Self {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY")
                .context("ANTHROPIC_API_KEY must be set")?,
            anthropic_base_url: var("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            completion_model: var("COMPLETION_MODEL", "claude-3-haiku-20240307"),
            max_tokens: var("MAX_TOKENS", "1024")
                .parse()
                .context("MAX_TOKENS must be a number")?,
            perplexity_api_key: lookup("PERPLEXITY_API_KEY")
                .context("PERPLEXITY_API_KEY must be set")?,
            perplexity_base_url: var("PERPLEXITY_BASE_URL", "https://api.perplexity.ai"),
            search_model: var("SEARCH_MODEL", "sonar-pro"),
            search_backend: var("SEARCH_BACKEND", "search")
                .parse()
                .context("SEARCH_BACKEND must be `search` or `chat`")?,
            search_focus: var("SEARCH_FOCUS", "technical")
                .parse()
                .context("SEARCH_FOCUS must be one of technical, general, news, writing")?,
            source_filter: var("SOURCE_FILTER", "reliable_sources_only"),
            max_plan_steps: var("MAX_PLAN_STEPS", "10")
                .parse()
                .context("MAX_PLAN_STEPS must be a number")?,
            bind_addr: var("BIND_ADDR", "0.0.0.0:3000"),
            run_log_dir: lookup("RUN_LOG_DIR").filter(|dir| !dir.trim().is_empty()),
        })
    }
}
