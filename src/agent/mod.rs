pub mod context;
pub mod planner;
pub mod summarizer;
pub mod synthesizer;

use anyhow::{Context as _, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::instrumentation::{RunLog, RunLogger, StepLog};
use crate::llm::CompletionProvider;
use crate::search::{SearchMetadata, SearchOptions, SearchProvider};

pub use context::Context;
pub use planner::{Plan, PlanStep, Planner};
use summarizer::Summarizer;
use synthesizer::Synthesizer;

#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    pub max_tokens: u32,
    pub max_plan_steps: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            max_plan_steps: 10,
        }
    }
}

impl From<&Config> for AgentSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens,
            max_plan_steps: config.max_plan_steps,
        }
    }
}

/// What one run produced. `context` and `plan` are kept for observability.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub response: String,
    pub context: String,
    pub plan: Plan,
    /// Every search performed, in plan order.
    pub searches: Vec<SearchMetadata>,
    pub log: RunLog,
}

/// Plans a query, runs the plan's searches one after another, and writes the
/// final answer from the accumulated context.
#[derive(Clone)]
pub struct Agent {
    planner: Planner,
    summarizer: Summarizer,
    synthesizer: Synthesizer,
    search: Arc<dyn SearchProvider>,
    logger: Option<Arc<RunLogger>>,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchProvider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            planner: Planner::new(llm.clone(), settings.max_tokens, settings.max_plan_steps),
            summarizer: Summarizer::new(llm.clone(), settings.max_tokens),
            synthesizer: Synthesizer::new(llm, settings.max_tokens),
            search,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub async fn run(&self, query: &str) -> Result<AgentRun> {
        let run_start = Instant::now();
        info!(query, "agent run started");

        // Planning
        let plan_start = Instant::now();
        let (plan, plan_response) = self.planner.plan(query).await.context("planning failed")?;
        let plan_latency = plan_start.elapsed().as_millis() as u64;

        info!(
            steps = plan.len(),
            searches = plan.search_steps(),
            latency_ms = plan_latency,
            "plan ready"
        );
        for step in &plan.steps {
            debug!(needs_search = step.needs_search, query = %step.query, "  - {}", step.description);
        }

        // Executing
        let mut context = Context::seed(query);
        let mut steps: Vec<StepLog> = Vec::with_capacity(plan.len());
        let mut searches: Vec<SearchMetadata> = Vec::new();

        for (index, step) in plan.steps.iter().enumerate() {
            let step_start = Instant::now();
            let mut step_log = StepLog {
                step_number: index as u32,
                description: step.description.clone(),
                needs_search: step.needs_search,
                query: step.query.clone(),
                num_results: 0,
                search_latency_ms: 0,
                llm_latency_ms: 0,
                llm_input_tokens: 0,
                llm_output_tokens: 0,
                total_step_latency_ms: 0,
            };

            if step.needs_search {
                let search_start = Instant::now();
                let results = self
                    .search
                    .search(&step.query, &SearchOptions::default())
                    .await
                    .with_context(|| format!("search failed for step {}", index + 1))?;
                step_log.search_latency_ms = search_start.elapsed().as_millis() as u64;
                step_log.num_results = results.len() as u32;

                let llm_start = Instant::now();
                let (summary, summary_response) = self
                    .summarizer
                    .summarize(&results, context.as_str())
                    .await
                    .with_context(|| format!("summarizing step {} failed", index + 1))?;
                step_log.llm_latency_ms = llm_start.elapsed().as_millis() as u64;
                step_log.llm_input_tokens = summary_response.input_tokens;
                step_log.llm_output_tokens = summary_response.output_tokens;

                context.push_search(&step.query, &summary);
                searches.push(SearchMetadata {
                    query: step.query.clone(),
                    results,
                });
            } else {
                context.push_step(&step.description);
            }

            step_log.total_step_latency_ms = step_start.elapsed().as_millis() as u64;
            info!(
                step = index + 1,
                needs_search = step_log.needs_search,
                results = step_log.num_results,
                search_ms = step_log.search_latency_ms,
                llm_ms = step_log.llm_latency_ms,
                "step done"
            );
            steps.push(step_log);
        }

        debug!(chars = context.as_str().len(), "context:\n{}", context);

        // Synthesizing
        let synth_start = Instant::now();
        let (response, synth_response) = self
            .synthesizer
            .synthesize(context.as_str())
            .await
            .context("final synthesis failed")?;
        let synth_latency = synth_start.elapsed().as_millis() as u64;

        let total_llm_input_tokens = plan_response.input_tokens
            + synth_response.input_tokens
            + steps.iter().map(|s| s.llm_input_tokens).sum::<u32>();
        let total_llm_output_tokens = plan_response.output_tokens
            + synth_response.output_tokens
            + steps.iter().map(|s| s.llm_output_tokens).sum::<u32>();

        let log = RunLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            query: query.to_string(),
            steps,
            plan_latency_ms: plan_latency,
            plan_input_tokens: plan_response.input_tokens,
            plan_output_tokens: plan_response.output_tokens,
            synthesis_latency_ms: synth_latency,
            synthesis_input_tokens: synth_response.input_tokens,
            synthesis_output_tokens: synth_response.output_tokens,
            total_latency_ms: run_start.elapsed().as_millis() as u64,
            total_llm_input_tokens,
            total_llm_output_tokens,
        };

        info!(run_id = %log.id, "{}", log.summary());
        if let Some(logger) = self.logger.clone() {
            let entry = log.clone();
            match tokio::task::spawn_blocking(move || logger.write(&entry)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "failed to write run log"),
                Err(e) => warn!(error = %e, "run log writer task failed"),
            }
        }

        Ok(AgentRun {
            response,
            context: context.into_string(),
            plan,
            searches,
            log,
        })
    }
}
