use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLog {
    pub step_number: u32,
    pub description: String,
    pub needs_search: bool,
    pub query: String,
    pub num_results: u32,
    pub search_latency_ms: u64,
    pub llm_latency_ms: u64,
    pub llm_input_tokens: u32,
    pub llm_output_tokens: u32,
    pub total_step_latency_ms: u64,
}

/// Timing and token usage of one agent run. Holds the query but not the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: String,
    pub timestamp: String,
    pub query: String,
    pub steps: Vec<StepLog>,
    pub plan_latency_ms: u64,
    pub plan_input_tokens: u32,
    pub plan_output_tokens: u32,
    pub synthesis_latency_ms: u64,
    pub synthesis_input_tokens: u32,
    pub synthesis_output_tokens: u32,
    pub total_latency_ms: u64,
    pub total_llm_input_tokens: u32,
    pub total_llm_output_tokens: u32,
}

impl RunLog {
    pub fn total_tokens(&self) -> u32 {
        self.total_llm_input_tokens + self.total_llm_output_tokens
    }

    pub fn searches(&self) -> usize {
        self.steps.iter().filter(|s| s.needs_search).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Steps: {} (searches: {}) | Total latency: {:.1}s | Results retrieved: {} | Tokens used by LLM: {}",
            self.steps.len(),
            self.searches(),
            self.total_latency_ms as f64 / 1000.0,
            self.steps.iter().map(|s| s.num_results).sum::<u32>(),
            self.total_tokens(),
        )
    }
}

pub struct RunLogger {
    dir: PathBuf,
}

impl RunLogger {
    pub fn new(dir: &str) -> Result<Self> {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir).context("Failed to create run log directory")?;
        Ok(Self { dir })
    }

    pub fn write(&self, run_log: &RunLog) -> Result<()> {
        let path = self.dir.join("runs.jsonl");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open run log file")?;

        let json = serde_json::to_string(run_log).context("Failed to serialize run log")?;
        writeln!(file, "{}", json).context("Failed to write run log")?;

        Ok(())
    }
}
