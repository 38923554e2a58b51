//! Invoker configuration
//!
//! Credentials and model selection are handed to the invokers at
//! construction. Nothing in the library reads the environment on its own;
//! `from_env` exists for the binary.

use anyhow::{anyhow, Result};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_REASONING_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_THINKING_BUDGET: u32 = 16_000;

#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// API base URL, without trailing slash
    pub api_base: String,

    pub api_key: String,

    /// Used for every role except the tie-breaker, and for clarifying questions
    pub fast_model: String,

    /// Used by the tie-breaker
    pub reasoning_model: String,

    /// Thinking tokens granted to the tie-breaker
    pub thinking_budget: u32,

    /// Per-request timeout
    pub timeout: Duration,
}

impl InvokerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            reasoning_model: DEFAULT_REASONING_MODEL.to_string(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
            timeout: Duration::from_secs(120),
        }
    }

    /// Build from `GEMINI_API_KEY` (or `API_KEY`) plus optional overrides
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("GEMINI_API_KEY not set. The war room requires API access."))?;

        let mut config = Self::new(api_key);
        if let Some(base) = lookup("WARROOM_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("WARROOM_FAST_MODEL") {
            config.fast_model = model;
        }
        if let Some(model) = lookup("WARROOM_REASONING_MODEL") {
            config.reasoning_model = model;
        }
        Ok(config)
    }

    pub fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}
