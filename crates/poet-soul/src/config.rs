//! Soul configuration from environment variables.

use std::time::Duration;

use crate::error::SoulError;
use crate::prompts::{DEFAULT_INITIAL_PROMPT, PHILOSOPHER_PROMPT};

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_THINK_INTERVAL_SECS: u64 = 600;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 60;

/// Which hosted model API backs the thinker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }
}

/// Configuration for the soul.
#[derive(Clone)]
pub struct SoulConfig {
    /// Model backend (env: LLM_PROVIDER, default: openai).
    pub provider: LlmProvider,
    /// API key for the selected provider. If absent, the soul runs dormant.
    pub llm_api_key: Option<String>,
    /// Model name for the selected provider.
    pub llm_model: String,
    /// API root for the selected provider.
    pub llm_base_url: String,
    /// HTTP timeout for one completion request (env: LLM_TIMEOUT_SECS, default: 120).
    pub llm_timeout_secs: u64,
    /// Seed prompt for the first cycle.
    pub initial_prompt: String,
    /// System instruction sent with every completion.
    pub personality: String,
    /// Sleep after a recorded thought (env: POET_THINK_INTERVAL_SECS, default: 600).
    pub think_interval_secs: u64,
    /// Sleep after a failed cycle (env: POET_RETRY_INTERVAL_SECS, default: 60).
    pub retry_interval_secs: u64,
}

impl std::fmt::Debug for SoulConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoulConfig")
            .field("provider", &self.provider)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("llm_model", &self.llm_model)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("initial_prompt", &self.initial_prompt)
            .field("think_interval_secs", &self.think_interval_secs)
            .field("retry_interval_secs", &self.retry_interval_secs)
            .finish()
    }
}

impl Default for SoulConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            llm_api_key: None,
            llm_model: DEFAULT_OPENAI_MODEL.to_string(),
            llm_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            initial_prompt: DEFAULT_INITIAL_PROMPT.to_string(),
            personality: PHILOSOPHER_PROMPT.to_string(),
            think_interval_secs: DEFAULT_THINK_INTERVAL_SECS,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

impl SoulConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, SoulError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SoulError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let provider = match non_empty("LLM_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw)
                .ok_or_else(|| SoulError::Config(format!("unknown LLM_PROVIDER: {raw}")))?,
            None => LlmProvider::OpenAi,
        };

        let (llm_api_key, llm_model, llm_base_url) = match provider {
            LlmProvider::OpenAi => (
                non_empty("OPENAI_API_KEY"),
                non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                non_empty("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            ),
            LlmProvider::Gemini => (
                non_empty("GEMINI_API_KEY"),
                non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                non_empty("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            ),
        };

        let llm_timeout_secs = parse_secs(&non_empty, "LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?;
        let think_interval_secs = parse_secs(
            &non_empty,
            "POET_THINK_INTERVAL_SECS",
            DEFAULT_THINK_INTERVAL_SECS,
        )?;
        let retry_interval_secs = parse_secs(
            &non_empty,
            "POET_RETRY_INTERVAL_SECS",
            DEFAULT_RETRY_INTERVAL_SECS,
        )?;

        let initial_prompt =
            non_empty("POET_INITIAL_PROMPT").unwrap_or_else(|| DEFAULT_INITIAL_PROMPT.to_string());

        let personality =
            non_empty("POET_PERSONALITY").unwrap_or_else(|| PHILOSOPHER_PROMPT.to_string());

        Ok(Self {
            provider,
            llm_api_key,
            llm_model,
            llm_base_url,
            llm_timeout_secs,
            initial_prompt,
            personality,
            think_interval_secs,
            retry_interval_secs,
        })
    }

    /// True when no API key is configured for the selected provider.
    pub fn is_dormant(&self) -> bool {
        self.llm_api_key.is_none()
    }

    pub fn think_interval(&self) -> Duration {
        Duration::from_secs(self.think_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

/// Parse a positive number of seconds, falling back to `default` when unset.
fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, SoulError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(SoulError::Config(format!("{key} must be greater than zero"))),
        Ok(secs) => Ok(secs),
        Err(_) => Err(SoulError::Config(format!("{key} is not a number: {raw}"))),
    }
}
