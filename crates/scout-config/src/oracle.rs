use scout_core::AppError;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODELS: &str = "gpt-4o-mini";
const DEFAULT_API_KEY_ENV: &str = "NICHE_SCOUT_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Language-model oracle configuration.
///
/// The API key itself is never stored in the config file; only the name of
/// the environment variable that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// OpenAI-compatible API base URL.
    ///
    /// Examples:
    /// - OpenAI:       https://api.openai.com/v1
    /// - Groq:         https://api.groq.com/openai/v1
    /// - DeepSeek:     https://api.deepseek.com/v1
    /// - Local Ollama: http://localhost:11434/v1
    pub base_url: String,
    /// Comma-separated model list for failover.
    ///
    /// First model is primary; on 429/quota exhaustion, auto-switch to next.
    pub models: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            models: DEFAULT_MODELS.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl OracleConfig {
    /// Read the API key from the process environment.
    ///
    /// A missing or blank key is fatal for the whole cycle.
    pub fn resolve_api_key(&self) -> Result<String, AppError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_api_key`](Self::resolve_api_key) with an explicit lookup.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(AppError::MissingCredential {
                env_var: self.api_key_env.clone(),
            }),
        }
    }

    pub fn model_list(&self) -> Vec<String> {
        self.models
            .split(',')
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Mask an API key for display, keeping a short prefix and suffix.
pub fn mask_api_key(api_key: &str) -> String {
    if api_key.is_empty() {
        return String::new();
    }

    let char_count = api_key.chars().count();
    let prefix: String = api_key.chars().take(3).collect();
    let suffix: String = api_key.chars().skip(char_count.saturating_sub(4)).collect();

    if char_count <= 4 {
        format!("***{suffix}")
    } else {
        format!("{prefix}...{suffix}")
    }
}
