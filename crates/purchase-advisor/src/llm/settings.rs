use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Language-model channel configuration, read from the environment.
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// Bound on a single generation call. Elapsing is not an error: the
    /// generator reports "no response" and the caller degrades.
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn from_env() -> Self {
        let base_url = env::var("ADVISOR_LLM_BASE_URL")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = env::var("ADVISOR_LLM_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok();
        let model = env::var("ADVISOR_LLM_MODEL")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let temperature = env::var("ADVISOR_LLM_TEMPERATURE")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);
        let max_output_tokens = env::var("ADVISOR_LLM_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);
        let timeout = env::var("ADVISOR_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            base_url,
            api_key,
            model,
            temperature,
            max_output_tokens,
            timeout,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
