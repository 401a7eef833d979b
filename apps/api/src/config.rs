use anyhow::{Context, Result};

const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const MAX_LLM_ATTEMPTS: u32 = 5;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub llm_timeout_secs: u64,
    /// Total attempts per model call, including the first one.
    pub llm_max_retries: u32,
    pub port: u16,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_API_URL.to_string()),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            llm_max_retries: clamp_attempts(parse_env("LLM_MAX_RETRIES", 3)?),
            port: parse_env("PORT", 5055)?,
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests(anthropic_api_url: &str, llm_max_retries: u32) -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            anthropic_api_url: anthropic_api_url.to_string(),
            llm_timeout_secs: 5,
            llm_max_retries,
            port: 0,
            cors_allowed_origins: Vec::new(),
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// At least one attempt, at most `MAX_LLM_ATTEMPTS`.
fn clamp_attempts(attempts: u32) -> u32 {
    attempts.clamp(1, MAX_LLM_ATTEMPTS)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
