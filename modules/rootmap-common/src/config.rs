use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // AI providers
    pub anthropic_api_key: String,
    pub voyage_api_key: String,

    // Dedup
    pub dedup_threshold: f64,
    pub arbiter_model: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            voyage_api_key: required_env("VOYAGE_API_KEY"),
            dedup_threshold: env_f64("DEDUP_THRESHOLD", 0.85),
            arbiter_model: env::var("ARBITER_MODEL")
                .unwrap_or_else(|_| "claude-haiku-4-5".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_f64(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
