//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::gemini_completion::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};

pub const DEFAULT_LOG_FILTER: &str = "mcp_dev_toolkit=info";
pub const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub export_root: Option<PathBuf>,
    pub initialize_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_blank(lookup("GEMINI_API_KEY")).or_else(|| non_blank(lookup("GOOGLE_API_KEY")));
        Self {
            gemini: GeminiConfig {
                api_key,
                model: non_blank(lookup("DEV_TOOLKIT_MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: non_blank(lookup("DEV_TOOLKIT_PROVIDER_URL"))
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: parse_duration_ms(lookup("DEV_TOOLKIT_PROVIDER_TIMEOUT_MS").as_deref(), DEFAULT_TIMEOUT),
            },
            export_root: non_blank(lookup("DEV_TOOLKIT_EXPORT_ROOT")).map(PathBuf::from),
            initialize_timeout: parse_duration_ms(
                lookup("DEV_TOOLKIT_INITIALIZE_TIMEOUT_MS").as_deref(),
                DEFAULT_INITIALIZE_TIMEOUT,
            ),
        }
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Positive millisecond count, or `default` when absent, zero or unparsable.
pub fn parse_duration_ms(raw: Option<&str>, default: Duration) -> Duration {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(default)
}
