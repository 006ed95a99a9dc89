use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tripit_agents::provider::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use tripit_agents::{GenerationConfig, ProviderConfig};

const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
];

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    /// token -> user id
    pub dev_tokens: HashMap<String, String>,
}

/// Process configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub catalog_path: PathBuf,
    pub database_url: Option<String>,
    pub provider: Option<ProviderConfig>,
    pub generation: GenerationConfig,
    pub rate_limit: RateLimitSettings,
    pub allowed_origins: Vec<String>,
    pub auth: AuthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            catalog_path: PathBuf::from("data/destinations.json"),
            database_url: None,
            provider: None,
            generation: GenerationConfig::default(),
            rate_limit: RateLimitSettings::default(),
            allowed_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
            auth: AuthSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from any variable source; unset or unparsable values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Settings::default();
        let generation_defaults = defaults.generation.clone();

        let provider = var("TRIPIT_LLM_API_KEY")
            .or_else(|| var("GROQ_API_KEY"))
            .map(|api_key| ProviderConfig {
                api_key,
                base_url: var("TRIPIT_LLM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: var("TRIPIT_LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            });

        let generation = GenerationConfig {
            max_attempts: parse_or(
                var("TRIPIT_AI_MAX_RETRIES"),
                generation_defaults.max_attempts,
            ),
            structured_temperature: parse_or(
                var("TRIPIT_AI_TEMPERATURE_STRUCTURED"),
                generation_defaults.structured_temperature,
            ),
            creative_temperature: parse_or(
                var("TRIPIT_AI_TEMPERATURE_CREATIVE"),
                generation_defaults.creative_temperature,
            ),
            attempt_timeout: var("TRIPIT_AI_ATTEMPT_TIMEOUT_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(generation_defaults.attempt_timeout),
            retry_backoff: var("TRIPIT_AI_RETRY_BACKOFF_MILLIS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(generation_defaults.retry_backoff),
            ..generation_defaults
        };

        let rate_limit = RateLimitSettings {
            enabled: var("TRIPIT_RATE_LIMIT_ENABLED")
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.rate_limit.enabled),
            max_requests: parse_or(
                var("TRIPIT_RATE_LIMIT_REQUESTS"),
                defaults.rate_limit.max_requests,
            ),
            window: var("TRIPIT_RATE_LIMIT_WINDOW_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit.window),
        };

        let allowed_origins = var("TRIPIT_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.allowed_origins);

        let auth = AuthSettings {
            remote_url: var("TRIPIT_AUTH_URL"),
            remote_key: var("TRIPIT_AUTH_KEY"),
            dev_tokens: var("TRIPIT_DEV_TOKENS")
                .map(|value| parse_dev_tokens(&value))
                .unwrap_or_default(),
        };

        Self {
            bind: var("TRIPIT_BIND").unwrap_or(defaults.bind),
            catalog_path: var("TRIPIT_CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            database_url: var("TRIPIT_DATABASE_URL"),
            provider,
            generation,
            rate_limit,
            allowed_origins,
            auth,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// `token=user,token2=user2`
fn parse_dev_tokens(value: &str) -> HashMap<String, String> {
    value
        .split(',')
        .filter_map(|pair| {
            let (token, user) = pair.split_once('=')?;
            let (token, user) = (token.trim(), user.trim());
            (!token.is_empty() && !user.is_empty()).then(|| (token.to_string(), user.to_string()))
        })
        .collect()
}
