use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "mock")]
    Mock,
}

impl Default for LlmProvider {
    fn default() -> Self {
        LlmProvider::OpenAI
    }
}

impl LlmProvider {
    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-sonnet",
            LlmProvider::Mock => "mock",
        }
    }

    fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmProvider::Mock => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub kube: KubeConfig,
    #[serde(default)]
    pub queries: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub max_turns: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubeConfig {
    /// Kubeconfig context to use instead of the current one.
    pub context: Option<String>,
    pub request_timeout: Duration,
}

/// Knobs for the query functions and the cluster summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Pods restarted more often than this are reported as unhealthy.
    pub restart_threshold: i32,
    /// How long a pod may sit in `Pending` before it counts as unhealthy.
    pub pending_grace: Duration,
    /// Upper bound on the unhealthy pods listed in a summary.
    pub unhealthy_limit: usize,
    pub event_limit: usize,
    /// Events last seen before this window are dropped. `None` keeps everything.
    pub event_window: Option<Duration>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            restart_threshold: 5,
            pending_grace: Duration::from_secs(300),
            unhealthy_limit: 10,
            event_limit: 20,
            event_window: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER")
            .unwrap_or_else(|| "openai".to_string())
            .to_lowercase()
            .as_str()
        {
            "openai" => LlmProvider::OpenAI,
            "anthropic" | "claude" => LlmProvider::Anthropic,
            "mock" => LlmProvider::Mock,
            other => {
                return Err(crate::Error::Config(format!(
                    "unsupported LLM_PROVIDER '{}' (expected openai, anthropic or mock)",
                    other
                )))
            }
        };

        let api_key = provider
            .api_key_var()
            .and_then(|name| var(name))
            .or_else(|| var("LLM_API_KEY"));

        if provider != LlmProvider::Mock && api_key.is_none() {
            return Err(crate::Error::Config(format!(
                "{} environment variable is required",
                provider.api_key_var().unwrap_or("LLM_API_KEY")
            )));
        }

        let defaults = QueryConfig::default();
        let config = Config {
            llm: LlmConfig {
                provider,
                api_key,
                model: var("LLM_MODEL")
                    .or_else(|| var("OPENAI_MODEL"))
                    .unwrap_or_else(|| provider.default_model().to_string()),
                temperature: parse_or(&var, "LLM_TEMPERATURE", 0.0),
                max_tokens: parse_or(&var, "LLM_MAX_TOKENS", 4096),
                max_turns: parse_or(&var, "LLM_MAX_TURNS", 10),
                timeout: Duration::from_secs(parse_or(&var, "LLM_TIMEOUT_SECS", 120)),
            },
            kube: KubeConfig {
                context: var("KUBE_CONTEXT"),
                request_timeout: Duration::from_secs(parse_or(&var, "KUBE_TIMEOUT_SECS", 15)),
            },
            queries: QueryConfig {
                restart_threshold: parse_or(
                    &var,
                    "KUBEBOY_RESTART_THRESHOLD",
                    defaults.restart_threshold,
                ),
                pending_grace: Duration::from_secs(parse_or(
                    &var,
                    "KUBEBOY_PENDING_GRACE_SECS",
                    defaults.pending_grace.as_secs(),
                )),
                unhealthy_limit: parse_or(&var, "KUBEBOY_UNHEALTHY_LIMIT", defaults.unhealthy_limit),
                event_limit: parse_or(&var, "KUBEBOY_EVENT_LIMIT", defaults.event_limit),
                event_window: match parse_or(&var, "KUBEBOY_EVENT_WINDOW_MINUTES", 60u64) {
                    0 => None,
                    minutes => Some(Duration::from_secs(minutes.saturating_mul(60))),
                },
            },
        };

        Ok(config)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value '{}' for {}", raw, key);
            default
        }),
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Mock,
                api_key: None,
                model: LlmProvider::Mock.default_model().to_string(),
                temperature: 0.0,
                max_tokens: 4096,
                max_turns: 10,
                timeout: Duration::from_secs(120),
            },
            kube: KubeConfig {
                context: None,
                request_timeout: Duration::from_secs(15),
            },
            queries: QueryConfig::default(),
        }
    }
}
