use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where interview questions and evaluations come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Groq,
    /// Deterministic canned interviewer, no network access.
    Offline,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub groq_api_key: Option<SecretString>,
    pub llm_base_url: Option<String>,
    pub chat_model: String,
    pub sarvam_api_key: Option<SecretString>,
    pub prompts_dir: Option<PathBuf>,
    pub session_ttl: Duration,
    pub log_level: Level,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// This function will look for a `.env` file in the current directory
    /// and load the following variables:
    ///
    /// *   `BIND_ADDRESS`: Address to bind (e.g. "0.0.0.0:8000"). When unset, `0.0.0.0:$PORT` is used.
    /// *   `PORT`: (Optional) Port used when `BIND_ADDRESS` is unset. Defaults to 8000.
    /// *   `LLM_PROVIDER`: "groq" or "offline". Defaults to "groq".
    /// *   `GROQ_API_KEY`: Secret key for the Groq API. Required if provider is "groq".
    /// *   `LLM_BASE_URL`: (Optional) Chat completions endpoint overriding Groq's.
    /// *   `CHAT_MODEL`: (Optional) Model name. Defaults to "llama-3.1-8b-instant".
    /// *   `SARVAM_API_KEY`: (Optional) Enables `/voice`. Without it the route answers 500.
    /// *   `PROMPTS_DIR`: (Optional) Directory of `*.md` prompt overrides.
    /// *   `SESSION_TTL_SECS`: (Optional) Idle time before a session is dropped. Defaults to 3600.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(var)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_address_str = match lookup("BIND_ADDRESS") {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", lookup("PORT").unwrap_or_else(|| "8000".to_string())),
        };
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = lookup("LLM_PROVIDER").unwrap_or_else(|| "groq".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "groq" => Provider::Groq,
            "offline" => Provider::Offline,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of groq, offline", other),
                ));
            }
        };

        let groq_api_key = lookup("GROQ_API_KEY").map(SecretString::from);
        let sarvam_api_key = lookup("SARVAM_API_KEY").map(SecretString::from);
        let llm_base_url = lookup("LLM_BASE_URL");
        let prompts_dir = lookup("PROMPTS_DIR").map(PathBuf::from);

        let chat_model = lookup("CHAT_MODEL")
            .unwrap_or_else(|| interview_core::interviewer::DEFAULT_CHAT_MODEL.to_string());

        let ttl_str = lookup("SESSION_TTL_SECS").unwrap_or_else(|| "3600".to_string());
        let session_ttl = ttl_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue("SESSION_TTL_SECS".to_string(), e.to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        if provider == Provider::Groq && groq_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "GROQ_API_KEY must be set for 'groq' provider".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            provider,
            groq_api_key,
            llm_base_url,
            chat_model,
            sarvam_api_key,
            prompts_dir,
            session_ttl,
            log_level,
        })
    }
}
