use secrecy::SecretString;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Environment settings for the console runner. Interview choices come from
/// the command line instead.
pub struct Config {
    pub groq_api_key: Option<SecretString>,
    pub llm_base_url: Option<String>,
    pub chat_model: String,
    pub sarvam_api_key: Option<SecretString>,
    pub prompts_dir: Option<PathBuf>,
    pub log_level: Level,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Reads `GROQ_API_KEY`, `LLM_BASE_URL`, `CHAT_MODEL`, `SARVAM_API_KEY`,
    /// `PROMPTS_DIR` and `RUST_LOG`, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            groq_api_key: var("GROQ_API_KEY").map(SecretString::from),
            llm_base_url: var("LLM_BASE_URL"),
            chat_model: var("CHAT_MODEL")
                .unwrap_or_else(|| interview_core::interviewer::DEFAULT_CHAT_MODEL.to_string()),
            sarvam_api_key: var("SARVAM_API_KEY").map(SecretString::from),
            prompts_dir: var("PROMPTS_DIR").map(PathBuf::from),
            log_level,
        })
    }

    /// The Groq key, required unless the runner is offline.
    pub fn require_groq_key(&self) -> Result<SecretString, ConfigError> {
        self.groq_api_key.clone().ok_or_else(|| {
            ConfigError::MissingVar("GROQ_API_KEY must be set unless --offline is given".to_string())
        })
    }
}
