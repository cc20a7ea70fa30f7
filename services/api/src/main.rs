mod config;

use crate::config::{Config, Provider};
use anyhow::{Context, Result};
use interview_api::{AppState, app};
use interview_core::offline::OfflineInterviewer;
use interview_core::prompts::Prompts;
use interview_core::voice::{SarvamVoice, SpeechSynthesizer};
use interview_core::{InterviewEngine, Interviewer, InterviewerClient};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::time::ChronoLocal;

fn build_interviewer(config: &Config) -> Result<Arc<dyn Interviewer>> {
    match config.provider {
        Provider::Offline => {
            tracing::warn!("Using the offline interviewer; questions and scores are canned");
            Ok(Arc::new(OfflineInterviewer))
        }
        Provider::Groq => {
            let prompts = match &config.prompts_dir {
                Some(dir) => Prompts::with_overrides(dir).context("Failed to load LLM prompts")?,
                None => Prompts::builtin(),
            };
            tracing::info!("Loaded {} prompts successfully.", prompts.len());

            let api_key = config
                .groq_api_key
                .clone()
                .context("GROQ_API_KEY must be set for 'groq' provider")?;
            let mut client = InterviewerClient::new(api_key, config.chat_model.clone(), prompts);
            if let Some(url) = &config.llm_base_url {
                client = client.with_endpoint(url.clone());
            }
            Ok(Arc::new(client))
        }
    }
}

fn build_voice(config: &Config) -> Result<Option<Arc<dyn SpeechSynthesizer>>> {
    match &config.sarvam_api_key {
        Some(key) => {
            let voice = SarvamVoice::new(key.clone()).context("Failed to build TTS client")?;
            Ok(Some(Arc::new(voice)))
        }
        None => {
            tracing::warn!("SARVAM_API_KEY not set; /voice will report TTS failures");
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 3. Initialize API Clients ---
    let engine = Arc::new(InterviewEngine::new(build_interviewer(&config)?));
    let voice = build_voice(&config)?;

    // --- 4. Idle Session Sweeper ---
    let sweeper_engine = engine.clone();
    let ttl = config.session_ttl;
    tokio::spawn(async move {
        let period = ttl.clamp(Duration::from_secs(1), Duration::from_secs(300));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let dropped = sweeper_engine.store().purge_idle(ttl).await;
            if dropped > 0 {
                tracing::info!("Dropped {} idle session(s)", dropped);
            }
        }
    });

    // --- 5. Serve ---
    let app = app(AppState { engine, voice });

    tracing::info!("Listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
