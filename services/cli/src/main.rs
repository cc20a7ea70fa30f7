mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Parser;
use interview_core::offline::OfflineInterviewer;
use interview_core::prompts::Prompts;
use interview_core::session_state::StartRequest;
use interview_core::voice::{SarvamVoice, SpeechSynthesizer};
use interview_core::{InterviewEngine, Interviewer, InterviewerClient};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::fmt::time::ChronoLocal;

/// Runs one mock interview in the terminal.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Candidate name; asked for when omitted.
    #[arg(long)]
    name: Option<String>,
    /// Interview role or topic; asked for when omitted.
    #[arg(long)]
    domain: Option<String>,
    /// Interview length in minutes.
    #[arg(long, default_value = "5", value_parser = ["3", "5", "10"])]
    duration: String,
    /// Use the canned offline interviewer instead of the LLM.
    #[arg(long)]
    offline: bool,
    /// Save each interviewer turn as an MP3 in this directory (needs SARVAM_API_KEY).
    #[arg(long)]
    audio_dir: Option<PathBuf>,
}

/// What the runner is doing, logged on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerState {
    Idle,
    Speaking,
    Listening,
    Thinking,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerState::Idle => "idle",
            RunnerState::Speaking => "speaking",
            RunnerState::Listening => "listening",
            RunnerState::Thinking => "thinking",
        };
        f.write_str(name)
    }
}

fn set_state(state: RunnerState) {
    tracing::debug!("Runner state: {}", state);
}

fn audio_path(dir: &Path, turn: usize) -> PathBuf {
    dir.join(format!("turn_{turn:02}.mp3"))
}

struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        let line = self
            .lines
            .next_line()
            .await?
            .context("Standard input closed")?;
        Ok(line.trim().to_string())
    }
}

/// Prints an interviewer turn and, when a voice is configured, saves its audio.
struct Speaker {
    voice: Option<(Arc<dyn SpeechSynthesizer>, PathBuf)>,
    turn: usize,
}

impl Speaker {
    async fn say(&mut self, text: &str) {
        set_state(RunnerState::Speaking);
        println!("\nAI: {text}\n");
        self.turn += 1;

        let Some((voice, dir)) = &self.voice else {
            return;
        };
        let path = audio_path(dir, self.turn);
        match voice.synthesize(text).await {
            Ok(audio) => match tokio::fs::write(&path, &audio).await {
                Ok(()) => {
                    tracing::info!("Saved {} bytes of audio to {}", audio.len(), path.display())
                }
                Err(e) => tracing::warn!("Failed to write {}: {}", path.display(), e),
            },
            Err(e) => tracing::warn!("TTS failed for turn {}: {}", self.turn, e),
        }
    }
}

fn build_interviewer(cli: &Cli, config: &Config) -> Result<Arc<dyn Interviewer>> {
    if cli.offline {
        return Ok(Arc::new(OfflineInterviewer));
    }
    let prompts = match &config.prompts_dir {
        Some(dir) => Prompts::with_overrides(dir).context("Failed to load LLM prompts")?,
        None => Prompts::builtin(),
    };
    let mut client = InterviewerClient::new(
        config.require_groq_key()?,
        config.chat_model.clone(),
        prompts,
    );
    if let Some(url) = &config.llm_base_url {
        client = client.with_endpoint(url.clone());
    }
    Ok(Arc::new(client))
}

async fn build_speaker(cli: &Cli, config: &Config) -> Result<Speaker> {
    let voice = match (&cli.audio_dir, &config.sarvam_api_key) {
        (Some(dir), Some(key)) => {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let voice: Arc<dyn SpeechSynthesizer> = Arc::new(SarvamVoice::new(key.clone())?);
            Some((voice, dir.clone()))
        }
        (Some(_), None) => {
            tracing::warn!("--audio-dir given but SARVAM_API_KEY is not set; audio disabled");
            None
        }
        (None, _) => None,
    };
    Ok(Speaker { voice, turn: 0 })
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

    // --- 3. Parse Command-Line Arguments ---
    let cli = Cli::parse();
    let mut console = Console::new();

    println!("\n====== AI MOCK INTERVIEW ======\n");
    let name = match cli.name.clone() {
        Some(name) => name,
        None => console.ask("Enter your name: ").await?,
    };
    let domain = match cli.domain.clone() {
        Some(domain) => domain,
        None => console.ask("Enter interview role/topic: ").await?,
    };

    // --- 4. Initialize Clients ---
    let engine = InterviewEngine::new(build_interviewer(&cli, &config)?);
    let mut speaker = build_speaker(&cli, &config).await?;

    // --- 5. Interview Loop ---
    set_state(RunnerState::Thinking);
    let started = engine
        .start(StartRequest {
            name,
            domain,
            duration: cli.duration.clone(),
        })
        .await;
    tracing::info!("Interview started, session {}", started.session_id);
    speaker.say(&started.question).await;
    let mut repeat_question = started.repeat_question;

    loop {
        set_state(RunnerState::Listening);
        let text = console.ask("You: ").await?;
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("repeat") {
            println!("\nAI: {repeat_question}\n");
            continue;
        }

        set_state(RunnerState::Thinking);
        let reply = engine.answer(&started.session_id, &text).await?;
        tracing::debug!(
            "Stage {:?}, question {}, {}s elapsed",
            reply.stage,
            reply.question_count,
            reply.elapsed
        );
        speaker.say(&reply.question).await;
        repeat_question = reply.repeat_question.clone();

        if reply.ends_interview() {
            break;
        }
    }

    // --- 6. Analysis ---
    set_state(RunnerState::Thinking);
    println!("Analyzing interview...\n");
    let report = engine.end(&started.session_id).await?;
    set_state(RunnerState::Idle);

    println!("===== INTERVIEW ANALYSIS =====\n");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
