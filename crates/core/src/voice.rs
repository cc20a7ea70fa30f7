//! Text-to-speech for interviewer turns.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

pub const SARVAM_TTS_URL: &str = "https://api.sarvam.ai/text-to-speech/stream";

/// Requests that take longer than this fail; the frontend falls back to browser speech.
pub const TTS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("TTS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TTS returned no audio")]
    EmptyAudio,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` into an MP3 clip.
    async fn synthesize(&self, text: &str) -> Result<Bytes, VoiceError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct SarvamRequest<'a> {
    pub text: &'a str,
    pub target_language_code: &'a str,
    pub speaker: &'a str,
    pub model: &'a str,
    pub pace: f64,
    pub speech_sample_rate: u32,
    pub output_audio_codec: &'a str,
    pub enable_preprocessing: bool,
}

impl<'a> SarvamRequest<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            target_language_code: "en-IN",
            speaker: "roopa",
            model: "bulbul:v3",
            pace: 1.2,
            speech_sample_rate: 22050,
            output_audio_codec: "mp3",
            enable_preprocessing: true,
        }
    }
}

/// [`SpeechSynthesizer`] backed by Sarvam's streaming TTS endpoint.
pub struct SarvamVoice {
    client: Client,
    api_key: SecretString,
    endpoint: String,
}

impl SarvamVoice {
    pub fn new(api_key: SecretString) -> Result<Self, VoiceError> {
        let client = Client::builder().timeout(TTS_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: SARVAM_TTS_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for SarvamVoice {
    async fn synthesize(&self, text: &str) -> Result<Bytes, VoiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("api-subscription-key", self.api_key.expose_secret())
            .json(&SarvamRequest::new(text))
            .send()
            .await?
            .error_for_status()?;

        let mut audio = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
        }

        if audio.is_empty() {
            return Err(VoiceError::EmptyAudio);
        }
        tracing::debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio.freeze())
    }
}
