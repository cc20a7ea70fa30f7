use crate::analysis::EvaluationRequest;
use crate::prompts::{self, Prompts};
use crate::session::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

pub const GROQ_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

/// Context for generating the next technical question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub name: String,
    pub domain: String,
    pub history: Vec<Message>,
}

/// Everything the interview delegates to a language model.
///
/// Implementations return the model's raw text; parsing and fallbacks live
/// with the state machine so they can be tested without a network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Interviewer: Send + Sync {
    /// Next question, optionally preceded by a short correction and a `---` line.
    async fn generate_question(&self, request: &QuestionRequest) -> Result<String>;

    /// A `RELEVANT:` or `IRRELEVANT:` prefixed reply to the candidate's question.
    async fn check_question_relevance(&self, question: &str, domain: &str) -> Result<String>;

    /// Scores the finished interview; expected to contain a JSON object.
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String>;
}

/// [`Interviewer`] backed by an OpenAI-compatible chat completions endpoint.
pub struct InterviewerClient {
    client: Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    prompts: Prompts,
}

impl InterviewerClient {
    pub fn new(api_key: SecretString, model: String, prompts: Prompts) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint: GROQ_CHAT_COMPLETIONS_URL.to_string(),
            model,
            prompts,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn chat(&self, messages: Vec<Value>, temperature: f32, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<LlmResponse>()
            .await?;

        let answer = &resp
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("No response from LLM"))?
            .message
            .content;
        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl Interviewer for InterviewerClient {
    async fn generate_question(&self, request: &QuestionRequest) -> Result<String> {
        let system_prompt = self.prompts.render(
            prompts::QUESTION,
            &[("name", request.name.as_str()), ("domain", request.domain.as_str())],
        )?;

        let mut messages = vec![json!({ "role": "system", "content": system_prompt })];
        for message in &request.history {
            messages.push(serde_json::to_value(message)?);
        }

        self.chat(messages, 0.6, 80)
            .await
            .context("Question generation request failed")
    }

    async fn check_question_relevance(&self, question: &str, domain: &str) -> Result<String> {
        let prompt = self.prompts.render(
            prompts::RELEVANCE,
            &[("domain", domain), ("question", question)],
        )?;

        self.chat(vec![json!({ "role": "user", "content": prompt })], 0.3, 150)
            .await
            .context("Relevance check request failed")
    }

    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String> {
        let prompt = request.render(&self.prompts)?;

        self.chat(vec![json!({ "role": "user", "content": prompt })], 0.1, 400)
            .await
            .context("Interview evaluation request failed")
    }
}
