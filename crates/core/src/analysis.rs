//! Post-interview scoring: transcript assembly, the evaluation request sent to
//! the LLM, and tolerant parsing of what comes back.

use crate::prompts::{self, PromptError, Prompts};
use crate::session::{Message, Role};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The conversation flattened into "Interviewer:" / "Candidate:" lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub answer_count: usize,
    pub total_words: usize,
}

impl Transcript {
    pub fn from_conversation(conversation: &[Message]) -> Self {
        let mut transcript = Self::default();
        for message in conversation {
            let speaker = match message.role {
                Role::Assistant => "Interviewer",
                Role::User => "Candidate",
            };
            transcript.text.push_str(speaker);
            transcript.text.push_str(": ");
            transcript.text.push_str(&message.content);
            transcript.text.push('\n');

            if message.role == Role::User {
                transcript.answer_count += 1;
                transcript.total_words += message.content.split_whitespace().count();
            }
        }
        transcript
    }

    pub fn avg_words_per_answer(&self) -> u64 {
        if self.answer_count == 0 {
            return 0;
        }
        (self.total_words as f64 / self.answer_count as f64).round() as u64
    }
}

/// Facts about the session the evaluator needs beyond the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisMetadata {
    pub name: String,
    pub total_questions: u32,
    pub configured_duration: u64,
    pub actual_duration: u64,
    pub early_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub transcript: Transcript,
    pub metadata: AnalysisMetadata,
}

impl EvaluationRequest {
    pub fn new(conversation: &[Message], metadata: AnalysisMetadata) -> Self {
        Self {
            transcript: Transcript::from_conversation(conversation),
            metadata,
        }
    }

    /// Share of the configured duration actually used, in percent.
    pub fn duration_pct(&self) -> u64 {
        if self.metadata.configured_duration == 0 {
            return 0;
        }
        (self.metadata.actual_duration as f64 / self.metadata.configured_duration as f64 * 100.0)
            .round() as u64
    }

    pub fn render(&self, prompts: &Prompts) -> Result<String, PromptError> {
        let meta = &self.metadata;
        let total_questions = meta.total_questions.to_string();
        let answer_count = self.transcript.answer_count.to_string();
        let avg_words = self.transcript.avg_words_per_answer().to_string();
        let actual_duration = meta.actual_duration.to_string();
        let configured_duration = meta.configured_duration.to_string();
        let duration_pct = self.duration_pct().to_string();
        prompts.render(
            prompts::ANALYSIS,
            &[
                ("candidate_name", meta.name.as_str()),
                ("total_questions", total_questions.as_str()),
                ("answer_count", answer_count.as_str()),
                ("avg_words_per_answer", avg_words.as_str()),
                ("actual_duration", actual_duration.as_str()),
                ("configured_duration", configured_duration.as_str()),
                ("duration_pct", duration_pct.as_str()),
                ("early_exit", if meta.early_exit { "True" } else { "False" }),
                ("transcript", self.transcript.text.as_str()),
            ],
        )
    }
}

/// Accepts integers, floats or numeric strings; rounds and clamps to 0..=100.
fn score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom(format!("invalid score: {value}")))?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, deserialize_with = "score")]
    pub technical_score: u8,
    #[serde(default, deserialize_with = "score")]
    pub communication_score: u8,
    #[serde(default, deserialize_with = "score")]
    pub confidence_score: u8,
    #[serde(default, deserialize_with = "score")]
    pub overall_score: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Analysis {
    /// Low scores used when the evaluator's output cannot be parsed. They
    /// scale with participation and never exceed 20.
    pub fn unparseable(answer_count: usize) -> Self {
        let score = (answer_count * 5).min(20) as u8;
        let strengths = if answer_count > 0 {
            "Attempted the interview"
        } else {
            "None identified"
        };
        Self {
            technical_score: score,
            communication_score: score,
            confidence_score: score,
            overall_score: score,
            strengths: vec![strengths.to_string()],
            weaknesses: vec!["Analysis could not be completed - insufficient data".to_string()],
            suggestions: vec![
                "Complete more of the interview for a thorough evaluation".to_string(),
            ],
        }
    }

    /// The fixed payload returned when evaluation fails outright.
    pub fn unavailable() -> Self {
        Self {
            technical_score: 70,
            communication_score: 70,
            confidence_score: 70,
            overall_score: 70,
            strengths: vec!["Interview completed".to_string()],
            weaknesses: vec!["Analysis failed".to_string()],
            suggestions: vec!["Please try again".to_string()],
        }
    }

    /// Caps every score for an interview ended over inappropriate language.
    pub fn apply_abuse_penalty(&mut self) {
        self.technical_score = self.technical_score.min(20);
        self.communication_score = self.communication_score.min(10);
        self.confidence_score = self.confidence_score.min(15);
        self.overall_score = self.overall_score.min(15);
        self.weaknesses.insert(
            0,
            "Interview terminated due to use of inappropriate language".to_string(),
        );
        self.suggestions.insert(
            0,
            "Maintain professional language and conduct during interviews".to_string(),
        );
    }
}

/// Extracts the JSON object from the evaluator's reply, tolerating prose
/// around it.
pub fn parse_analysis(raw: &str, answer_count: usize) -> Analysis {
    let span = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => Some(&raw[start..=end]),
        _ => None,
    };

    match span.map(serde_json::from_str::<Analysis>) {
        Some(Ok(analysis)) => analysis,
        Some(Err(e)) => {
            tracing::warn!("Failed to parse analysis JSON: {}. Raw response: {}", e, raw);
            Analysis::unparseable(answer_count)
        }
        None => {
            tracing::warn!("No JSON object in analysis response: {}", raw);
            Analysis::unparseable(answer_count)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub candidate_name: String,
    pub domain: String,
    pub total_questions: u32,
    pub duration: u64,
    pub configured_duration: u64,
    pub abuse_terminated: bool,
}

/// Everything returned to the client when an interview ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndReport {
    pub analysis: Analysis,
    pub metadata: ReportMetadata,
    pub conversation: Vec<Message>,
}

impl EndReport {
    pub fn fallback() -> Self {
        Self {
            analysis: Analysis::unavailable(),
            metadata: ReportMetadata {
                candidate_name: String::new(),
                domain: String::new(),
                total_questions: 0,
                duration: 0,
                configured_duration: 0,
                abuse_terminated: false,
            },
            conversation: Vec::new(),
        }
    }
}
