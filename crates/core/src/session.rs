use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Who said a line of the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

/// One turn of the conversation, in the shape the chat completions API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The branch that will handle the candidate's next input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Technical,
    Closing,
    CandidateQuestions,
    Final,
}

/// Configured length of an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterviewDuration(u64);

impl InterviewDuration {
    pub const SHORT: Self = Self(3 * 60);
    pub const STANDARD: Self = Self(5 * 60);
    pub const LONG: Self = Self(10 * 60);

    /// Parses the duration choice sent by the client ("3", "5" or "10" minutes).
    /// Unknown choices fall back to the standard five minutes.
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim() {
            "3" => Self::SHORT,
            "10" => Self::LONG,
            _ => Self::STANDARD,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl Default for InterviewDuration {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Server-held record of one candidate's interview.
#[derive(Debug, Clone)]
pub struct Session {
    pub name: String,
    pub domain: String,
    pub duration: InterviewDuration,
    pub started_at: Instant,
    pub last_activity: Instant,
    pub stage: Stage,
    pub question_count: u32,
    pub time_warning_given: bool,
    pub abuse_terminated: bool,
    pub conversation: Vec<Message>,
}

impl Session {
    pub fn new(name: impl Into<String>, domain: impl Into<String>, duration: InterviewDuration) -> Self {
        let now = Instant::now();
        Self {
            name: name.into(),
            domain: domain.into(),
            duration,
            started_at: now,
            last_activity: now,
            stage: Stage::Technical,
            question_count: 0,
            time_warning_given: false,
            abuse_terminated: false,
            conversation: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "Candidate" } else { name }
    }

    pub fn first_name(&self) -> &str {
        self.name
            .split_whitespace()
            .next()
            .unwrap_or_else(|| self.display_name())
    }

    /// Question budget: two per configured minute, never fewer than five.
    pub fn max_questions(&self) -> u32 {
        let per_minute = (self.duration.as_secs() / 60) as u32 * 2;
        per_minute.max(5)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Seconds left in the configured duration; negative once overrun.
    pub fn remaining(&self, elapsed: Duration) -> i64 {
        self.duration.as_secs() as i64 - elapsed.as_secs() as i64
    }

    /// True when the interview ended before half of its configured time.
    pub fn is_early_exit(&self, elapsed: Duration) -> bool {
        elapsed.as_secs_f64() < self.duration.as_secs() as f64 * 0.5
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.conversation.push(Message::assistant(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.conversation.push(Message::user(content));
    }

    /// The trailing window of conversation given to the LLM as context.
    pub fn recent_history(&self, window: usize) -> &[Message] {
        let start = self.conversation.len().saturating_sub(window);
        &self.conversation[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_choices_map_to_minutes() {
        assert_eq!(InterviewDuration::from_choice("3").as_secs(), 180);
        assert_eq!(InterviewDuration::from_choice("5").as_secs(), 300);
        assert_eq!(InterviewDuration::from_choice("10").as_secs(), 600);
        assert_eq!(InterviewDuration::from_choice("forever").as_secs(), 300);
        assert_eq!(InterviewDuration::from_choice(" 10 ").as_secs(), 600);
    }

    #[test]
    fn question_budget_scales_with_duration() {
        let short = Session::new("A", "Rust", InterviewDuration::SHORT);
        let standard = Session::new("A", "Rust", InterviewDuration::STANDARD);
        let long = Session::new("A", "Rust", InterviewDuration::LONG);
        assert_eq!(short.max_questions(), 6);
        assert_eq!(standard.max_questions(), 10);
        assert_eq!(long.max_questions(), 20);
        let tiny = Session::new("A", "Rust", InterviewDuration::from_secs(60));
        assert_eq!(tiny.max_questions(), 5);
    }

    #[test]
    fn names_fall_back_to_candidate() {
        let session = Session::new("  ", "Rust", InterviewDuration::STANDARD);
        assert_eq!(session.display_name(), "Candidate");
        assert_eq!(session.first_name(), "Candidate");

        let session = Session::new("Ravi Pandey", "Rust", InterviewDuration::STANDARD);
        assert_eq!(session.first_name(), "Ravi");
        assert_eq!(session.display_name(), "Ravi Pandey");
    }

    #[test]
    fn remaining_goes_negative_after_overrun() {
        let session = Session::new("A", "Rust", InterviewDuration::SHORT);
        assert_eq!(session.remaining(Duration::from_secs(170)), 10);
        assert_eq!(session.remaining(Duration::from_secs(200)), -20);
        assert!(session.is_early_exit(Duration::from_secs(89)));
        assert!(!session.is_early_exit(Duration::from_secs(90)));
    }

    #[test]
    fn recent_history_is_a_trailing_window() {
        let mut session = Session::new("A", "Rust", InterviewDuration::SHORT);
        for i in 0..8 {
            session.push_user(format!("answer {i}"));
        }
        let window = session.recent_history(6);
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].content, "answer 2");
        assert_eq!(session.recent_history(20).len(), 8);
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
        let json = serde_json::to_value(Stage::CandidateQuestions).unwrap();
        assert_eq!(json, "candidate_questions");
    }
}
