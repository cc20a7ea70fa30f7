use crate::analysis::EvaluationRequest;
use crate::interviewer::{Interviewer, QuestionRequest};
use crate::session::Role;
use anyhow::Result;
use async_trait::async_trait;

const QUESTIONS: &[&str] = &[
    "What project are you most proud of, and what was your part in it?",
    "How do you approach debugging a problem you have never seen before?",
    "Can you explain the difference between a process and a thread?",
    "How would you design an API that needs to stay backwards compatible?",
    "What trade-offs do you weigh when choosing a database for a new service?",
    "How do you make sure your code is ready for production?",
];

/// A deterministic [`Interviewer`] that never touches the network.
///
/// Questions come from a fixed list, skipping any asked within the recent
/// history the engine passes along. Every candidate question is treated as
/// relevant and the evaluation is derived from participation alone. Useful
/// for running the service locally without an API key and for end-to-end
/// tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineInterviewer;

#[async_trait]
impl Interviewer for OfflineInterviewer {
    async fn generate_question(&self, request: &QuestionRequest) -> Result<String> {
        let recent = |q: &str| {
            request
                .history
                .iter()
                .any(|m| m.role == Role::Assistant && m.content.ends_with(q))
        };
        let question = QUESTIONS
            .iter()
            .find(|q| !recent(**q))
            .or(QUESTIONS.first())
            .copied()
            .unwrap_or_default();
        Ok(question.to_string())
    }

    async fn check_question_relevance(&self, _question: &str, domain: &str) -> Result<String> {
        Ok(format!(
            "RELEVANT: The {domain} team works in small groups with weekly releases, and new joiners get a mentor for their first months."
        ))
    }

    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String> {
        let answers = request.transcript.answer_count as u64;
        let words = request.transcript.avg_words_per_answer();
        let technical = (answers * 10).min(60);
        let communication = (words * 3).min(60);
        let confidence = (answers * 8).min(60);
        let overall = (technical * 4 + communication * 3 + confidence * 3) / 10;
        Ok(serde_json::json!({
            "technical_score": technical,
            "communication_score": communication,
            "confidence_score": confidence,
            "overall_score": overall,
            "strengths": ["Completed the offline interview"],
            "weaknesses": ["Scored offline from participation only"],
            "suggestions": ["Run with a language model for detailed feedback"],
        })
        .to_string())
    }
}
