use crate::analysis::{AnalysisMetadata, EndReport, EvaluationRequest, ReportMetadata, parse_analysis};
use crate::classifier::{self, Relevance};
use crate::error::InterviewError;
use crate::interviewer::{Interviewer, QuestionRequest};
use crate::phrases;
use crate::session::{InterviewDuration, Session, Stage};
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Messages of recent conversation sent along when generating a question.
pub const HISTORY_WINDOW: usize = 6;

/// Seconds left at which the candidate is warned that time is nearly up.
pub const TIME_WARNING_SECS: i64 = 15;

/// Seconds left at which the technical stage closes on its own.
pub const CLOSING_SECS: i64 = 30;

/// What the interviewer does with the candidate's latest input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPlan {
    /// Abusive language: end the interview immediately.
    Terminate,
    /// The candidate has no questions: say goodbye.
    Goodbye,
    /// The candidate asked something: judge relevance, answer, say goodbye.
    AnswerCandidateQuestion,
    /// Time is almost up: ask the candidate to wrap up.
    TimeWarning,
    /// Technical part is over: invite the candidate's questions.
    Closing,
    NextQuestion,
}

impl Session {
    /// Decides the next move and applies the resulting stage transition.
    ///
    /// Returns `None` once the interview has reached its final stage.
    pub fn plan_turn(&mut self, text: &str, elapsed: Duration) -> Option<TurnPlan> {
        if self.stage == Stage::Final {
            return None;
        }

        if classifier::detect_abuse(text) {
            self.abuse_terminated = true;
            self.stage = Stage::Final;
            return Some(TurnPlan::Terminate);
        }

        if self.stage == Stage::CandidateQuestions {
            self.stage = Stage::Final;
            return Some(if classifier::has_no_questions(text) {
                TurnPlan::Goodbye
            } else {
                TurnPlan::AnswerCandidateQuestion
            });
        }

        if self.stage == Stage::Technical {
            let remaining = self.remaining(elapsed);
            if remaining <= TIME_WARNING_SECS && !self.time_warning_given {
                self.time_warning_given = true;
                self.stage = Stage::Closing;
                return Some(TurnPlan::TimeWarning);
            }
            if remaining <= CLOSING_SECS || self.question_count >= self.max_questions() {
                self.stage = Stage::Closing;
            }
        }

        if self.stage == Stage::Closing {
            self.stage = Stage::CandidateQuestions;
            return Some(TurnPlan::Closing);
        }

        Some(TurnPlan::NextQuestion)
    }
}

/// An interviewer turn in two forms: the full text to speak and a short
/// form the client can replay if the candidate asks for a repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub full: String,
    pub repeat: String,
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '?' | '!') {
            out.push(text[start..i + c.len_utf8()].trim());
            start = i + c.len_utf8();
        }
    }
    out.push(text[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}

/// The last question sentence of `text`, or its last sentence if none asks anything.
fn core_question(text: &str) -> String {
    let sentences = sentences(text);
    let chosen = sentences
        .iter()
        .rev()
        .find(|s| s.ends_with('?'))
        .or(sentences.last())
        .copied()
        .unwrap_or_else(|| text.trim());
    capitalize(chosen)
}

/// Shapes a raw model reply into a [`Question`].
///
/// A `---` line separates a short correction from the next question; the
/// repeat form keeps only the question. `transition` is prepended to the full
/// form only.
pub fn shape_question(raw: &str, transition: Option<&str>) -> Question {
    let raw = raw.trim();
    let (mut full, question_part) = match raw.split_once("---") {
        Some((explanation, question)) if !question.trim().is_empty() => {
            let explanation = explanation.trim();
            let question = question.trim();
            let full = if explanation.is_empty() {
                question.to_string()
            } else {
                format!("{explanation}\n{question}")
            };
            (full, question.to_string())
        }
        _ => (raw.replace("---", "").trim().to_string(), raw.replace("---", "")),
    };

    if let Some(transition) = transition {
        full.insert_str(0, transition);
    }

    Question {
        full,
        repeat: core_question(&question_part),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    pub name: String,
    pub domain: String,
    /// Minutes as sent by the client: "3", "5" or "10".
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReply {
    pub session_id: String,
    pub question: String,
    pub repeat_question: String,
    pub duration: u64,
}

/// Stage reported back to the client; abuse termination is reported on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStage {
    Technical,
    Closing,
    CandidateQuestions,
    Final,
    AbuseTerminated,
}

impl From<Stage> for ReplyStage {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Technical => Self::Technical,
            Stage::Closing => Self::Closing,
            Stage::CandidateQuestions => Self::CandidateQuestions,
            Stage::Final => Self::Final,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    EndInterview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReply {
    pub question: String,
    pub repeat_question: String,
    pub question_count: u32,
    pub stage: ReplyStage,
    pub elapsed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrelevant_question: Option<bool>,
}

impl AnswerReply {
    pub fn ends_interview(&self) -> bool {
        self.action == Some(Action::EndInterview)
    }
}

/// Drives interviews: owns the live sessions and the model they talk to.
pub struct InterviewEngine {
    store: SessionStore,
    interviewer: Arc<dyn Interviewer>,
}

impl InterviewEngine {
    pub fn new(interviewer: Arc<dyn Interviewer>) -> Self {
        Self {
            store: SessionStore::new(),
            interviewer,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Opens a session and greets the candidate.
    pub async fn start(&self, request: StartRequest) -> StartReply {
        let mut session = Session::new(
            request.name,
            request.domain,
            InterviewDuration::from_choice(&request.duration),
        );

        let greeting = phrases::greeting(session.first_name(), &session.domain);
        session.push_assistant(greeting.clone());
        session.question_count = 1;

        let duration = session.duration.as_secs();
        let domain = session.domain.clone();
        let session_id = self.store.insert(session).await;
        tracing::info!(
            "Started {} second {} interview, session {}",
            duration,
            domain,
            session_id
        );

        StartReply {
            session_id,
            question: greeting,
            repeat_question: phrases::GREETING_REPEAT.to_string(),
            duration,
        }
    }

    /// Records the candidate's answer and produces the interviewer's next turn.
    pub async fn answer(&self, session_id: &str, text: &str) -> Result<AnswerReply, InterviewError> {
        let shared = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))?;
        let mut session = shared.lock().await;
        session.touch();

        let elapsed = session.elapsed();
        let plan = session
            .plan_turn(text, elapsed)
            .ok_or_else(|| InterviewError::AlreadyEnded(session_id.to_string()))?;
        tracing::debug!("Session {} turn plan: {:?}", session_id, plan);
        session.push_user(text);

        let name = session.display_name().to_string();
        let mut action = None;
        let mut irrelevant_question = None;
        let mut stage = ReplyStage::from(session.stage);

        let question = match plan {
            TurnPlan::Terminate => {
                tracing::warn!("Session {} terminated for inappropriate language", session_id);
                action = Some(Action::EndInterview);
                stage = ReplyStage::AbuseTerminated;
                same_twice(phrases::ABUSE_TERMINATION.to_string())
            }
            TurnPlan::Goodbye => {
                action = Some(Action::EndInterview);
                same_twice(phrases::goodbye(&name))
            }
            TurnPlan::AnswerCandidateQuestion => {
                let relevance = self.judge_question(text, &session.domain).await;
                action = Some(Action::EndInterview);
                if relevance.relevant {
                    same_twice(phrases::relevant_farewell(&relevance.answer, &name))
                } else {
                    irrelevant_question = Some(true);
                    same_twice(phrases::irrelevant_farewell(&relevance.answer, &name))
                }
            }
            TurnPlan::TimeWarning => same_twice(phrases::time_warning().to_string()),
            TurnPlan::Closing => same_twice(phrases::closing().to_string()),
            TurnPlan::NextQuestion => self.next_question(&session).await,
        };

        session.push_assistant(question.full.clone());
        if plan == TurnPlan::NextQuestion {
            session.question_count += 1;
        }

        Ok(AnswerReply {
            question: question.full,
            repeat_question: question.repeat,
            question_count: session.question_count,
            stage,
            elapsed: elapsed.as_secs(),
            action,
            irrelevant_question,
        })
    }

    async fn next_question(&self, session: &Session) -> Question {
        let request = QuestionRequest {
            name: session.display_name().to_string(),
            domain: session.domain.clone(),
            history: session.recent_history(HISTORY_WINDOW).to_vec(),
        };
        let transition = (session.question_count == 1)
            .then(|| phrases::technical_transition(session.display_name()));

        match self.interviewer.generate_question(&request).await {
            Ok(raw) => {
                tracing::debug!("Raw question from model: {:?}", raw);
                shape_question(&raw, transition.as_deref())
            }
            Err(e) => {
                tracing::error!("Question generation failed, using fallback: {:?}", e);
                shape_question(phrases::FALLBACK_QUESTION, transition.as_deref())
            }
        }
    }

    async fn judge_question(&self, question: &str, domain: &str) -> Relevance {
        match self.interviewer.check_question_relevance(question, domain).await {
            Ok(reply) => Relevance::parse(&reply),
            Err(e) => {
                tracing::error!("Relevance check failed, treating as relevant: {:?}", e);
                Relevance {
                    relevant: true,
                    answer: phrases::FALLBACK_RELEVANCE_ANSWER.to_string(),
                }
            }
        }
    }

    /// Scores the interview and closes the session.
    ///
    /// If the evaluation call itself fails the fixed fallback report is
    /// returned and the session is kept so the client can retry.
    pub async fn end(&self, session_id: &str) -> Result<EndReport, InterviewError> {
        let shared = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| InterviewError::SessionNotFound(session_id.to_string()))?;
        let session = shared.lock().await;

        let elapsed = session.elapsed();
        let metadata = AnalysisMetadata {
            name: session.display_name().to_string(),
            total_questions: session.question_count,
            configured_duration: session.duration.as_secs(),
            actual_duration: elapsed.as_secs(),
            early_exit: session.is_early_exit(elapsed),
        };
        let request = EvaluationRequest::new(&session.conversation, metadata);

        let raw = match self.interviewer.evaluate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Evaluation failed for session {}: {:?}", session_id, e);
                return Ok(EndReport::fallback());
            }
        };

        let mut analysis = parse_analysis(&raw, request.transcript.answer_count);
        if session.abuse_terminated {
            analysis.apply_abuse_penalty();
        }

        let report = EndReport {
            analysis,
            metadata: ReportMetadata {
                candidate_name: session.name.clone(),
                domain: session.domain.clone(),
                total_questions: session.question_count,
                duration: elapsed.as_secs(),
                configured_duration: session.duration.as_secs(),
                abuse_terminated: session.abuse_terminated,
            },
            conversation: session.conversation.clone(),
        };

        drop(session);
        self.store.remove(session_id).await;
        tracing::info!(
            "Ended session {} with overall score {}",
            session_id,
            report.analysis.overall_score
        );
        Ok(report)
    }
}

fn same_twice(text: String) -> Question {
    Question {
        repeat: text.clone(),
        full: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;
    use crate::interviewer::MockInterviewer;
    use crate::session::Role;

    fn session(duration: InterviewDuration) -> Session {
        let mut session = Session::new("Ravi Pandey", "Backend", duration);
        session.question_count = 1;
        session
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn plan_asks_next_question_with_time_left() {
        let mut s = session(InterviewDuration::STANDARD);
        assert_eq!(s.plan_turn("I work on APIs", secs(10)), Some(TurnPlan::NextQuestion));
        assert_eq!(s.stage, Stage::Technical);
    }

    #[test]
    fn plan_warns_once_when_time_is_nearly_up() {
        let mut s = session(InterviewDuration::STANDARD);
        assert_eq!(s.plan_turn("answer", secs(290)), Some(TurnPlan::TimeWarning));
        assert!(s.time_warning_given);
        assert_eq!(s.stage, Stage::Closing);

        assert_eq!(s.plan_turn("finishing up", secs(295)), Some(TurnPlan::Closing));
        assert_eq!(s.stage, Stage::CandidateQuestions);
    }

    #[test]
    fn plan_closes_inside_the_last_thirty_seconds() {
        let mut s = session(InterviewDuration::STANDARD);
        assert_eq!(s.plan_turn("answer", secs(275)), Some(TurnPlan::Closing));
        assert_eq!(s.stage, Stage::CandidateQuestions);
        assert!(!s.time_warning_given);
    }

    #[test]
    fn plan_closes_once_question_budget_is_spent() {
        let mut s = session(InterviewDuration::SHORT);
        s.question_count = s.max_questions();
        assert_eq!(s.plan_turn("answer", secs(5)), Some(TurnPlan::Closing));
    }

    #[test]
    fn plan_handles_candidate_questions() {
        let mut s = session(InterviewDuration::STANDARD);
        s.stage = Stage::CandidateQuestions;
        assert_eq!(s.plan_turn("No thanks", secs(100)), Some(TurnPlan::Goodbye));
        assert_eq!(s.stage, Stage::Final);

        let mut s = session(InterviewDuration::STANDARD);
        s.stage = Stage::CandidateQuestions;
        assert_eq!(
            s.plan_turn("What would I work on first?", secs(100)),
            Some(TurnPlan::AnswerCandidateQuestion)
        );
        assert_eq!(s.stage, Stage::Final);
    }

    #[test]
    fn plan_terminates_on_abuse_in_any_open_stage() {
        for stage in [Stage::Technical, Stage::Closing, Stage::CandidateQuestions] {
            let mut s = session(InterviewDuration::STANDARD);
            s.stage = stage;
            assert_eq!(s.plan_turn("this is bullshit", secs(10)), Some(TurnPlan::Terminate));
            assert!(s.abuse_terminated);
            assert_eq!(s.stage, Stage::Final);
        }
    }

    #[test]
    fn plan_rejects_input_after_final() {
        let mut s = session(InterviewDuration::STANDARD);
        s.stage = Stage::Final;
        assert_eq!(s.plan_turn("hello?", secs(10)), None);
    }

    #[test]
    fn shape_question_splits_on_separator() {
        let q = shape_question(
            "A mutex guards shared data.\n---\nNo problem. How does an RwLock differ?",
            None,
        );
        assert_eq!(
            q.full,
            "A mutex guards shared data.\nNo problem. How does an RwLock differ?"
        );
        assert_eq!(q.repeat, "How does an RwLock differ?");
    }

    #[test]
    fn shape_question_prefixes_transition_on_full_only() {
        let q = shape_question("what is a trait?", Some("Okay Mr. Ravi, let's go. "));
        assert_eq!(q.full, "Okay Mr. Ravi, let's go. what is a trait?");
        assert_eq!(q.repeat, "What is a trait?");
    }

    #[test]
    fn shape_question_prefers_last_question_sentence() {
        let q = shape_question("Can you explain ownership? Take your time.", None);
        assert_eq!(q.repeat, "Can you explain ownership?");

        let q = shape_question("Good. Why use Arc? Think about threads.", None);
        assert_eq!(q.repeat, "Why use Arc?");

        let q = shape_question("Describe your last project.", None);
        assert_eq!(q.repeat, "Describe your last project.");
    }

    #[test]
    fn shape_question_ignores_empty_question_part() {
        let q = shape_question("Tell me about lifetimes?\n---\n", None);
        assert_eq!(q.full, "Tell me about lifetimes?");
        assert_eq!(q.repeat, "Tell me about lifetimes?");
    }

    fn engine(mock: MockInterviewer) -> InterviewEngine {
        InterviewEngine::new(Arc::new(mock))
    }

    async fn start(engine: &InterviewEngine, duration: &str) -> StartReply {
        engine
            .start(StartRequest {
                name: "Ravi Pandey".to_string(),
                domain: "Backend".to_string(),
                duration: duration.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn start_greets_and_opens_session() {
        let engine = engine(MockInterviewer::new());
        let reply = start(&engine, "10").await;

        assert_eq!(reply.duration, 600);
        assert_eq!(reply.repeat_question, phrases::GREETING_REPEAT);
        assert!(reply.question.contains("Ravi"));
        assert!(reply.session_id.starts_with("session_"));

        let shared = engine.store().get(&reply.session_id).await.unwrap();
        let session = shared.lock().await;
        assert_eq!(session.question_count, 1);
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.conversation[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn first_answer_gets_transition_and_counts_question() {
        let mut mock = MockInterviewer::new();
        mock.expect_generate_question()
            .withf(|req| req.name == "Ravi Pandey" && req.history.len() == 2)
            .times(1)
            .returning(|_| Ok("What is ownership in Rust?".to_string()));
        let engine = engine(mock);
        let started = start(&engine, "5").await;

        let reply = engine
            .answer(&started.session_id, "I am a backend developer")
            .await
            .unwrap();

        assert_eq!(
            reply.question,
            "Okay Mr. Ravi Pandey, let's dive into some technical background and skills. What is ownership in Rust?"
        );
        assert_eq!(reply.repeat_question, "What is ownership in Rust?");
        assert_eq!(reply.question_count, 2);
        assert_eq!(reply.stage, ReplyStage::Technical);
        assert_eq!(reply.action, None);

        let shared = engine.store().get(&started.session_id).await.unwrap();
        let session = shared.lock().await;
        assert_eq!(session.conversation.len(), 3);
        assert_eq!(session.conversation[1].content, "I am a backend developer");
    }

    #[tokio::test]
    async fn history_sent_to_model_is_bounded() {
        let mut mock = MockInterviewer::new();
        mock.expect_generate_question()
            .withf(|req| req.history.len() <= HISTORY_WINDOW)
            .times(4)
            .returning(|_| Ok("Next?".to_string()));
        let engine = engine(mock);
        let started = start(&engine, "10").await;

        for i in 0..4 {
            let reply = engine
                .answer(&started.session_id, &format!("answer {i}"))
                .await
                .unwrap();
            assert_eq!(reply.repeat_question, "Next?");
        }
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_fixed_question() {
        let mut mock = MockInterviewer::new();
        mock.expect_generate_question()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));
        let engine = engine(mock);
        let started = start(&engine, "5").await;

        let reply = engine.answer(&started.session_id, "hello").await.unwrap();
        assert!(reply.question.ends_with(phrases::FALLBACK_QUESTION));
        assert_eq!(reply.question_count, 2);
    }

    #[tokio::test]
    async fn abuse_ends_interview_and_blocks_further_answers() {
        let engine = engine(MockInterviewer::new());
        let started = start(&engine, "5").await;

        let reply = engine.answer(&started.session_id, "shut up").await.unwrap();
        assert_eq!(reply.stage, ReplyStage::AbuseTerminated);
        assert_eq!(reply.question, phrases::ABUSE_TERMINATION);
        assert_eq!(reply.repeat_question, phrases::ABUSE_TERMINATION);
        assert!(reply.ends_interview());
        assert_eq!(reply.question_count, 1);

        let again = engine.answer(&started.session_id, "sorry").await;
        assert!(matches!(again, Err(InterviewError::AlreadyEnded(_))));
    }

    #[tokio::test]
    async fn short_session_walks_warning_closing_and_goodbye() {
        let engine = engine(MockInterviewer::new());
        let id = "session_test_short".to_string();
        let mut s = Session::new("Ravi", "Backend", InterviewDuration::from_secs(10));
        s.question_count = 1;
        engine.store().insert_with_id(id.clone(), s).await;

        let warning = engine.answer(&id, "I like Rust").await.unwrap();
        assert_eq!(warning.stage, ReplyStage::Closing);
        assert_eq!(warning.action, None);

        let closing = engine.answer(&id, "that's my answer").await.unwrap();
        assert_eq!(closing.stage, ReplyStage::CandidateQuestions);

        let goodbye = engine.answer(&id, "No, that's all").await.unwrap();
        assert_eq!(goodbye.stage, ReplyStage::Final);
        assert!(goodbye.ends_interview());
        assert!(goodbye.question.contains("Ravi"));
    }

    #[tokio::test]
    async fn candidate_question_relevance_shapes_farewell() {
        let mut mock = MockInterviewer::new();
        mock.expect_check_question_relevance()
            .withf(|question, domain| question.contains("salary") && domain == "Backend")
            .times(1)
            .returning(|_, _| Ok("IRRELEVANT: Compensation is covered by HR.".to_string()));
        mock.expect_check_question_relevance()
            .withf(|question, _| question.contains("team"))
            .times(1)
            .returning(|_, _| Ok("RELEVANT: The team owns the billing platform.".to_string()));
        let engine = engine(mock);

        for (id, text, relevant) in [
            ("s_irrelevant", "What salary do you pay?", false),
            ("s_relevant", "What does the team build?", true),
        ] {
            let mut s = session(InterviewDuration::STANDARD);
            s.stage = Stage::CandidateQuestions;
            engine.store().insert_with_id(id.to_string(), s).await;

            let reply = engine.answer(id, text).await.unwrap();
            assert_eq!(reply.stage, ReplyStage::Final);
            assert!(reply.ends_interview());
            if relevant {
                assert!(reply.question.starts_with("The team owns the billing platform."));
                assert_eq!(reply.irrelevant_question, None);
            } else {
                assert!(reply.question.starts_with("Compensation is covered by HR."));
                assert_eq!(reply.irrelevant_question, Some(true));
            }
        }
    }

    #[tokio::test]
    async fn relevance_failure_uses_fallback_answer() {
        let mut mock = MockInterviewer::new();
        mock.expect_check_question_relevance()
            .returning(|_, _| Err(anyhow::anyhow!("timeout")));
        let engine = engine(mock);
        let mut s = session(InterviewDuration::STANDARD);
        s.stage = Stage::CandidateQuestions;
        engine.store().insert_with_id("s".to_string(), s).await;

        let reply = engine.answer("s", "How big is the team?").await.unwrap();
        assert!(reply.question.starts_with(phrases::FALLBACK_RELEVANCE_ANSWER));
    }

    #[tokio::test]
    async fn unknown_session_is_reported() {
        let engine = engine(MockInterviewer::new());
        assert!(matches!(
            engine.answer("missing", "hi").await,
            Err(InterviewError::SessionNotFound(id)) if id == "missing"
        ));
        assert!(matches!(
            engine.end("missing").await,
            Err(InterviewError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn end_scores_penalizes_abuse_and_removes_session() {
        let mut mock = MockInterviewer::new();
        mock.expect_evaluate()
            .withf(|req| req.metadata.early_exit && req.transcript.answer_count == 1)
            .times(1)
            .returning(|_| {
                Ok(r#"{"technical_score": 50, "communication_score": 50, "confidence_score": 50, "overall_score": 50, "strengths": [], "weaknesses": [], "suggestions": []}"#.to_string())
            });
        let engine = engine(mock);
        let started = start(&engine, "5").await;
        engine.answer(&started.session_id, "wtf").await.unwrap();

        let report = engine.end(&started.session_id).await.unwrap();
        assert_eq!(report.analysis.technical_score, 20);
        assert_eq!(report.analysis.communication_score, 10);
        assert_eq!(report.analysis.overall_score, 15);
        assert!(report.metadata.abuse_terminated);
        assert_eq!(report.metadata.candidate_name, "Ravi Pandey");
        assert_eq!(report.metadata.configured_duration, 300);
        assert_eq!(report.conversation.len(), 3);
        assert!(engine.store().get(&started.session_id).await.is_none());
    }

    #[tokio::test]
    async fn end_with_unparseable_evaluation_scores_low_and_removes_session() {
        let mut mock = MockInterviewer::new();
        mock.expect_generate_question()
            .returning(|_| Ok("What is a lifetime?".to_string()));
        mock.expect_evaluate()
            .times(1)
            .returning(|_| Ok("Sorry, I cannot score this interview.".to_string()));
        let engine = engine(mock);
        let started = start(&engine, "5").await;
        engine
            .answer(&started.session_id, "I mostly write Rust services")
            .await
            .unwrap();

        let report = engine.end(&started.session_id).await.unwrap();
        assert_eq!(report.analysis, Analysis::unparseable(1));
        assert_eq!(report.analysis.overall_score, 5);
        assert_eq!(report.analysis.strengths, ["Attempted the interview"]);
        assert!(!report.metadata.abuse_terminated);
        assert_eq!(report.conversation.len(), 3);
        assert!(engine.store().get(&started.session_id).await.is_none());
    }

    #[tokio::test]
    async fn end_returns_fallback_and_keeps_session_when_evaluation_fails() {
        let mut mock = MockInterviewer::new();
        mock.expect_evaluate()
            .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));
        let engine = engine(mock);
        let started = start(&engine, "3").await;

        let report = engine.end(&started.session_id).await.unwrap();
        assert_eq!(report, EndReport::fallback());
        assert!(engine.store().get(&started.session_id).await.is_some());
    }

    #[test]
    fn answer_reply_omits_absent_optionals() {
        let reply = AnswerReply {
            question: "Q?".to_string(),
            repeat_question: "Q?".to_string(),
            question_count: 2,
            stage: ReplyStage::CandidateQuestions,
            elapsed: 12,
            action: None,
            irrelevant_question: None,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["stage"], "candidate_questions");
        assert!(json.get("action").is_none());
        assert!(json.get("irrelevant_question").is_none());

        let json = serde_json::to_value(AnswerReply {
            action: Some(Action::EndInterview),
            stage: ReplyStage::AbuseTerminated,
            ..reply
        })
        .unwrap();
        assert_eq!(json["action"], "end_interview");
        assert_eq!(json["stage"], "abuse_terminated");
    }
}
