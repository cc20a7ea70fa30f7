/// Errors surfaced by the interview engine to its callers.
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Interview already ended for session {0}")]
    AlreadyEnded(String),
}
