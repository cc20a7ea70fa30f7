pub mod analysis;
pub mod classifier;
pub mod error;
pub mod interviewer;
pub mod offline;
pub mod phrases;
pub mod prompts;
pub mod session;
pub mod session_state;
pub mod store;
pub mod voice;

pub use error::InterviewError;
pub use interviewer::{Interviewer, InterviewerClient};
pub use session_state::InterviewEngine;

/// Name the interviewer introduces itself with and the service reports on `/health`.
pub const SERVICE_NAME: &str = "Syera AI Interview Backend";
