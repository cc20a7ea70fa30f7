use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub type SharedSession = Arc<Mutex<Session>>;

/// In-memory map of live interviews, keyed by session id.
///
/// Each session sits behind its own mutex, so turns of one interview are
/// serialized while different interviews proceed independently.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

/// `session_{unix_seconds}_{8 hex chars}`.
pub fn new_session_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", chrono::Utc::now().timestamp(), &uuid[..8])
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session` under a fresh id and returns the id.
    pub async fn insert(&self, session: Session) -> String {
        let id = new_session_id();
        self.insert_with_id(id.clone(), session).await;
        id
    }

    pub async fn insert_with_id(&self, id: String, session: Session) {
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<SharedSession> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops sessions with no activity for longer than `max_idle`. Sessions
    /// mid-turn (locked) are skipped. Returns how many were dropped.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(session) if session.last_activity.elapsed() > max_idle => {
                tracing::info!("Dropping idle session {}", id);
                false
            }
            _ => true,
        });
        before - sessions.len()
    }
}
