//! Shared state handed to every request handler.

use poet_soul::{Soul, Thinker, ThoughtHistory};
use std::sync::Arc;

#[derive(Clone)]
pub struct NodeState {
    /// Thought log written by the soul's thinker
    pub history: Arc<ThoughtHistory>,
    /// The thinker (None when the soul is dormant)
    pub thinker: Option<Arc<Thinker>>,
    /// When the node started
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl NodeState {
    pub fn from_soul(soul: &Soul) -> Self {
        Self {
            history: soul.history().clone(),
            thinker: soul.thinker().cloned(),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn is_dormant(&self) -> bool {
        self.thinker.is_none()
    }
}
