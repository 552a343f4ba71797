//! poet-soul: the thinking half of Poet.
//!
//! A [`Thinker`] repeatedly asks a language model to continue its own last
//! thought. Every produced thought is handed to a [`ThoughtObserver`]; the
//! [`ThoughtHistory`] observer keeps them in an ordered in-memory log that the
//! HTTP layer reads.
//!
//! Without an LLM API key the soul is dormant: the history exists but no
//! thinker is built.

pub mod config;
pub mod error;
pub mod gemini;
pub mod history;
pub mod llm;
pub mod observer;
pub mod openai;
pub mod prompts;
pub mod thinker;

pub use config::{LlmProvider, SoulConfig};
pub use error::SoulError;
pub use history::{ThoughtHistory, ThoughtRecord};
pub use llm::LanguageModel;
pub use observer::ThoughtObserver;
pub use thinker::{Thinker, ThinkerPhase, ThinkerStatus};

use std::sync::Arc;
use tokio::task::JoinHandle;

/// The Soul: owns the history and, unless dormant, the thinker that feeds it.
pub struct Soul {
    history: Arc<ThoughtHistory>,
    thinker: Option<Arc<Thinker>>,
}

impl Soul {
    /// Create a soul from config, building the configured model backend.
    pub fn new(config: &SoulConfig) -> Result<Self, SoulError> {
        let model = llm::client_from_config(config)?;
        Ok(Self::with_model(config, model))
    }

    /// Create a soul around an explicit model (`None` = dormant).
    pub fn with_model(config: &SoulConfig, model: Option<Arc<dyn LanguageModel>>) -> Self {
        let history = Arc::new(ThoughtHistory::new());
        let thinker = model.map(|model| {
            let observer: Arc<dyn ThoughtObserver> = history.clone();
            Arc::new(Thinker::new(config, model, observer))
        });
        Self { history, thinker }
    }

    /// Start the think loop. `None` when dormant or already running.
    pub fn spawn(&self) -> Option<JoinHandle<()>> {
        self.thinker.as_ref().and_then(|t| t.start())
    }

    pub fn is_dormant(&self) -> bool {
        self.thinker.is_none()
    }

    pub fn history(&self) -> &Arc<ThoughtHistory> {
        &self.history
    }

    pub fn thinker(&self) -> Option<&Arc<Thinker>> {
        self.thinker.as_ref()
    }
}
