//! Append-only, in-memory thought history.

use chrono::NaiveDateTime;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SoulError;
use crate::observer::ThoughtObserver;

/// Wire format of [`ThoughtRecord::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One generated thought. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtRecord {
    /// 1-based sequence number, contiguous in creation order.
    pub id: u64,
    /// Local wall-clock time the thought was recorded.
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    /// The prompt the model was given.
    pub input: String,
    /// The text the model produced.
    pub thought: String,
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Ordered log of every recorded thought, oldest first.
///
/// Writers and readers share one async mutex. It is held only for the
/// length-then-push of an append or the copy of a read.
#[derive(Debug, Default)]
pub struct ThoughtHistory {
    records: Mutex<Vec<ThoughtRecord>>,
}

impl ThoughtHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a thought and return the stored record.
    pub async fn record(&self, input: &str, thought: &str) -> ThoughtRecord {
        let mut records = self.records.lock().await;
        let record = ThoughtRecord {
            id: records.len() as u64 + 1,
            timestamp: chrono::Local::now().naive_local(),
            input: input.to_string(),
            thought: thought.to_string(),
        };
        records.push(record.clone());
        drop(records);

        tracing::info!(
            id = record.id,
            preview = %preview(thought, 50),
            "New thought recorded"
        );
        record
    }

    /// Every record, oldest first. Empty when nothing has been recorded yet.
    pub async fn list_all(&self) -> Vec<ThoughtRecord> {
        self.records.lock().await.clone()
    }

    /// The newest record.
    pub async fn latest(&self) -> Result<ThoughtRecord, SoulError> {
        self.records
            .lock()
            .await
            .last()
            .cloned()
            .ok_or(SoulError::EmptyHistory)
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl ThoughtObserver for ThoughtHistory {
    fn on_thought<'a>(
        &'a self,
        input: &'a str,
        thought: &'a str,
    ) -> BoxFuture<'a, Result<(), SoulError>> {
        async move {
            self.record(input, thought).await;
            Ok(())
        }
        .boxed()
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
