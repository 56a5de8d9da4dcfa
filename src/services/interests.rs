//! Per-chat search history used for recommendations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;

use super::storage::JsonDocument;

/// Chat id → topics in the order they were searched
pub type Interests = BTreeMap<String, Vec<String>>;

/// File-backed interest history
pub struct InterestStore {
    document: JsonDocument<Interests>,
    write_lock: Mutex<()>,
}

impl InterestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Appends a searched topic to a chat's history
    pub async fn record(&self, chat_id: i64, topic: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut interests = self.document.load().await?;
        interests
            .entry(chat_id.to_string())
            .or_default()
            .push(topic.to_string());
        self.document.save(&interests).await?;
        debug!("Recorded interest '{}' for chat {}", topic, chat_id);
        Ok(())
    }

    /// The most recently searched topic
    pub async fn latest(&self, chat_id: i64) -> Result<Option<String>> {
        let interests = self.document.load().await?;
        Ok(interests
            .get(&chat_id.to_string())
            .and_then(|topics| topics.last().cloned()))
    }

    /// Full history of a chat
    pub async fn history(&self, chat_id: i64) -> Result<Vec<String>> {
        let interests = self.document.load().await?;
        Ok(interests.get(&chat_id.to_string()).cloned().unwrap_or_default())
    }
}
