//! Daily-news subscriptions, one topic per chat.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;

use super::storage::JsonDocument;

/// Chat id → subscribed topic
pub type Subscriptions = BTreeMap<String, String>;

/// File-backed subscription list
pub struct SubscriptionStore {
    document: JsonDocument<Subscriptions>,
    write_lock: Mutex<()>,
}

impl SubscriptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Subscribes a chat to a topic, replacing any previous topic
    pub async fn subscribe(&self, chat_id: i64, topic: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut subscriptions = self.document.load().await?;
        subscriptions.insert(chat_id.to_string(), topic.to_string());
        self.document.save(&subscriptions).await?;
        info!("Chat {} subscribed to '{}'", chat_id, topic);
        Ok(())
    }

    /// Removes a chat's subscription. Returns false if it had none.
    pub async fn unsubscribe(&self, chat_id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut subscriptions = self.document.load().await?;
        if subscriptions.remove(&chat_id.to_string()).is_none() {
            return Ok(false);
        }
        self.document.save(&subscriptions).await?;
        info!("Chat {} unsubscribed", chat_id);
        Ok(true)
    }

    /// The topic a chat is subscribed to
    pub async fn get(&self, chat_id: i64) -> Result<Option<String>> {
        let subscriptions = self.document.load().await?;
        Ok(subscriptions.get(&chat_id.to_string()).cloned())
    }

    /// All subscriptions
    pub async fn all(&self) -> Result<Subscriptions> {
        self.document.load().await
    }
}
