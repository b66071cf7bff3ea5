//! Change notifications keyed by user and table.
//!
//! Consumers never diff a notification: any change means "refetch the
//! current window".

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Buffered notifications per receiver before it lags.
const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Notifications were dropped; the receiver must assume anything changed.
    Resync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub user_id: String,
    pub table: String,
    pub kind: ChangeKind,
    pub record_id: Option<String>,
}

/// Publish side of the feed. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

/// Receive side filtered to one user and table.
pub struct Subscription {
    receiver: broadcast::Receiver<Change>,
    user_id: String,
    table: String,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        ChangeFeed { sender }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, change: Change) {
        let delivered = self.sender.send(change).unwrap_or(0);
        tracing::trace!(delivered, "Published change notification");
    }

    pub fn subscribe(&self, user_id: &str, table: &str) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            user_id: user_id.to_string(),
            table: table.to_string(),
        }
    }
}

impl Subscription {
    /// Wait for the next change for this user and table. `None` once every
    /// publisher is gone.
    pub async fn next(&mut self) -> Option<Change> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.user_id == self.user_id && change.table == self.table => {
                    return Some(change);
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, user_id = %self.user_id, "Change feed lagged");
                    return Some(Change {
                        user_id: self.user_id.clone(),
                        table: self.table.clone(),
                        kind: ChangeKind::Resync,
                        record_id: None,
                    });
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
