//! User-visible system messages.
//!
//! Problems a user has to fix (for example a malformed schedule) are put here
//! in addition to being logged, so the host can surface them in its UI.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Broadcast capacity for live subscribers.
const SYSTEM_MESSAGE_CHANNEL_CAPACITY: usize = 64;

/// Messages kept for hosts that poll instead of subscribing.
const SYSTEM_MESSAGE_BACKLOG: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Component that raised the message.
    pub source: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Queue of user-visible system messages.
pub struct SystemMessageQueue {
    backlog: Mutex<VecDeque<SystemMessage>>,
    tx: broadcast::Sender<SystemMessage>,
}

impl SystemMessageQueue {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SYSTEM_MESSAGE_CHANNEL_CAPACITY);
        Self {
            backlog: Mutex::new(VecDeque::new()),
            tx,
        }
    }

    /// Publish a message.
    pub fn put(&self, source: impl Into<String>, text: impl Into<String>) {
        let message = SystemMessage {
            source: source.into(),
            text: text.into(),
            timestamp: Utc::now(),
        };

        {
            let mut backlog = self.backlog.lock();
            if backlog.len() >= SYSTEM_MESSAGE_BACKLOG {
                backlog.pop_front();
            }
            backlog.push_back(message.clone());
        }

        // No subscribers is fine; the backlog still has it
        let _ = self.tx.send(message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SystemMessage> {
        self.tx.subscribe()
    }

    /// Take every queued message.
    pub fn drain(&self) -> Vec<SystemMessage> {
        self.backlog.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.backlog.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.lock().is_empty()
    }
}

impl Default for SystemMessageQueue {
    fn default() -> Self {
        Self::new()
    }
}
