//! Subscription list stored as a JSON array on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::domain::{Subscription, SubscriptionStore};
use crate::utils::fs::read_optional;

/// Reads subscriptions from a JSON file on every call.
///
/// A missing file means no subscriptions.
pub struct JsonSubscriptionStore {
    path: PathBuf,
}

impl JsonSubscriptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SubscriptionStore for JsonSubscriptionStore {
    async fn list(&self) -> Result<Vec<Subscription>> {
        let Some(content) = read_optional("reading subscriptions", &self.path).await? else {
            debug!(path = %self.path.display(), "Subscription file not found");
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}
