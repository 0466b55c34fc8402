//! Outbound notification pipeline.
//!
//! Every notification the host emits goes through [`NotificationPipeline::send`].
//! Cross-cutting behaviour is attached as [`NotificationMiddleware`] rather than by
//! replacing the send function:
//!
//! - `install` adds a middleware and returns a [`MiddlewareHandle`] owned by the caller
//! - `replace` swaps one installed middleware for another in a single step
//! - `uninstall` removes it again; the chain is then exactly what it was before
//!
//! The chain is stored as an immutable snapshot behind a lock. Writers build a new
//! snapshot and swap it in; each send clones the current snapshot once, so an
//! in-flight send sees either the old chain or the new one, never a mix.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::channels::NotificationChannel;
use super::message::OutboundMessage;
use crate::{Error, Result};

/// Broadcast capacity for delivered-message events.
const DELIVERED_CHANNEL_CAPACITY: usize = 64;

/// The shared outbound send entry point.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}

/// A step applied to every message before delivery.
#[async_trait]
pub trait NotificationMiddleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect or modify the message.
    ///
    /// An error is logged and the message continues down the chain as it was
    /// when this middleware returned.
    async fn handle(&self, message: &mut OutboundMessage) -> Result<()>;
}

/// Ownership token for an installed middleware.
///
/// Deliberately not `Clone`: only the installer can replace or remove its entry.
#[derive(Debug, PartialEq, Eq)]
pub struct MiddlewareHandle {
    id: u64,
    name: &'static str,
}

impl MiddlewareHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Clone)]
struct InstalledMiddleware {
    id: u64,
    order: i32,
    middleware: Arc<dyn NotificationMiddleware>,
}

type Chain = Arc<Vec<InstalledMiddleware>>;

/// Statistics about the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStats {
    pub middleware_count: usize,
    pub channel_count: usize,
    pub delivered: u64,
    pub failed: u64,
}

/// The notification pipeline.
pub struct NotificationPipeline {
    chain: RwLock<Chain>,
    channels: RwLock<Vec<Arc<dyn NotificationChannel>>>,
    next_id: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    delivered_tx: broadcast::Sender<OutboundMessage>,
}

impl NotificationPipeline {
    /// Create a pipeline with no channels and no middleware.
    pub fn new() -> Self {
        let (delivered_tx, _) = broadcast::channel(DELIVERED_CHANNEL_CAPACITY);
        Self {
            chain: RwLock::new(Arc::new(Vec::new())),
            channels: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            delivered_tx,
        }
    }

    /// Create a pipeline delivering to the given channels.
    pub fn with_channels(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        let pipeline = Self::new();
        *pipeline.channels.write() = channels;
        pipeline
    }

    /// Add a delivery channel.
    pub fn add_channel(&self, channel: Arc<dyn NotificationChannel>) {
        debug!(channel_type = channel.channel_type(), "Adding notification channel");
        self.channels.write().push(channel);
    }

    /// Subscribe to messages as they are handed to the channels.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.delivered_tx.subscribe()
    }

    /// Install a middleware.
    ///
    /// Middleware runs in ascending `order`; ties run in installation order.
    pub fn install(&self, order: i32, middleware: Arc<dyn NotificationMiddleware>) -> MiddlewareHandle {
        self.replace(None, order, middleware)
    }

    /// Install `middleware`, removing `previous` in the same step.
    ///
    /// A stale `previous` handle (already removed) is ignored.
    pub fn replace(
        &self,
        previous: Option<MiddlewareHandle>,
        order: i32,
        middleware: Arc<dyn NotificationMiddleware>,
    ) -> MiddlewareHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let name = middleware.name();
        let previous_id = previous.map(|h| h.id);

        let mut chain = self.chain.write();
        let mut next: Vec<InstalledMiddleware> = chain
            .iter()
            .filter(|entry| Some(entry.id) != previous_id)
            .cloned()
            .collect();
        next.push(InstalledMiddleware {
            id,
            order,
            middleware,
        });
        next.sort_by_key(|entry| (entry.order, entry.id));
        *chain = Arc::new(next);

        debug!(middleware = name, id, order, "Notification middleware installed");
        MiddlewareHandle { id, name }
    }

    /// Remove an installed middleware.
    ///
    /// Returns `false` if it was no longer installed.
    pub fn uninstall(&self, handle: MiddlewareHandle) -> bool {
        let mut chain = self.chain.write();
        if !chain.iter().any(|entry| entry.id == handle.id) {
            return false;
        }
        let next: Vec<InstalledMiddleware> = chain
            .iter()
            .filter(|entry| entry.id != handle.id)
            .cloned()
            .collect();
        *chain = Arc::new(next);

        debug!(middleware = handle.name, id = handle.id, "Notification middleware removed");
        true
    }

    /// Whether the middleware behind `handle` is still in the chain.
    pub fn is_installed(&self, handle: &MiddlewareHandle) -> bool {
        self.chain.read().iter().any(|entry| entry.id == handle.id)
    }

    /// Names of the installed middleware in execution order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.chain
            .read()
            .iter()
            .map(|entry| entry.middleware.name())
            .collect()
    }

    /// Run the middleware chain over `message` without delivering it.
    pub async fn prepare(&self, mut message: OutboundMessage) -> OutboundMessage {
        let chain: Chain = self.chain.read().clone();
        for entry in chain.iter() {
            if let Err(e) = entry.middleware.handle(&mut message).await {
                warn!(
                    middleware = entry.middleware.name(),
                    error = %e,
                    "Notification middleware failed; continuing with unmodified message"
                );
            }
        }
        message
    }

    /// Deliver an already prepared message to every enabled channel.
    async fn deliver(&self, message: &OutboundMessage) -> Result<()> {
        let channels: Vec<Arc<dyn NotificationChannel>> = self
            .channels
            .read()
            .iter()
            .filter(|c| c.is_enabled())
            .cloned()
            .collect();

        let _ = self.delivered_tx.send(message.clone());

        let mut failures = Vec::new();
        for channel in &channels {
            if let Err(e) = channel.send(message).await {
                warn!(
                    channel_type = channel.channel_type(),
                    error = %e,
                    "Notification delivery failed"
                );
                failures.push(format!("{}: {}", channel.channel_type(), e));
            }
        }

        if failures.is_empty() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            Err(Error::notification(failures.join("; ")))
        }
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            middleware_count: self.chain.read().len(),
            channel_count: self.channels.read().len(),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for NotificationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSender for NotificationPipeline {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let message = self.prepare(message).await;
        self.deliver(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::message::NotificationKind;

    struct Tag(&'static str);

    #[async_trait]
    impl NotificationMiddleware for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn handle(&self, message: &mut OutboundMessage) -> Result<()> {
            message.text.push_str(self.0);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl NotificationMiddleware for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _message: &mut OutboundMessage) -> Result<()> {
            Err(Error::Other("boom".to_string()))
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage::new(NotificationKind::Manual, "title", "")
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let pipeline = NotificationPipeline::new();
        pipeline.install(10, Arc::new(Tag("b")));
        pipeline.install(0, Arc::new(Tag("a")));
        pipeline.install(10, Arc::new(Tag("c")));

        assert_eq!(pipeline.middleware_names(), vec!["a", "b", "c"]);
        assert_eq!(pipeline.prepare(message()).await.text, "abc");
    }

    #[tokio::test]
    async fn test_uninstall_restores_chain() {
        let pipeline = NotificationPipeline::new();
        let handle = pipeline.install(0, Arc::new(Tag("x")));
        assert!(pipeline.is_installed(&handle));

        assert!(pipeline.uninstall(handle));
        assert_eq!(pipeline.prepare(message()).await, message());
        assert_eq!(pipeline.stats().middleware_count, 0);
    }

    #[tokio::test]
    async fn test_replace_does_not_nest() {
        let pipeline = NotificationPipeline::new();
        let first = pipeline.install(0, Arc::new(Tag("1")));
        let second = pipeline.replace(Some(first), 0, Arc::new(Tag("2")));

        assert_eq!(pipeline.middleware_names(), vec!["2"]);
        assert_eq!(pipeline.prepare(message()).await.text, "2");
        assert!(pipeline.is_installed(&second));
    }

    #[tokio::test]
    async fn test_stale_handle_uninstall_is_noop() {
        let pipeline = NotificationPipeline::new();
        let handle = pipeline.install(0, Arc::new(Tag("x")));
        let stale = MiddlewareHandle {
            id: handle.id,
            name: handle.name,
        };
        assert!(pipeline.uninstall(handle));
        assert!(!pipeline.uninstall(stale));
    }

    #[tokio::test]
    async fn test_failing_middleware_does_not_block_delivery() {
        let pipeline = NotificationPipeline::new();
        pipeline.install(0, Arc::new(Failing));
        pipeline.install(1, Arc::new(Tag("ok")));

        let mut rx = pipeline.subscribe();
        pipeline.send(message()).await.unwrap();

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.text, "ok");
        assert_eq!(pipeline.stats().delivered, 1);
    }
}
