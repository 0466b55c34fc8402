//! Configuration update events.
//!
//! Broadcast when a plugin configuration is changed so that the owning
//! service can re-apply it.

use tokio::sync::broadcast;

/// Events broadcast when configuration changes occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdateEvent {
    /// The release digest configuration was updated.
    DigestUpdated,
    /// The default image configuration was updated.
    DefaultImageUpdated,
    /// The logging configuration was updated.
    LoggingUpdated,
}

impl ConfigUpdateEvent {
    /// Get a description of the event for logging.
    pub fn description(&self) -> String {
        match self {
            Self::DigestUpdated => "Digest config updated".to_string(),
            Self::DefaultImageUpdated => "Default image config updated".to_string(),
            Self::LoggingUpdated => "Logging config updated".to_string(),
        }
    }
}

/// Default channel capacity for config update events.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for configuration update events.
#[derive(Clone)]
pub struct ConfigEventBroadcaster {
    sender: broadcast::Sender<ConfigUpdateEvent>,
}

impl ConfigEventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateEvent> {
        self.sender.subscribe()
    }

    /// Publish an event.
    ///
    /// Returns the number of receivers, 0 if nobody is listening.
    pub fn publish(&self, event: ConfigUpdateEvent) -> usize {
        tracing::debug!("Publishing config event: {}", event.description());
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ConfigEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_description() {
        assert_eq!(
            ConfigUpdateEvent::DigestUpdated.description(),
            "Digest config updated"
        );
    }

    #[tokio::test]
    async fn test_broadcaster_publish_subscribe() {
        let broadcaster = ConfigEventBroadcaster::new();
        let mut receiver = broadcaster.subscribe();

        let count = broadcaster.publish(ConfigUpdateEvent::DefaultImageUpdated);
        assert_eq!(count, 1);
        assert_eq!(
            receiver.recv().await.unwrap(),
            ConfigUpdateEvent::DefaultImageUpdated
        );
    }

    #[test]
    fn test_broadcaster_no_subscribers() {
        let broadcaster = ConfigEventBroadcaster::new();
        assert_eq!(broadcaster.publish(ConfigUpdateEvent::DigestUpdated), 0);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
