//! Notification channels.
//!
//! A channel is the transport at the end of the pipeline. Currently:
//! - Generic webhooks (HTTP POST or PUT)

mod webhook;

pub use webhook::{WebhookAuth, WebhookChannel, WebhookConfig};

use async_trait::async_trait;

use super::message::OutboundMessage;
use crate::Result;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Check if the channel is enabled.
    fn is_enabled(&self) -> bool;

    /// Deliver a message through this channel.
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}
