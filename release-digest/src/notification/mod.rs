//! Notification module.
//!
//! Outbound messages flow through a [`NotificationPipeline`]: an ordered chain of
//! middleware followed by delivery to the configured channels.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use release_digest::notification::{
//!     DispatchInterceptor, FallbackImagePolicy, NotificationPipeline, WebhookChannel, WebhookConfig,
//! };
//!
//! let pipeline = Arc::new(NotificationPipeline::new());
//! pipeline.add_channel(Arc::new(WebhookChannel::new(WebhookConfig::for_url("https://example.com/hook"))));
//!
//! let interceptor = DispatchInterceptor::new(pipeline.clone());
//! interceptor.install(FallbackImagePolicy::new().with_links(Some("https://img.example/a.png")))?;
//! ```

pub mod channels;
mod interceptor;
mod message;
mod pipeline;
mod system;

pub use channels::{NotificationChannel, WebhookAuth, WebhookChannel, WebhookConfig};
pub use interceptor::{
    DEFAULT_NOTIFICATION_IMAGE, DispatchInterceptor, FALLBACK_IMAGE_ORDER, FallbackImagePolicy,
};
pub use message::{NotificationKind, OutboundMessage};
pub use pipeline::{
    MiddlewareHandle, NotificationMiddleware, NotificationPipeline, NotificationSender,
    PipelineStats,
};
pub use system::{SystemMessage, SystemMessageQueue};
