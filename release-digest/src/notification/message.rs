//! Outbound notification messages.

use serde::{Deserialize, Serialize};

/// Category of an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Download,
    Organize,
    Subscribe,
    SiteMessage,
    MediaServer,
    Manual,
    Plugin,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "Download",
            Self::Organize => "Organize",
            Self::Subscribe => "Subscribe",
            Self::SiteMessage => "SiteMessage",
            Self::MediaServer => "MediaServer",
            Self::Manual => "Manual",
            Self::Plugin => "Plugin",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formed notification ready for delivery.
///
/// `image` is `None` until someone supplies one; the fallback-image
/// middleware fills it in only in that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub kind: NotificationKind,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl OutboundMessage {
    /// Create a message without an image.
    pub fn new(kind: NotificationKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            text: text.into(),
            image: None,
        }
    }

    /// Attach an image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_without_image() {
        let msg = OutboundMessage::new(NotificationKind::Download, "t", "body");
        assert!(!msg.has_image());
        let msg = msg.with_image("http://x.png");
        assert_eq!(msg.image.as_deref(), Some("http://x.png"));
    }

    #[test]
    fn test_serialize_kind() {
        let msg = OutboundMessage::new(NotificationKind::Subscribe, "t", "b");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "Subscribe");
        assert!(json["image"].is_null());
    }
}
