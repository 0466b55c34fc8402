//! One digest run: match, pick an image, send.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::builder::DigestBuilder;
use super::image::ImageSelector;
use crate::Result;
use crate::notification::{NotificationKind, NotificationSender, OutboundMessage};

/// What a digest run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestOutcome {
    /// Nothing releases today; no notification was sent.
    Empty,
    /// A digest notification was sent.
    Sent { match_count: usize, image: String },
}

/// Title of the digest notification.
pub fn digest_title(match_count: usize) -> String {
    format!("Today's releases: {} items", match_count)
}

/// Builds the digest and hands it to the notification sender.
pub struct DigestService {
    builder: DigestBuilder,
    selector: ImageSelector,
    sender: Arc<dyn NotificationSender>,
}

impl DigestService {
    pub fn new(builder: DigestBuilder, selector: ImageSelector, sender: Arc<dyn NotificationSender>) -> Self {
        Self {
            builder,
            selector,
            sender,
        }
    }

    /// Run the digest for `today`.
    ///
    /// Nothing is sent when no subscription matches.
    pub async fn run(&self, today: NaiveDate, image_links: Option<&str>) -> Result<DigestOutcome> {
        let digest = self.builder.build(today).await?;

        if digest.is_empty() {
            info!(date = %today, "No releases today, digest not sent");
            return Ok(DigestOutcome::Empty);
        }

        let match_count = digest.match_count();
        let image = self.selector.select(&digest.images, image_links);
        let message = OutboundMessage::new(
            NotificationKind::Subscribe,
            digest_title(match_count),
            digest.text(),
        )
        .with_image(image.clone());

        self.sender.send(message).await?;

        info!(date = %today, match_count, image = %image, "Release digest sent");
        Ok(DigestOutcome::Sent { match_count, image })
    }
}
