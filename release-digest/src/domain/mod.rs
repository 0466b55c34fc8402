//! Domain types shared by the digest, scheduler and notification modules.

mod media;
mod subscription;

pub use media::{EpisodeRecord, MetadataProvider, MovieInfo, SubscriptionStore, WallpaperProvider};
pub use subscription::{MediaKind, Subscription};
