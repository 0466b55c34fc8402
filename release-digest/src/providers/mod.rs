//! Concrete collaborators: metadata, wallpapers and the subscription list.

mod bing;
mod disabled;
mod media_wallpaper;
mod subscriptions;
mod tmdb;

pub use bing::{BING_HOST, BingWallpaperProvider};
pub use disabled::DisabledMetadata;
pub use media_wallpaper::MediaWallpaper;
pub use subscriptions::JsonSubscriptionStore;
pub use tmdb::TmdbClient;
