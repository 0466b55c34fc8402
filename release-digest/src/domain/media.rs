//! Metadata records and the collaborator traits the digest queries.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::subscription::Subscription;
use crate::Result;

/// One episode of a season as reported by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_number: u32,
    pub air_date: Option<NaiveDate>,
}

impl EpisodeRecord {
    pub fn new(episode_number: u32, air_date: Option<NaiveDate>) -> Self {
        Self {
            episode_number,
            air_date,
        }
    }

    /// Whether this episode airs on `date`.
    pub fn airs_on(&self, date: NaiveDate) -> bool {
        self.air_date == Some(date)
    }
}

/// Release information for a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
    pub release_date: Option<NaiveDate>,
}

/// Source of the current subscription list.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Subscription>>;
}

/// Media metadata lookups.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// All episodes of one season, in provider order.
    async fn episodes(&self, tmdb_id: u64, season: u32) -> Result<Vec<EpisodeRecord>>;

    /// Release info for a movie, or `None` when the provider does not know it.
    async fn movie_info(&self, tmdb_id: u64) -> Result<Option<MovieInfo>>;

    /// A random wallpaper derived from media metadata.
    async fn random_wallpaper(&self) -> Result<Option<String>>;
}

/// Source of a random wallpaper image URL.
#[async_trait]
pub trait WallpaperProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn random(&self) -> Result<Option<String>>;
}
