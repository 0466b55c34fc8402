//! Metadata provider used when no metadata API is configured.

use async_trait::async_trait;

use crate::Result;
use crate::domain::{EpisodeRecord, MetadataProvider, MovieInfo};

/// Knows nothing; every lookup comes back empty.
pub struct DisabledMetadata;

#[async_trait]
impl MetadataProvider for DisabledMetadata {
    async fn episodes(&self, _tmdb_id: u64, _season: u32) -> Result<Vec<EpisodeRecord>> {
        Ok(Vec::new())
    }

    async fn movie_info(&self, _tmdb_id: u64) -> Result<Option<MovieInfo>> {
        Ok(None)
    }

    async fn random_wallpaper(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
