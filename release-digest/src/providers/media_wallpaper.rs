//! Exposes a metadata provider's random wallpaper as a [`WallpaperProvider`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::domain::{MetadataProvider, WallpaperProvider};

pub struct MediaWallpaper {
    metadata: Arc<dyn MetadataProvider>,
}

impl MediaWallpaper {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl WallpaperProvider for MediaWallpaper {
    fn name(&self) -> &'static str {
        "media"
    }

    async fn random(&self) -> Result<Option<String>> {
        self.metadata.random_wallpaper().await
    }
}
