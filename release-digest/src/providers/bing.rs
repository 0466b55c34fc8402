//! Bing daily wallpaper.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::WallpaperProvider;
use crate::utils::http_client;
use crate::{Error, Result};

pub const BING_HOST: &str = "https://cn.bing.com";

const ARCHIVE_PATH: &str = "/HPImageArchive.aspx?format=js&idx=0&n=1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    images: Vec<ArchiveImage>,
}

#[derive(Debug, Deserialize)]
struct ArchiveImage {
    #[serde(default)]
    url: String,
}

/// Today's Bing homepage image.
pub struct BingWallpaperProvider {
    client: reqwest::Client,
    host: String,
}

impl BingWallpaperProvider {
    pub fn new() -> Self {
        Self::with_host(BING_HOST)
    }

    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            client: http_client::build_client(REQUEST_TIMEOUT),
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if url.is_empty() {
            None
        } else if url.starts_with("http") {
            Some(url.to_string())
        } else {
            Some(format!("{}{}", self.host, url))
        }
    }
}

impl Default for BingWallpaperProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WallpaperProvider for BingWallpaperProvider {
    fn name(&self) -> &'static str {
        "bing"
    }

    async fn random(&self) -> Result<Option<String>> {
        let url = format!("{}{}", self.host, ARCHIVE_PATH);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::metadata(format!("Bing wallpaper returned HTTP {}", status)));
        }

        let archive: ArchiveResponse = response.json().await?;
        Ok(archive
            .images
            .first()
            .and_then(|image| self.absolute(&image.url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let provider = BingWallpaperProvider::with_host("https://cn.bing.com/");
        assert_eq!(
            provider.absolute("/th?id=OHR.Foo_1920x1080.jpg"),
            Some("https://cn.bing.com/th?id=OHR.Foo_1920x1080.jpg".to_string())
        );
        assert_eq!(
            provider.absolute("https://example.com/a.jpg"),
            Some("https://example.com/a.jpg".to_string())
        );
        assert_eq!(provider.absolute("  "), None);
    }

    #[test]
    fn test_archive_response_shape() {
        let json = r#"{"images":[{"url":"/th?id=a.jpg","copyright":"x"}],"tooltips":{}}"#;
        let archive: ArchiveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(archive.images[0].url, "/th?id=a.jpg");
    }
}
