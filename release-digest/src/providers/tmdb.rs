//! TMDB v3 metadata client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{EpisodeRecord, MetadataProvider, MovieInfo};
use crate::utils::http_client;
use crate::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct SeasonResponse {
    #[serde(default)]
    episodes: Vec<EpisodeItem>,
}

#[derive(Debug, Deserialize)]
struct EpisodeItem {
    episode_number: u32,
    #[serde(default)]
    air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    results: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    #[serde(default)]
    backdrop_path: Option<String>,
}

/// Parse a TMDB date. Empty or malformed dates count as unknown.
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// TMDB client.
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    language: String,
    api_base: String,
    image_base: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: http_client::build_client(REQUEST_TIMEOUT),
            api_key: api_key.into(),
            language: language.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
        }
    }

    /// Point the client at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}{}", self.api_base, path);
        debug!(url = %url, "TMDB request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::metadata(format!("TMDB {} returned HTTP {}", path, status)));
        }

        Ok(Some(response.json().await?))
    }

    fn image_url(&self, path: &str) -> String {
        format!("{}{}", self.image_base, path)
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn episodes(&self, tmdb_id: u64, season: u32) -> Result<Vec<EpisodeRecord>> {
        let path = format!("/tv/{}/season/{}", tmdb_id, season);
        let Some(response) = self.get::<SeasonResponse>(&path).await? else {
            return Ok(Vec::new());
        };

        Ok(response
            .episodes
            .into_iter()
            .map(|e| EpisodeRecord::new(e.episode_number, parse_date(e.air_date.as_deref())))
            .collect())
    }

    async fn movie_info(&self, tmdb_id: u64) -> Result<Option<MovieInfo>> {
        let path = format!("/movie/{}", tmdb_id);
        Ok(self.get::<MovieResponse>(&path).await?.map(|m| MovieInfo {
            release_date: parse_date(m.release_date.as_deref()),
        }))
    }

    async fn random_wallpaper(&self) -> Result<Option<String>> {
        let Some(response) = self.get::<TrendingResponse>("/trending/all/week").await? else {
            return Ok(None);
        };

        let backdrops: Vec<String> = response
            .results
            .into_iter()
            .filter_map(|item| item.backdrop_path)
            .filter(|path| !path.trim().is_empty())
            .map(|path| self.image_url(&path))
            .collect();

        Ok(crate::digest::choose_random(&backdrops).cloned())
    }
}
