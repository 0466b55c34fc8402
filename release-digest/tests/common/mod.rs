//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use release_digest::domain::{
    EpisodeRecord, MetadataProvider, MovieInfo, Subscription, SubscriptionStore,
    WallpaperProvider,
};
use release_digest::notification::{NotificationChannel, NotificationSender, OutboundMessage};
use release_digest::{Error, Result};

pub struct FakeSubscriptions(pub Vec<Subscription>);

#[async_trait]
impl SubscriptionStore for FakeSubscriptions {
    async fn list(&self) -> Result<Vec<Subscription>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FakeMetadata {
    pub episodes: HashMap<(u64, u32), Vec<EpisodeRecord>>,
    pub movies: HashMap<u64, MovieInfo>,
    pub failing: HashSet<u64>,
    pub wallpaper: Option<String>,
}

impl FakeMetadata {
    pub fn with_season(mut self, tmdb_id: u64, season: u32, episodes: Vec<EpisodeRecord>) -> Self {
        self.episodes.insert((tmdb_id, season), episodes);
        self
    }

    pub fn with_movie(mut self, tmdb_id: u64, release_date: Option<NaiveDate>) -> Self {
        self.movies.insert(tmdb_id, MovieInfo { release_date });
        self
    }

    pub fn failing_for(mut self, tmdb_id: u64) -> Self {
        self.failing.insert(tmdb_id);
        self
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadata {
    async fn episodes(&self, tmdb_id: u64, season: u32) -> Result<Vec<EpisodeRecord>> {
        if self.failing.contains(&tmdb_id) {
            return Err(Error::metadata("provider unavailable"));
        }
        Ok(self.episodes.get(&(tmdb_id, season)).cloned().unwrap_or_default())
    }

    async fn movie_info(&self, tmdb_id: u64) -> Result<Option<MovieInfo>> {
        if self.failing.contains(&tmdb_id) {
            return Err(Error::metadata("provider unavailable"));
        }
        Ok(self.movies.get(&tmdb_id).cloned())
    }

    async fn random_wallpaper(&self) -> Result<Option<String>> {
        Ok(self.wallpaper.clone())
    }
}

pub struct FixedWallpaper(pub Option<&'static str>);

#[async_trait]
impl WallpaperProvider for FixedWallpaper {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn random(&self) -> Result<Option<String>> {
        Ok(self.0.map(str::to_string))
    }
}

/// Records every message handed to it.
#[derive(Default)]
pub struct RecordingSender {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSender {
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.messages.lock().push(message);
        Ok(())
    }
}

/// Channel that records delivered messages.
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingChannel {
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn channel_type(&self) -> &'static str {
        "recording"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.messages.lock().push(message.clone());
        Ok(())
    }
}

pub fn ep(number: u32, air_date: NaiveDate) -> EpisodeRecord {
    EpisodeRecord::new(number, Some(air_date))
}

/// Poll `condition` while letting virtual time move forward.
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
