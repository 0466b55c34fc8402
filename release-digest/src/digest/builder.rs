//! Matches subscriptions against today's releases and composes the digest text.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::Result;
use crate::domain::{MediaKind, MetadataProvider, Subscription, SubscriptionStore};

const TV_PREFIX: &str = "📺 ";
const MOVIE_PREFIX: &str = "🎬 ";

/// One line of the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEntry {
    pub display_name: String,
    pub season_label: Option<String>,
    pub episode_label: Option<String>,
}

impl DigestEntry {
    /// Entry for matched episodes of one season.
    ///
    /// The episode label spans the first and last matched numbers in list
    /// order; gaps between them are not represented.
    pub fn tv(name: &str, season: u32, episodes: &[u32]) -> Self {
        let episode_label = match episodes {
            [] => None,
            [single] => Some(format!("Episode {}", single)),
            [first, .., last] => Some(format!("Episode {}–{}", first, last)),
        };

        Self {
            display_name: format!("{}{}", TV_PREFIX, name),
            season_label: Some(format!("Season {}", season)),
            episode_label,
        }
    }

    /// Entry for a movie released today.
    pub fn movie(name: &str, year: Option<u16>) -> Self {
        let display_name = match year {
            Some(year) => format!("{}{} ({})", MOVIE_PREFIX, name, year),
            None => format!("{}{}", MOVIE_PREFIX, name),
        };

        Self {
            display_name,
            season_label: None,
            episode_label: None,
        }
    }

    /// Render as a single digest line (without the trailing newline).
    pub fn render(&self) -> String {
        [
            Some(self.display_name.as_str()),
            self.season_label.as_deref(),
            self.episode_label.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Result of one matching run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    pub tv_entries: Vec<DigestEntry>,
    pub movie_entries: Vec<DigestEntry>,
    /// Artwork of every matched subscription, in match order.
    pub images: Vec<String>,
}

impl Digest {
    /// Number of matched subscriptions.
    pub fn match_count(&self) -> usize {
        self.tv_entries.len() + self.movie_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.match_count() == 0
    }

    /// TV lines first, then movie lines, one per line.
    ///
    /// Empty when nothing matched.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for entry in self.tv_entries.iter().chain(self.movie_entries.iter()) {
            text.push_str(&entry.render());
            text.push('\n');
        }
        text
    }
}

/// Scans subscriptions for content releasing on a given date.
pub struct DigestBuilder {
    store: Arc<dyn SubscriptionStore>,
    metadata: Arc<dyn MetadataProvider>,
}

impl DigestBuilder {
    pub fn new(store: Arc<dyn SubscriptionStore>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { store, metadata }
    }

    /// Build the digest for `today`.
    ///
    /// Fails only if the subscription list itself cannot be loaded; lookup
    /// failures for individual subscriptions skip that subscription.
    pub async fn build(&self, today: NaiveDate) -> Result<Digest> {
        let subscriptions = self.store.list().await?;
        let mut digest = Digest::default();

        if subscriptions.is_empty() {
            info!("No subscriptions, nothing to match");
            return Ok(digest);
        }

        for subscription in &subscriptions {
            match subscription.kind {
                MediaKind::Tv => self.match_tv(subscription, today, &mut digest).await,
                MediaKind::Movie => self.match_movie(subscription, today, &mut digest).await,
            }
        }

        info!(
            date = %today,
            subscriptions = subscriptions.len(),
            tv = digest.tv_entries.len(),
            movies = digest.movie_entries.len(),
            "Release matching finished"
        );
        Ok(digest)
    }

    async fn match_tv(&self, subscription: &Subscription, today: NaiveDate, digest: &mut Digest) {
        let Some((tmdb_id, season)) = subscription.tv_lookup() else {
            debug!(subscription_id = subscription.id, name = %subscription.name, "TV subscription lacks tmdb id or season, skipping");
            return;
        };

        let episodes = match self.metadata.episodes(tmdb_id, season).await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(
                    subscription_id = subscription.id,
                    tmdb_id,
                    season,
                    error = %e,
                    "Episode lookup failed, skipping subscription"
                );
                return;
            }
        };

        let matched: Vec<u32> = episodes
            .iter()
            .filter(|episode| episode.airs_on(today))
            .map(|episode| episode.episode_number)
            .collect();

        if matched.is_empty() {
            return;
        }

        debug!(subscription_id = subscription.id, episodes = ?matched, "Episodes airing today");
        if let Some(image) = subscription.artwork() {
            digest.images.push(image.to_string());
        }
        digest
            .tv_entries
            .push(DigestEntry::tv(&subscription.name, season, &matched));
    }

    async fn match_movie(&self, subscription: &Subscription, today: NaiveDate, digest: &mut Digest) {
        let Some(tmdb_id) = subscription.movie_lookup() else {
            debug!(subscription_id = subscription.id, name = %subscription.name, "Movie subscription lacks tmdb id, skipping");
            return;
        };

        let info = match self.metadata.movie_info(tmdb_id).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                debug!(subscription_id = subscription.id, tmdb_id, "Movie not recognized by provider");
                return;
            }
            Err(e) => {
                warn!(
                    subscription_id = subscription.id,
                    tmdb_id,
                    error = %e,
                    "Movie lookup failed, skipping subscription"
                );
                return;
            }
        };

        if info.release_date != Some(today) {
            return;
        }

        if let Some(image) = subscription.artwork() {
            digest.images.push(image.to_string());
        }
        digest
            .movie_entries
            .push(DigestEntry::movie(&subscription.name, subscription.year));
    }
}
