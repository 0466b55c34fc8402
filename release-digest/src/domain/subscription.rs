//! Subscription records tracked by the host.

use serde::{Deserialize, Serialize};

/// Kind of media a subscription tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A TV series; one subscription covers a single season.
    #[serde(alias = "TV", alias = "series")]
    Tv,
    /// A feature film.
    #[serde(alias = "Movie", alias = "film")]
    Movie,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tv => write!(f, "tv"),
            Self::Movie => write!(f, "movie"),
        }
    }
}

/// A tracked media subscription.
///
/// Owned by the subscription store and read-only to the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u64,
    pub kind: MediaKind,
    #[serde(default)]
    pub tmdb_id: Option<u64>,
    #[serde(default)]
    pub season: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub backdrop: Option<String>,
}

impl Subscription {
    /// Create a TV subscription for one season.
    pub fn tv(id: u64, name: impl Into<String>, tmdb_id: u64, season: u32) -> Self {
        Self {
            id,
            kind: MediaKind::Tv,
            tmdb_id: Some(tmdb_id),
            season: Some(season),
            name: name.into(),
            year: None,
            poster: None,
            backdrop: None,
        }
    }

    /// Create a movie subscription.
    pub fn movie(id: u64, name: impl Into<String>, tmdb_id: u64, year: Option<u16>) -> Self {
        Self {
            id,
            kind: MediaKind::Movie,
            tmdb_id: Some(tmdb_id),
            season: None,
            name: name.into(),
            year,
            poster: None,
            backdrop: None,
        }
    }

    /// Set the poster URL.
    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }

    /// Set the backdrop URL.
    pub fn with_backdrop(mut self, backdrop: impl Into<String>) -> Self {
        self.backdrop = Some(backdrop.into());
        self
    }

    /// Identifiers needed to query a season's episodes, if this is an eligible TV subscription.
    pub fn tv_lookup(&self) -> Option<(u64, u32)> {
        match (self.kind, self.tmdb_id, self.season) {
            (MediaKind::Tv, Some(tmdb_id), Some(season)) => Some((tmdb_id, season)),
            _ => None,
        }
    }

    /// Identifier needed to query release info, if this is an eligible movie subscription.
    pub fn movie_lookup(&self) -> Option<u64> {
        match self.kind {
            MediaKind::Movie => self.tmdb_id,
            MediaKind::Tv => None,
        }
    }

    /// Preferred artwork for notifications: backdrop first, then poster.
    ///
    /// Empty strings count as absent.
    pub fn artwork(&self) -> Option<&str> {
        non_empty(self.backdrop.as_deref()).or_else(|| non_empty(self.poster.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artwork_prefers_backdrop() {
        let sub = Subscription::tv(1, "Show", 10, 1)
            .with_poster("http://poster")
            .with_backdrop("http://backdrop");
        assert_eq!(sub.artwork(), Some("http://backdrop"));
    }

    #[test]
    fn test_artwork_skips_empty_backdrop() {
        let sub = Subscription::tv(1, "Show", 10, 1)
            .with_poster("http://poster")
            .with_backdrop("");
        assert_eq!(sub.artwork(), Some("http://poster"));

        let bare = Subscription::movie(2, "Film", 20, None).with_poster("");
        assert_eq!(bare.artwork(), None);
    }

    #[test]
    fn test_tv_lookup_requires_season() {
        let mut sub = Subscription::tv(1, "Show", 10, 2);
        assert_eq!(sub.tv_lookup(), Some((10, 2)));

        sub.season = None;
        assert_eq!(sub.tv_lookup(), None);

        let movie = Subscription::movie(2, "Film", 20, Some(2024));
        assert_eq!(movie.tv_lookup(), None);
        assert_eq!(movie.movie_lookup(), Some(20));
    }

    #[test]
    fn test_deserialize_kind_aliases() {
        let json = r#"{"id": 3, "kind": "TV", "tmdb_id": 5, "season": 1, "name": "A"}"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.kind, MediaKind::Tv);
        assert_eq!(sub.poster, None);
    }
}
