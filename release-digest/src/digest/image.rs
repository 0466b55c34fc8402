//! Header image selection for the digest notification.

use rand::seq::IndexedRandom;

/// Image used when neither configured links nor subscription artwork are available.
pub const DEFAULT_DIGEST_IMAGE: &str =
    "https://raw.githubusercontent.com/jianxcao/MoviePilot-extension/main/img/default.png";

/// Split a newline-delimited list of image links, keeping only lines that start with `http`.
///
/// A line with leading whitespace is not a link. Trailing whitespace (such as
/// the `\r` of a CRLF line ending) is stripped from kept links.
pub fn parse_image_links(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split('\n')
        .filter(|line| line.starts_with("http"))
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Pick one element uniformly at random.
pub fn choose_random(candidates: &[String]) -> Option<&String> {
    candidates.choose(&mut rand::rng())
}

/// Picks the header image for one digest run.
#[derive(Debug, Clone)]
pub struct ImageSelector {
    default_image: String,
}

impl ImageSelector {
    pub fn new() -> Self {
        Self::with_default(DEFAULT_DIGEST_IMAGE)
    }

    /// Use a different fixed fallback asset.
    pub fn with_default(default_image: impl Into<String>) -> Self {
        Self {
            default_image: default_image.into(),
        }
    }

    pub fn default_image(&self) -> &str {
        &self.default_image
    }

    /// Select the image for a run.
    ///
    /// Priority: a random valid configured link, then a random collected image,
    /// then the fixed default.
    pub fn select(&self, images: &[String], configured_links: Option<&str>) -> String {
        let links = parse_image_links(configured_links);
        if let Some(link) = choose_random(&links) {
            return link.clone();
        }

        if let Some(image) = choose_random(images) {
            return image.clone();
        }

        self.default_image.clone()
    }
}

impl Default for ImageSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_links_filters_non_http() {
        let links = parse_image_links(Some("http://a.png\nnot-a-url\n\nhttps://b.png\r\n"));
        assert_eq!(links, vec!["http://a.png", "https://b.png"]);
        assert!(parse_image_links(None).is_empty());
        assert!(parse_image_links(Some("")).is_empty());
    }

    #[test]
    fn test_parse_image_links_indented_line_is_dropped() {
        let links = parse_image_links(Some(" http://indented.png\nhttp://kept.png  "));
        assert_eq!(links, vec!["http://kept.png"]);
    }

    #[test]
    fn test_configured_links_override_images() {
        let selector = ImageSelector::new();
        let images = vec!["http://backdrop-1".to_string(), "http://backdrop-2".to_string()];
        let configured = "http://a.png\nhttp://b.png";

        for _ in 0..50 {
            let picked = selector.select(&images, Some(configured));
            assert!(picked == "http://a.png" || picked == "http://b.png");
        }
    }

    #[test]
    fn test_single_valid_link_always_chosen() {
        let selector = ImageSelector::new();
        let images = vec!["http://backdrop".to_string()];
        for _ in 0..20 {
            assert_eq!(
                selector.select(&images, Some("http://a.png\nnot-a-url")),
                "http://a.png"
            );
        }
    }

    #[test]
    fn test_invalid_links_fall_back_to_images() {
        let selector = ImageSelector::new();
        let images = vec!["http://backdrop".to_string()];
        assert_eq!(selector.select(&images, Some("ftp://x\nfoo")), "http://backdrop");
    }

    #[test]
    fn test_default_when_nothing_available() {
        let selector = ImageSelector::new();
        assert_eq!(selector.select(&[], None), DEFAULT_DIGEST_IMAGE);

        let custom = ImageSelector::with_default("http://fallback.png");
        assert_eq!(custom.select(&[], Some("")), "http://fallback.png");
    }
}
