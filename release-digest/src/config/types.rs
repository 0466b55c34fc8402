//! Typed plugin configuration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scheduler::{DailySchedule, ScheduleError, ScheduleZone};

/// Default hour of day for the digest run.
pub const DEFAULT_DIGEST_HOUR: u32 = 9;

/// Hour of day as entered by the user.
///
/// Kept raw so that a malformed value survives loading and is reported when
/// the schedule is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleHour(String);

impl ScheduleHour {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// No hour given; the digest has no recurring run.
    pub fn is_unset(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn to_schedule(&self) -> Result<DailySchedule, ScheduleError> {
        DailySchedule::parse(&self.0)
    }
}

impl Default for ScheduleHour {
    fn default() -> Self {
        Self(DEFAULT_DIGEST_HOUR.to_string())
    }
}

impl From<u32> for ScheduleHour {
    fn from(hour: u32) -> Self {
        Self(hour.to_string())
    }
}

impl Serialize for ScheduleHour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.trim().parse::<i64>() {
            Ok(hour) => serializer.serialize_i64(hour),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ScheduleHour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Null,
            Int(i64),
            Float(f64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Null => Self(String::new()),
            Raw::Int(hour) => Self(hour.to_string()),
            Raw::Float(hour) => Self(hour.to_string()),
            Raw::Str(raw) => Self(raw),
        })
    }
}

/// Read an explicit `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Configuration of the daily release digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    /// Run once shortly after configuration, then reset.
    #[serde(alias = "onlyonce", deserialize_with = "null_as_default")]
    pub run_once: bool,
    /// `null` or blank means no recurring run.
    #[serde(alias = "time")]
    pub hour_of_day: ScheduleHour,
    /// Newline separated image URLs.
    #[serde(alias = "img_link", deserialize_with = "null_as_default")]
    pub image_links: String,
    /// IANA timezone for "today" and the fire time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl DigestConfig {
    pub fn schedule(&self) -> Result<DailySchedule, ScheduleError> {
        self.hour_of_day.to_schedule()
    }

    /// The configured zone, or `fallback` when none is set.
    pub fn zone(&self, fallback: ScheduleZone) -> Result<ScheduleZone, ScheduleError> {
        match self.timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => ScheduleZone::parse(Some(name)),
            _ => Ok(fallback),
        }
    }

    pub fn image_links(&self) -> Option<&str> {
        let trimmed = self.image_links.trim();
        (!trimmed.is_empty()).then_some(self.image_links.as_str())
    }
}

/// Where the fallback wallpaper comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallpaperSource {
    /// Random backdrop from the metadata provider.
    #[default]
    #[serde(alias = "tmdb")]
    Media,
    /// Generic web wallpaper.
    #[serde(alias = "bing")]
    Web,
}

impl std::fmt::Display for WallpaperSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Media => write!(f, "media"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// Configuration of the default image fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultImageConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(alias = "img_link", deserialize_with = "null_as_default")]
    pub image_links: String,
    #[serde(alias = "wallpaper", deserialize_with = "null_as_default")]
    pub wallpaper_source: WallpaperSource,
    /// Overrides the built-in default image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,
}

impl DefaultImageConfig {
    pub fn image_links(&self) -> Option<&str> {
        let trimmed = self.image_links.trim();
        (!trimmed.is_empty()).then_some(self.image_links.as_str())
    }
}

/// Host logging settings that can change at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `"release_digest=debug"`. Blank keeps the
    /// startup filter.
    #[serde(deserialize_with = "null_as_default")]
    pub filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_config_defaults() {
        let config: DigestConfig = serde_json::from_value(json!({})).unwrap();
        assert!(!config.enabled);
        assert!(!config.run_once);
        assert_eq!(config.schedule().unwrap().hour(), 9);
        assert!(config.image_links().is_none());
    }

    #[test]
    fn test_hour_accepts_number_or_string() {
        let config: DigestConfig =
            serde_json::from_value(json!({"enabled": true, "hour_of_day": 21})).unwrap();
        assert_eq!(config.schedule().unwrap().hour(), 21);

        let config: DigestConfig = serde_json::from_value(json!({"time": "7"})).unwrap();
        assert_eq!(config.schedule().unwrap().hour(), 7);
    }

    #[test]
    fn test_malformed_hour_loads_but_fails_validation() {
        let config: DigestConfig =
            serde_json::from_value(json!({"hour_of_day": "morning"})).unwrap();
        assert_eq!(config.hour_of_day.as_str(), "morning");
        assert!(matches!(
            config.schedule(),
            Err(ScheduleError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_legacy_field_names() {
        let config: DigestConfig = serde_json::from_value(json!({
            "enabled": true,
            "onlyonce": true,
            "time": 8,
            "img_link": "http://a.png"
        }))
        .unwrap();
        assert!(config.run_once);
        assert_eq!(config.image_links(), Some("http://a.png"));
    }

    #[test]
    fn test_stored_nulls_are_accepted() {
        let config: DigestConfig = serde_json::from_value(json!({
            "enabled": true,
            "onlyonce": false,
            "time": 8,
            "img_link": null
        }))
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.schedule().unwrap().hour(), 8);
        assert!(config.image_links().is_none());

        let config: DigestConfig = serde_json::from_value(json!({
            "enabled": true,
            "onlyonce": null,
            "time": null,
            "img_link": null
        }))
        .unwrap();
        assert!(config.enabled);
        assert!(!config.run_once);
        assert!(config.hour_of_day.is_unset());

        let config: DefaultImageConfig =
            serde_json::from_value(json!({"enabled": true, "img_link": null, "wallpaper": null}))
                .unwrap();
        assert!(config.enabled);
        assert!(config.image_links().is_none());
        assert_eq!(config.wallpaper_source, WallpaperSource::Media);
    }

    #[test]
    fn test_missing_hour_is_not_unset() {
        let config = DigestConfig::default();
        assert!(!config.hour_of_day.is_unset());
        assert!(ScheduleHour::new("  ").is_unset());
    }

    #[test]
    fn test_hour_serializes_as_number_when_numeric() {
        let config = DigestConfig {
            hour_of_day: ScheduleHour::from(6),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["hour_of_day"], json!(6));
        assert!(value.get("timezone").is_none());
    }

    #[test]
    fn test_zone_fallback() {
        let config = DigestConfig::default();
        assert_eq!(
            config.zone(ScheduleZone::Local).unwrap(),
            ScheduleZone::Local
        );

        let config = DigestConfig {
            timezone: Some("Europe/Paris".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.zone(ScheduleZone::Local).unwrap(),
            ScheduleZone::Named(_)
        ));
    }

    #[test]
    fn test_wallpaper_source_aliases() {
        let config: DefaultImageConfig =
            serde_json::from_value(json!({"enabled": true, "wallpaper": "bing"})).unwrap();
        assert_eq!(config.wallpaper_source, WallpaperSource::Web);

        let config: DefaultImageConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.wallpaper_source, WallpaperSource::Media);
    }
}
