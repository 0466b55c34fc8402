//! Configuration.
//!
//! Host settings come from the environment; plugin settings live in a
//! [`ConfigStore`] and are accessed through the [`ConfigService`], which
//! broadcasts an event for every user-initiated update.

pub mod app;
pub mod events;
pub mod service;
pub mod store;
pub mod types;

pub use app::AppConfig;
pub use events::{ConfigEventBroadcaster, ConfigUpdateEvent};
pub use service::ConfigService;
pub use store::{
    ConfigStore, DEFAULT_IMAGE_CONFIG_KEY, DIGEST_CONFIG_KEY, JsonFileConfigStore,
    LOGGING_CONFIG_KEY, MemoryConfigStore,
};
pub use types::{DefaultImageConfig, DigestConfig, LoggingConfig, ScheduleHour, WallpaperSource};
