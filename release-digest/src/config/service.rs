//! Configuration service implementation.
//!
//! Typed access to the plugin configuration store, with event broadcasting
//! for user-initiated updates.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::events::{ConfigEventBroadcaster, ConfigUpdateEvent};
use super::store::{ConfigStore, DEFAULT_IMAGE_CONFIG_KEY, DIGEST_CONFIG_KEY, LOGGING_CONFIG_KEY};
use super::types::{DefaultImageConfig, DigestConfig, LoggingConfig};
use crate::{Error, Result};

/// Configuration service.
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    broadcaster: ConfigEventBroadcaster,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            broadcaster: ConfigEventBroadcaster::new(),
        }
    }

    // ========== Event Broadcasting ==========

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateEvent> {
        self.broadcaster.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    // ========== Digest Config ==========

    /// Get the digest configuration, or its default when none is stored.
    ///
    /// A stored document that does not decode is an error, never a silent
    /// default.
    pub async fn get_digest_config(&self) -> Result<DigestConfig> {
        self.load_or_default(DIGEST_CONFIG_KEY).await
    }

    /// Store the digest configuration and notify listeners.
    pub async fn update_digest_config(&self, config: &DigestConfig) -> Result<()> {
        self.save(DIGEST_CONFIG_KEY, config).await?;
        self.broadcaster.publish(ConfigUpdateEvent::DigestUpdated);
        info!(enabled = config.enabled, run_once = config.run_once, "Digest config updated");
        Ok(())
    }

    /// Store the digest configuration without notifying listeners.
    pub async fn persist_digest_config(&self, config: &DigestConfig) -> Result<()> {
        self.save(DIGEST_CONFIG_KEY, config).await
    }

    // ========== Default Image Config ==========

    pub async fn get_default_image_config(&self) -> Result<DefaultImageConfig> {
        self.load_or_default(DEFAULT_IMAGE_CONFIG_KEY).await
    }

    pub async fn update_default_image_config(&self, config: &DefaultImageConfig) -> Result<()> {
        self.save(DEFAULT_IMAGE_CONFIG_KEY, config).await?;
        self.broadcaster
            .publish(ConfigUpdateEvent::DefaultImageUpdated);
        info!(
            enabled = config.enabled,
            wallpaper = %config.wallpaper_source,
            "Default image config updated"
        );
        Ok(())
    }

    pub async fn persist_default_image_config(&self, config: &DefaultImageConfig) -> Result<()> {
        self.save(DEFAULT_IMAGE_CONFIG_KEY, config).await
    }

    // ========== Logging Config ==========

    pub async fn get_logging_config(&self) -> Result<LoggingConfig> {
        self.load_or_default(LOGGING_CONFIG_KEY).await
    }

    pub async fn update_logging_config(&self, config: &LoggingConfig) -> Result<()> {
        self.save(LOGGING_CONFIG_KEY, config).await?;
        self.broadcaster.publish(ConfigUpdateEvent::LoggingUpdated);
        info!(filter = %config.filter, "Logging config updated");
        Ok(())
    }

    // ========== Helpers ==========

    async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.load(key).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                warn!(key, error = %e, "Stored config is invalid");
                Error::config(format!("stored {} config is invalid: {}", key, e))
            }),
            None => Ok(T::default()),
        }
    }

    async fn save<T: Serialize>(&self, key: &str, config: &T) -> Result<()> {
        let value = serde_json::to_value(config)?;
        self.store.save(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::MemoryConfigStore;
    use serde_json::json;

    fn service() -> (ConfigService, Arc<MemoryConfigStore>) {
        let store = Arc::new(MemoryConfigStore::new());
        (ConfigService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_missing_config_is_default() {
        let (service, _) = service();
        assert_eq!(
            service.get_digest_config().await.unwrap(),
            DigestConfig::default()
        );
        assert_eq!(
            service.get_default_image_config().await.unwrap(),
            DefaultImageConfig::default()
        );
    }

    #[tokio::test]
    async fn test_update_publishes_event() {
        let (service, _) = service();
        let mut events = service.subscribe();

        let config = DigestConfig {
            enabled: true,
            ..Default::default()
        };
        service.update_digest_config(&config).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), ConfigUpdateEvent::DigestUpdated);
        assert_eq!(service.get_digest_config().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_persist_is_silent() {
        let (service, _) = service();
        let mut events = service.subscribe();

        service
            .persist_digest_config(&DigestConfig::default())
            .await
            .unwrap();

        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_stored_config_is_an_error() {
        let (service, store) = service();
        store
            .save(DIGEST_CONFIG_KEY, json!({"enabled": "yes please"}))
            .await
            .unwrap();

        let err = service.get_digest_config().await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains(DIGEST_CONFIG_KEY));
    }

    #[tokio::test]
    async fn test_stored_nulls_keep_the_config_enabled() {
        let (service, store) = service();
        store
            .save(
                DIGEST_CONFIG_KEY,
                json!({"enabled": true, "onlyonce": false, "time": 8, "img_link": null}),
            )
            .await
            .unwrap();
        store
            .save(
                DEFAULT_IMAGE_CONFIG_KEY,
                json!({"enabled": true, "img_link": null}),
            )
            .await
            .unwrap();

        let digest = service.get_digest_config().await.unwrap();
        assert!(digest.enabled);
        assert_eq!(digest.hour_of_day.as_str(), "8");
        assert!(service.get_default_image_config().await.unwrap().enabled);
    }
}
