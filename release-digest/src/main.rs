use std::sync::Arc;

use tracing::{info, warn};

use release_digest::config::{AppConfig, JsonFileConfigStore};
use release_digest::domain::MetadataProvider;
use release_digest::logging::{LoggingOptions, init_logging};
use release_digest::notification::{NotificationChannel, WebhookChannel};
use release_digest::providers::{
    BingWallpaperProvider, DisabledMetadata, JsonSubscriptionStore, TmdbClient,
};
use release_digest::services::{ServiceContainer, ServiceDependencies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let (logging, _guard) = init_logging(LoggingOptions {
        filter: config.log_filter.clone(),
        log_dir: config.log_dir.clone(),
    })?;

    info!(
        config = %config.config_path.display(),
        subscriptions = %config.subscriptions_path.display(),
        zone = %config.zone,
        filter = %logging.get_filter(),
        "Starting release-digest v{}",
        env!("CARGO_PKG_VERSION")
    );

    let metadata: Arc<dyn MetadataProvider> = match config.tmdb_api_key.as_deref() {
        Some(api_key) => Arc::new(TmdbClient::new(api_key, config.tmdb_language.as_str())),
        None => {
            warn!("TMDB_API_KEY not set; metadata lookups are disabled");
            Arc::new(DisabledMetadata)
        }
    };

    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
    match config.webhook.clone() {
        Some(webhook) => channels.push(Arc::new(WebhookChannel::new(webhook))),
        None => warn!("NOTIFY_WEBHOOK_URL not set; notifications are not delivered"),
    }

    let container = ServiceContainer::new(ServiceDependencies {
        config_store: Arc::new(JsonFileConfigStore::new(&config.config_path)),
        subscriptions: Arc::new(JsonSubscriptionStore::new(&config.subscriptions_path)),
        metadata,
        web_wallpaper: Arc::new(BingWallpaperProvider::new()),
        channels,
        default_zone: config.zone,
        logging: Some(logging.clone()),
    });

    logging.start_retention_cleanup(container.cancellation_token());
    container.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    container.shutdown().await?;
    Ok(())
}
