//! Service container.
//!
//! Wires the collaborators into the two plugin services, applies their stored
//! configuration and re-applies it whenever a config update event arrives.
//! System messages are forwarded to the notification channels.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::default_image::{DEFAULT_IMAGE_SOURCE, DefaultImageService};
use super::subscription_digest::{DIGEST_SOURCE, SubscriptionDigestService};
use crate::Result;
use crate::config::{ConfigService, ConfigStore, ConfigUpdateEvent};
use crate::digest::{DigestBuilder, DigestService, ImageSelector};
use crate::domain::{MetadataProvider, SubscriptionStore, WallpaperProvider};
use crate::logging::LoggingHandle;
use crate::notification::{
    NotificationChannel, NotificationKind, NotificationPipeline, NotificationSender,
    OutboundMessage, SystemMessage, SystemMessageQueue,
};
use crate::providers::MediaWallpaper;
use crate::scheduler::ScheduleZone;

/// Source name used for system messages raised by the host.
pub const HOST_SOURCE: &str = "host";

/// Default shutdown timeout for the background tasks.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// External collaborators the container is built from.
pub struct ServiceDependencies {
    pub config_store: Arc<dyn ConfigStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub web_wallpaper: Arc<dyn WallpaperProvider>,
    pub channels: Vec<Arc<dyn NotificationChannel>>,
    /// Zone used when the digest config does not name one.
    pub default_zone: ScheduleZone,
    /// Installed logging, reloaded from the logging config when present.
    pub logging: Option<Arc<LoggingHandle>>,
}

/// Service container holding all application services.
pub struct ServiceContainer {
    pub config_service: Arc<ConfigService>,
    pub pipeline: Arc<NotificationPipeline>,
    pub system_messages: Arc<SystemMessageQueue>,
    pub digest: Arc<SubscriptionDigestService>,
    pub default_image: Arc<DefaultImageService>,
    logging: Option<Arc<LoggingHandle>>,
    cancellation_token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ServiceContainer {
    pub fn new(deps: ServiceDependencies) -> Self {
        info!("Initializing service container");

        let config_service = Arc::new(ConfigService::new(deps.config_store));
        let pipeline = Arc::new(NotificationPipeline::with_channels(deps.channels));
        let system_messages = Arc::new(SystemMessageQueue::new());

        let digest_service = Arc::new(DigestService::new(
            DigestBuilder::new(deps.subscriptions, deps.metadata.clone()),
            ImageSelector::new(),
            pipeline.clone(),
        ));
        let digest = Arc::new(SubscriptionDigestService::new(
            digest_service,
            config_service.clone(),
            system_messages.clone(),
            deps.default_zone,
        ));

        let default_image = Arc::new(DefaultImageService::new(
            pipeline.clone(),
            Arc::new(MediaWallpaper::new(deps.metadata)),
            deps.web_wallpaper,
            system_messages.clone(),
        ));

        Self {
            config_service,
            pipeline,
            system_messages,
            digest,
            default_image,
            logging: deps.logging,
            cancellation_token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Apply the stored configuration and start listening for updates.
    ///
    /// Configuration that cannot be loaded is reported as a system message
    /// and leaves the affected service as it was.
    pub async fn start(&self) -> Result<()> {
        self.setup_system_message_forwarding();
        let appliers = self.appliers();
        appliers.apply_all().await;
        self.setup_config_event_subscriptions(appliers);
        info!("Services started");
        Ok(())
    }

    fn appliers(&self) -> ConfigAppliers {
        ConfigAppliers {
            config_service: self.config_service.clone(),
            system_messages: self.system_messages.clone(),
            digest: self.digest.clone(),
            default_image: self.default_image.clone(),
            logging: self.logging.clone(),
        }
    }

    fn setup_config_event_subscriptions(&self, appliers: ConfigAppliers) {
        let mut receiver = self.config_service.subscribe();
        let cancellation_token = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancellation_token.cancelled() => {
                        debug!("Config event handler shutting down");
                        break;
                    }
                    result = receiver.recv() => {
                        match result {
                            Ok(ConfigUpdateEvent::DigestUpdated) => appliers.apply_digest().await,
                            Ok(ConfigUpdateEvent::DefaultImageUpdated) => {
                                appliers.apply_default_image().await
                            }
                            Ok(ConfigUpdateEvent::LoggingUpdated) => appliers.apply_logging().await,
                            Err(RecvError::Lagged(skipped)) => {
                                warn!(skipped, "Config events lagged, reloading all");
                                appliers.apply_all().await;
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                }
            }
        });

        self.tasks.lock().push(handle);
    }

    /// Deliver every system message through the notification pipeline.
    fn setup_system_message_forwarding(&self) {
        let mut receiver = self.system_messages.subscribe();
        let cancellation_token = self.cancellation_token.clone();
        let pipeline = self.pipeline.clone();

        let handle = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    _ = cancellation_token.cancelled() => {
                        debug!("System message forwarder shutting down");
                        break;
                    }
                    result = receiver.recv() => {
                        match result {
                            Ok(message) => message,
                            Err(RecvError::Lagged(skipped)) => {
                                warn!(skipped, "System message forwarder lagged");
                                continue;
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                };

                if let Err(e) = pipeline.send(system_notification(&message)).await {
                    warn!(source = %message.source, error = %e, "Failed to forward system message");
                }
            }
        });

        self.tasks.lock().push(handle);
    }

    /// Shutdown all services gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        info!("Shutting down services (timeout: {:?})", timeout);

        self.cancellation_token.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let abort = task.abort_handle();
            if tokio::time::timeout(timeout, task).await.is_err() {
                warn!("Background task did not stop in time, aborting");
                abort.abort();
            }
        }

        self.digest.stop().await;
        self.default_image.stop();

        info!("Services shut down");
        Ok(())
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

fn system_notification(message: &SystemMessage) -> OutboundMessage {
    OutboundMessage::new(
        NotificationKind::Plugin,
        format!("[{}] needs attention", message.source),
        message.text.clone(),
    )
}

/// Re-applies stored configuration to the services that own it.
struct ConfigAppliers {
    config_service: Arc<ConfigService>,
    system_messages: Arc<SystemMessageQueue>,
    digest: Arc<SubscriptionDigestService>,
    default_image: Arc<DefaultImageService>,
    logging: Option<Arc<LoggingHandle>>,
}

impl ConfigAppliers {
    async fn apply_all(&self) {
        self.apply_logging().await;
        self.apply_digest().await;
        self.apply_default_image().await;
    }

    async fn apply_digest(&self) {
        match self.config_service.get_digest_config().await {
            Ok(config) => {
                self.digest.configure(config).await;
            }
            Err(e) => self.report(DIGEST_SOURCE, format!("Digest config not applied: {}", e)),
        }
    }

    async fn apply_default_image(&self) {
        match self.config_service.get_default_image_config().await {
            Ok(config) => {
                self.default_image.configure(&config);
            }
            Err(e) => self.report(
                DEFAULT_IMAGE_SOURCE,
                format!("Default image config not applied: {}", e),
            ),
        }
    }

    async fn apply_logging(&self) {
        let Some(logging) = &self.logging else {
            return;
        };
        if let Err(e) = logging.apply_persisted_filter(&self.config_service).await {
            self.report(HOST_SOURCE, format!("Log filter not applied: {}", e));
        }
    }

    fn report(&self, source: &str, text: String) {
        warn!(source, "{}", text);
        self.system_messages.put(source, text);
    }
}
