//! Config-driven activation of the fallback image interceptor.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{DefaultImageConfig, WallpaperSource};
use crate::domain::WallpaperProvider;
use crate::notification::{
    DispatchInterceptor, FallbackImagePolicy, NotificationPipeline, SystemMessageQueue,
};

/// Source name used for system messages raised by the interceptor.
pub const DEFAULT_IMAGE_SOURCE: &str = "default_image";

pub struct DefaultImageService {
    interceptor: DispatchInterceptor,
    media_wallpaper: Arc<dyn WallpaperProvider>,
    web_wallpaper: Arc<dyn WallpaperProvider>,
    system_messages: Arc<SystemMessageQueue>,
}

impl DefaultImageService {
    pub fn new(
        pipeline: Arc<NotificationPipeline>,
        media_wallpaper: Arc<dyn WallpaperProvider>,
        web_wallpaper: Arc<dyn WallpaperProvider>,
        system_messages: Arc<SystemMessageQueue>,
    ) -> Self {
        Self {
            interceptor: DispatchInterceptor::new(pipeline),
            media_wallpaper,
            web_wallpaper,
            system_messages,
        }
    }

    /// Build the fallback policy described by `config`.
    pub fn policy(&self, config: &DefaultImageConfig) -> FallbackImagePolicy {
        let wallpaper = match config.wallpaper_source {
            WallpaperSource::Media => self.media_wallpaper.clone(),
            WallpaperSource::Web => self.web_wallpaper.clone(),
        };

        let mut policy = FallbackImagePolicy::new()
            .with_links(config.image_links())
            .with_wallpaper(wallpaper);
        if let Some(default_image) = config.default_image.as_deref() {
            policy = policy.with_default_image(default_image);
        }
        policy
    }

    /// Install or remove the interceptor according to `config`.
    ///
    /// Returns whether the interceptor is installed afterwards. A rejected
    /// policy leaves the previous state in place.
    pub fn configure(&self, config: &DefaultImageConfig) -> bool {
        if !config.enabled {
            if self.interceptor.uninstall() {
                info!("Default image disabled");
            }
            return false;
        }

        match self.interceptor.install(self.policy(config)) {
            Ok(()) => {
                info!(wallpaper = %config.wallpaper_source, "Default image enabled");
            }
            Err(e) => {
                warn!(error = %e, "Default image interceptor not installed");
                self.system_messages
                    .put(DEFAULT_IMAGE_SOURCE, format!("Default image not enabled: {}", e));
            }
        }
        self.interceptor.is_installed()
    }

    pub fn is_installed(&self) -> bool {
        self.interceptor.is_installed()
    }

    pub fn stop(&self) {
        self.interceptor.uninstall();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::notification::{
        DEFAULT_NOTIFICATION_IMAGE, NotificationKind, OutboundMessage,
    };
    use async_trait::async_trait;

    struct Fixed(&'static str, Option<&'static str>);

    #[async_trait]
    impl WallpaperProvider for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn random(&self) -> Result<Option<String>> {
            Ok(self.1.map(str::to_string))
        }
    }

    fn service(pipeline: Arc<NotificationPipeline>) -> (DefaultImageService, Arc<SystemMessageQueue>) {
        let messages = Arc::new(SystemMessageQueue::new());
        let service = DefaultImageService::new(
            pipeline,
            Arc::new(Fixed("media", Some("http://media/wall.jpg"))),
            Arc::new(Fixed("web", None)),
            messages.clone(),
        );
        (service, messages)
    }

    fn bare() -> OutboundMessage {
        OutboundMessage::new(NotificationKind::Download, "t", "x")
    }

    #[tokio::test]
    async fn test_wallpaper_source_selection() {
        let pipeline = Arc::new(NotificationPipeline::new());
        let (service, _) = service(pipeline.clone());

        let media = DefaultImageConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(service.configure(&media));
        let out = pipeline.prepare(bare()).await;
        assert_eq!(out.image.as_deref(), Some("http://media/wall.jpg"));

        let web = DefaultImageConfig {
            enabled: true,
            wallpaper_source: WallpaperSource::Web,
            ..Default::default()
        };
        assert!(service.configure(&web));
        let out = pipeline.prepare(bare()).await;
        assert_eq!(out.image.as_deref(), Some(DEFAULT_NOTIFICATION_IMAGE));
        assert_eq!(pipeline.middleware_names().len(), 1);
    }

    #[tokio::test]
    async fn test_disable_uninstalls() {
        let pipeline = Arc::new(NotificationPipeline::new());
        let (service, _) = service(pipeline.clone());

        service.configure(&DefaultImageConfig {
            enabled: true,
            ..Default::default()
        });
        assert!(!service.configure(&DefaultImageConfig::default()));
        assert!(pipeline.middleware_names().is_empty());
        assert!(pipeline.prepare(bare()).await.image.is_none());
    }

    #[tokio::test]
    async fn test_invalid_default_is_reported_and_keeps_previous() {
        let pipeline = Arc::new(NotificationPipeline::new());
        let (service, messages) = service(pipeline.clone());

        service.configure(&DefaultImageConfig {
            enabled: true,
            image_links: "http://a.png".to_string(),
            ..Default::default()
        });

        let installed = service.configure(&DefaultImageConfig {
            enabled: true,
            default_image: Some("  ".to_string()),
            ..Default::default()
        });
        assert!(installed);
        assert_eq!(messages.drain().len(), 1);

        let out = pipeline.prepare(bare()).await;
        assert_eq!(out.image.as_deref(), Some("http://a.png"));
    }
}
