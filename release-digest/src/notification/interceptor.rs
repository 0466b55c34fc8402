//! Default-image interceptor.
//!
//! Installs a middleware on the [`NotificationPipeline`] that gives every
//! outbound message without an image a fallback one. Messages that already
//! carry an image pass through untouched.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::message::OutboundMessage;
use super::pipeline::{MiddlewareHandle, NotificationMiddleware, NotificationPipeline};
use crate::digest::{choose_random, parse_image_links};
use crate::domain::WallpaperProvider;
use crate::{Error, Result};

/// Image used when no configured link or wallpaper is available.
pub const DEFAULT_NOTIFICATION_IMAGE: &str =
    "https://raw.githubusercontent.com/jianxcao/MoviePilot-extension/main/img/mp.jpg";

/// Position of the fallback-image middleware in the pipeline.
///
/// Runs late so that earlier middleware can still supply a real image.
pub const FALLBACK_IMAGE_ORDER: i32 = 900;

/// Where a fallback image comes from, in precedence order.
#[derive(Clone)]
pub struct FallbackImagePolicy {
    image_links: Vec<String>,
    wallpaper: Option<Arc<dyn WallpaperProvider>>,
    default_image: String,
}

impl FallbackImagePolicy {
    /// Policy that always yields the built-in default image.
    pub fn new() -> Self {
        Self {
            image_links: Vec::new(),
            wallpaper: None,
            default_image: DEFAULT_NOTIFICATION_IMAGE.to_string(),
        }
    }

    /// Use newline-delimited configured links; entries not starting with `http` are dropped.
    pub fn with_links(mut self, raw: Option<&str>) -> Self {
        self.image_links = parse_image_links(raw);
        self
    }

    pub fn with_wallpaper(mut self, provider: Arc<dyn WallpaperProvider>) -> Self {
        self.wallpaper = Some(provider);
        self
    }

    pub fn with_default_image(mut self, default_image: impl Into<String>) -> Self {
        self.default_image = default_image.into();
        self
    }

    pub fn image_links(&self) -> &[String] {
        &self.image_links
    }

    pub fn default_image(&self) -> &str {
        &self.default_image
    }

    fn validate(&self) -> Result<()> {
        if self.default_image.trim().is_empty() {
            return Err(Error::validation("fallback default image must not be empty"));
        }
        Ok(())
    }

    /// Compute a fallback image.
    ///
    /// Configured links win, then the wallpaper provider, then the default.
    /// Provider failures are logged and treated as "no wallpaper".
    pub async fn resolve(&self) -> String {
        if let Some(link) = choose_random(&self.image_links) {
            return link.clone();
        }

        if let Some(provider) = &self.wallpaper {
            match provider.random().await {
                Ok(Some(url)) if !url.is_empty() => {
                    debug!(provider = provider.name(), url = %url, "Using wallpaper as fallback image");
                    return url;
                }
                Ok(_) => debug!(provider = provider.name(), "Wallpaper provider returned nothing"),
                Err(e) => warn!(provider = provider.name(), error = %e, "Wallpaper lookup failed"),
            }
        }

        self.default_image.clone()
    }
}

impl Default for FallbackImagePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FallbackImagePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackImagePolicy")
            .field("image_links", &self.image_links)
            .field("wallpaper", &self.wallpaper.as_ref().map(|w| w.name()))
            .field("default_image", &self.default_image)
            .finish()
    }
}

/// Middleware that fills a missing image.
struct FallbackImageMiddleware {
    policy: FallbackImagePolicy,
}

#[async_trait]
impl NotificationMiddleware for FallbackImageMiddleware {
    fn name(&self) -> &'static str {
        "fallback_image"
    }

    async fn handle(&self, message: &mut OutboundMessage) -> Result<()> {
        if message.image.is_some() {
            return Ok(());
        }

        let image = self.policy.resolve().await;
        debug!(kind = %message.kind, image = %image, "Assigned fallback image");
        message.image = Some(image);
        Ok(())
    }
}

/// Owns the fallback-image middleware slot on a pipeline.
///
/// `install` while installed swaps the middleware in one step; `uninstall`
/// when not installed does nothing. Dropping the interceptor uninstalls it.
pub struct DispatchInterceptor {
    pipeline: Arc<NotificationPipeline>,
    slot: Mutex<Option<MiddlewareHandle>>,
}

impl DispatchInterceptor {
    pub fn new(pipeline: Arc<NotificationPipeline>) -> Self {
        Self {
            pipeline,
            slot: Mutex::new(None),
        }
    }

    /// Install (or reinstall) the middleware with `policy`.
    ///
    /// On error the pipeline is left exactly as it was.
    pub fn install(&self, policy: FallbackImagePolicy) -> Result<()> {
        policy.validate()?;

        let middleware = Arc::new(FallbackImageMiddleware { policy });
        let mut slot = self.slot.lock();
        let previous = slot.take();
        let reinstall = previous.is_some();
        let handle = self
            .pipeline
            .replace(previous, FALLBACK_IMAGE_ORDER, middleware);
        *slot = Some(handle);

        info!(reinstall, "Fallback image interceptor installed");
        Ok(())
    }

    /// Remove the middleware. Returns `true` if it was installed.
    pub fn uninstall(&self) -> bool {
        let Some(handle) = self.slot.lock().take() else {
            return false;
        };

        if self.pipeline.uninstall(handle) {
            info!("Fallback image interceptor removed");
        } else {
            warn!("Fallback image interceptor was already detached from the pipeline");
        }
        true
    }

    pub fn is_installed(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|handle| self.pipeline.is_installed(handle))
    }
}

impl Drop for DispatchInterceptor {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.get_mut().take() {
            self.pipeline.uninstall(handle);
        }
    }
}
