//! Application services.

mod container;
mod default_image;
mod subscription_digest;

pub use container::{HOST_SOURCE, ServiceContainer, ServiceDependencies};
pub use default_image::{DEFAULT_IMAGE_SOURCE, DefaultImageService};
pub use subscription_digest::{DIGEST_SOURCE, RUN_ONCE_DELAY, SubscriptionDigestService};
