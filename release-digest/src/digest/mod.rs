//! Release digest.
//!
//! Finds subscriptions with content releasing on a given day, composes a single
//! aggregated notification and picks a header image for it.

mod builder;
mod image;
mod service;

pub use builder::{Digest, DigestBuilder, DigestEntry};
pub use image::{DEFAULT_DIGEST_IMAGE, ImageSelector, choose_random, parse_image_links};
pub use service::{DigestOutcome, DigestService, digest_title};
