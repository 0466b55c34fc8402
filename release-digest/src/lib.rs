//! release-digest library crate.
//!
//! Daily digest of subscribed media releasing today, plus a fallback image
//! for outbound notifications that carry none.

pub mod config;
pub mod digest;
pub mod domain;
pub mod error;
pub mod logging;
pub mod notification;
pub mod providers;
pub mod scheduler;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
