//! Host runtime configuration read from the environment.

use std::path::PathBuf;

use crate::notification::{WebhookAuth, WebhookConfig};
use crate::scheduler::ScheduleZone;
use crate::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/plugins.json";
pub const DEFAULT_SUBSCRIPTIONS_PATH: &str = "config/subscriptions.json";
pub const DEFAULT_TMDB_LANGUAGE: &str = "en-US";

/// Host configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Plugin configuration document.
    pub config_path: PathBuf,
    /// Subscription list.
    pub subscriptions_path: PathBuf,
    pub tmdb_api_key: Option<String>,
    pub tmdb_language: String,
    /// Webhook that receives outbound notifications.
    pub webhook: Option<WebhookConfig>,
    /// Zone used when the digest config does not name one.
    pub zone: ScheduleZone,
    /// Directory for rotating log files.
    pub log_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let zone = ScheduleZone::parse(get("RELEASE_DIGEST_TZ").as_deref())?;

        Ok(Self {
            config_path: get("RELEASE_DIGEST_CONFIG")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
                .into(),
            subscriptions_path: get("RELEASE_DIGEST_SUBSCRIPTIONS")
                .unwrap_or_else(|| DEFAULT_SUBSCRIPTIONS_PATH.to_string())
                .into(),
            tmdb_api_key: get("TMDB_API_KEY"),
            tmdb_language: get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_TMDB_LANGUAGE.to_string()),
            webhook: webhook_config(&get)?,
            zone,
            log_dir: get("RELEASE_DIGEST_LOG_DIR").map(PathBuf::from),
            log_filter: get("RUST_LOG"),
        })
    }
}

/// Webhook settings from `NOTIFY_WEBHOOK_*`. `None` without a URL.
///
/// Headers are `Name: value` pairs separated by newlines. A token selects
/// bearer auth and takes precedence over a username/password pair.
fn webhook_config<F>(get: &F) -> Result<Option<WebhookConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(url) = get("NOTIFY_WEBHOOK_URL") else {
        return Ok(None);
    };
    let mut config = WebhookConfig::for_url(url);

    if let Some(method) = get("NOTIFY_WEBHOOK_METHOD") {
        let method = method.to_uppercase();
        if method != "POST" && method != "PUT" {
            return Err(Error::config(format!(
                "NOTIFY_WEBHOOK_METHOD must be POST or PUT, got {}",
                method
            )));
        }
        config.method = method;
    }

    if let Some(headers) = get("NOTIFY_WEBHOOK_HEADERS") {
        for line in headers.lines().filter(|line| !line.trim().is_empty()) {
            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::config(format!(
                    "NOTIFY_WEBHOOK_HEADERS entry is not 'Name: value': {}",
                    line.trim()
                )));
            };
            config
                .headers
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    config.auth = match (
        get("NOTIFY_WEBHOOK_TOKEN"),
        get("NOTIFY_WEBHOOK_USERNAME"),
    ) {
        (Some(token), _) => Some(WebhookAuth::Bearer { token }),
        (None, Some(username)) => Some(WebhookAuth::Basic {
            username,
            password: get("NOTIFY_WEBHOOK_PASSWORD").unwrap_or_default(),
        }),
        (None, None) => None,
    };

    if let Some(timeout) = get("NOTIFY_WEBHOOK_TIMEOUT") {
        config.timeout_secs = timeout.parse().map_err(|_| {
            Error::config(format!("NOTIFY_WEBHOOK_TIMEOUT is not a number of seconds: {}", timeout))
        })?;
    }

    Ok(Some(config))
}
