//! Config-driven activation of the daily release digest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::{ConfigService, DigestConfig};
use crate::digest::{DigestOutcome, DigestService};
use crate::notification::SystemMessageQueue;
use crate::scheduler::{ScheduleZone, ScheduledJob, Scheduler, SchedulerSnapshot};

/// Source name used for system messages raised by the digest.
pub const DIGEST_SOURCE: &str = "subscribe_digest";

/// Delay before a run-once digest fires.
pub const RUN_ONCE_DELAY: Duration = Duration::from_secs(3);

/// One scheduled digest run.
struct DigestJob {
    digest: Arc<DigestService>,
    zone: ScheduleZone,
    image_links: Option<String>,
}

#[async_trait]
impl ScheduledJob for DigestJob {
    fn name(&self) -> &str {
        "release_digest"
    }

    async fn run(&self) {
        let today = self.zone.today();
        match self.digest.run(today, self.image_links.as_deref()).await {
            Ok(DigestOutcome::Empty) => debug!(date = %today, "Digest run found nothing"),
            Ok(DigestOutcome::Sent { match_count, .. }) => {
                info!(date = %today, match_count, "Digest run completed")
            }
            Err(e) => warn!(date = %today, error = %e, "Digest run failed"),
        }
    }
}

/// Owns the digest schedule and applies digest configuration to it.
pub struct SubscriptionDigestService {
    digest: Arc<DigestService>,
    scheduler: Scheduler,
    config_service: Arc<ConfigService>,
    system_messages: Arc<SystemMessageQueue>,
    default_zone: ScheduleZone,
    current: Mutex<Option<DigestConfig>>,
}

impl SubscriptionDigestService {
    pub fn new(
        digest: Arc<DigestService>,
        config_service: Arc<ConfigService>,
        system_messages: Arc<SystemMessageQueue>,
        default_zone: ScheduleZone,
    ) -> Self {
        Self {
            digest,
            scheduler: Scheduler::new(),
            config_service,
            system_messages,
            default_zone,
            current: Mutex::new(None),
        }
    }

    /// Apply `config` to the schedule.
    ///
    /// Replaces the recurring job, schedules the run-once job when requested
    /// and persists the consumed `run_once` flag. A blank hour means no
    /// recurring job. Malformed hours are reported to the system message
    /// queue and never returned.
    ///
    /// Returns the configuration as it now stands.
    pub async fn configure(&self, mut config: DigestConfig) -> DigestConfig {
        let zone = match config.zone(self.default_zone) {
            Ok(zone) => zone,
            Err(e) => {
                self.report(format!("Invalid digest timezone, using {}: {}", self.default_zone, e));
                self.default_zone
            }
        };

        if !config.enabled && !config.run_once {
            self.scheduler.stop().await;
            info!("Release digest disabled");
            *self.current.lock() = Some(config.clone());
            return config;
        }

        if config.enabled && config.hour_of_day.is_unset() {
            info!("No digest hour set, recurring digest not scheduled");
            self.scheduler.cancel_recurring();
        } else if config.enabled {
            match config.schedule() {
                Ok(schedule) => {
                    self.scheduler
                        .schedule_daily(schedule, zone, self.job(zone, &config));
                }
                Err(e) => {
                    self.report(format!("Digest schedule not set: {}", e));
                    self.scheduler.cancel_recurring();
                }
            }
        } else {
            self.scheduler.cancel_recurring();
        }

        if config.run_once {
            self.scheduler
                .schedule_once(RUN_ONCE_DELAY, self.job(zone, &config));
            config.run_once = false;
            if let Err(e) = self.config_service.persist_digest_config(&config).await {
                warn!(error = %e, "Failed to persist digest config after consuming run_once");
            }
        }

        *self.current.lock() = Some(config.clone());
        config
    }

    /// Run the digest immediately with the current configuration.
    pub async fn run_now(&self) -> Result<DigestOutcome> {
        let config = self.current.lock().clone().unwrap_or_default();
        let zone = config.zone(self.default_zone).unwrap_or(self.default_zone);
        self.digest.run(zone.today(), config.image_links()).await
    }

    /// The configuration last applied.
    pub fn current_config(&self) -> Option<DigestConfig> {
        self.current.lock().clone()
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.scheduler.snapshot()
    }

    /// Cancel all digest jobs and wait for them to exit.
    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }

    fn job(&self, zone: ScheduleZone, config: &DigestConfig) -> Arc<dyn ScheduledJob> {
        Arc::new(DigestJob {
            digest: self.digest.clone(),
            zone,
            image_links: config.image_links().map(str::to_string),
        })
    }

    fn report(&self, text: String) {
        warn!(source = DIGEST_SOURCE, "{}", text);
        self.system_messages.put(DIGEST_SOURCE, text);
    }
}
