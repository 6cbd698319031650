use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use otter_core::{CommandEvent, NoopObserver, Observer, Platform};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::store::ReminderStore;
use crate::types::StoredReminder;

const MIN_INTERVAL: Duration = Duration::from_secs(1);
const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Outcome of one poll iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Undelivered reminders inside the window.
    pub found: usize,
    /// Claimed and sent successfully.
    pub delivered: usize,
    /// Claimed but the send failed. These are not retried.
    pub failed: usize,
    /// Already claimed by someone else between query and claim.
    pub skipped: usize,
}

/// Periodic reminder delivery loop.
///
/// Each tick claims every undelivered reminder due before `now + interval`
/// and sends it. The claim happens before the send, so a reminder is
/// attempted at most once even if ticks overlap or the process restarts
/// mid-iteration.
pub struct ReminderPoller {
    store: Arc<dyn ReminderStore>,
    platform: Arc<dyn Platform>,
    interval: Duration,
    observer: Arc<dyn Observer>,
}

impl ReminderPoller {
    /// `interval` is clamped to between one second and one week.
    pub fn new(
        store: Arc<dyn ReminderStore>,
        platform: Arc<dyn Platform>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            platform,
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first iteration fires one full interval after start. A failed
    /// iteration is logged and the loop carries on.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "reminder poller started");

        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(report) if report.found > 0 => info!(
                            found = report.found,
                            delivered = report.delivered,
                            failed = report.failed,
                            skipped = report.skipped,
                            "reminder tick complete"
                        ),
                        Ok(_) => debug!("reminder tick: nothing due"),
                        Err(e) => error!(error = %e, retryable = e.is_retryable(), "reminder tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("reminder poller shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One poll iteration evaluated at `now`.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let window = chrono::Duration::from_std(self.interval)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let due = self.store.due_before(now + window).await?;

        let mut report = TickReport {
            found: due.len(),
            ..TickReport::default()
        };

        for stored in due {
            match self.store.claim(stored.id, now).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(reminder_id = stored.id, "reminder already claimed");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(reminder_id = stored.id, error = %e, "reminder claim failed");
                    report.skipped += 1;
                    continue;
                }
            }

            if self.deliver(&stored).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        Ok(report)
    }

    async fn deliver(&self, stored: &StoredReminder) -> bool {
        let r = &stored.reminder;
        let text = delivery_text(r.creator, &r.message);
        match self.platform.send_message(r.channel, &text).await {
            Ok(()) => {
                self.observer.record(&CommandEvent::ReminderDelivered {
                    reminder_id: stored.id,
                    channel_id: r.channel,
                });
                true
            }
            Err(e) => {
                self.observer.record(&CommandEvent::ReminderFailed {
                    reminder_id: stored.id,
                    error: e.to_string(),
                });
                warn!(reminder_id = stored.id, channel = r.channel, error = %e, "reminder send failed");
                false
            }
        }
    }
}

/// Message posted when a reminder fires.
pub fn delivery_text(creator: u64, message: &str) -> String {
    format!("Hey <@{creator}>, remember {message}")
}
