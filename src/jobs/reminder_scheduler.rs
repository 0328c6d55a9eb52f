use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use time::{Date, Duration as CalendarDuration, OffsetDateTime, Time};
use tracing::{info, warn};

use crate::app::reminders::ReminderService;

/// Owns the once-daily reminder schedule. Created at process start and run
/// inside a `select!` with the shutdown signal, so stopping the process is
/// the shutdown hook; nothing persists between runs.
pub struct ReminderScheduler {
    service: Arc<ReminderService>,
    fire_time: Time,
    running: AtomicBool,
}

impl ReminderScheduler {
    pub fn new(service: Arc<ReminderService>, fire_time: Time) -> Self {
        Self {
            service,
            fire_time,
            running: AtomicBool::new(false),
        }
    }

    /// Sleep until the configured wall-clock time, fire, repeat.
    pub async fn run(&self) {
        info!(fire_time = %self.fire_time, "reminder scheduler started");
        loop {
            let wait = until_next_fire(local_now(), self.fire_time);
            tokio::time::sleep(wait).await;

            let today = local_now().date();
            self.fire(today).await;
        }
    }

    /// One scheduled (or manually triggered) run. The guard skips a fire
    /// that would overlap a run still in progress.
    pub async fn fire(&self, today: Date) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("previous reminder run still in progress, skipping this fire");
            return;
        }

        info!(%today, "running daily birthday check");
        self.service.run_once(today).await;

        self.running.store(false, Ordering::SeqCst);
    }
}

fn local_now() -> OffsetDateTime {
    // Local offset can be unavailable in some environments; UTC then.
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Time to sleep from `now` until the next strictly-future `fire_time`.
pub fn until_next_fire(now: OffsetDateTime, fire_time: Time) -> std::time::Duration {
    let today_fire = now.replace_time(fire_time);
    let next = if today_fire > now {
        today_fire
    } else {
        today_fire + CalendarDuration::days(1)
    };
    (next - now)
        .try_into()
        .unwrap_or(std::time::Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, time};

    #[test]
    fn fire_later_today_waits_until_then() {
        let now = datetime!(2025-03-03 08:00:00 UTC);
        let wait = until_next_fire(now, time!(9:30:00));
        assert_eq!(wait, std::time::Duration::from_secs(90 * 60));
    }

    #[test]
    fn fire_time_already_passed_waits_for_tomorrow() {
        let now = datetime!(2025-03-03 10:00:00 UTC);
        let wait = until_next_fire(now, time!(0:00:00));
        assert_eq!(wait, std::time::Duration::from_secs(14 * 60 * 60));
    }

    #[test]
    fn fire_time_equal_to_now_waits_a_full_day() {
        let now = datetime!(2025-03-03 00:00:00 UTC);
        let wait = until_next_fire(now, time!(0:00:00));
        assert_eq!(wait, std::time::Duration::from_secs(24 * 60 * 60));
    }
}
