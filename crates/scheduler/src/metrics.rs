use std::time::Duration;

use chrono::NaiveDateTime;
use nudge_notify::DispatchReport;
use serde::Serialize;

/// Scheduler operational counters shown by the `status` command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Ticks completed since start.
    pub ticks: u64,
    /// Reminders dispatched (one per due task).
    pub reminders_fired: u64,
    pub desktop_failures: u64,
    pub email_failures: u64,
    /// Local time of the most recent tick.
    pub last_tick: Option<NaiveDateTime>,
    /// Wall time spent in the most recent tick.
    pub last_tick_duration: Duration,
    /// Average tick duration.
    pub avg_tick_duration: Duration,
}

impl SchedulerMetrics {
    /// Record one completed tick and the reports of the reminders it fired.
    pub fn record_tick<'a>(
        &mut self,
        at: NaiveDateTime,
        duration: Duration,
        reports: impl IntoIterator<Item = &'a DispatchReport>,
    ) {
        self.ticks += 1;
        self.last_tick = Some(at);
        self.last_tick_duration = duration;

        for report in reports {
            self.reminders_fired += 1;
            if !report.desktop_ok {
                self.desktop_failures += 1;
            }
            if report.email_attempted && !report.email_ok {
                self.email_failures += 1;
            }
        }

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        self.avg_tick_duration = if self.ticks == 1 {
            duration
        } else {
            let prev_nanos = self.avg_tick_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / self.ticks as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn empty_tick_counts_tick_only() {
        let mut m = SchedulerMetrics::default();
        m.record_tick(at(), Duration::from_millis(5), []);
        assert_eq!(m.ticks, 1);
        assert_eq!(m.reminders_fired, 0);
        assert_eq!(m.last_tick, Some(at()));
        assert_eq!(m.avg_tick_duration, Duration::from_millis(5));
    }

    #[test]
    fn failures_counted_per_channel() {
        let mut m = SchedulerMetrics::default();
        let ok = DispatchReport {
            desktop_ok: true,
            email_attempted: true,
            email_ok: true,
            ..Default::default()
        };
        let email_failed = DispatchReport {
            desktop_ok: true,
            email_attempted: true,
            email_ok: false,
            ..Default::default()
        };
        let desktop_failed = DispatchReport::default();

        m.record_tick(at(), Duration::ZERO, [&ok, &email_failed, &desktop_failed]);
        assert_eq!(m.reminders_fired, 3);
        assert_eq!(m.email_failures, 1);
        assert_eq!(m.desktop_failures, 1);
    }

    #[test]
    fn average_duration_rolls() {
        let mut m = SchedulerMetrics::default();
        m.record_tick(at(), Duration::from_millis(100), []);
        m.record_tick(at(), Duration::from_millis(200), []);
        let avg = m.avg_tick_duration.as_millis();
        assert!((149..=151).contains(&avg), "avg was {avg}ms");
    }
}
