//! Backup report evaluation and daily scheduling.
//!
//! Unlike the other metrics there is no previous-sample memory: each report
//! is judged on its own. The scheduled check notifies only on failure; a
//! manually triggered check always reports, success or not.

use chrono::{DateTime, Local, NaiveTime, TimeDelta};

use crate::BackupReport;

/// Verdict for the scheduled daily check.
pub fn is_failure(report: &BackupReport) -> bool {
    !report.succeeded()
}

/// Time to sleep until the next occurrence of `at`, relative to `now`. If
/// today's occurrence has already passed (or is exactly now), the next one
/// is tomorrow's.
pub fn delay_until(now: DateTime<Local>, at: NaiveTime) -> std::time::Duration {
    let now = now.naive_local();
    let mut target = now.date().and_time(at);

    if now >= target {
        target += TimeDelta::days(1);
    }

    (target - now).to_std().unwrap_or_default()
}
