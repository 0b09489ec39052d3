use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::instrument;

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// A ticker firing on every multiple of `period` since the Unix epoch, so an hourly
/// schedule runs on the hour. Missed ticks are skipped rather than bunched up.
#[instrument]
pub fn timer(period: Duration, now: DateTime<Utc>) -> tokio::time::Interval {
    let period = period.max(MIN_PERIOD);
    let start = tokio::time::Instant::now() + duration_to_next_boundary(period, now);

    let mut timer = tokio::time::interval_at(start, period);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    timer
}

/// compute the time until the next multiple of `period` counted from the epoch.
fn duration_to_next_boundary(period: Duration, now: DateTime<Utc>) -> Duration {
    let period = period.as_millis().max(1);
    let elapsed = now.timestamp_millis().max(0) as u128;
    let remainder = elapsed % period;

    if remainder == 0 {
        return Duration::ZERO;
    }

    Duration::from_millis((period - remainder) as u64)
}
