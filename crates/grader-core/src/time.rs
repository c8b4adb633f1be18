use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix() -> i64 {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_secs() as i64
}

/// ISO-8601 UTC timestamp for ledger rows and payloads.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Wall-clock hour truncated to the hour, e.g. `2025-10-16-14`.
///
/// Generation is seeded per participant per hour bucket, so re-running a
/// batch within the same hour reproduces identical tasks.
pub fn hour_bucket(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d-%H").to_string()
}

pub fn current_hour_bucket() -> String {
    hour_bucket(Utc::now())
}
