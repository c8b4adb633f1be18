/// Pure retry delay policies.
///
/// Dispatch talks to participant servers under a multi-hour SLA, so it uses
/// a short fixed escalating schedule. Notification runs under a minutes-scale
/// deadline, so it uses doubling backoff bounded to ~127s of cumulative
/// sleep.

/// Delay after the n-th failed dispatch attempt (1-based): 60s, 180s, 600s.
pub fn dispatch_delay_seconds(attempt: u32) -> u64 {
    match attempt {
        0 | 1 => 60,
        2 => 180,
        _ => 600,
    }
}

/// Delay after the n-th failed notification attempt (1-based): 1,2,4,...,64s.
pub fn notify_delay_seconds(attempt: u32) -> u64 {
    1u64 << attempt.saturating_sub(1).min(6)
}

/// Total planned sleep across `max_retries` notification retries.
pub fn notify_total_sleep_seconds(max_retries: u32) -> u64 {
    (1..=max_retries).map(notify_delay_seconds).sum()
}
