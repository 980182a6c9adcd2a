/// Returns the current Unix time in milliseconds.
pub fn now_ms() -> u64 {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as u64
}

/// Formats an epoch-millisecond timestamp as a `HH:MM` label (UTC).
pub fn minute_label(ts_ms: u64) -> String {
    let secs_of_day = (ts_ms / 1000) % 86_400;
    format!("{:02}:{:02}", secs_of_day / 3600, (secs_of_day % 3600) / 60)
}

/// Truncates an epoch-millisecond timestamp to the start of its minute.
pub fn minute_floor(ts_ms: u64) -> u64 {
    ts_ms - ts_ms % 60_000
}
