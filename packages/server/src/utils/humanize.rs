//! Human-readable renderings of timestamps and byte counts.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

const CHUNKS: [(i64, &str); 6] = [
    (YEAR, "year"),
    (MONTH, "month"),
    (WEEK, "week"),
    (DAY, "day"),
    (HOUR, "hour"),
    (MINUTE, "minute"),
];

/// Describe `then` relative to `now`, e.g. "now", "a minute ago",
/// "5 hours ago", "2 days, 4 hours ago" or "3 minutes from now".
pub fn natural_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let (seconds, suffix) = if then <= now {
        ((now - then).num_seconds(), "ago")
    } else {
        ((then - now).num_seconds(), "from now")
    };

    if seconds < DAY {
        return match seconds {
            0 => "now".to_string(),
            1 => format!("a second {suffix}"),
            s if s < MINUTE => format!("{s} seconds {suffix}"),
            s if s < 2 * MINUTE => format!("a minute {suffix}"),
            s if s < HOUR => format!("{} minutes {suffix}", s / MINUTE),
            s if s < 2 * HOUR => format!("an hour {suffix}"),
            s => format!("{} hours {suffix}", s / HOUR),
        };
    }

    format!("{} {suffix}", time_since(seconds))
}

/// At most two adjacent units, largest first: "1 year, 2 months", "3 days".
fn time_since(seconds: i64) -> String {
    let Some(first) = CHUNKS.iter().position(|&(size, _)| seconds >= size) else {
        return unit(0, "minute");
    };

    let (size, name) = CHUNKS[first];
    let count = seconds / size;
    let mut out = unit(count, name);

    if let Some(&(next_size, next_name)) = CHUNKS.get(first + 1) {
        let next_count = (seconds - count * size) / next_size;
        if next_count > 0 {
            out.push_str(", ");
            out.push_str(&unit(next_count, next_name));
        }
    }
    out
}

fn unit(count: i64, name: &str) -> String {
    if count == 1 {
        format!("1 {name}")
    } else {
        format!("{count} {name}s")
    }
}

/// Render a byte count with one truncated decimal: "512B", "1.5KB", "2.0MB".
pub fn natural_size(bytes: u64) -> String {
    const K: u64 = 1024;
    const M: u64 = K * K;
    const G: u64 = M * K;

    let (scale, suffix) = match bytes {
        b if b < K => return format!("{b}B"),
        b if b < M => (K, "KB"),
        b if b < G => (M, "MB"),
        _ => (G, "GB"),
    };
    let tenths = bytes * 10 / scale;
    format!("{}.{}{suffix}", tenths / 10, tenths % 10)
}
