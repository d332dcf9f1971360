use chrono::{Duration, NaiveTime};

/// Renders worked time as `"Hh Mm Ss"`. Negative input renders as zero.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Inverse of [`format_duration`]; returns `None` for anything it did not produce.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let mut parts = s.split_whitespace();
    let hours = parts.next()?.strip_suffix('h')?.parse::<i64>().ok()?;
    let minutes = parts.next()?.strip_suffix('m')?.parse::<i64>().ok()?;
    let seconds = parts.next()?.strip_suffix('s')?.parse::<i64>().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(Duration::seconds(hours * 3600 + minutes * 60 + seconds))
}

/// 12-hour clock used in check-in labels, e.g. `"09:05 AM"`.
pub fn format_clock_time(t: NaiveTime) -> String {
    t.format("%I:%M %p").to_string()
}
