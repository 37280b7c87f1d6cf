use crate::error::{ReportError, Result};
use crate::model::TimeWindow;
use chrono::{DateTime, Duration, Utc};

pub const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const SHORT_HASH_LEN: usize = 8;

pub fn format_api_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(API_TIMESTAMP_FORMAT).to_string()
}

/// Window covering the `days` days up to `now`.
pub fn time_window(days: u32, now: DateTime<Utc>) -> Result<TimeWindow> {
    let since = Duration::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| ReportError::InvalidWindow(format!("{days} days before {now}")))?;
    Ok(TimeWindow { since, until: now })
}

/// First eight characters of the last `/` segment of a commit URL.
pub fn short_hash(url: &str) -> &str {
    let segment = url.rsplit('/').next().unwrap_or(url);
    match segment.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &segment[..idx],
        None => segment,
    }
}

pub fn single_line(message: &str) -> String {
    message.replace('\n', " ")
}
