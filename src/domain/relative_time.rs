use chrono::{DateTime, Utc};

const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
// Average Gregorian month: 146097 days per 4800 months.
const DAYS_PER_MONTH: f64 = 146_097.0 / 4_800.0;

/// Human-readable distance between `time` and `now`, e.g. "5 minutes ago".
///
/// Each unit is rounded to the nearest whole value before the thresholds are
/// applied, so 89 seconds still reads as "a minute ago".
pub fn time_ago(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta_ms = now.signed_duration_since(time).num_milliseconds();
    let future = delta_ms < 0;
    let ms = delta_ms.unsigned_abs() as f64;

    let seconds = (ms / 1000.0).round();
    if seconds < 45.0 {
        return "Just now".to_string();
    }

    let minutes = (ms / MILLIS_PER_MINUTE).round();
    let hours = (ms / MILLIS_PER_HOUR).round();
    let days = (ms / MILLIS_PER_DAY).round();
    let months_exact = ms / MILLIS_PER_DAY / DAYS_PER_MONTH;
    let months = months_exact.round();
    let years = (months_exact / 12.0).round();

    let phrase = if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    };

    if future {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}
