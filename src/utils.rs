//! Time helpers shared across the crate.

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};

/// Current UTC wall-clock time truncated to microsecond precision.
#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}

/// Truncates a timestamp to microsecond precision.
#[must_use]
pub fn truncate_to_micros(value: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = value.nanosecond();
    value - chrono::Duration::nanoseconds(i64::from(nanos % 1_000))
}

/// Renders a timestamp in the persisted `YYYY-MM-DD HH:MM:SS.ffffff` form.
#[must_use]
pub fn format_micros(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Current local calendar day, used for day-order expiry.
#[must_use]
pub fn local_day() -> NaiveDate {
    Local::now().date_naive()
}

/// Local calendar day of a UTC instant.
#[must_use]
pub fn local_day_of(value: DateTime<Utc>) -> NaiveDate {
    value.with_timezone(&Local).date_naive()
}
