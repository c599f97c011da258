//! Trading-session resolution for earnings announcements.
//!
//! All calendar arithmetic happens in the exchange zone (America/New_York).
//! Only weekends are skipped; exchange holidays are not modeled, so an AMC
//! release on the eve of a holiday resolves to the holiday itself.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

use crate::config::{SESSION_CLOSE, SESSION_OPEN};
use crate::error::{AppError, Result};
use crate::types::ReleaseFlag;

pub const EXCHANGE_TZ: Tz = New_York;

/// Formats accepted for timestamps that carry no zone; those are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a provider timestamp. Offsets are honoured; zone-less values are UTC.
pub fn parse_announcement_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Exchange-local calendar date of an instant.
pub fn exchange_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&EXCHANGE_TZ).date_naive()
}

/// The session whose regular-hours trading reflects the announcement.
pub fn resolve_session_day(announced_at: DateTime<Utc>, release_flag: ReleaseFlag) -> NaiveDate {
    let local_day = exchange_date(announced_at);
    match release_flag {
        ReleaseFlag::AfterMarketClose => next_trading_day(local_day),
        ReleaseFlag::BeforeMarketOpen => local_day,
    }
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn next_trading_day(day: NaiveDate) -> NaiveDate {
    let mut next = day + Duration::days(1);
    while is_weekend(next) {
        next += Duration::days(1);
    }
    next
}

pub fn previous_trading_day(day: NaiveDate) -> NaiveDate {
    let mut prev = day - Duration::days(1);
    while is_weekend(prev) {
        prev -= Duration::days(1);
    }
    prev
}

/// Regular-hours window (09:30 to 16:00 exchange-local) for `day`, in UTC.
pub fn regular_session_bounds(day: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_instant(day, SESSION_OPEN)?;
    let end = local_instant(day, SESSION_CLOSE)?;
    Ok((start, end))
}

fn local_instant(day: NaiveDate, (hour, minute): (u32, u32)) -> Result<DateTime<Utc>> {
    let naive = day
        .and_hms_opt(hour, minute, 0)
        .ok_or(AppError::SessionTime(day))?;
    EXCHANGE_TZ
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or(AppError::SessionTime(day))
}
