//! Timestamp utilities
//!
//! All calendar-day logic (same-day check-in detection, daily counter
//! rollover) and all human-facing formatting happen in the configured event
//! timezone. Stored timestamps are always UTC.

use crate::{Error, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Timezone used when none is configured
pub const DEFAULT_TIMEZONE: &str = "Asia/Hong_Kong";

/// Export/display format (`YYYY-MM-DD HH:mm:ss`)
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset-less layouts accepted for client-supplied times, read as event-local
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Config(format!("Unknown timezone '{}': {}", name, e)))
}

/// Parse a client-supplied timestamp
///
/// RFC 3339 strings carry their own offset. Strings without an offset
/// (`2024-01-01T09:00:00`, `2024-01-01 09:00:00`, or a bare date) are read
/// as wall-clock time in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return from_local(naive, tz);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return start_of_day(date, tz)
            .ok_or_else(|| Error::InvalidInput(format!("No local midnight on {}", date)));
    }

    Err(Error::InvalidInput(format!("Unrecognized timestamp '{}'", raw)))
}

/// Convert epoch milliseconds to a UTC timestamp
pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::InvalidInput(format!("Timestamp out of range: {}", millis)))
}

/// Calendar date of `ts` in the event timezone
pub fn local_date(ts: &DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// Format `ts` as `YYYY-MM-DD HH:mm:ss` in the event timezone
pub fn format_local(ts: &DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format(DISPLAY_FORMAT).to_string()
}

/// Time left until the next event-local midnight
pub fn until_next_midnight(now: DateTime<Utc>, tz: Tz) -> std::time::Duration {
    let fallback = std::time::Duration::from_secs(24 * 60 * 60);

    let Some(tomorrow) = local_date(&now, tz).checked_add_days(Days::new(1)) else {
        return fallback;
    };
    let Some(midnight) = start_of_day(tomorrow, tz) else {
        return fallback;
    };

    (midnight - now).to_std().unwrap_or(std::time::Duration::ZERO)
}

fn from_local(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidInput(format!("{} does not exist in {}", naive, tz)))
}

/// First existing instant of `date`; midnight can fall in a DST gap
fn start_of_day(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    (0..24).find_map(|hour| {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|ts| ts.with_timezone(&Utc))
    })
}
