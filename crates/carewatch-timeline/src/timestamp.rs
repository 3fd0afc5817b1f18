use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;

use crate::error::TimelineError;

/// Parse a remote timestamp.
///
/// Accepts RFC 3339 instants (`2025-01-10T09:00:00Z`), civil date-times
/// without an offset (`2025-01-10 09:00`, `2025-01-10T09:00:00`) and bare
/// dates (`2025-01-10`). The last two are read as local time in `tz`; a
/// bare date means the start of that day.
pub fn parse_timestamp(raw: &str, tz: &TimeZone) -> Result<Timestamp, TimelineError> {
    let raw = raw.trim();
    let invalid = |reason: String| TimelineError::InvalidTimestamp {
        value: raw.to_string(),
        reason,
    };

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }

    let civil = if raw.len() > 10 && raw.as_bytes()[10] == b' ' {
        format!("{}T{}", &raw[..10], raw[11..].trim_start())
    } else {
        raw.to_string()
    };

    if let Ok(dt) = civil.parse::<DateTime>() {
        return dt
            .to_zoned(tz.clone())
            .map(|zdt| zdt.timestamp())
            .map_err(|e| invalid(e.to_string()));
    }

    match civil.parse::<Date>() {
        Ok(date) => date
            .to_zoned(tz.clone())
            .map(|zdt| zdt.timestamp())
            .map_err(|e| invalid(e.to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}
