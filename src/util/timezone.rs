use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};
use tracing::warn;

/// Resolve an IANA timezone name, falling back to UTC when it is unknown.
pub fn resolve_timezone(name: &str) -> Tz {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Tz::UTC;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => tz,
        Err(err) => {
            warn!(
                target = "util::timezone",
                timezone = trimmed,
                error = %err,
                "unknown timezone; falling back to UTC"
            );
            Tz::UTC
        }
    }
}

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_default();
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}
