//! Relative "time since" phrases such as `3 days, 4 hours`.

use time::OffsetDateTime;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

const CHUNKS: [(i64, &str, &str); 6] = [
    (365 * DAY, "year", "years"),
    (30 * DAY, "month", "months"),
    (7 * DAY, "week", "weeks"),
    (DAY, "day", "days"),
    (HOUR, "hour", "hours"),
    (MINUTE, "minute", "minutes"),
];

/// Describe the time elapsed between `then` and `now` with at most two
/// adjacent units. Anything under a minute, or in the future, is `0 minutes`.
pub fn timesince(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = (now - then).whole_seconds();
    if elapsed < MINUTE {
        return "0 minutes".to_string();
    }

    let Some(index) = CHUNKS.iter().position(|(seconds, _, _)| elapsed / seconds > 0) else {
        return "0 minutes".to_string();
    };

    let (seconds, singular, plural) = CHUNKS[index];
    let count = elapsed / seconds;
    let mut phrase = pluralize(count, singular, plural);

    if let Some(&(next_seconds, next_singular, next_plural)) = CHUNKS.get(index + 1) {
        let remainder = (elapsed - count * seconds) / next_seconds;
        if remainder > 0 {
            phrase.push_str(", ");
            phrase.push_str(&pluralize(remainder, next_singular, next_plural));
        }
    }

    phrase
}

fn pluralize(count: i64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, macros::datetime};

    fn since(duration: Duration) -> String {
        let now = datetime!(2024-06-01 12:00 UTC);
        timesince(now - duration, now)
    }

    #[test]
    fn under_a_minute_and_future_read_as_zero() {
        assert_eq!(since(Duration::seconds(30)), "0 minutes");
        assert_eq!(since(Duration::hours(-2)), "0 minutes");
    }

    #[test]
    fn two_adjacent_units() {
        assert_eq!(since(Duration::days(3) + Duration::hours(4)), "3 days, 4 hours");
        assert_eq!(since(Duration::days(400)), "1 year, 1 month");
        assert_eq!(since(Duration::minutes(1)), "1 minute");
    }

    #[test]
    fn non_adjacent_remainders_are_dropped() {
        assert_eq!(since(Duration::weeks(2) + Duration::hours(5)), "2 weeks");
    }
}
