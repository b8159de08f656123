// src/dates.rs
//! Lenient timestamp parsing. Every successful parse is normalized to UTC.
//!
//! Upstream APIs disagree on formats: RFC 3339, RFC 2822 (RSS), ISO-8601 with
//! `+HHMM` offsets, naive date-times, bare dates and relative phrases such as
//! "3 days ago". Naive values are read as UTC. Relative phrases resolve to
//! the start of the UTC day they land on, so repeated fetches of the same item
//! agree on its timestamp.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert any zoned timestamp to UTC.
pub fn to_utc<Tz: TimeZone>(ts: &DateTime<Tz>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

/// Parse an absolute timestamp. Relative phrases are not accepted here.
pub fn parse_absolute(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(to_utc(&dt));
    }
    if let Some(dt) = parse_rfc2822(s) {
        return Some(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, fmt) {
            return Some(to_utc(&dt));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    None
}

/// Parse an absolute or relative timestamp; relative phrases resolve against
/// `now` and are truncated to midnight UTC.
pub fn parse_timestamp_at(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    parse_absolute(raw).or_else(|| parse_relative(raw, now))
}

fn parse_rfc2822(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc2822) {
        return Utc
            .timestamp_opt(odt.unix_timestamp(), odt.nanosecond())
            .single();
    }
    // chrono is more forgiving about obsolete zone names
    DateTime::parse_from_rfc2822(s).ok().map(|dt| to_utc(&dt))
}

fn parse_relative(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = raw.trim().to_lowercase();
    match s.as_str() {
        "today" | "just now" | "now" => return start_of_day(now),
        "yesterday" => return start_of_day(now - Duration::days(1)),
        _ => {}
    }

    static RE_AGO: OnceCell<Regex> = OnceCell::new();
    let re = RE_AGO.get_or_init(|| {
        Regex::new(r"^(?:about\s+)?(\d+|an?|one)\+?\s*(minute|min|hour|hr|day|week|month)s?\s+ago$")
            .unwrap()
    });
    let caps = re.captures(&s)?;
    let n: i64 = match &caps[1] {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };
    let delta = match &caps[2] {
        "minute" | "min" => Duration::minutes(n),
        "hour" | "hr" => Duration::hours(n),
        "day" => Duration::days(n),
        "week" => Duration::weeks(n),
        "month" => Duration::days(30 * n),
        _ => return None,
    };
    start_of_day(now - delta)
}

fn start_of_day(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    ts.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|n| Utc.from_utc_datetime(&n))
}
