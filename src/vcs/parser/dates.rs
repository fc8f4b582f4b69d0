//! Date helpers shared by the parsers
//!
//! Every helper converts to an absolute UTC instant. Only
//! [`in_local_zone`] consults the host's zone, for tools that print none.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};

const HOUR: i32 = 3600;

/// Zone abbreviations printed by some tools instead of numeric offsets
const ZONE_ABBREVIATIONS: &[(&str, i32)] = &[
    ("GMT", 0),
    ("UTC", 0),
    ("UT", 0),
    ("Z", 0),
    ("WET", 0),
    ("BST", HOUR),
    ("CET", HOUR),
    ("MET", HOUR),
    ("CEST", 2 * HOUR),
    ("MEST", 2 * HOUR),
    ("EET", 2 * HOUR),
    ("EEST", 3 * HOUR),
    ("MSK", 3 * HOUR),
    ("JST", 9 * HOUR),
    ("KST", 9 * HOUR),
    ("AEST", 10 * HOUR),
    ("AEDT", 11 * HOUR),
    ("NZST", 12 * HOUR),
    ("NZDT", 13 * HOUR),
    ("AST", -4 * HOUR),
    ("EDT", -4 * HOUR),
    ("EST", -5 * HOUR),
    ("CDT", -5 * HOUR),
    ("CST", -6 * HOUR),
    ("MDT", -6 * HOUR),
    ("MST", -7 * HOUR),
    ("PDT", -7 * HOUR),
    ("PST", -8 * HOUR),
    ("AKDT", -8 * HOUR),
    ("AKST", -9 * HOUR),
    ("HST", -10 * HOUR),
];

/// Resolve a zone token into a fixed offset
///
/// Accepts numeric offsets (`+0100`, `-05:00`, `+09`), `GMT`/`UTC` with an
/// offset (`GMT+1:00`) and the common abbreviations (`PST`, `CEST`, ...).
pub fn zone_offset(token: &str) -> Option<FixedOffset> {
    let token = token.trim();
    if let Some(offset) = numeric_offset(token) {
        return Some(offset);
    }
    for prefix in ["GMT", "UTC"] {
        if let Some(rest) = token.strip_prefix(prefix)
            && !rest.is_empty()
        {
            return numeric_offset(rest);
        }
    }
    let upper = token.to_ascii_uppercase();
    ZONE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == upper)
        .and_then(|(_, secs)| FixedOffset::east_opt(*secs))
}

fn numeric_offset(token: &str) -> Option<FixedOffset> {
    let (sign, digits) = match token.as_bytes().first()? {
        b'+' => (1, &token[1..]),
        b'-' => (-1, &token[1..]),
        _ => return None,
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some(parts) => parts,
        None if digits.len() == 4 && digits.is_ascii() => (&digits[..2], &digits[2..]),
        None if !digits.is_empty() && digits.len() <= 2 => (digits, "0"),
        None => return None,
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(hours) || !all_digits(minutes) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * HOUR + minutes * 60))
}

/// Interpret a zone-less time at a fixed offset
pub fn in_offset(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

/// Interpret a zone-less time in the host's default zone
///
/// Fallback for tools whose output carries no zone at all.
pub fn in_local_zone(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Seconds since the epoch, as printed by git and Mercurial
pub fn from_epoch_seconds(secs: &str) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs.trim().parse().ok()?, 0)
}

/// RFC 3339 timestamps with any fractional precision (`...T10:00:00.123456Z`)
pub fn from_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Parse `<date> <time> [zone]` with `-` or `/` date separators
///
/// A missing zone means `default_offset`; an unknown zone fails.
pub fn parse_date_time_with_zone(text: &str, default_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let mut tokens = text.split_whitespace();
    let date = tokens.next()?;
    let time = tokens.next()?;
    let offset = match tokens.next() {
        Some(zone) => zone_offset(zone)?,
        None => default_offset,
    };
    if tokens.next().is_some() {
        return None;
    }

    let joined = format!("{} {}", date, time);
    let naive = NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&joined, "%Y/%m/%d %H:%M:%S"))
        .ok()?;
    in_offset(naive, offset)
}
