use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;

use crate::limits::MINUTES_PER_DAY;
use crate::model::Minutes;
use crate::observability::Diagnostics;

/// Offset-bearing layouts RFC 3339 rejects: missing seconds, or an offset
/// without a colon. `%#z` also takes `Z`.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Naive timestamp layouts taken as already-local wall clock.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a time-only clock string: "H:mm", "HH:mm", "HH:mm:ss" or
/// "HH:mm:ss.fff". Seconds are truncated.
pub fn parse_clock(s: &str) -> Option<Minutes> {
    let s = s.trim();
    let mut parts = s.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let digits = |p: &str, min_len: usize| {
        (min_len..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(hours, 1) || !digits(minutes, 2) {
        return None;
    }
    if let Some(sec) = seconds {
        let (whole, fraction) = sec.split_once('.').unwrap_or((sec, "0"));
        let fraction_ok = !fraction.is_empty() && fraction.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole, 2) || !fraction_ok || whole.parse::<u32>().ok()? >= 60 {
            return None;
        }
    }

    let h: u32 = hours.parse().ok()?;
    let m: u32 = minutes.parse().ok()?;
    if h >= 24 || m >= 60 {
        return None;
    }
    Some(h * 60 + m)
}

/// Parse a full timestamp and return its local wall-clock minutes.
///
/// With `tz` set, the instant is converted into that zone. Without it, an
/// offset-bearing timestamp reads its own offset's wall clock and a naive
/// timestamp is taken as already local.
pub fn parse_timestamp(s: &str, tz: Option<Tz>) -> Option<Minutes> {
    let s = s.trim();
    let offset = DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        OFFSET_LAYOUTS
            .iter()
            .find_map(|layout| DateTime::parse_from_str(s, layout).ok())
    });
    if let Some(dt) = offset {
        return Some(wall_clock(dt, tz));
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .map(|dt| minutes_of(dt.time()))
}

/// Normalize any supported representation to minutes since midnight.
/// `None` when the input matches no known shape.
pub fn parse_minutes(raw: &str, tz: Option<Tz>) -> Option<Minutes> {
    parse_clock(raw).or_else(|| parse_timestamp(raw, tz))
}

fn wall_clock(dt: DateTime<FixedOffset>, tz: Option<Tz>) -> Minutes {
    match tz {
        Some(tz) => minutes_of(dt.with_timezone(&tz).time()),
        None => minutes_of(dt.time()),
    }
}

fn minutes_of(time: NaiveTime) -> Minutes {
    time.hour() * 60 + time.minute()
}

/// Zero-padded 24-hour "HH:mm".
pub fn format_hhmm(minutes: Minutes) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Pick the localized clock string when it is well formed, else the raw value.
pub fn preferred<'a>(local: Option<&'a str>, raw: &'a str) -> &'a str {
    match local {
        Some(l) if parse_clock(l).is_some() => l,
        _ => raw,
    }
}

/// Per-invocation normalizer. Malformed values read as `0`, are reported to
/// the diagnostics hook, and are counted so the caller can surface them.
pub struct Normalizer<'a> {
    timezone: Option<Tz>,
    diagnostics: &'a dyn Diagnostics,
    malformed: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(timezone: Option<Tz>, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            timezone,
            diagnostics,
            malformed: 0,
        }
    }

    pub fn to_minutes(&mut self, slot_id: &str, raw: &str) -> Minutes {
        match parse_minutes(raw, self.timezone) {
            Some(m) => m,
            None => {
                self.malformed += 1;
                self.diagnostics.malformed_time(slot_id, raw);
                0
            }
        }
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }
}
