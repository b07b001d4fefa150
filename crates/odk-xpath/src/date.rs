//! Dates as ODK forms see them.
//!
//! A *day-count* is days since 1970-01-01 (integer part) plus the time of day
//! (fractional part), both measured on the **local** wall clock. Instants
//! carrying an explicit offset are first moved into the local zone, so the
//! same string can yield different day-counts in different zones.
use crate::consts::MILLIS_PER_DAY;
use crate::model::XPathNode;
use crate::runtime::{Error, ErrorCode};
use crate::value::{XPathValue, as_string, parse_number};
use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeDelta, TimeZone, Timelike,
};
use fancy_regex::Regex;
use std::sync::LazyLock;

static DATE_STRING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:T(\d{2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?(Z|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .ok()
});

static RAW_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").ok());

static TIME_STRING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\d\d):(\d\d):(\d\d)(\.\d{1,3})?([+-])(\d\d):(\d\d)$").ok()
});

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn matches(re: &LazyLock<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(s).unwrap_or(false))
}

/// The zone whose wall clock defines "local" for day-count arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    #[default]
    System,
    Fixed(FixedOffset),
}

impl LocalZone {
    pub fn offset_at(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self {
            LocalZone::System => Local.offset_from_utc_datetime(utc).fix(),
            LocalZone::Fixed(o) => *o,
        }
    }

    /// Re-express an instant on the local wall clock.
    pub fn to_local(&self, instant: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(&instant.naive_utc()))
    }

    /// Attach the local offset to a wall-clock time. Ambiguous times take the
    /// earlier instant; times skipped by a DST gap move forward one hour.
    pub fn from_local(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            LocalZone::System => Local
                .from_local_datetime(naive)
                .earliest()
                .or_else(|| {
                    let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
                    Local.from_local_datetime(&shifted).earliest()
                })
                .map(|d| d.fixed_offset()),
            LocalZone::Fixed(o) => o.from_local_datetime(naive).single(),
        }
    }
}

/// A point in time, or one of the two non-instants a form can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Moment {
    /// Carries the local offset in effect at that instant.
    Valid(DateTime<FixedOffset>),
    /// The result of converting an empty string; stringifies to `""`.
    Blank,
    Invalid,
}

impl Moment {
    pub fn is_valid(&self) -> bool {
        matches!(self, Moment::Valid(_))
    }

    pub fn from_local(naive: &NaiveDateTime, zone: &LocalZone) -> Self {
        zone.from_local(naive).map_or(Moment::Invalid, Moment::Valid)
    }
}

pub fn is_date_string(s: &str) -> bool {
    matches(&DATE_STRING, s)
}

/// Parse text matching the date-string grammar. Date-only input is local
/// midnight; a time without offset is local wall-clock time.
pub fn parse_date_string(s: &str, zone: &LocalZone) -> Moment {
    let Some(re) = DATE_STRING.as_ref() else {
        return Moment::Invalid;
    };
    let Ok(Some(caps)) = re.captures(s) else {
        return Moment::Invalid;
    };
    let num = |i: usize| -> Option<u32> { caps.get(i).and_then(|m| m.as_str().parse().ok()) };
    let (Some(year), Some(month), Some(day)) = (
        caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()),
        num(2),
        num(3),
    ) else {
        return Moment::Invalid;
    };
    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        return Moment::Invalid;
    };
    let millis = caps.get(7).map_or(0, |m| {
        let digits: String = m.as_str().chars().chain("000".chars()).take(3).collect();
        digits.parse().unwrap_or(0)
    });
    let Some(time) = NaiveTime::from_hms_milli_opt(
        num(4).unwrap_or(0),
        num(5).unwrap_or(0),
        num(6).unwrap_or(0),
        millis,
    ) else {
        return Moment::Invalid;
    };
    let naive = date.and_time(time);
    match caps.get(8).map(|m| m.as_str()) {
        None => Moment::from_local(&naive, zone),
        Some(ofs) => match parse_offset(ofs) {
            Some(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map_or(Moment::Invalid, |dt| Moment::Valid(zone.to_local(&dt))),
            None => Moment::Invalid,
        },
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if s.starts_with('-') { -1 } else { 1 };
    let digits: String = s[1..].chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits
        .get(2..)
        .filter(|m| !m.is_empty())
        .map_or(Some(0), |m| m.parse().ok())?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub fn date_to_days(m: &Moment) -> f64 {
    match m {
        Moment::Valid(dt) => {
            dt.naive_local().and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY
        }
        Moment::Blank | Moment::Invalid => f64::NAN,
    }
}

pub fn date_string_to_days(s: &str, zone: &LocalZone) -> f64 {
    date_to_days(&parse_date_string(s, zone))
}

pub fn days_to_moment(days: f64, zone: &LocalZone) -> Moment {
    if !days.is_finite() {
        return Moment::Invalid;
    }
    let millis = (days * MILLIS_PER_DAY).round() as i64;
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => Moment::from_local(&utc.naive_utc(), zone),
        None => Moment::Invalid,
    }
}

/// Text → Moment: empty is [`Moment::Blank`], a bare number is a day-count,
/// the date-string grammar is parsed, anything else gets a lenient parse.
pub fn string_to_moment(s: &str, zone: &LocalZone) -> Moment {
    let t = s.trim();
    if t.is_empty() {
        return Moment::Blank;
    }
    if matches(&RAW_NUMBER, t) {
        return days_to_moment(parse_number(t).trunc(), zone);
    }
    if is_date_string(t) {
        return parse_date_string(t, zone);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t).or_else(|_| DateTime::parse_from_rfc2822(t)) {
        return Moment::Valid(zone.to_local(&dt));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Moment::from_local(&naive, zone);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(t, "%Y/%m/%d") {
        return Moment::from_local(&date.and_time(NaiveTime::MIN), zone);
    }
    Moment::Invalid
}

/// Any value → Moment, following the `date()` conversion rules.
pub fn as_moment<N: XPathNode>(v: &XPathValue<N>, zone: &LocalZone) -> Moment {
    match v {
        XPathValue::Boolean(_) => Moment::Invalid,
        XPathValue::Date(m) => m.clone(),
        XPathValue::Number(n) => days_to_moment(*n, zone),
        XPathValue::String(s) => string_to_moment(s, zone),
        XPathValue::NodeSet(_) => string_to_moment(&as_string(v), zone),
    }
}

/// String context: `""` for blank and invalid moments, the bare date at
/// local midnight, the full local-offset form otherwise.
pub fn date_as_string(m: &Moment) -> String {
    match m {
        Moment::Valid(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
        Moment::Valid(_) => to_local_offset_string(m),
        Moment::Blank | Moment::Invalid => String::new(),
    }
}

/// `YYYY-MM-DDTHH:MM:SS.sss±HH:MM`, the on-the-wire datetime format.
pub fn to_local_offset_string(m: &Moment) -> String {
    match m {
        Moment::Valid(dt) => format!(
            "{}{}",
            dt.format("%Y-%m-%dT%H:%M:%S%.3f"),
            offset_as_time(dt.offset())
        ),
        Moment::Blank => String::new(),
        Moment::Invalid => "Invalid Date".to_string(),
    }
}

/// The local UTC offset of a moment as `±HH:MM`; `""` when not valid.
pub fn timezone_offset_as_time(m: &Moment) -> String {
    match m {
        Moment::Valid(dt) => offset_as_time(dt.offset()),
        Moment::Blank | Moment::Invalid => String::new(),
    }
}

fn offset_as_time(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let minutes = secs.abs() / 60;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Local midnight of the day containing `now`.
pub fn local_midnight(now: &DateTime<FixedOffset>, zone: &LocalZone) -> Moment {
    Moment::from_local(&now.date_naive().and_time(NaiveTime::MIN), zone)
}

/// Fraction of a day for a standalone `HH:MM:SS[.sss]±HH:MM` time. The time
/// is placed on `today` before converting into the local zone so that the
/// offset in effect today applies.
pub fn decimal_time(s: &str, today: NaiveDate, zone: &LocalZone) -> f64 {
    let Some(Ok(Some(caps))) = TIME_STRING.as_ref().map(|re| re.captures(s)) else {
        return f64::NAN;
    };
    let field = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(u32::MAX)
    };
    let (h, m, sec, oh, om) = (field(1), field(2), field(3), field(6), field(7));
    if h >= 24 || m >= 60 || sec >= 60 || oh >= 24 || om >= 60 {
        return f64::NAN;
    }
    let millis = caps.get(4).map_or(0, |f| {
        let digits: String = f.as_str()[1..].chars().chain("00".chars()).take(3).collect();
        digits.parse().unwrap_or(0)
    });
    let sign = if caps.get(5).is_some_and(|g| g.as_str() == "-") { -1 } else { 1 };
    let Some(offset) = FixedOffset::east_opt(sign * (oh as i32 * 3600 + om as i32 * 60)) else {
        return f64::NAN;
    };
    let Some(time) = NaiveTime::from_hms_milli_opt(h, m, sec, millis) else {
        return f64::NAN;
    };
    let Some(instant) = offset.from_local_datetime(&today.and_time(time)).single() else {
        return f64::NAN;
    };
    let local = zone.to_local(&instant);
    let t = local.time();
    (((f64::from(t.nanosecond() / 1_000_000) / 1000.0 + f64::from(t.second())) / 60.0
        + f64::from(t.minute()))
        / 60.0
        + f64::from(t.hour()))
        / 24.0
}

/// strftime-like formatting used by `format-date`. Blank and invalid moments
/// format to `""`; an unknown escape is an error.
pub fn format_date(m: &Moment, format: &str) -> Result<String, Error> {
    let Moment::Valid(dt) = m else {
        return Ok(String::new());
    };
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(code) = chars.next() else {
            return Err(Error::from_code(
                ErrorCode::InvalidFormat,
                "date format string ends with %",
            ));
        };
        match code {
            '%' => out.push('%'),
            'Y' => out.push_str(&dt.year().to_string()),
            'y' => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'n' => out.push_str(&dt.month().to_string()),
            'b' => out.push_str(MONTHS[dt.month0() as usize]),
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'e' => out.push_str(&dt.day().to_string()),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'h' => out.push_str(&dt.hour().to_string()),
            'M' => out.push_str(&format!("{:02}", dt.minute())),
            'S' => out.push_str(&format!("{:02}", dt.second())),
            '3' => out.push_str(&format!("{:03}", dt.timestamp_subsec_millis())),
            'a' => out.push_str(WEEKDAYS[dt.weekday().num_days_from_sunday() as usize]),
            other => {
                return Err(Error::from_code(
                    ErrorCode::InvalidFormat,
                    format!("unrecognized date format code: %{other}"),
                ));
            }
        }
    }
    Ok(out)
}
