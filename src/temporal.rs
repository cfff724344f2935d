//! Date and date-time resolution for dirty source columns.
//!
//! Two resolvers live here and share the sentinel date `1900-01-01`:
//!
//! - [`DateResolver`] tries an ordered list of date-only formats and returns
//!   the first successful parse, or the sentinel.
//! - [`TemporalResolver`] classifies trimmed text into one of the [`Shape`]s,
//!   in priority order, and hands it to that shape's parser. Shapes without a
//!   date component land on the sentinel date; anything unrecognised becomes
//!   `1900-01-01 00:00:00`.
//!
//! Both are total: every input, including null, resolves to a valid value.

use std::{fmt, sync::LazyLock};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::RawCell;

pub const SENTINEL_DATE_TEXT: &str = "1900-01-01";
pub const SENTINEL_DATETIME_TEXT: &str = "1900-01-01 00:00:00";

/// Trimmed inputs that mean "no value" to the date-time resolver.
pub const MISSING_MARKERS: &[&str] = &["", "0", "NULL"];

/// Date-only formats in priority order.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%Y/%m/%d"];

pub const FULL_DATETIME_PATTERN: &str =
    r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\s+[0-9]{1,2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?$";
pub const DATE_ONLY_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$";
pub const MINUTE_SECOND_PATTERN: &str = r"^([0-9]{1,2}):[0-9]{2}(\.[0-9]+)?$";
pub const CLOCK_TIME_PATTERN: &str = r"^[0-9]{1,2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?$";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S%.f";
const HOUR_MINUTE_FORMAT: &str = "%H:%M";

const MAX_HOUR_OF_DAY: u32 = 23;

static FULL_DATETIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FULL_DATETIME_PATTERN).expect("full date-time pattern compiles"));
static DATE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE_ONLY_PATTERN).expect("date-only pattern compiles"));
static MINUTE_SECOND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MINUTE_SECOND_PATTERN).expect("minute:second pattern compiles"));
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CLOCK_TIME_PATTERN).expect("clock time pattern compiles"));

static DEFAULT_DATE_RESOLVER: LazyLock<DateResolver> = LazyLock::new(DateResolver::default);
static DEFAULT_TEMPORAL_RESOLVER: LazyLock<TemporalResolver> =
    LazyLock::new(TemporalResolver::default);

pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn sentinel_datetime() -> NaiveDateTime {
    sentinel_date().and_time(midnight())
}

fn midnight() -> NaiveTime {
    NaiveTime::default()
}

/// Resolves any cell to a calendar date, `1900-01-01` when no format matches.
pub fn resolve_date(raw: impl Into<RawCell>) -> NaiveDate {
    DEFAULT_DATE_RESOLVER.resolve(&raw.into())
}

/// Resolves any cell to a date-time, `1900-01-01 00:00:00` when no shape matches.
pub fn resolve_datetime(raw: impl Into<RawCell>) -> NaiveDateTime {
    DEFAULT_TEMPORAL_RESOLVER.resolve(&raw.into())
}

/// Shape of the trimmed input, or `None` when no shape applies.
pub fn classify(raw: impl Into<RawCell>) -> Option<Shape> {
    let cell = raw.into();
    let text = cell.as_text();
    DEFAULT_TEMPORAL_RESOLVER.classify(text.as_deref().map(str::trim).unwrap_or_default())
}

pub fn default_date_resolver() -> &'static DateResolver {
    &DEFAULT_DATE_RESOLVER
}

pub fn default_temporal_resolver() -> &'static TemporalResolver {
    &DEFAULT_TEMPORAL_RESOLVER
}

/// Ordered list of date-only formats; the first format that yields a valid
/// date wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateResolver {
    formats: Vec<String>,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS.iter().copied())
    }
}

impl DateResolver {
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            formats: formats.into_iter().map(Into::into).collect(),
        }
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Returns the parsed date along with the format that produced it.
    pub fn parse<'a>(&'a self, text: &str) -> Option<(NaiveDate, &'a str)> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.formats.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(trimmed, fmt)
                .ok()
                .filter(is_supported_date)
                .map(|date| (date, fmt.as_str()))
        })
    }

    pub fn resolve(&self, cell: &RawCell) -> NaiveDate {
        self.resolve_with_format(cell)
            .map(|(date, _)| date)
            .unwrap_or_else(sentinel_date)
    }

    /// Like [`DateResolver::resolve`], but `None` when the sentinel applies.
    pub fn resolve_with_format(&self, cell: &RawCell) -> Option<(NaiveDate, &str)> {
        let text = cell.as_text()?;
        self.parse(&text)
    }
}

// Warehouse DATE covers years 1 through 9999.
fn is_supported_date(date: &NaiveDate) -> bool {
    (1..=9999).contains(&date.year())
}

/// Textual shapes the date-time resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Null, empty, `0` or `NULL`.
    Missing,
    /// `YYYY-MM-DD H[H]:MM[:SS[.f]]`
    DateTime,
    /// `YYYY-MM-DD`
    DateOnly,
    /// `M[M]:SS[.f]`, elapsed minutes and seconds.
    MinuteSecond,
    /// `H[H]:MM[:SS[.f]]`, a time of day.
    ClockTime,
}

impl Shape {
    /// Default priority order. `MinuteSecond` must precede `ClockTime`.
    pub const PRIORITY: [Shape; 5] = [
        Shape::Missing,
        Shape::DateTime,
        Shape::DateOnly,
        Shape::MinuteSecond,
        Shape::ClockTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Missing => "missing",
            Shape::DateTime => "date_time",
            Shape::DateOnly => "date_only",
            Shape::MinuteSecond => "minute_second",
            Shape::ClockTime => "clock_time",
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Shape::Missing => MISSING_MARKERS.contains(&text),
            Shape::DateTime => FULL_DATETIME.is_match(text),
            Shape::DateOnly => DATE_ONLY.is_match(text),
            Shape::MinuteSecond => is_minute_second(text),
            Shape::ClockTime => CLOCK_TIME.is_match(text),
        }
    }

    /// Parses text already known to match this shape. `None` means the
    /// sentinel applies.
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        match self {
            Shape::Missing => None,
            Shape::DateTime => parse_full_datetime(text),
            Shape::DateOnly => parse_iso_date(text).map(|date| date.and_time(midnight())),
            Shape::MinuteSecond => {
                let time = parse_time(&format!("00:{text}"), TIME_OF_DAY_FORMAT)
                    .unwrap_or_else(midnight);
                Some(sentinel_date().and_time(time))
            }
            Shape::ClockTime => {
                let time = parse_time_of_day(text).unwrap_or_else(midnight);
                Some(sentinel_date().and_time(time))
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Two bare fields are ambiguous between M:SS and H:MM. A fraction, or a
// leading field that cannot be an hour, makes it minutes:seconds.
fn is_minute_second(text: &str) -> bool {
    let Some(captures) = MINUTE_SECOND.captures(text) else {
        return false;
    };
    if captures.get(2).is_some() {
        return true;
    }
    captures
        .get(1)
        .and_then(|field| field.as_str().parse::<u32>().ok())
        .is_some_and(|leading| leading > MAX_HOUR_OF_DAY)
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, ISO_DATE_FORMAT)
        .ok()
        .filter(is_supported_date)
}

fn parse_full_datetime(text: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = text.split_once(char::is_whitespace)?;
    let date = parse_iso_date(date_part)?;
    let time = parse_time_of_day(time_part.trim_start())?;
    Some(date.and_time(time))
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    parse_time(text, TIME_OF_DAY_FORMAT).or_else(|| parse_time(text, HOUR_MINUTE_FORMAT))
}

// Leap seconds are not representable in the warehouse TIME type.
fn parse_time(text: &str, fmt: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, fmt)
        .ok()
        .filter(|time| time.nanosecond() < 1_000_000_000)
}

/// Shape-dispatching date-time resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalResolver {
    order: Vec<Shape>,
}

impl Default for TemporalResolver {
    fn default() -> Self {
        Self {
            order: Shape::PRIORITY.to_vec(),
        }
    }
}

impl TemporalResolver {
    /// Builds a resolver that tries `order` top to bottom. Shapes left out
    /// of the list are never recognised.
    pub fn new(order: Vec<Shape>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[Shape] {
        &self.order
    }

    pub fn classify(&self, trimmed: &str) -> Option<Shape> {
        self.order
            .iter()
            .copied()
            .find(|shape| shape.matches(trimmed))
    }

    pub fn resolve(&self, cell: &RawCell) -> NaiveDateTime {
        self.resolve_with_shape(cell).0
    }

    /// Resolved value plus the shape that produced it. The shape is `None`
    /// when the sentinel was substituted.
    pub fn resolve_with_shape(&self, cell: &RawCell) -> (NaiveDateTime, Option<Shape>) {
        let text = cell.as_text();
        let trimmed = text.as_deref().map(str::trim).unwrap_or_default();
        match self.classify(trimmed) {
            Some(shape) => match shape.parse(trimmed) {
                Some(value) => (value, Some(shape)),
                None => (sentinel_datetime(), None),
            },
            None => (sentinel_datetime(), None),
        }
    }
}
