//! Time ranges for stats views.
//!
//! A range arrives either as a shorthand such as `"30 days"` or as an explicit
//! `{start, end}` pair. Everything downstream (export links, chart queries)
//! wants the explicit pair, so [`Range::normalize`] resolves shorthands against
//! a given "today".

use chrono::{DateTime, Days, Local, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("empty range shorthand")]
    Empty,
    #[error("invalid range count '{0}'")]
    InvalidCount(String),
    #[error("unknown range unit '{0}'")]
    UnknownUnit(String),
    #[error("range '{0}' reaches outside the supported calendar")]
    OutOfCalendar(String),
}

/// View range as carried in `changeview` payloads and session storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Range {
    Shorthand(String),
    Span(DateSpan),
}

/// Concrete, inclusive pair of calendar dates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    #[serde(with = "date_like")]
    pub start: NaiveDate,
    #[serde(with = "date_like")]
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RangeUnit {
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "day" | "days" => Some(RangeUnit::Day),
            "week" | "weeks" => Some(RangeUnit::Week),
            "month" | "months" => Some(RangeUnit::Month),
            "year" | "years" => Some(RangeUnit::Year),
            _ => None,
        }
    }
}

impl Range {
    pub fn shorthand(text: impl Into<String>) -> Self {
        Range::Shorthand(text.into())
    }

    pub fn span(start: NaiveDate, end: NaiveDate) -> Self {
        Range::Span(DateSpan { start, end })
    }

    /// Leading whitespace-delimited token of a shorthand (`"30"` for `"30 days"`).
    ///
    /// Structured spans and blank shorthands have no token.
    pub fn shorthand_token(&self) -> Option<&str> {
        match self {
            Range::Shorthand(text) => text.split_whitespace().next(),
            Range::Span(_) => None,
        }
    }

    /// A blank shorthand counts as "not set" when restoring stored views.
    pub fn is_blank(&self) -> bool {
        matches!(self, Range::Shorthand(text) if text.trim().is_empty())
    }

    /// Resolve to a concrete span ending `today`. Spans pass through unchanged.
    pub fn normalize(&self, today: NaiveDate) -> Result<DateSpan, RangeError> {
        match self {
            Range::Span(span) => Ok(*span),
            Range::Shorthand(text) => {
                let (count, unit) = parse_shorthand(text)?;
                let start = match unit {
                    RangeUnit::Day => today.checked_sub_days(Days::new(count.into())),
                    RangeUnit::Week => today.checked_sub_days(Days::new(u64::from(count) * 7)),
                    RangeUnit::Month => today.checked_sub_months(Months::new(count)),
                    RangeUnit::Year => count
                        .checked_mul(12)
                        .and_then(|months| today.checked_sub_months(Months::new(months))),
                }
                .ok_or_else(|| RangeError::OutOfCalendar(text.clone()))?;
                Ok(DateSpan { start, end: today })
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::Shorthand(text) => f.write_str(text),
            Range::Span(span) => write!(f, "{} to {}", span.start, span.end),
        }
    }
}

/// Split `"<count> <unit>"`. A bare count means days.
pub fn parse_shorthand(text: &str) -> Result<(u32, RangeUnit), RangeError> {
    let mut parts = text.split_whitespace();
    let count = parts.next().ok_or(RangeError::Empty)?;
    let count: u32 = count
        .parse()
        .map_err(|_| RangeError::InvalidCount(count.to_string()))?;
    let unit = match parts.next() {
        None => RangeUnit::Day,
        Some(unit) => RangeUnit::parse(unit).ok_or_else(|| RangeError::UnknownUnit(unit.to_string()))?,
    };
    Ok((count, unit))
}

/// Year, month and day joined by `separator`; `pretty(date, "")` gives `20261014`.
pub fn pretty(date: NaiveDate, separator: &str) -> String {
    date.format(&format!("%Y{separator}%m{separator}%d")).to_string()
}

impl DateSpan {
    pub fn pretty_start(&self, separator: &str) -> String {
        pretty(self.start, separator)
    }

    pub fn pretty_end(&self, separator: &str) -> String {
        pretty(self.end, separator)
    }
}

// Range bounds written by page scripts may be ISO dates, full timestamps
// (what a serialized JS `Date` looks like) or epoch milliseconds.
mod date_like {
    use super::*;
    use serde::{Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
        Float(f64),
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_text_in(&text, &Local)
                .ok_or_else(|| de::Error::custom(format!("unrecognized date '{text}'"))),
            Raw::Millis(millis) => from_millis(millis),
            Raw::Float(millis) => from_millis(millis as i64),
        }
    }

    /// Plain dates are taken as-is; timestamps land on their calendar day in `tz`.
    pub(super) fn parse_text_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<NaiveDate> {
        let text = text.trim();
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(tz).date_naive())
        })
    }

    pub(super) fn millis_in<Tz: TimeZone>(millis: i64, tz: &Tz) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(tz).date_naive())
    }

    fn from_millis<E: de::Error>(millis: i64) -> Result<NaiveDate, E> {
        millis_in(millis, &Local).ok_or_else(|| E::custom(format!("timestamp {millis} out of range")))
    }
}
