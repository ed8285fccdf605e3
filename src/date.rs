//! Date text for comment headers.

use chrono::{DateTime, TimeDelta, Utc};

/// How the short date in a comment header is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    /// Recent dates as "5 mins ago", older ones as the short date.
    #[default]
    Relative,
    /// Always the short date.
    Absolute,
}

impl DateStyle {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "relative" => Some(Self::Relative),
            "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

/// Header text for one timestamp: the short form is shown inline, the long
/// form on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateText {
    pub short: String,
    pub long: String,
}

impl DateText {
    pub fn new(date: DateTime<Utc>, style: DateStyle, now: DateTime<Utc>) -> Self {
        let short = match style {
            DateStyle::Relative => format_recent(date, now).unwrap_or_else(|| format_short(date)),
            DateStyle::Absolute => format_short(date),
        };
        Self {
            short,
            long: format_long(date),
        }
    }
}

/// "Mar 1"
pub fn format_short(date: DateTime<Utc>) -> String {
    date.format("%b %-d").to_string()
}

/// "March 1, 2024, 09:05:00 AM UTC"
pub fn format_long(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y, %I:%M:%S %p UTC").to_string()
}

/// Relative text for dates less than a day old. Dates in the future get none.
pub fn format_recent(date: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    let age = now - date;
    if age < TimeDelta::zero() {
        None
    } else if age < TimeDelta::hours(1) {
        Some(plural(age.num_minutes(), "min"))
    } else if age < TimeDelta::days(1) {
        Some(plural(age.num_hours(), "hr"))
    } else {
        None
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
