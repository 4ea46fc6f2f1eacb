//! Calendar step intervals.
//!
//! A step interval is a positive magnitude of one [`CalendarUnit`]. Two
//! different notions of "length" live here and must not be mixed:
//!
//! - **Calendar arithmetic** ([`TimeStepInterval::add_to`]): month and year
//!   steps go through chrono's `Months`, so Jan 31 + 1 month lands on the
//!   last day of February and leap years are honoured.
//! - **Approximate seconds** ([`TimeStepInterval::to_seconds`]): a fixed
//!   table (Julian year, mean month) used only to order intervals of
//!   different units and for the half-step termination rule of the step
//!   generator.
//!
//! Richer input units ([`TimeUnit`]) collapse into the six calendar units
//! with a multiplier: ns/ms become fractional seconds, weeks become days,
//! decades and centuries become years.

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 3_600.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const SECONDS_PER_WEEK: f64 = 604_800.0;
/// Mean Gregorian month (1/12 of the Julian-ish year below)
pub const SECONDS_PER_MONTH: f64 = 2_629_746.0;
pub const SECONDS_PER_YEAR: f64 = 31_556_952.0;

/// Largest nanosecond count we hand to chrono before falling back to micros.
const MAX_NANOS: f64 = (i64::MAX / 2) as f64;

/// Unit of a step interval after normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl CalendarUnit {
    /// Approximate length in seconds (comparison only)
    pub fn seconds(self) -> f64 {
        match self {
            CalendarUnit::Second => 1.0,
            CalendarUnit::Minute => SECONDS_PER_MINUTE,
            CalendarUnit::Hour => SECONDS_PER_HOUR,
            CalendarUnit::Day => SECONDS_PER_DAY,
            CalendarUnit::Month => SECONDS_PER_MONTH,
            CalendarUnit::Year => SECONDS_PER_YEAR,
        }
    }

    /// Month and year lengths vary, everything below is a fixed duration.
    pub fn is_calendar_based(self) -> bool {
        matches!(self, CalendarUnit::Month | CalendarUnit::Year)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalendarUnit::Second => "second",
            CalendarUnit::Minute => "minute",
            CalendarUnit::Hour => "hour",
            CalendarUnit::Day => "day",
            CalendarUnit::Month => "month",
            CalendarUnit::Year => "year",
        }
    }
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input unit as reported by data sources or typed by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanosecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
    Decade,
    Century,
}

impl TimeUnit {
    /// Multiplier and calendar unit this input unit collapses into.
    pub fn collapse(self) -> (f64, CalendarUnit) {
        match self {
            TimeUnit::Nanosecond => (1e-9, CalendarUnit::Second),
            TimeUnit::Millisecond => (1e-3, CalendarUnit::Second),
            TimeUnit::Second => (1.0, CalendarUnit::Second),
            TimeUnit::Minute => (1.0, CalendarUnit::Minute),
            TimeUnit::Hour => (1.0, CalendarUnit::Hour),
            TimeUnit::Day => (1.0, CalendarUnit::Day),
            TimeUnit::Week => (7.0, CalendarUnit::Day),
            TimeUnit::Month => (1.0, CalendarUnit::Month),
            TimeUnit::Year => (1.0, CalendarUnit::Year),
            TimeUnit::Decade => (10.0, CalendarUnit::Year),
            TimeUnit::Century => (100.0, CalendarUnit::Year),
        }
    }

    /// Parse a unit name or abbreviation ("d", "days", "min", "yr", ...)
    pub fn parse(name: &str) -> Option<Self> {
        let unit = match name.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanosecond" | "nanoseconds" => TimeUnit::Nanosecond,
            "ms" | "millisecond" | "milliseconds" => TimeUnit::Millisecond,
            "s" | "sec" | "secs" | "second" | "seconds" => TimeUnit::Second,
            "m" | "min" | "mins" | "minute" | "minutes" => TimeUnit::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => TimeUnit::Hour,
            "d" | "day" | "days" => TimeUnit::Day,
            "w" | "wk" | "week" | "weeks" => TimeUnit::Week,
            "mo" | "mon" | "month" | "months" => TimeUnit::Month,
            "y" | "yr" | "yrs" | "year" | "years" => TimeUnit::Year,
            "decade" | "decades" => TimeUnit::Decade,
            "century" | "centuries" => TimeUnit::Century,
            _ => return None,
        };
        Some(unit)
    }
}

/// Errors from parsing an interval like `"3 days"`
#[derive(Debug, Clone, PartialEq)]
pub enum IntervalParseError {
    Empty,
    InvalidMagnitude(String),
    UnknownUnit(String),
    NonPositive(f64),
}

impl fmt::Display for IntervalParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalParseError::Empty => write!(f, "Empty time step interval"),
            IntervalParseError::InvalidMagnitude(s) => write!(f, "Invalid interval magnitude: {}", s),
            IntervalParseError::UnknownUnit(s) => write!(f, "Unknown time unit: {}", s),
            IntervalParseError::NonPositive(v) => write!(f, "Interval magnitude must be positive, got {}", v),
        }
    }
}

impl std::error::Error for IntervalParseError {}

/// Positive magnitude of a calendar unit, e.g. 3 days or 1 month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStepInterval {
    pub magnitude: f64,
    pub unit: CalendarUnit,
}

impl TimeStepInterval {
    pub fn new(magnitude: f64, unit: CalendarUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Build from a richer input unit, collapsing it into a calendar unit.
    pub fn from_unit(magnitude: f64, unit: TimeUnit) -> Self {
        let (multiplier, unit) = unit.collapse();
        Self::new(magnitude * multiplier, unit)
    }

    pub fn seconds(n: f64) -> Self {
        Self::new(n, CalendarUnit::Second)
    }

    pub fn minutes(n: f64) -> Self {
        Self::new(n, CalendarUnit::Minute)
    }

    pub fn hours(n: f64) -> Self {
        Self::new(n, CalendarUnit::Hour)
    }

    pub fn days(n: f64) -> Self {
        Self::new(n, CalendarUnit::Day)
    }

    pub fn months(n: f64) -> Self {
        Self::new(n, CalendarUnit::Month)
    }

    pub fn years(n: f64) -> Self {
        Self::new(n, CalendarUnit::Year)
    }

    /// Usable for step generation: finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.magnitude.is_finite() && self.magnitude > 0.0
    }

    /// Approximate length in seconds. Never used to generate steps.
    pub fn to_seconds(&self) -> f64 {
        self.magnitude * self.unit.seconds()
    }

    /// Order two intervals: by magnitude for equal units, else by seconds.
    pub fn compare(&self, other: &Self) -> Ordering {
        if self.unit == other.unit {
            self.magnitude.total_cmp(&other.magnitude)
        } else {
            self.to_seconds().total_cmp(&other.to_seconds())
        }
    }

    /// Half of one step as a fixed delta (termination rule of the generator).
    pub fn half_step(&self) -> TimeDelta {
        seconds_to_delta(self.to_seconds() / 2.0)
    }

    /// Whole months added per step for month/year units.
    ///
    /// Fractional magnitudes are rounded to the nearest month, never below one.
    fn whole_months(&self) -> u32 {
        let months = match self.unit {
            CalendarUnit::Year => self.magnitude * 12.0,
            _ => self.magnitude,
        };
        months.round().clamp(1.0, u32::MAX as f64) as u32
    }

    /// Add one step to `t` using calendar arithmetic.
    ///
    /// Returns `None` for an unusable interval or on overflow.
    pub fn add_to(&self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_valid() {
            return None;
        }
        if self.unit.is_calendar_based() {
            t.checked_add_months(Months::new(self.whole_months()))
        } else {
            t.checked_add_signed(seconds_to_delta(self.to_seconds()))
        }
    }
}

impl fmt::Display for TimeStepInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.magnitude == 1.0 { "" } else { "s" };
        if self.magnitude.fract() == 0.0 {
            write!(f, "{:.0} {}{}", self.magnitude, self.unit, plural)
        } else {
            write!(f, "{} {}{}", self.magnitude, self.unit, plural)
        }
    }
}

impl FromStr for TimeStepInterval {
    type Err = IntervalParseError;

    /// Accepts `"3 days"`, `"3days"`, `"1.5 h"`, `"month"` (magnitude 1).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IntervalParseError::Empty);
        }
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| IntervalParseError::UnknownUnit(String::new()))?;
        let (number, unit) = s.split_at(split);
        let number = number.trim();
        let magnitude = if number.is_empty() {
            1.0
        } else {
            number
                .parse::<f64>()
                .map_err(|_| IntervalParseError::InvalidMagnitude(number.to_string()))?
        };
        let unit = TimeUnit::parse(unit).ok_or_else(|| IntervalParseError::UnknownUnit(unit.trim().to_string()))?;
        let interval = TimeStepInterval::from_unit(magnitude, unit);
        if !interval.is_valid() {
            return Err(IntervalParseError::NonPositive(magnitude));
        }
        Ok(interval)
    }
}

/// Fixed-length delta from seconds, nanosecond precision when it fits.
fn seconds_to_delta(seconds: f64) -> TimeDelta {
    let nanos = seconds * 1e9;
    if nanos.abs() <= MAX_NANOS {
        TimeDelta::nanoseconds(nanos.round() as i64)
    } else {
        TimeDelta::microseconds((seconds * 1e6).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_to_seconds_table() {
        assert_eq!(TimeStepInterval::years(1.0).to_seconds(), 31_556_952.0);
        assert_eq!(TimeStepInterval::months(1.0).to_seconds(), 2_629_746.0);
        assert_eq!(TimeStepInterval::from_unit(1.0, TimeUnit::Week).to_seconds(), 604_800.0);
        assert_eq!(TimeStepInterval::days(2.0).to_seconds(), 172_800.0);
        assert_eq!(TimeStepInterval::from_unit(1.0, TimeUnit::Decade).to_seconds(), 315_569_520.0);
        assert_eq!(TimeStepInterval::from_unit(1.0, TimeUnit::Century).to_seconds(), 3_155_695_200.0);
    }

    #[test]
    fn test_collapse_units() {
        let ms = TimeStepInterval::from_unit(500.0, TimeUnit::Millisecond);
        assert_eq!(ms.unit, CalendarUnit::Second);
        assert!((ms.magnitude - 0.5).abs() < 1e-12);

        let week = TimeStepInterval::from_unit(2.0, TimeUnit::Week);
        assert_eq!(week, TimeStepInterval::days(14.0));

        let decade = TimeStepInterval::from_unit(1.0, TimeUnit::Decade);
        assert_eq!(decade, TimeStepInterval::years(10.0));
    }

    #[test]
    fn test_compare_same_unit_by_magnitude() {
        let a = TimeStepInterval::days(2.0);
        let b = TimeStepInterval::days(3.0);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&a), Ordering::Equal);
    }

    #[test]
    fn test_compare_mixed_units_by_seconds() {
        assert_eq!(TimeStepInterval::hours(25.0).compare(&TimeStepInterval::days(1.0)), Ordering::Greater);
        assert_eq!(TimeStepInterval::days(31.0).compare(&TimeStepInterval::months(1.0)), Ordering::Greater);
        assert_eq!(TimeStepInterval::months(11.0).compare(&TimeStepInterval::years(1.0)), Ordering::Less);
        assert_eq!(TimeStepInterval::months(12.0).compare(&TimeStepInterval::years(1.0)), Ordering::Equal);
    }

    #[test]
    fn test_add_month_uses_calendar() {
        let jan31 = utc(2020, 1, 31);
        assert_eq!(TimeStepInterval::months(1.0).add_to(jan31), Some(utc(2020, 2, 29)));
        assert_eq!(TimeStepInterval::months(1.0).add_to(utc(2021, 1, 31)), Some(utc(2021, 2, 28)));
        assert_eq!(TimeStepInterval::years(1.0).add_to(utc(2020, 2, 29)), Some(utc(2021, 2, 28)));
        assert_eq!(TimeStepInterval::years(0.5).add_to(utc(2020, 1, 1)), Some(utc(2020, 7, 1)));
    }

    #[test]
    fn test_add_fixed_units() {
        let t = utc(2020, 1, 1);
        assert_eq!(TimeStepInterval::days(3.0).add_to(t), Some(utc(2020, 1, 4)));
        assert_eq!(TimeStepInterval::hours(1.5).add_to(t), Some(t + TimeDelta::minutes(90)));
        assert_eq!(
            TimeStepInterval::from_unit(250.0, TimeUnit::Millisecond).add_to(t),
            Some(t + TimeDelta::milliseconds(250))
        );
    }

    #[test]
    fn test_invalid_interval_adds_nothing() {
        let t = utc(2020, 1, 1);
        assert!(TimeStepInterval::days(0.0).add_to(t).is_none());
        assert!(TimeStepInterval::days(-1.0).add_to(t).is_none());
        assert!(TimeStepInterval::days(f64::NAN).add_to(t).is_none());
        assert!(!TimeStepInterval::months(0.0).is_valid());
    }

    #[test]
    fn test_parse_and_display() {
        let i: TimeStepInterval = "3 days".parse().unwrap();
        assert_eq!(i, TimeStepInterval::days(3.0));
        assert_eq!(i.to_string(), "3 days");

        let i: TimeStepInterval = "1month".parse().unwrap();
        assert_eq!(i, TimeStepInterval::months(1.0));
        assert_eq!(i.to_string(), "1 month");

        let i: TimeStepInterval = "hour".parse().unwrap();
        assert_eq!(i, TimeStepInterval::hours(1.0));

        let i: TimeStepInterval = "1.5 h".parse().unwrap();
        assert_eq!(i.to_string(), "1.5 hours");

        assert_eq!("".parse::<TimeStepInterval>(), Err(IntervalParseError::Empty));
        assert!(matches!("3 fortnights".parse::<TimeStepInterval>(), Err(IntervalParseError::UnknownUnit(_))));
        assert!(matches!("1..5 days".parse::<TimeStepInterval>(), Err(IntervalParseError::InvalidMagnitude(_))));
        assert!(matches!("0 days".parse::<TimeStepInterval>(), Err(IntervalParseError::NonPositive(_))));
    }
}
