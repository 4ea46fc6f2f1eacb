//! Tick label text and width estimation.

use chrono::format::{Item, StrftimeItems};

use crate::entities::{CalendarUnit, TimeStepInterval, Timestamp};

/// Strftime pattern for step labels, picked from the step interval's unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelFormat {
    pattern: &'static str,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self::DATE_TIME
    }
}

impl LabelFormat {
    pub const DATE_TIME: LabelFormat = LabelFormat { pattern: "%Y-%m-%d %H:%M" };

    /// Coarser units drop the fields that never change between steps.
    pub fn for_interval(interval: Option<&TimeStepInterval>) -> Self {
        let Some(interval) = interval.filter(|i| i.is_valid()) else {
            return Self::DATE_TIME;
        };
        let pattern = match interval.unit {
            CalendarUnit::Year => "%Y",
            CalendarUnit::Month => "%b %Y",
            CalendarUnit::Day => "%b %-d",
            CalendarUnit::Hour | CalendarUnit::Minute => "%H:%M",
            CalendarUnit::Second if interval.magnitude < 1.0 => "%H:%M:%S%.3f",
            CalendarUnit::Second => "%H:%M:%S",
        };
        Self { pattern }
    }

    /// Custom pattern; falls back to [`LabelFormat::DATE_TIME`] if chrono
    /// cannot parse it.
    pub fn custom(pattern: &'static str) -> Self {
        let valid = StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error));
        if valid { Self { pattern } } else { Self::DATE_TIME }
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    pub fn format(&self, t: Timestamp) -> String {
        t.format(self.pattern).to_string()
    }
}

/// Rough rendered width of `text` at a fixed per-character advance.
pub fn estimate_width(text: &str, char_width: f64) -> f64 {
    text.chars().count() as f64 * char_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t() -> Timestamp {
        Utc.with_ymd_and_hms(2020, 3, 7, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_format_by_unit() {
        let fmt = |i: TimeStepInterval| LabelFormat::for_interval(Some(&i)).format(t());
        assert_eq!(fmt(TimeStepInterval::years(1.0)), "2020");
        assert_eq!(fmt(TimeStepInterval::months(3.0)), "Mar 2020");
        assert_eq!(fmt(TimeStepInterval::days(1.0)), "Mar 7");
        assert_eq!(fmt(TimeStepInterval::hours(6.0)), "14:05");
        assert_eq!(fmt(TimeStepInterval::minutes(15.0)), "14:05");
        assert_eq!(fmt(TimeStepInterval::seconds(30.0)), "14:05:09");
        assert_eq!(fmt(TimeStepInterval::seconds(0.5)), "14:05:09.000");
    }

    #[test]
    fn test_missing_interval_uses_full_date() {
        assert_eq!(LabelFormat::for_interval(None).format(t()), "2020-03-07 14:05");
        let bad = TimeStepInterval::days(0.0);
        assert_eq!(LabelFormat::for_interval(Some(&bad)), LabelFormat::DATE_TIME);
    }

    #[test]
    fn test_custom_pattern() {
        assert_eq!(LabelFormat::custom("%d/%m").format(t()), "07/03");
        assert_eq!(LabelFormat::custom("%Q"), LabelFormat::DATE_TIME);
    }

    #[test]
    fn test_estimate_width() {
        assert_eq!(estimate_width("Mar 7", 7.0), 35.0);
        assert_eq!(estimate_width("", 7.0), 0.0);
        assert_eq!(estimate_width("Mär", 10.0), 30.0);
    }
}
