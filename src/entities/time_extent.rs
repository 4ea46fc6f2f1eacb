//! Time extents: an optional start/end pair of UTC timestamps.
//!
//! - both present: a range, always stored with `start <= end`
//! - one present: a single instant
//! - none: no extent

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in time used throughout the slider.
pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "ExtentBounds")]
pub struct TimeExtent {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

/// Wire form of [`TimeExtent`]; decoding goes through `from_bounds`.
#[derive(Deserialize)]
struct ExtentBounds {
    #[serde(default)]
    start: Option<Timestamp>,
    #[serde(default)]
    end: Option<Timestamp>,
}

impl From<ExtentBounds> for TimeExtent {
    fn from(b: ExtentBounds) -> Self {
        TimeExtent::from_bounds(b.start, b.end)
    }
}

impl TimeExtent {
    /// Empty extent
    pub const EMPTY: TimeExtent = TimeExtent { start: None, end: None };

    /// Range extent. Bounds are swapped if given in reverse order.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        if end < start {
            Self { start: Some(end), end: Some(start) }
        } else {
            Self { start: Some(start), end: Some(end) }
        }
    }

    /// Single-instant extent (start and end equal)
    pub fn instant(t: Timestamp) -> Self {
        Self { start: Some(t), end: Some(t) }
    }

    /// Build from optional bounds, normalising order when both are present.
    pub fn from_bounds(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        match (start, end) {
            (Some(s), Some(e)) => Self::new(s, e),
            _ => Self { start, end },
        }
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both bounds present and distinct
    pub fn is_range(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s != e)
    }

    /// Both bounds, with a lone bound mirrored to the other side.
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some((s, e)),
            (Some(t), None) | (None, Some(t)) => Some((t, t)),
            (None, None) => None,
        }
    }

    /// `end - start`, zero for a single instant.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.bounds().map(|(s, e)| e - s)
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.bounds().is_some_and(|(s, e)| s <= t && t <= e)
    }

    /// Clamp `t` into this extent. Returns `t` unchanged for an empty extent.
    pub fn clamp(&self, t: Timestamp) -> Timestamp {
        match self.bounds() {
            Some((s, e)) => t.clamp(s, e),
            None => t,
        }
    }

    /// Component-wise min(start) / max(end).
    ///
    /// Returns `self` unchanged when either side has no bounds at all.
    pub fn union(&self, other: &TimeExtent) -> TimeExtent {
        let (Some((a_start, a_end)), Some((b_start, b_end))) = (self.bounds(), other.bounds()) else {
            return *self;
        };
        TimeExtent::new(a_start.min(b_start), a_end.max(b_end))
    }
}

impl fmt::Display for TimeExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const FMT: &str = "%Y-%m-%d %H:%M:%S";
        match (self.start, self.end) {
            (Some(s), Some(e)) if s == e => write!(f, "{}", s.format(FMT)),
            (Some(s), Some(e)) => write!(f, "{} .. {}", s.format(FMT), e.format(FMT)),
            (Some(t), None) | (None, Some(t)) => write!(f, "{}", t.format(FMT)),
            (None, None) => write!(f, "(none)"),
        }
    }
}

/// Parse a UTC timestamp from RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| format!("Invalid timestamp '{}': expected YYYY-MM-DD[ HH:MM:SS] or RFC 3339", s))
}
