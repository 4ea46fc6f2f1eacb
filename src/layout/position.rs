//! Linear mapping between instants and positions along the slider track.
//!
//! Position 0 is the full extent start, position `length` its end. The
//! mapping works in nanoseconds, falling back to milliseconds for spans too
//! long to count in `i64` nanoseconds (about 292 years).

use chrono::TimeDelta;

use crate::entities::{TimeExtent, Timestamp};

/// Offsets at or above this many nanoseconds are built from milliseconds
const NANOS_LIMIT: f64 = i64::MAX as f64;

/// Maps instants of a full extent onto a track of `length` units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackMapper {
    full_extent: TimeExtent,
    length: f64,
}

impl TrackMapper {
    pub fn new(full_extent: TimeExtent, length: f64) -> Self {
        Self {
            full_extent,
            length: if length.is_finite() { length.max(0.0) } else { 0.0 },
        }
    }

    pub fn full_extent(&self) -> TimeExtent {
        self.full_extent
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Span of the domain in nanoseconds, `None` when degenerate.
    fn span(&self) -> Option<(Timestamp, f64)> {
        let (start, end) = self.full_extent.bounds()?;
        let span = nanos(end - start);
        (span > 0.0).then_some((start, span))
    }

    /// Track position of `t`. Zero for an empty or single-instant domain.
    pub fn position(&self, t: Timestamp) -> f64 {
        let Some((start, span)) = self.span() else {
            return 0.0;
        };
        self.length * nanos(t - start) / span
    }

    /// Instant at track position `p` (inverse of [`position`](Self::position)).
    ///
    /// `p` is clamped to the track, so the result always lies in the
    /// domain. Returns the domain start for a degenerate domain or track and
    /// `None` without a domain.
    pub fn value(&self, p: f64) -> Option<Timestamp> {
        let (start, _) = self.full_extent.bounds()?;
        let Some((start, span)) = self.span() else {
            return Some(start);
        };
        if self.length <= 0.0 || p.is_nan() {
            return Some(start);
        }
        let offset = (p.clamp(0.0, self.length) / self.length * span).round();
        let delta = if offset < NANOS_LIMIT {
            TimeDelta::nanoseconds(offset as i64)
        } else {
            TimeDelta::try_milliseconds((offset / 1e6).round() as i64)?
        };
        start.checked_add_signed(delta)
    }

    /// Thumb positions `(start, end)` of an extent; a lone bound maps twice.
    pub fn extent_positions(&self, extent: &TimeExtent) -> Option<(f64, f64)> {
        let (start, end) = extent.bounds()?;
        Some((self.position(start), self.position(end)))
    }

    pub fn step_positions(&self, steps: &[Timestamp]) -> Vec<f64> {
        steps.iter().map(|&t| self.position(t)).collect()
    }
}

fn nanos(d: TimeDelta) -> f64 {
    match d.num_nanoseconds() {
        Some(ns) => ns as f64,
        None => d.num_milliseconds() as f64 * 1e6,
    }
}
