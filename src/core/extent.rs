//! Extent controller: owns the current extent inside the full extent.
//!
//! **Transitions** are explicit and synchronous. Each one performs its
//! cascade (step regeneration, clamping, snapping) and emits the resulting
//! state on the event bus:
//!
//! - `set_full_extent()` / `set_step_interval()`: invalidate the step cache
//!   and re-clamp / re-snap the current extent
//! - `set_current_extent()`: host push (sync from another component)
//! - `update_start()` / `update_end()`: interactive candidate times
//! - `move_time_step()`: index-based stepping, used by buttons and playback
//!
//! # Range vs single instant
//!
//! When the current extent is assigned with two distinct bounds the
//! controller is *range-enabled* and both endpoints move independently.
//! Otherwise it tracks one instant and every operation moves start and end
//! together. The flag is derived on assignment only; stepping a range down
//! to zero width keeps it a range.
//!
//! # Step indices
//!
//! `start_index` / `end_index` point into the step sequence. `None` means
//! "not snapped yet" (no steps when the time was set); stepping resolves
//! them to the nearest step first.

use std::cell::OnceCell;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::entities::{TimeExtent, TimeStepInterval, Timestamp, generate_steps};

use super::event_bus::EventEmitter;
use super::slider_events::{CurrentExtentChanged, FullExtentChanged, StepIntervalChanged};

/// Which endpoints are excluded from movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinState {
    pub start: bool,
    pub end: bool,
}

impl PinState {
    pub fn both(&self) -> bool {
        self.start && self.end
    }

    pub fn any(&self) -> bool {
        self.start || self.end
    }
}

/// When interactive updates are announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotifyMode {
    /// Every intermediate drag position
    #[default]
    Continuous,
    /// Once, when the gesture ends (`finish_interaction`)
    OnRelease,
}

#[derive(Debug, Clone, Default)]
pub struct ExtentController {
    full_extent: TimeExtent,
    step_interval: Option<TimeStepInterval>,
    /// Lazily generated; reset whenever full extent or interval changes
    steps: OnceCell<Vec<Timestamp>>,
    current: TimeExtent,
    start_index: Option<usize>,
    end_index: Option<usize>,
    pins: PinState,
    range_enabled: bool,
    notify_mode: NotifyMode,
    pending_notify: bool,
    emitter: EventEmitter,
}

impl ExtentController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emitter(emitter: EventEmitter) -> Self {
        Self {
            emitter,
            ..Self::default()
        }
    }

    pub fn set_emitter(&mut self, emitter: EventEmitter) {
        self.emitter = emitter;
    }

    // === Accessors ===

    pub fn full_extent(&self) -> TimeExtent {
        self.full_extent
    }

    pub fn step_interval(&self) -> Option<TimeStepInterval> {
        self.step_interval
    }

    pub fn current_extent(&self) -> TimeExtent {
        self.current
    }

    pub fn start_index(&self) -> Option<usize> {
        self.start_index
    }

    pub fn end_index(&self) -> Option<usize> {
        self.end_index
    }

    pub fn pins(&self) -> PinState {
        self.pins
    }

    pub fn is_range_enabled(&self) -> bool {
        self.range_enabled
    }

    pub fn notify_mode(&self) -> NotifyMode {
        self.notify_mode
    }

    pub fn set_notify_mode(&mut self, mode: NotifyMode) {
        self.notify_mode = mode;
    }

    pub fn set_start_pinned(&mut self, pinned: bool) {
        self.pins.start = pinned;
    }

    pub fn set_end_pinned(&mut self, pinned: bool) {
        self.pins.end = pinned;
    }

    pub fn set_pins(&mut self, pins: PinState) {
        self.pins = pins;
    }

    /// Step instants for the current full extent and interval.
    ///
    /// Empty when either is missing or unusable.
    pub fn steps(&self) -> &[Timestamp] {
        self.steps.get_or_init(|| match &self.step_interval {
            Some(interval) => generate_steps(&self.full_extent, interval),
            None => Vec::new(),
        })
    }

    pub fn step_count(&self) -> usize {
        self.steps().len()
    }

    fn invalidate_steps(&mut self) {
        self.steps = OnceCell::new();
        self.start_index = None;
        self.end_index = None;
    }

    // === Transitions ===

    /// Replace the full extent.
    ///
    /// The first full extent also becomes the current extent; later ones
    /// re-clamp and re-snap the existing current extent.
    pub fn set_full_extent(&mut self, extent: TimeExtent) {
        if extent == self.full_extent {
            return;
        }
        info!("Full extent set to {}", extent);
        self.full_extent = extent;
        self.invalidate_steps();
        self.emitter.emit(FullExtentChanged {
            extent,
            step_count: self.step_count(),
        });

        if self.current.is_empty() {
            self.set_current_extent(extent);
        } else {
            self.reclamp_current();
        }
    }

    /// Replace the step interval and re-snap the current extent.
    pub fn set_step_interval(&mut self, interval: Option<TimeStepInterval>) {
        if interval == self.step_interval {
            return;
        }
        match &interval {
            Some(i) => info!("Step interval set to {}", i),
            None => info!("Step interval cleared"),
        }
        self.step_interval = interval;
        self.invalidate_steps();
        self.emitter.emit(StepIntervalChanged {
            interval,
            step_count: self.step_count(),
        });
        self.reclamp_current();
    }

    /// Assign the current extent (host push or initial value).
    ///
    /// Derives range mode from the input, mirrors a lone bound to both ends,
    /// clears on an empty extent, then clamps into the full extent and snaps
    /// to steps. Emits only when the stored extent changes. Returns whether
    /// it changed.
    pub fn set_current_extent(&mut self, extent: TimeExtent) -> bool {
        let Some((start, end)) = extent.bounds() else {
            self.range_enabled = false;
            return self.commit(None, TimeExtent::EMPTY, None, None);
        };
        self.range_enabled = extent.is_range();
        let (start, start_idx, end, end_idx) = self.normalize(start, end);
        self.commit(None, TimeExtent::new(start, end), start_idx, end_idx)
    }

    /// Move the start toward `candidate`, clamped and snapped.
    ///
    /// Start lies in `[full.start, current.end]` in range mode, else in the
    /// whole full extent (and the end follows it). Returns whether the
    /// current extent changed.
    pub fn update_start(&mut self, candidate: Timestamp) -> bool {
        let Some((_, current_end)) = self.current.bounds() else {
            debug!("update_start ignored: no current extent");
            return false;
        };
        if self.is_blocked(self.pins.start) {
            trace!("update_start ignored: start pinned");
            return false;
        }
        let (full_start, full_end) = self.full_bounds();
        if !self.range_enabled {
            return self.update_instant(candidate, full_start, full_end);
        }

        let clamped = clamp_between(candidate, full_start, Some(current_end));
        let (mut start, mut start_idx) = self.snap(clamped);
        if start > current_end {
            start = current_end;
            start_idx = self.end_index;
        }
        self.commit(Some(false), TimeExtent::new(start, current_end), start_idx, self.end_index)
    }

    /// Move the end toward `candidate`, clamped to `[current.start, full.end]`
    /// and snapped. In single-instant mode behaves like `update_start`.
    pub fn update_end(&mut self, candidate: Timestamp) -> bool {
        let Some((current_start, _)) = self.current.bounds() else {
            debug!("update_end ignored: no current extent");
            return false;
        };
        if self.is_blocked(self.pins.end) {
            trace!("update_end ignored: end pinned");
            return false;
        }
        let (full_start, full_end) = self.full_bounds();
        if !self.range_enabled {
            return self.update_instant(candidate, full_start, full_end);
        }

        let clamped = clamp_between(candidate, Some(current_start), full_end);
        let (mut end, mut end_idx) = self.snap(clamped);
        if end < current_start {
            end = current_start;
            end_idx = self.start_index;
        }
        self.commit(Some(false), TimeExtent::new(current_start, end), self.start_index, end_idx)
    }

    /// Flush a change held back by [`NotifyMode::OnRelease`].
    ///
    /// Returns whether a notification was emitted.
    pub fn finish_interaction(&mut self) -> bool {
        if !self.pending_notify {
            return false;
        }
        self.pending_notify = false;
        self.emit_current();
        true
    }

    /// Nearest step to `t`; exact ties resolve to the earlier step.
    pub fn closest_step_index(&self, t: Timestamp) -> Option<(usize, Timestamp)> {
        let steps = self.steps();
        if steps.is_empty() {
            return None;
        }
        let after = steps.partition_point(|s| *s < t);
        let best = if after == 0 {
            0
        } else if after == steps.len() {
            steps.len() - 1
        } else if steps[after] - t < t - steps[after - 1] {
            after
        } else {
            after - 1
        };
        Some((best, steps[best]))
    }

    /// Shift the current extent by `delta` steps.
    ///
    /// Unpinned endpoints move together. `delta` is clamped so every moving
    /// endpoint stays inside `[min, max]`, where a pinned start is the
    /// minimum and a pinned end the maximum. With one end pinned the other
    /// keeps moving, narrowing or widening the range. Returns whether any
    /// endpoint moved.
    pub fn move_time_step(&mut self, delta: i32) -> bool {
        if delta == 0 || self.pins.both() {
            return false;
        }
        // A single instant cannot split, so any pin freezes it
        if !self.range_enabled && self.pins.any() {
            return false;
        }
        let count = self.step_count();
        if count == 0 || delta.unsigned_abs() as usize > count {
            return false;
        }
        let Some((current_start, current_end)) = self.current.bounds() else {
            return false;
        };

        let Some(start_idx) = self.start_index.or_else(|| self.closest_step_index(current_start).map(|(i, _)| i)) else {
            return false;
        };
        let end_idx = if self.range_enabled {
            match self.end_index.or_else(|| self.closest_step_index(current_end).map(|(i, _)| i)) {
                Some(i) => i.max(start_idx),
                None => return false,
            }
        } else {
            start_idx
        };
        self.start_index = Some(start_idx);
        self.end_index = Some(end_idx);

        let last = (count - 1) as i64;
        let (start, end) = (start_idx as i64, end_idx as i64);
        let min = if self.pins.start { start } else { 0 };
        let max = if self.pins.end { end } else { last };
        let moves_start = !self.pins.start;
        let moves_end = !self.pins.end;

        let mut step = delta as i64;
        if step > 0 {
            if moves_start {
                step = step.min(max - start);
            }
            if moves_end {
                step = step.min(max - end);
            }
            step = step.max(0);
        } else {
            if moves_start {
                step = step.max(min - start);
            }
            if moves_end {
                step = step.max(min - end);
            }
            step = step.min(0);
        }
        if step == 0 {
            trace!("move_time_step({}) blocked at [{}, {}]", delta, start_idx, end_idx);
            return false;
        }

        let new_start = (if moves_start { start + step } else { start }) as usize;
        let new_end = (if moves_end { end + step } else { end }) as usize;
        debug_assert!(new_start <= new_end);

        let steps = self.steps();
        let extent = TimeExtent::new(steps[new_start], steps[new_end]);
        trace!(
            "move_time_step({}) -> {} [{}, {}]",
            delta, step, new_start, new_end
        );
        self.commit(Some(true), extent, Some(new_start), Some(new_end));
        true
    }

    // === Internals ===

    /// Pinned endpoints block interactive moves; in single-instant mode
    /// either pin blocks.
    fn is_blocked(&self, endpoint_pinned: bool) -> bool {
        if self.range_enabled {
            endpoint_pinned
        } else {
            self.pins.any()
        }
    }

    fn full_bounds(&self) -> (Option<Timestamp>, Option<Timestamp>) {
        match self.full_extent.bounds() {
            Some((s, e)) => (Some(s), Some(e)),
            None => (None, None),
        }
    }

    fn update_instant(&mut self, candidate: Timestamp, lower: Option<Timestamp>, upper: Option<Timestamp>) -> bool {
        let (t, idx) = self.snap(clamp_between(candidate, lower, upper));
        self.commit(Some(false), TimeExtent::instant(t), idx, idx)
    }

    fn snap(&self, t: Timestamp) -> (Timestamp, Option<usize>) {
        match self.closest_step_index(t) {
            Some((idx, step)) => (step, Some(idx)),
            None => (t, None),
        }
    }

    /// Clamp both bounds into the full extent and snap them to steps.
    fn normalize(&self, start: Timestamp, end: Timestamp) -> (Timestamp, Option<usize>, Timestamp, Option<usize>) {
        let (start, end) = (self.full_extent.clamp(start), self.full_extent.clamp(end));
        if !self.range_enabled {
            let (t, idx) = self.snap(start);
            return (t, idx, t, idx);
        }
        // Nearest-step snapping is monotonic, so order is preserved
        let (start, start_idx) = self.snap(start);
        let (end, end_idx) = self.snap(end);
        (start, start_idx, end, end_idx)
    }

    fn reclamp_current(&mut self) {
        let Some((start, end)) = self.current.bounds() else {
            return;
        };
        let (start, start_idx, end, end_idx) = self.normalize(start, end);
        self.commit(None, TimeExtent::new(start, end), start_idx, end_idx);
    }

    /// Store a new current extent and announce it if it changed.
    ///
    /// `interactive`: `Some(false)` for drag updates (subject to the notify
    /// mode), `Some(true)` for discrete moves, `None` for host/cascade
    /// assignments. Only drag updates may be deferred.
    fn commit(
        &mut self,
        interactive: Option<bool>,
        extent: TimeExtent,
        start_index: Option<usize>,
        end_index: Option<usize>,
    ) -> bool {
        self.start_index = start_index;
        self.end_index = end_index;
        if extent == self.current {
            return false;
        }
        self.current = extent;
        debug!("Current extent -> {} [{:?}, {:?}]", extent, start_index, end_index);

        if interactive == Some(false) && self.notify_mode == NotifyMode::OnRelease {
            self.pending_notify = true;
        } else {
            self.pending_notify = false;
            self.emit_current();
        }
        true
    }

    fn emit_current(&self) {
        self.emitter.emit(CurrentExtentChanged {
            extent: self.current,
            start_index: self.start_index,
            end_index: self.end_index,
        });
    }
}

/// Clamp without panicking when the bounds cross (upper wins).
fn clamp_between(t: Timestamp, lower: Option<Timestamp>, upper: Option<Timestamp>) -> Timestamp {
    let t = lower.map_or(t, |lo| t.max(lo));
    upper.map_or(t, |hi| t.min(hi))
}
