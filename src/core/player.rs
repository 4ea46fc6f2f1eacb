//! Playback engine: steps the current extent on a fixed period.
//!
//! **Architecture**: Player does NOT own the extent controller. It receives
//! `&mut ExtentController` on every poll, the same way the host passes it
//! to drag handlers, so the controller stays the single source of truth.
//!
//! # Timing Model
//!
//! Cooperative, poll driven: the host calls `update()` from its own loop
//! (typically every frame). When at least one playback interval has passed
//! since the previous tick, exactly one `move_time_step(±1)` runs to
//! completion. No thread, no overlap, and a `stop()` is always observed
//! before the next tick.
//!
//! # Boundaries
//!
//! When a step fails (edge of the legal range) the loop mode decides:
//! - `None`: stop playing
//! - `Repeat`: jump back to the opposite edge
//! - `Reverse`: flip direction, no move on this tick. A second flip with
//!   no step in between means neither direction can move, so playback stops.
//!
//! # Readiness gate
//!
//! An optional [`ReadinessGate`] lets a slow consumer hold playback back:
//! a due tick is skipped (and retried on the next poll) until it reports
//! ready.

use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::entities::TimeExtent;

use super::event_bus::EventEmitter;
use super::extent::ExtentController;
use super::slider_events::PlaybackStateChanged;

/// Default time between playback steps
pub const DEFAULT_PLAYBACK_INTERVAL: Duration = Duration::from_millis(1000);

/// Lower bound for the playback interval
pub const MIN_PLAYBACK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayDirection {
    #[default]
    Forward,
    Backward,
}

impl PlayDirection {
    pub fn flipped(self) -> Self {
        match self {
            PlayDirection::Forward => PlayDirection::Backward,
            PlayDirection::Backward => PlayDirection::Forward,
        }
    }

    /// Step delta for one tick
    pub fn delta(self) -> i32 {
        match self {
            PlayDirection::Forward => 1,
            PlayDirection::Backward => -1,
        }
    }
}

impl fmt::Display for PlayDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayDirection::Forward => write!(f, "forward"),
            PlayDirection::Backward => write!(f, "backward"),
        }
    }
}

impl FromStr for PlayDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "fwd" => Ok(PlayDirection::Forward),
            "backward" | "back" | "reverse" => Ok(PlayDirection::Backward),
            _ => Err(format!("Unknown play direction '{}' (forward|backward)", s)),
        }
    }
}

/// What happens when playback reaches the edge of the legal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    #[default]
    None,
    Repeat,
    Reverse,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMode::None => write!(f, "none"),
            LoopMode::Repeat => write!(f, "repeat"),
            LoopMode::Reverse => write!(f, "reverse"),
        }
    }
}

impl FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" | "once" => Ok(LoopMode::None),
            "repeat" | "loop" => Ok(LoopMode::Repeat),
            "reverse" | "pingpong" | "ping-pong" => Ok(LoopMode::Reverse),
            _ => Err(format!("Unknown loop mode '{}' (none|repeat|reverse)", s)),
        }
    }
}

/// "Is the consumer ready for the next step?"
pub trait ReadinessGate: Send + Sync {
    fn is_ready(&self) -> bool;
}

impl<F: Fn() -> bool + Send + Sync> ReadinessGate for F {
    fn is_ready(&self) -> bool {
        self()
    }
}

/// Result of one playback tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Current extent moved one step
    Stepped,
    /// Boundary hit in repeat mode, jumped to the opposite edge
    Wrapped,
    /// Boundary hit in reverse mode, direction flipped
    Reversed,
    /// Boundary hit without looping (or the wrap failed), playback stopped
    Stopped,
    /// Gate not ready, nothing done
    Deferred,
}

/// Playback state manager (does NOT own the extent controller)
#[derive(Clone)]
pub struct Player {
    is_playing: bool,
    direction: PlayDirection,
    loop_mode: LoopMode,
    interval: Duration,

    /// Last tick timestamp
    last_tick: Option<Instant>,
    /// Reverse flipped direction and nothing has moved since
    stalled_flip: bool,
    gate: Option<Arc<dyn ReadinessGate>>,
    emitter: EventEmitter,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("is_playing", &self.is_playing)
            .field("direction", &self.direction)
            .field("loop_mode", &self.loop_mode)
            .field("interval", &self.interval)
            .field("last_tick", &self.last_tick)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            is_playing: false,
            direction: PlayDirection::Forward,
            loop_mode: LoopMode::None,
            interval: DEFAULT_PLAYBACK_INTERVAL,
            last_tick: None,
            stalled_flip: false,
            gate: None,
            emitter: EventEmitter::detached(),
        }
    }

    pub fn with_emitter(emitter: EventEmitter) -> Self {
        Self {
            emitter,
            ..Self::new()
        }
    }

    pub fn set_emitter(&mut self, emitter: EventEmitter) {
        self.emitter = emitter;
    }

    // === State accessors ===

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: PlayDirection) {
        if self.direction != direction {
            self.direction = direction;
            self.emit_state();
        }
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        if self.loop_mode != mode {
            self.loop_mode = mode;
            self.emit_state();
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Set time between steps (floored at [`MIN_PLAYBACK_INTERVAL`]).
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(MIN_PLAYBACK_INTERVAL);
    }

    pub fn set_readiness_gate(&mut self, gate: Option<Arc<dyn ReadinessGate>>) {
        self.gate = gate;
    }

    // === Transport ===

    /// Start playing; the first step comes one interval from now.
    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    pub fn play_at(&mut self, now: Instant) {
        self.last_tick = Some(now);
        self.stalled_flip = false;
        if !self.is_playing {
            self.is_playing = true;
            info!("Playback started ({}, loop {})", self.direction, self.loop_mode);
            self.emit_state();
        }
    }

    /// Stop playing. Never touches the current extent.
    pub fn stop(&mut self) {
        self.last_tick = None;
        if self.is_playing {
            self.is_playing = false;
            info!("Playback stopped");
            self.emit_state();
        }
    }

    pub fn toggle(&mut self) {
        if self.is_playing {
            self.stop();
        } else {
            self.play();
        }
    }

    /// Manual step forward (stops playback)
    pub fn step_forward(&mut self, controller: &mut ExtentController) -> bool {
        self.stop();
        controller.move_time_step(1)
    }

    /// Manual step backward (stops playback)
    pub fn step_backward(&mut self, controller: &mut ExtentController) -> bool {
        self.stop();
        controller.move_time_step(-1)
    }

    // === Playback loop ===

    /// Poll from the host loop. Returns the new current extent when a tick
    /// moved it.
    pub fn update(&mut self, controller: &mut ExtentController) -> Option<TimeExtent> {
        self.update_at(Instant::now(), controller)
    }

    /// Same as [`update`](Self::update) with an explicit clock reading.
    pub fn update_at(&mut self, now: Instant, controller: &mut ExtentController) -> Option<TimeExtent> {
        if !self.is_playing {
            return None;
        }
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return None;
        };
        if now.duration_since(last) < self.interval {
            return None;
        }

        let before = controller.current_extent();
        match self.tick(controller) {
            TickOutcome::Deferred => None,
            _ => {
                self.last_tick = Some(now);
                let after = controller.current_extent();
                (after != before).then_some(after)
            }
        }
    }

    /// Run one playback step now, applying the loop policy at boundaries.
    pub fn tick(&mut self, controller: &mut ExtentController) -> TickOutcome {
        if let Some(gate) = &self.gate
            && !gate.is_ready()
        {
            trace!("Playback tick deferred: consumer not ready");
            return TickOutcome::Deferred;
        }

        if controller.move_time_step(self.direction.delta()) {
            self.stalled_flip = false;
            return TickOutcome::Stepped;
        }

        match self.loop_mode {
            LoopMode::None => {
                trace!("Reached end of range, stopping");
                self.stop();
                TickOutcome::Stopped
            }
            LoopMode::Repeat => {
                let delta = repeat_delta(self.direction, controller);
                if delta != 0 && controller.move_time_step(delta) {
                    trace!("Playback wrapped by {} steps", delta);
                    self.stalled_flip = false;
                    TickOutcome::Wrapped
                } else {
                    trace!("Playback cannot wrap, stopping");
                    self.stop();
                    TickOutcome::Stopped
                }
            }
            LoopMode::Reverse if self.stalled_flip => {
                trace!("Playback cannot move either way, stopping");
                self.stop();
                TickOutcome::Stopped
            }
            LoopMode::Reverse => {
                self.stalled_flip = true;
                self.direction = self.direction.flipped();
                trace!("Playback reversed to {}", self.direction);
                self.emit_state();
                TickOutcome::Reversed
            }
        }
    }

    fn emit_state(&self) {
        self.emitter.emit(PlaybackStateChanged {
            is_playing: self.is_playing,
            direction: self.direction,
            loop_mode: self.loop_mode,
        });
    }
}

/// Steps needed to jump back to the start edge of the legal range.
///
/// An unpinned leading endpoint jumps all the way back, preserving width.
/// A pinned one stays, and the range collapses to its minimal width next to
/// it.
fn repeat_delta(direction: PlayDirection, controller: &ExtentController) -> i32 {
    let (Some(start), Some(end)) = (controller.start_index(), controller.end_index()) else {
        return 0;
    };
    let (start, end) = (start as i64, end as i64);
    let last = controller.step_count() as i64 - 1;
    let pins = controller.pins();
    let delta = match direction {
        PlayDirection::Forward if !pins.start => -start,
        PlayDirection::Forward => -(end - start - 1),
        PlayDirection::Backward if !pins.end => last - end,
        PlayDirection::Backward => end - start - 1,
    };
    delta as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{EventBus, downcast_event};
    use crate::core::extent::PinState;
    use crate::entities::{TimeStepInterval, Timestamp};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn day(n: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2020, 1, n, 0, 0, 0).unwrap()
    }

    /// Ten daily steps with current extent = steps[from..=to]
    fn controller(from: usize, to: usize) -> ExtentController {
        let mut c = ExtentController::new();
        c.set_full_extent(TimeExtent::new(day(1), day(10)));
        c.set_step_interval(Some(TimeStepInterval::days(1.0)));
        c.set_current_extent(TimeExtent::new(day(from as u32 + 1), day(to as u32 + 1)));
        c
    }

    fn indices(c: &ExtentController) -> (usize, usize) {
        (c.start_index().unwrap(), c.end_index().unwrap())
    }

    #[test]
    fn test_tick_steps_forward_and_backward() {
        let mut c = controller(2, 4);
        let mut p = Player::new();
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(indices(&c), (3, 5));
        p.set_direction(PlayDirection::Backward);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(indices(&c), (1, 3));
    }

    #[test]
    fn test_loop_none_stops_at_end() {
        let mut c = controller(7, 8);
        let mut p = Player::new();
        p.play();
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(p.tick(&mut c), TickOutcome::Stopped);
        assert!(!p.is_playing());
        assert_eq!(indices(&c), (8, 9));
    }

    #[test]
    fn test_repeat_forward_wraps_preserving_width() {
        let mut c = controller(8, 9);
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Repeat);
        p.play();
        assert_eq!(p.tick(&mut c), TickOutcome::Wrapped);
        assert_eq!(indices(&c), (0, 1));
        assert!(p.is_playing());
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(indices(&c), (1, 2));
    }

    #[test]
    fn test_repeat_backward_wraps_to_end() {
        let mut c = controller(0, 2);
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Repeat);
        p.set_direction(PlayDirection::Backward);
        assert_eq!(p.tick(&mut c), TickOutcome::Wrapped);
        assert_eq!(indices(&c), (7, 9));
    }

    #[test]
    fn test_repeat_with_pinned_start_collapses_to_minimal_width() {
        let mut c = controller(3, 5);
        c.set_start_pinned(true);
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Repeat);
        for _ in 0..4 {
            assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        }
        assert_eq!(indices(&c), (3, 9));
        assert_eq!(p.tick(&mut c), TickOutcome::Wrapped);
        assert_eq!(indices(&c), (3, 4));
    }

    #[test]
    fn test_repeat_backward_with_pinned_end() {
        let mut c = controller(4, 6);
        c.set_end_pinned(true);
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Repeat);
        p.set_direction(PlayDirection::Backward);
        for _ in 0..4 {
            assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        }
        assert_eq!(indices(&c), (0, 6));
        assert_eq!(p.tick(&mut c), TickOutcome::Wrapped);
        assert_eq!(indices(&c), (5, 6));
    }

    #[test]
    fn test_reverse_flips_without_moving() {
        let mut c = controller(8, 9);
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Reverse);
        p.play();
        assert_eq!(p.tick(&mut c), TickOutcome::Reversed);
        assert_eq!(indices(&c), (8, 9));
        assert_eq!(p.direction(), PlayDirection::Backward);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(indices(&c), (7, 8));
    }

    #[test]
    fn test_reverse_stops_when_neither_direction_moves() {
        let mut c = controller(2, 5);
        c.set_pins(PinState { start: true, end: true });
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Reverse);
        p.play();
        assert_eq!(p.tick(&mut c), TickOutcome::Reversed);
        assert!(p.is_playing());
        assert_eq!(p.tick(&mut c), TickOutcome::Stopped);
        assert!(!p.is_playing());
        assert_eq!(indices(&c), (2, 5));
    }

    #[test]
    fn test_reverse_without_steps_stops() {
        let mut c = ExtentController::new();
        c.set_full_extent(TimeExtent::new(day(1), day(10)));
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Reverse);
        p.set_interval(Duration::from_millis(100));
        let t0 = Instant::now();
        p.play_at(t0);
        assert_eq!(p.update_at(t0 + Duration::from_millis(100), &mut c), None);
        assert_eq!(p.update_at(t0 + Duration::from_millis(200), &mut c), None);
        assert!(!p.is_playing());
    }

    #[test]
    fn test_reverse_keeps_bouncing_while_moving() {
        let mut c = controller(7, 9);
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Reverse);
        p.play();
        assert_eq!(p.tick(&mut c), TickOutcome::Reversed);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(indices(&c), (5, 7));
        p.set_direction(PlayDirection::Forward);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(p.tick(&mut c), TickOutcome::Stepped);
        assert_eq!(p.tick(&mut c), TickOutcome::Reversed);
        assert!(p.is_playing());
        assert_eq!(p.direction(), PlayDirection::Backward);
    }

    #[test]
    fn test_both_pinned_stops_even_when_repeating() {
        let mut c = controller(2, 5);
        c.set_pins(PinState { start: true, end: true });
        let mut p = Player::new();
        p.set_loop_mode(LoopMode::Repeat);
        p.play();
        assert_eq!(p.tick(&mut c), TickOutcome::Stopped);
        assert!(!p.is_playing());
        assert_eq!(indices(&c), (2, 5));
    }

    #[test]
    fn test_update_respects_interval() {
        let mut c = controller(0, 1);
        let mut p = Player::new();
        p.set_interval(Duration::from_millis(100));
        let t0 = Instant::now();
        p.play_at(t0);

        assert_eq!(p.update_at(t0 + Duration::from_millis(50), &mut c), None);
        let moved = p.update_at(t0 + Duration::from_millis(100), &mut c);
        assert_eq!(moved, Some(TimeExtent::new(day(2), day(3))));
        // Timer restarted from the last tick
        assert_eq!(p.update_at(t0 + Duration::from_millis(150), &mut c), None);
        assert!(p.update_at(t0 + Duration::from_millis(200), &mut c).is_some());
    }

    #[test]
    fn test_stop_prevents_further_ticks() {
        let mut c = controller(0, 1);
        let mut p = Player::new();
        p.set_interval(Duration::from_millis(100));
        let t0 = Instant::now();
        p.play_at(t0);
        p.stop();
        let before = c.current_extent();
        assert_eq!(p.update_at(t0 + Duration::from_secs(5), &mut c), None);
        assert_eq!(c.current_extent(), before);
    }

    #[test]
    fn test_readiness_gate_defers_ticks() {
        let mut c = controller(0, 1);
        let mut p = Player::new();
        p.set_interval(Duration::from_millis(100));
        let ready = Arc::new(AtomicBool::new(false));
        let r = Arc::clone(&ready);
        p.set_readiness_gate(Some(Arc::new(move || r.load(Ordering::SeqCst))));

        let t0 = Instant::now();
        p.play_at(t0);
        assert_eq!(p.update_at(t0 + Duration::from_millis(100), &mut c), None);
        assert_eq!(indices(&c), (0, 1));

        ready.store(true, Ordering::SeqCst);
        assert!(p.update_at(t0 + Duration::from_millis(110), &mut c).is_some());
        assert_eq!(indices(&c), (1, 2));
    }

    #[test]
    fn test_interval_floor() {
        let mut p = Player::new();
        p.set_interval(Duration::ZERO);
        assert_eq!(p.interval(), MIN_PLAYBACK_INTERVAL);
    }

    #[test]
    fn test_manual_step_stops_playback() {
        let mut c = controller(2, 3);
        let mut p = Player::new();
        p.play();
        assert!(p.step_forward(&mut c));
        assert!(!p.is_playing());
        assert!(p.step_backward(&mut c));
        assert_eq!(indices(&c), (2, 3));
    }

    #[test]
    fn test_emits_playback_state() {
        let bus = EventBus::new();
        let mut p = Player::with_emitter(bus.emitter());
        p.play();
        p.set_loop_mode(LoopMode::Reverse);
        p.stop();
        let states: Vec<_> = bus
            .poll()
            .iter()
            .filter_map(|e| downcast_event::<PlaybackStateChanged>(e).cloned())
            .collect();
        assert_eq!(states.len(), 3);
        assert!(states[0].is_playing);
        assert_eq!(states[1].loop_mode, LoopMode::Reverse);
        assert!(!states[2].is_playing);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("repeat".parse::<LoopMode>(), Ok(LoopMode::Repeat));
        assert_eq!("Reverse".parse::<LoopMode>(), Ok(LoopMode::Reverse));
        assert!("sideways".parse::<LoopMode>().is_err());
        assert_eq!("backward".parse::<PlayDirection>(), Ok(PlayDirection::Backward));
        assert_eq!(PlayDirection::Forward.flipped(), PlayDirection::Backward);
    }
}
