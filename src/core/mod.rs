//! Core engine modules - extent state, playback, events
//!
//! These modules form the slider engine, independent of any UI.

pub mod event_bus;
pub mod extent;
pub mod player;
pub mod slider_events;

// Re-exports for convenience
pub use event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use extent::{ExtentController, NotifyMode, PinState};
pub use player::{LoopMode, PlayDirection, Player, ReadinessGate, TickOutcome};
pub use slider_events::{CurrentExtentChanged, FullExtentChanged, PlaybackStateChanged, StepIntervalChanged};
