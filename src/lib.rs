//! timeslider - time slider core library
//!
//! Calendar step generation, extent snapping and stepping with pinned
//! endpoints, playback, track mapping and tick layout. No rendering.

// Core engine (extent controller, player, events)
pub mod core;

pub mod cli;
pub mod discovery;
pub mod entities;
pub mod layout;
pub mod paths;
pub mod settings;
pub mod slider;

// Re-export commonly used types
pub use crate::core::{EventBus, ExtentController, LoopMode, PlayDirection, Player};
pub use entities::{TimeExtent, TimeStepInterval, Timestamp, generate_steps};
pub use slider::TimeSlider;
