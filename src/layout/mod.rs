//! Track geometry: instant/position mapping, tick planning, label text.

pub mod labels;
pub mod position;
pub mod ticks;

pub use labels::{LabelFormat, estimate_width};
pub use position::TrackMapper;
pub use ticks::{Tick, TickKind, TickLayout, plan_ticks};
