//! Entities module - temporal value types and step generation
//!
//! Plain values with no UI or event wiring:
//! - `TimeExtent`: optional start/end instants
//! - `TimeStepInterval`: calendar-aware step size
//! - `generate_steps`: discretisation of a full extent

pub mod step_interval;
pub mod steps;
pub mod time_extent;

pub use step_interval::{CalendarUnit, IntervalParseError, TimeStepInterval, TimeUnit};
pub use steps::{MAX_STEP_COUNT, generate_steps};
pub use time_extent::{TimeExtent, Timestamp, parse_timestamp};
