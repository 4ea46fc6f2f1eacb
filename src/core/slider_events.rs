//! Events emitted by the extent controller and the player.

use crate::entities::{TimeExtent, TimeStepInterval};

use super::player::{LoopMode, PlayDirection};

/// Current extent changed (drag, step, playback or host push)
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentExtentChanged {
    pub extent: TimeExtent,
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FullExtentChanged {
    pub extent: TimeExtent,
    pub step_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepIntervalChanged {
    pub interval: Option<TimeStepInterval>,
    pub step_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackStateChanged {
    pub is_playing: bool,
    pub direction: PlayDirection,
    pub loop_mode: LoopMode,
}
