//! `TimeSlider`: controller, player, event bus and track geometry wired
//! together for a host.
//!
//! The host owns one `TimeSlider`, feeds it discovery results and pointer
//! positions, polls `update()` from its loop, and drains `bus().poll()`
//! (or subscribes) to learn about changes.

use std::time::Instant;

use log::info;

use crate::core::{EventBus, ExtentController, Player};
use crate::discovery::TimeProperties;
use crate::entities::{TimeExtent, TimeStepInterval};
use crate::layout::{LabelFormat, TickLayout, TrackMapper, estimate_width, plan_ticks};
use crate::settings::SliderSettings;

#[derive(Debug)]
pub struct TimeSlider {
    bus: EventBus,
    controller: ExtentController,
    player: Player,
    track_length: f64,
    label_padding: f64,
    label_char_width: f64,
}

impl Default for TimeSlider {
    fn default() -> Self {
        Self::from_settings(&SliderSettings::default())
    }
}

impl TimeSlider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &SliderSettings) -> Self {
        let bus = EventBus::new();
        let mut controller = ExtentController::with_emitter(bus.emitter());
        let mut player = Player::with_emitter(bus.emitter());
        settings.apply_to_controller(&mut controller);
        settings.apply_to_player(&mut player);
        Self {
            bus,
            controller,
            player,
            track_length: settings.track_length,
            label_padding: settings.label_padding,
            label_char_width: settings.label_char_width,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn controller(&self) -> &ExtentController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExtentController {
        &mut self.controller
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Write current configuration back into `settings`.
    pub fn capture_settings(&self, settings: &mut SliderSettings) {
        settings.capture(&self.controller, &self.player);
        settings.track_length = self.track_length;
        settings.label_padding = self.label_padding;
        settings.label_char_width = self.label_char_width;
    }

    /// Install discovered time properties (full extent first, then interval).
    pub fn apply_time_properties(&mut self, props: &TimeProperties) {
        info!("Applying time properties: {}", props.full_extent);
        self.controller.set_full_extent(props.full_extent);
        self.controller.set_step_interval(props.step_interval);
    }

    pub fn set_full_extent(&mut self, extent: TimeExtent) {
        self.controller.set_full_extent(extent);
    }

    pub fn set_step_interval(&mut self, interval: Option<TimeStepInterval>) {
        self.controller.set_step_interval(interval);
    }

    pub fn set_current_extent(&mut self, extent: TimeExtent) -> bool {
        self.controller.set_current_extent(extent)
    }

    pub fn current_extent(&self) -> TimeExtent {
        self.controller.current_extent()
    }

    // === Geometry ===

    pub fn track_length(&self) -> f64 {
        self.track_length
    }

    pub fn set_track_length(&mut self, length: f64) {
        self.track_length = length;
    }

    pub fn mapper(&self) -> TrackMapper {
        TrackMapper::new(self.controller.full_extent(), self.track_length)
    }

    /// Thumb positions of the current extent
    pub fn thumb_positions(&self) -> Option<(f64, f64)> {
        self.mapper().extent_positions(&self.controller.current_extent())
    }

    /// Drag the start thumb to track position `p`.
    pub fn drag_start(&mut self, p: f64) -> bool {
        match self.mapper().value(p) {
            Some(t) => self.controller.update_start(t),
            None => false,
        }
    }

    /// Drag the end thumb to track position `p`.
    pub fn drag_end(&mut self, p: f64) -> bool {
        match self.mapper().value(p) {
            Some(t) => self.controller.update_end(t),
            None => false,
        }
    }

    /// Pointer released; flushes a deferred notification.
    pub fn release(&mut self) -> bool {
        self.controller.finish_interaction()
    }

    pub fn label_format(&self) -> LabelFormat {
        LabelFormat::for_interval(self.controller.step_interval().as_ref())
    }

    /// Label text of step `index`
    pub fn step_label(&self, index: usize) -> Option<String> {
        let format = self.label_format();
        self.controller.steps().get(index).map(|&t| format.format(t))
    }

    pub fn tick_layout(&self) -> TickLayout {
        let steps = self.controller.steps();
        let positions = self.mapper().step_positions(steps);
        let format = self.label_format();
        let char_width = self.label_char_width;
        plan_ticks(
            &positions,
            |i| estimate_width(&format.format(steps[i]), char_width),
            self.label_padding,
        )
    }

    // === Playback ===

    pub fn update(&mut self) -> Option<TimeExtent> {
        self.player.update(&mut self.controller)
    }

    pub fn update_at(&mut self, now: Instant) -> Option<TimeExtent> {
        self.player.update_at(now, &mut self.controller)
    }

    pub fn step_forward(&mut self) -> bool {
        self.player.step_forward(&mut self.controller)
    }

    pub fn step_backward(&mut self) -> bool {
        self.player.step_backward(&mut self.controller)
    }
}
