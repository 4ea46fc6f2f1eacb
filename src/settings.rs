//! Persisted slider preferences (`timeslider.json`).
//!
//! Only configuration is stored here; the current extent is never saved.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::{ExtentController, LoopMode, NotifyMode, PinState, PlayDirection, Player};
use crate::core::player::DEFAULT_PLAYBACK_INTERVAL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderSettings {
    pub pin_start: bool,
    pub pin_end: bool,
    pub direction: PlayDirection,
    pub loop_mode: LoopMode,
    /// Time between playback steps
    pub playback_interval_ms: u64,
    pub notify_mode: NotifyMode,
    /// Track length in layout units
    pub track_length: f64,
    /// Minimum gap between neighbouring tick labels
    pub label_padding: f64,
    /// Per-character advance used to estimate label widths
    pub label_char_width: f64,
}

impl Default for SliderSettings {
    fn default() -> Self {
        Self {
            pin_start: false,
            pin_end: false,
            direction: PlayDirection::Forward,
            loop_mode: LoopMode::None,
            playback_interval_ms: DEFAULT_PLAYBACK_INTERVAL.as_millis() as u64,
            notify_mode: NotifyMode::Continuous,
            track_length: 800.0,
            label_padding: 8.0,
            label_char_width: 7.0,
        }
    }
}

impl SliderSettings {
    /// Load from `path`; a missing file gives defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid settings JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize settings")
    }

    pub fn pins(&self) -> PinState {
        PinState {
            start: self.pin_start,
            end: self.pin_end,
        }
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }

    pub fn apply_to_controller(&self, controller: &mut ExtentController) {
        controller.set_pins(self.pins());
        controller.set_notify_mode(self.notify_mode);
    }

    pub fn apply_to_player(&self, player: &mut Player) {
        player.set_direction(self.direction);
        player.set_loop_mode(self.loop_mode);
        player.set_interval(self.playback_interval());
    }

    /// Snapshot the configurable state of a live controller/player pair.
    pub fn capture(&mut self, controller: &ExtentController, player: &Player) {
        let pins = controller.pins();
        self.pin_start = pins.start;
        self.pin_end = pins.end;
        self.notify_mode = controller.notify_mode();
        self.direction = player.direction();
        self.loop_mode = player.loop_mode();
        self.playback_interval_ms = player.interval().as_millis() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keeps_values() {
        let settings = SliderSettings {
            pin_end: true,
            loop_mode: LoopMode::Reverse,
            direction: PlayDirection::Backward,
            playback_interval_ms: 250,
            notify_mode: NotifyMode::OnRelease,
            ..Default::default()
        };
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"loop_mode\": \"Reverse\""));
        assert_eq!(SliderSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = SliderSettings::from_json(r#"{ "pin_start": true, "track_length": 320.0 }"#).unwrap();
        assert!(settings.pin_start);
        assert_eq!(settings.track_length, 320.0);
        assert_eq!(settings.loop_mode, LoopMode::None);
        assert_eq!(settings.playback_interval(), DEFAULT_PLAYBACK_INTERVAL);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(SliderSettings::from_json("{ not json").is_err());
        assert!(SliderSettings::from_json(r#"{ "loop_mode": "Sideways" }"#).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("timeslider_no_such_dir").join("timeslider.json");
        assert_eq!(SliderSettings::load(&path).unwrap(), SliderSettings::default());
    }

    #[test]
    fn test_apply_and_capture() {
        let settings = SliderSettings {
            pin_start: true,
            loop_mode: LoopMode::Repeat,
            playback_interval_ms: 40,
            ..Default::default()
        };
        let mut controller = ExtentController::new();
        let mut player = Player::new();
        settings.apply_to_controller(&mut controller);
        settings.apply_to_player(&mut player);
        assert!(controller.pins().start);
        assert_eq!(player.loop_mode(), LoopMode::Repeat);
        assert_eq!(player.interval(), Duration::from_millis(40));

        let mut captured = SliderSettings::default();
        captured.capture(&controller, &player);
        assert_eq!(captured.pins(), settings.pins());
        assert_eq!(captured.loop_mode, LoopMode::Repeat);
        assert_eq!(captured.playback_interval_ms, 40);
    }
}
