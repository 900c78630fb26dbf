use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;
pub const HOLD_DURATION_MS: u64 = 400;
pub const TAP_MAX_MOVEMENT_PX: f32 = 20.0;
pub const SWIPE_THRESHOLD_PX: f32 = 60.0;
// Zoom fires when the finger distance grows or shrinks by this fraction of the baseline.
pub const PINCH_STEP_RATIO: f32 = 0.05;
pub const PINCH_VS_SCROLL_SENSITIVITY: f32 = 1.0;
pub const EDGE_WIDTH_PX: f32 = 50.0;
pub const STICKY_LONG_PRESS_MS: u64 = 300;
pub const STICKY_MAX_KEYS: usize = 8;
pub const COMMAND_QUEUE_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GestureConfig {
    pub double_tap_window_ms: u64,
    pub hold_duration_ms: u64,
    pub tap_max_movement_px: f32,
    pub swipe_threshold_px: f32,
    pub pinch_step_ratio: f32,
    pub pinch_vs_scroll_sensitivity: f32,
    pub edge_swipes: bool,
    pub edge_width_px: f32,
    /// Width of the touch surface; zero when unknown.
    pub surface_width_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: DOUBLE_TAP_WINDOW_MS,
            hold_duration_ms: HOLD_DURATION_MS,
            tap_max_movement_px: TAP_MAX_MOVEMENT_PX,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
            pinch_step_ratio: PINCH_STEP_RATIO,
            pinch_vs_scroll_sensitivity: PINCH_VS_SCROLL_SENSITIVITY,
            edge_swipes: false,
            edge_width_px: EDGE_WIDTH_PX,
            surface_width_px: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StickyConfig {
    pub long_press_ms: u64,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            long_press_ms: STICKY_LONG_PRESS_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub gesture: GestureConfig,
    pub sticky: StickyConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl RemoteConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: RemoteConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let gesture = &self.gesture;
        if gesture.double_tap_window_ms == 0 {
            return Err(invalid("gesture.double_tap_window_ms", "must be > 0"));
        }
        if gesture.hold_duration_ms == 0 {
            return Err(invalid("gesture.hold_duration_ms", "must be > 0"));
        }
        if !(gesture.tap_max_movement_px > 0.0) {
            return Err(invalid("gesture.tap_max_movement_px", "must be > 0"));
        }
        if !(gesture.swipe_threshold_px > 0.0) {
            return Err(invalid("gesture.swipe_threshold_px", "must be > 0"));
        }
        if !(gesture.pinch_step_ratio > 0.0 && gesture.pinch_step_ratio < 1.0) {
            return Err(invalid("gesture.pinch_step_ratio", "must be within (0, 1)"));
        }
        if !(gesture.pinch_vs_scroll_sensitivity > 0.0) {
            return Err(invalid("gesture.pinch_vs_scroll_sensitivity", "must be > 0"));
        }
        if gesture.edge_swipes && !(gesture.surface_width_px > gesture.edge_width_px * 2.0) {
            return Err(invalid(
                "gesture.surface_width_px",
                "edge swipes need a surface wider than both edge zones",
            ));
        }
        if self.sticky.long_press_ms == 0 {
            return Err(invalid("sticky.long_press_ms", "must be > 0"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
