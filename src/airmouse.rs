//! Air-mouse relay: device orientation stands in for touchpad motion while enabled.

use crate::action::Action;

/// One device-orientation reading. Browsers report `null` axes before the sensor settles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationSample {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

impl OrientationSample {
    pub const fn new(alpha: Option<f64>, beta: Option<f64>) -> Self {
        Self { alpha, beta }
    }
}

#[derive(Debug, Default)]
pub struct AirMouseRelay {
    active: bool,
}

impl AirMouseRelay {
    pub const fn new() -> Self {
        Self { active: false }
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Flips the mode and returns the announcement for the sink.
    pub fn toggle(&mut self) -> Action {
        self.set_active(!self.active)
    }

    pub fn set_active(&mut self, active: bool) -> Action {
        self.active = active;
        log::info!("airmouse: active={}", active);
        Action::AirMouse { active }
    }

    /// Forwards the sample unfiltered; smoothing belongs to the executor.
    pub fn on_orientation(&self, sample: OrientationSample) -> Option<Action> {
        if !self.active {
            return None;
        }
        let alpha = sample.alpha?;
        Some(Action::Orientation {
            alpha,
            beta: sample.beta,
        })
    }
}
