//! Normalized vehicle actuation.

use serde::{Deserialize, Serialize};

/// One tick's worth of vehicle control.
///
/// Always within range: steer in `[-1, 1]`, throttle and brake in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    pub steer: f32,
    pub throttle: f32,
    pub brake: f32,
}

impl ActuationCommand {
    /// Build a command, clamping each channel into its domain.
    ///
    /// Non-finite inputs read as zero.
    #[must_use]
    pub fn new(steer: f32, throttle: f32, brake: f32) -> Self {
        Self {
            steer: clamp_finite(steer, -1.0, 1.0),
            throttle: clamp_finite(throttle, 0.0, 1.0),
            brake: clamp_finite(brake, 0.0, 1.0),
        }
    }

    /// No steering, no pedals.
    pub const NEUTRAL: Self = Self {
        steer: 0.0,
        throttle: 0.0,
        brake: 0.0,
    };
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}
