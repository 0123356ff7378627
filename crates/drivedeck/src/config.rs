//! Construction-time configuration.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! needs the fields it changes.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraOrientation;
use crate::error::{Error, Result};

/// Slowest accepted loop rate.
pub const MIN_TICK_RATE_HZ: f32 = 20.0;
/// Fastest accepted loop rate.
pub const MAX_TICK_RATE_HZ: f32 = 50.0;

/// What the loop does when the tracked vehicle disappears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Skip the camera step and keep forwarding actuation.
    #[default]
    ContinueActuation,
    /// Stop the loop with [`Error::TargetLost`].
    RequireTarget,
}

/// Steering wheel tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Rotation limit either side of centre (degrees).
    pub max_angle: f32,
    /// Largest change of angle between two ticks (degrees).
    pub max_rotation_speed: f32,
    /// Return-to-centre step applied each tick while released (degrees).
    pub recenter_step: f32,
    /// Below this magnitude a released wheel snaps to exactly zero (degrees).
    pub recenter_snap: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            max_angle: 90.0,
            max_rotation_speed: 5.0,
            recenter_step: 2.0,
            recenter_snap: 1.0,
        }
    }
}

impl WheelConfig {
    /// Check the wheel limits are usable.
    pub fn validate(&self) -> Result<()> {
        positive("wheel.max_angle", self.max_angle)?;
        if self.max_angle > 180.0 {
            return Err(invalid(
                "wheel.max_angle",
                format!("{} exceeds half a turn", self.max_angle),
            ));
        }
        positive("wheel.max_rotation_speed", self.max_rotation_speed)?;
        positive("wheel.recenter_step", self.recenter_step)?;
        if !self.recenter_snap.is_finite() || self.recenter_snap < 0.0 {
            return Err(invalid(
                "wheel.recenter_snap",
                format!("{} must be a non-negative number", self.recenter_snap),
            ));
        }
        Ok(())
    }
}

/// Chase camera mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Mount point in the vehicle frame (forward, lateral, vertical), metres.
    pub offset: Vec3,
    pub orientation: CameraOrientation,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.5, 0.0, 1.2),
            orientation: CameraOrientation::FollowVehicle,
        }
    }
}

/// Top-level configuration for the controls and the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub wheel: WheelConfig,
    /// Loop frequency in Hz.
    pub tick_rate_hz: f32,
    pub camera: CameraConfig,
    pub target_policy: TargetPolicy,
    /// Upper bound on a single sink forward, in milliseconds.
    ///
    /// Both sinks are forwarded every tick, so twice this must fit in one
    /// tick period.
    pub sink_timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            wheel: WheelConfig::default(),
            tick_rate_hz: 30.0,
            camera: CameraConfig::default(),
            target_policy: TargetPolicy::default(),
            sink_timeout_ms: 8,
        }
    }
}

impl ControlConfig {
    /// Check every value is usable.
    pub fn validate(&self) -> Result<()> {
        self.wheel.validate()?;

        if !(MIN_TICK_RATE_HZ..=MAX_TICK_RATE_HZ).contains(&self.tick_rate_hz) {
            return Err(invalid(
                "tick_rate_hz",
                format!(
                    "{} is outside {MIN_TICK_RATE_HZ}..={MAX_TICK_RATE_HZ}",
                    self.tick_rate_hz
                ),
            ));
        }

        if !self.camera.offset.is_finite() {
            return Err(invalid(
                "camera.offset",
                format!("{} is not finite", self.camera.offset),
            ));
        }

        if self.sink_timeout_ms == 0 {
            return Err(invalid("sink_timeout_ms", "must be non-zero".to_string()));
        }
        if self.sink_timeout() * 2 > self.tick_period() {
            return Err(invalid(
                "sink_timeout_ms",
                format!(
                    "two sinks at {} ms each do not fit in a {:.1} ms tick",
                    self.sink_timeout_ms,
                    self.tick_period().as_secs_f32() * 1000.0
                ),
            ));
        }

        Ok(())
    }

    /// Time between two ticks.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_rate_hz)
    }

    #[must_use]
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be a positive number")))
    }
}

fn invalid(field: &'static str, detail: String) -> Error {
    Error::InvalidConfig { field, detail }
}
