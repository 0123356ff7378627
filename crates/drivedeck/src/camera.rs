//! Chase camera placement.
//!
//! World axes follow the simulator convention: x forward, y lateral, z up.
//! Angles are in degrees.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

/// Orientation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    /// Rotation about the vertical axis.
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    #[must_use]
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// World transform of the tracked vehicle, read from the simulated world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehiclePose {
    pub location: Vec3,
    pub rotation: Rotation,
}

/// Derived world transform for the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub location: Vec3,
    pub rotation: Rotation,
}

/// Camera mount point in the vehicle frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraOffset(pub Vec3);

impl CameraOffset {
    #[must_use]
    pub fn new(forward: f32, lateral: f32, vertical: f32) -> Self {
        Self(Vec3::new(forward, lateral, vertical))
    }

    #[must_use]
    pub fn forward(&self) -> f32 {
        self.0.x
    }

    #[must_use]
    pub fn lateral(&self) -> f32 {
        self.0.y
    }

    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.0.z
    }
}

/// How the camera's orientation relates to the vehicle's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraOrientation {
    /// Copy the vehicle's pitch, yaw and roll.
    #[default]
    FollowVehicle,
    /// Copy the vehicle's yaw, hold pitch and roll at zero.
    Level,
}

/// Place the camera for a vehicle pose.
///
/// The offset's forward/lateral part turns with the vehicle's yaw; the
/// vertical part is applied unrotated.
#[must_use]
pub fn chase_camera_pose(
    pose: &VehiclePose,
    offset: CameraOffset,
    orientation: CameraOrientation,
) -> CameraPose {
    let heading = Vec2::from_angle(pose.rotation.yaw.to_radians());
    let horizontal = heading.rotate(Vec2::new(offset.forward(), offset.lateral()));
    let location = pose.location + horizontal.extend(offset.vertical());

    let rotation = match orientation {
        CameraOrientation::FollowVehicle => pose.rotation,
        CameraOrientation::Level => Rotation::new(0.0, pose.rotation.yaw, 0.0),
    };

    CameraPose { location, rotation }
}

/// A fixed camera mount bundled with its orientation mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub offset: CameraOffset,
    pub orientation: CameraOrientation,
}

impl CameraRig {
    #[must_use]
    pub fn new(offset: CameraOffset, orientation: CameraOrientation) -> Self {
        Self {
            offset,
            orientation,
        }
    }

    #[must_use]
    pub fn pose_for(&self, vehicle: &VehiclePose) -> CameraPose {
        chase_camera_pose(vehicle, self.offset, self.orientation)
    }
}

impl From<&CameraConfig> for CameraRig {
    fn from(config: &CameraConfig) -> Self {
        Self::new(CameraOffset(config.offset), config.orientation)
    }
}
