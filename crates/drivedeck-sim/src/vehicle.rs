//! Kinematic bicycle model for the simulated vehicle.
//!
//! Pure functions that can be tested without a runtime. Angles are in
//! degrees, with positive yaw turning from +x toward +y, matching the camera
//! math in `drivedeck`.

use drivedeck::{ActuationCommand, Rotation, VehiclePose};
use glam::{Vec2, Vec3};

/// Configuration for the vehicle model.
#[derive(Clone, Debug)]
pub struct VehicleParams {
    /// Distance between the axles (m).
    pub wheelbase: f32,
    /// Road-wheel angle at full steer (degrees).
    pub max_wheel_angle: f32,
    /// Acceleration at full throttle (m/s²).
    pub max_acceleration: f32,
    /// Deceleration at full brake (m/s²).
    pub max_deceleration: f32,
    /// Linear drag coefficient (1/s).
    pub drag: f32,
    /// Hard speed cap (m/s).
    pub top_speed: f32,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            wheelbase: 2.9,
            max_wheel_angle: 35.0,
            max_acceleration: 4.0,
            max_deceleration: 9.0,
            drag: 0.15,
            top_speed: 40.0,
        }
    }
}

/// Mutable state of the vehicle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleSimState {
    pub position: Vec3,
    /// Heading (degrees, in `[0, 360)`).
    pub yaw: f32,
    /// Forward speed (m/s, never negative).
    pub speed: f32,
}

impl VehicleSimState {
    /// The pose as the control loop sees it. The model stays flat.
    #[must_use]
    pub fn pose(&self) -> VehiclePose {
        VehiclePose {
            location: self.position,
            rotation: Rotation::new(0.0, self.yaw, 0.0),
        }
    }
}

/// Advance the vehicle by `dt` seconds under `command`.
#[must_use]
pub fn step(
    params: &VehicleParams,
    state: &VehicleSimState,
    command: ActuationCommand,
    dt: f32,
) -> VehicleSimState {
    let acceleration = command.throttle * params.max_acceleration
        - command.brake * params.max_deceleration
        - params.drag * state.speed;
    let speed = (state.speed + acceleration * dt).clamp(0.0, params.top_speed);

    let wheel_angle = (command.steer * params.max_wheel_angle).to_radians();
    let yaw_rate = (speed / params.wheelbase * wheel_angle.tan()).to_degrees();
    let yaw = (state.yaw + yaw_rate * dt).rem_euclid(360.0);

    let heading = Vec2::from_angle(yaw.to_radians());
    let position = state.position + (heading * speed * dt).extend(0.0);

    VehicleSimState {
        position,
        yaw,
        speed,
    }
}

/// Speed where full-throttle thrust balances drag.
///
/// At equilibrium: `max_acceleration = drag * v`.
#[must_use]
pub fn theoretical_top_speed(params: &VehicleParams) -> f32 {
    (params.max_acceleration / params.drag).min(params.top_speed)
}

/// Radius of the circle driven at a steady steer input.
///
/// Returns `None` when driving straight.
#[must_use]
pub fn turning_radius(params: &VehicleParams, steer: f32) -> Option<f32> {
    let tan = (steer * params.max_wheel_angle).to_radians().tan();
    if tan.abs() < f32::EPSILON {
        None
    } else {
        Some(params.wheelbase / tan.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.01;

    fn drive(
        params: &VehicleParams,
        mut state: VehicleSimState,
        command: ActuationCommand,
        seconds: f32,
    ) -> VehicleSimState {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            state = step(params, &state, command, DT);
        }
        state
    }

    #[test]
    fn test_full_throttle_reaches_top_speed() {
        let params = VehicleParams::default();
        let state = drive(
            &params,
            VehicleSimState::default(),
            ActuationCommand::new(0.0, 1.0, 0.0),
            60.0,
        );
        assert!((state.speed - theoretical_top_speed(&params)).abs() < 0.1);
        assert!(state.position.x > 100.0);
        assert!(state.position.y.abs() < 1e-3);
        assert_eq!(state.yaw, 0.0);
    }

    #[test]
    fn test_brake_stops_without_reversing() {
        let params = VehicleParams::default();
        let moving = VehicleSimState {
            speed: 10.0,
            ..VehicleSimState::default()
        };
        let state = drive(&params, moving, ActuationCommand::new(0.0, 0.0, 1.0), 3.0);
        assert_eq!(state.speed, 0.0);
    }

    #[test]
    fn test_positive_steer_turns_toward_positive_y() {
        let params = VehicleParams::default();
        let moving = VehicleSimState {
            speed: 5.0,
            ..VehicleSimState::default()
        };
        let state = drive(&params, moving, ActuationCommand::new(0.5, 0.0, 0.0), 0.5);
        assert!(state.yaw > 0.0 && state.yaw < 90.0);
        assert!(state.position.y > 0.0);
    }

    #[test]
    fn test_steady_turn_follows_radius() {
        let params = VehicleParams {
            drag: 0.0,
            ..VehicleParams::default()
        };
        let radius = turning_radius(&params, 1.0).unwrap();
        let moving = VehicleSimState {
            speed: 5.0,
            ..VehicleSimState::default()
        };
        // Half a lap ends one diameter to the side.
        let half_lap = std::f32::consts::PI * radius / 5.0;
        let state = drive(&params, moving, ActuationCommand::new(1.0, 0.0, 0.0), half_lap);
        assert!((state.position.y - 2.0 * radius).abs() < 0.1);
        assert!(state.position.x.abs() < 0.1);
        assert!(turning_radius(&params, 0.0).is_none());
    }

    #[test]
    fn test_stationary_vehicle_ignores_steer() {
        let params = VehicleParams::default();
        let state = drive(
            &params,
            VehicleSimState::default(),
            ActuationCommand::new(1.0, 0.0, 0.0),
            1.0,
        );
        assert_eq!(state, VehicleSimState::default());
    }
}
