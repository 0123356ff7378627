//! Steering wheel rotation model.
//!
//! The wheel follows the pointer's bearing around its pivot while dragged,
//! rate limited per tick, and springs back to centre when released. The
//! per-tick limit holds for the net change between two ticks, however many
//! move events arrive in between.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::angle::{bearing, move_toward, shortest_angle_delta};
use crate::bounds::Bounds;
use crate::config::WheelConfig;
use crate::control::{PointerControl, finite_position};
use crate::error::Result;

/// Interaction phase of the wheel, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelPhase {
    /// Centred and not held.
    Idle,
    /// Held by the pointer.
    Dragging,
    /// Released away from centre, returning each tick.
    Recentering,
}

/// Copy of the wheel state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelState {
    /// Current rotation (degrees, counter-clockwise positive).
    pub angle: f32,
    pub dragging: bool,
    /// Pointer bearing when the current drag started.
    pub initial_pointer_bearing: f32,
    /// Wheel angle when the current drag started.
    pub initial_angle: f32,
    pub max_angle: f32,
    pub max_rotation_speed: f32,
}

impl WheelState {
    #[must_use]
    pub fn phase(&self) -> WheelPhase {
        if self.dragging {
            WheelPhase::Dragging
        } else if self.angle == 0.0 {
            WheelPhase::Idle
        } else {
            WheelPhase::Recentering
        }
    }
}

/// Stateful steering wheel.
#[derive(Debug, Clone)]
pub struct WheelController {
    bounds: Bounds,
    config: WheelConfig,
    angle: f32,
    dragging: bool,
    initial_pointer_bearing: f32,
    initial_angle: f32,
    /// Angle the current drag is heading for.
    drag_target: f32,
    /// Angle at the last tick boundary; anchors the rate-limit window.
    tick_origin: f32,
}

impl WheelController {
    /// Create a centred wheel occupying `bounds`, pivoting on their centre.
    ///
    /// Fails if `config` does not validate.
    pub fn new(bounds: Bounds, config: WheelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bounds,
            config,
            angle: 0.0,
            dragging: false,
            initial_pointer_bearing: 0.0,
            initial_angle: 0.0,
            drag_target: 0.0,
            tick_origin: 0.0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    #[must_use]
    pub fn pivot(&self) -> Vec2 {
        self.bounds.center()
    }

    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    #[must_use]
    pub fn phase(&self) -> WheelPhase {
        self.state().phase()
    }

    #[must_use]
    pub fn state(&self) -> WheelState {
        WheelState {
            angle: self.angle,
            dragging: self.dragging,
            initial_pointer_bearing: self.initial_pointer_bearing,
            initial_angle: self.initial_angle,
            max_angle: self.config.max_angle,
            max_rotation_speed: self.config.max_rotation_speed,
        }
    }

    /// Steering output in `[-1, 1]`.
    #[must_use]
    pub fn normalized_steer(&self) -> f32 {
        let steer = self.angle / self.config.max_angle;
        if steer.is_finite() {
            steer.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Steer mapped onto a display wheel with `full_lock_degrees` either side.
    ///
    /// Only affects presentation; the control itself never leaves
    /// `±max_angle`.
    #[must_use]
    pub fn display_angle(&self, full_lock_degrees: f32) -> f32 {
        self.normalized_steer() * full_lock_degrees
    }

    /// Advance one loop tick.
    ///
    /// While dragging, keeps turning toward the drag target. Otherwise steps
    /// back toward centre, snapping to exactly zero once close enough.
    pub fn tick(&mut self) {
        let target = if self.dragging {
            self.drag_target
        } else if self.angle.abs() <= self.config.recenter_snap {
            0.0
        } else {
            move_toward(self.angle, 0.0, self.config.recenter_step)
        };
        self.rotate_toward(target);
        self.tick_origin = self.angle;
    }

    /// Step toward `target`, staying inside both the travel limit and the
    /// window this tick still allows.
    fn rotate_toward(&mut self, target: f32) {
        let max = self.config.max_angle;
        let speed = self.config.max_rotation_speed;
        let target = target.clamp(-max, max);

        let lo = (self.tick_origin - speed).max(-max);
        let hi = (self.tick_origin + speed).min(max);
        self.angle = move_toward(self.angle, target, speed).clamp(lo, hi);
    }
}

impl PointerControl for WheelController {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn press(&mut self, pos: Vec2) -> Result<()> {
        let pos = finite_position(pos)?;
        self.dragging = true;
        self.initial_pointer_bearing = bearing(self.pivot(), pos);
        self.initial_angle = self.angle;
        self.drag_target = self.angle;
        Ok(())
    }

    fn drag(&mut self, pos: Vec2) -> Result<()> {
        let pos = finite_position(pos)?;
        if !self.dragging {
            return Ok(());
        }

        let current = bearing(self.pivot(), pos);
        let delta = shortest_angle_delta(current, self.initial_pointer_bearing);
        let max = self.config.max_angle;
        self.drag_target = (self.initial_angle + delta).clamp(-max, max);
        self.rotate_toward(self.drag_target);
        Ok(())
    }

    fn release(&mut self) {
        self.dragging = false;
    }

    fn is_engaged(&self) -> bool {
        self.dragging
    }

    fn normalized_value(&self) -> f32 {
        self.normalized_steer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RADIUS: f32 = 100.0;

    fn wheel() -> WheelController {
        WheelController::new(
            Bounds::from_center_size(Vec2::new(300.0, 300.0), Vec2::new(400.0, 400.0)),
            WheelConfig::default(),
        )
        .unwrap()
    }

    /// Screen position at `degrees` bearing around the wheel's pivot.
    fn at_bearing(wheel: &WheelController, degrees: f32) -> Vec2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        wheel.pivot() + Vec2::new(cos, -sin) * RADIUS
    }

    fn settle(wheel: &mut WheelController, ticks: usize) {
        for _ in 0..ticks {
            wheel.tick();
        }
    }

    #[test]
    fn test_rejects_unusable_config() {
        let bounds = Bounds::from_center_size(Vec2::ZERO, Vec2::splat(200.0));
        let config = WheelConfig {
            max_rotation_speed: -1.0,
            ..WheelConfig::default()
        };
        assert!(matches!(
            WheelController::new(bounds, config),
            Err(crate::Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_starts_idle() {
        let wheel = wheel();
        assert_eq!(wheel.phase(), WheelPhase::Idle);
        assert_eq!(wheel.normalized_steer(), 0.0);
    }

    #[test]
    fn test_drag_past_limit_saturates() {
        let mut wheel = wheel();
        wheel.press(at_bearing(&wheel, 0.0)).unwrap();
        wheel.drag(at_bearing(&wheel, 95.0)).unwrap();
        assert_eq!(wheel.phase(), WheelPhase::Dragging);
        // First move is rate limited.
        assert_eq!(wheel.angle(), 5.0);

        settle(&mut wheel, 40);
        assert_eq!(wheel.angle(), 90.0);
        assert_eq!(wheel.normalized_steer(), 1.0);
    }

    #[test]
    fn test_drag_follows_pointer_across_seam() {
        let mut wheel = wheel();
        wheel.press(at_bearing(&wheel, 170.0)).unwrap();
        // 190 degrees comes back from atan2 as -170.
        wheel.drag(at_bearing(&wheel, 190.0)).unwrap();
        settle(&mut wheel, 10);
        assert!((wheel.angle() - 20.0).abs() < 1e-3, "angle {}", wheel.angle());
    }

    #[test]
    fn test_drag_is_relative_to_press_bearing() {
        let mut wheel = wheel();
        wheel.angle = 10.0;
        wheel.tick_origin = 10.0;
        wheel.press(at_bearing(&wheel, -60.0)).unwrap();
        wheel.drag(at_bearing(&wheel, -63.0)).unwrap();
        assert!((wheel.angle() - 7.0).abs() < 1e-3);
        assert_eq!(wheel.state().initial_angle, 10.0);
    }

    #[test]
    fn test_many_moves_share_one_tick_budget() {
        let mut wheel = wheel();
        wheel.press(at_bearing(&wheel, 0.0)).unwrap();
        for b in [10.0, 20.0, 30.0, 40.0] {
            wheel.drag(at_bearing(&wheel, b)).unwrap();
        }
        assert_eq!(wheel.angle(), 5.0);
        wheel.tick();
        assert_eq!(wheel.angle(), 5.0);
        wheel.tick();
        assert_eq!(wheel.angle(), 10.0);
    }

    #[test]
    fn test_recenter_sequence_never_overshoots() {
        let mut wheel = wheel();
        wheel.press(at_bearing(&wheel, 0.0)).unwrap();
        wheel.drag(at_bearing(&wheel, 30.0)).unwrap();
        settle(&mut wheel, 10);
        assert!((wheel.angle() - 30.0).abs() < 1e-3);
        // Pin to the exact value so the sequence below is exact.
        wheel.angle = 30.0;
        wheel.tick_origin = 30.0;

        wheel.release();
        assert_eq!(wheel.phase(), WheelPhase::Recentering);

        let mut seen = Vec::new();
        while wheel.angle() != 0.0 {
            wheel.tick();
            seen.push(wheel.angle());
        }
        let expected: Vec<f32> = (0..15).rev().map(|i| i as f32 * 2.0).collect();
        assert_eq!(seen, expected);
        assert_eq!(wheel.phase(), WheelPhase::Idle);
    }

    #[test]
    fn test_small_angle_snaps_to_zero() {
        let mut wheel = wheel();
        wheel.angle = -0.8;
        wheel.tick();
        assert_eq!(wheel.angle(), 0.0);

        wheel.angle = 1.5;
        wheel.tick_origin = 1.5;
        wheel.tick();
        assert_eq!(wheel.angle(), 0.0);
    }

    #[test]
    fn test_non_finite_pointer_leaves_state() {
        let mut wheel = wheel();
        assert!(wheel.press(Vec2::new(f32::NAN, 0.0)).is_err());
        assert_eq!(wheel.phase(), WheelPhase::Idle);

        wheel.press(at_bearing(&wheel, 0.0)).unwrap();
        wheel.drag(at_bearing(&wheel, 4.0)).unwrap();
        let before = wheel.state();
        assert!(wheel.drag(Vec2::new(0.0, f32::INFINITY)).is_err());
        assert_eq!(wheel.state(), before);
    }

    #[test]
    fn test_drag_without_press_is_ignored() {
        let mut wheel = wheel();
        wheel.drag(at_bearing(&wheel, 45.0)).unwrap();
        assert_eq!(wheel.angle(), 0.0);
    }

    #[test]
    fn test_steer_is_odd_and_display_scales() {
        let mut wheel = wheel();
        for a in [0.0, 12.5, 45.0, 90.0] {
            wheel.angle = a;
            let pos = wheel.normalized_steer();
            wheel.angle = -a;
            assert_eq!(wheel.normalized_steer(), -pos);
        }
        wheel.angle = 45.0;
        assert_eq!(wheel.display_angle(450.0), 225.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Press(f32, f32),
        Drag(f32, f32),
        Release,
        Tick,
    }

    fn op() -> impl Strategy<Value = Op> {
        let coord = -200.0f32..800.0;
        prop_oneof![
            (coord.clone(), coord.clone()).prop_map(|(x, y)| Op::Press(x, y)),
            (coord.clone(), coord).prop_map(|(x, y)| Op::Drag(x, y)),
            Just(Op::Release),
            Just(Op::Tick),
        ]
    }

    proptest! {
        #[test]
        fn angle_stays_in_range_and_rate_limited(ops in prop::collection::vec(op(), 1..300)) {
            let mut wheel = wheel();
            let limit = wheel.config.max_angle;
            let speed = wheel.config.max_rotation_speed;
            let mut last_tick_angle = wheel.angle();

            for op in ops {
                match op {
                    Op::Press(x, y) => wheel.press(Vec2::new(x, y)).unwrap(),
                    Op::Drag(x, y) => wheel.drag(Vec2::new(x, y)).unwrap(),
                    Op::Release => wheel.release(),
                    Op::Tick => {
                        wheel.tick();
                        prop_assert!((wheel.angle() - last_tick_angle).abs() <= speed + 1e-4);
                        last_tick_angle = wheel.angle();
                    }
                }
                prop_assert!(wheel.angle().abs() <= limit);
                prop_assert!((wheel.angle() - last_tick_angle).abs() <= speed + 1e-4);
            }
        }

        #[test]
        fn recentering_is_monotone_and_finite(start in -90.0f32..=90.0) {
            let mut wheel = wheel();
            wheel.angle = start;
            wheel.tick_origin = start;

            let mut ticks = 0;
            while wheel.angle() != 0.0 {
                let before = wheel.angle().abs();
                wheel.tick();
                prop_assert!(wheel.angle().abs() <= before);
                prop_assert!(wheel.angle() == 0.0 || wheel.angle().signum() == start.signum());
                ticks += 1;
                prop_assert!(ticks <= 50);
            }
        }

        #[test]
        fn steer_is_monotonic(a in -90.0f32..=90.0, b in -90.0f32..=90.0) {
            let mut wheel = wheel();
            wheel.angle = a.min(b);
            let low = wheel.normalized_steer();
            wheel.angle = a.max(b);
            prop_assert!(low <= wheel.normalized_steer());
        }
    }
}
