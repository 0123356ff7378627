//! Angle helpers shared by the wheel model.
//!
//! All angles are in degrees. Screen positions use the usual raster
//! convention (y grows downward); [`bearing`] flips that so counter-clockwise
//! rotation is positive, matching standard math orientation.

use glam::Vec2;

/// Bearing in degrees of the vector from `pivot` to `pos`.
///
/// The result lies in `(-180, 180]`. Moving the pointer counter-clockwise
/// around the pivot increases the bearing.
pub fn bearing(pivot: Vec2, pos: Vec2) -> f32 {
    // Subtract in this order so a level pointer gives +0.0, keeping the
    // left axis at +180 rather than -180.
    (pivot.y - pos.y).atan2(pos.x - pivot.x).to_degrees()
}

/// Signed difference `a - b` wrapped into `(-180, 180]`.
///
/// The wheel calls this as `(current, initial)`, so a pointer moving
/// clockwise yields a negative delta.
///
/// Used to follow a pointer across the ±180° seam of [`bearing`] without the
/// wheel snapping by a full turn.
pub fn shortest_angle_delta(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Move a value toward a target by a maximum delta.
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
