//! Pointer input and the capability shared by every on-screen control.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{Error, Result};

/// A raw pointer sample from the input collector.
///
/// `pressed` is the button level at the time of the sample, not an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub pressed: bool,
}

impl PointerEvent {
    #[must_use]
    pub fn new(x: f32, y: f32, pressed: bool) -> Self {
        Self { x, y, pressed }
    }

    /// The event position, rejected if either coordinate is not finite.
    pub fn position(&self) -> Result<Vec2> {
        finite_position(Vec2::new(self.x, self.y))
    }
}

pub(crate) fn finite_position(pos: Vec2) -> Result<Vec2> {
    if pos.is_finite() {
        Ok(pos)
    } else {
        Err(Error::NonFinitePointer { x: pos.x, y: pos.y })
    }
}

/// Identifies one of the three controls on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlId {
    Wheel,
    ThrottlePedal,
    BrakePedal,
}

impl ControlId {
    /// Hit-test priority order.
    pub const ALL: [ControlId; 3] = [
        ControlId::Wheel,
        ControlId::ThrottlePedal,
        ControlId::BrakePedal,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ControlId::Wheel => "wheel",
            ControlId::ThrottlePedal => "throttle",
            ControlId::BrakePedal => "brake",
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Behaviour every pointer-driven control provides.
///
/// Implementations reject non-finite positions with
/// [`Error::NonFinitePointer`] and leave their state untouched in that case.
pub trait PointerControl {
    /// Screen area the control occupies.
    fn bounds(&self) -> Bounds;

    /// Start an interaction at `pos`.
    fn press(&mut self, pos: Vec2) -> Result<()>;

    /// Pointer moved to `pos` while the control is engaged.
    fn drag(&mut self, pos: Vec2) -> Result<()>;

    /// End the interaction.
    fn release(&mut self);

    /// Whether the control is currently being held by the pointer.
    fn is_engaged(&self) -> bool;

    /// The control's output in its normalized domain.
    fn normalized_value(&self) -> f32;

    fn hit(&self, pos: Vec2) -> bool {
        self.bounds().contains(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_rejects_non_finite() {
        assert_eq!(
            PointerEvent::new(1.0, 2.0, true).position(),
            Ok(Vec2::new(1.0, 2.0))
        );
        assert!(matches!(
            PointerEvent::new(f32::NAN, 2.0, true).position(),
            Err(Error::NonFinitePointer { .. })
        ));
        assert!(matches!(
            PointerEvent::new(1.0, f32::INFINITY, false).position(),
            Err(Error::NonFinitePointer { .. })
        ));
    }

    #[test]
    fn test_control_names() {
        let names: Vec<_> = ControlId::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["wheel", "throttle", "brake"]);
    }
}
