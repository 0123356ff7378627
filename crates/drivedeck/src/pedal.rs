//! Linear pedal model, used for both throttle and brake.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::control::{PointerControl, finite_position};
use crate::error::Result;

/// Direction the pedal travels along on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelAxis {
    /// Bottom edge is released, top edge is fully pressed.
    Vertical,
    /// Left edge is released, right edge is fully pressed.
    Horizontal,
}

/// Copy of a pedal's state at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedalState {
    /// Travel in percent, `0..=100`.
    pub percent: u8,
    pub active: bool,
}

/// Stateful pedal. Travel tracks the pointer directly, without rate limiting.
#[derive(Debug, Clone)]
pub struct PedalController {
    bounds: Bounds,
    axis: TravelAxis,
    state: PedalState,
}

impl PedalController {
    #[must_use]
    pub fn new(bounds: Bounds, axis: TravelAxis) -> Self {
        Self {
            bounds,
            axis,
            state: PedalState::default(),
        }
    }

    /// A vertically travelling pedal.
    #[must_use]
    pub fn throttle(bounds: Bounds) -> Self {
        Self::new(bounds, TravelAxis::Vertical)
    }

    /// A horizontally travelling pedal.
    #[must_use]
    pub fn brake(bounds: Bounds) -> Self {
        Self::new(bounds, TravelAxis::Horizontal)
    }

    #[must_use]
    pub fn axis(&self) -> TravelAxis {
        self.axis
    }

    #[must_use]
    pub fn state(&self) -> PedalState {
        self.state
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.state.percent
    }

    /// Pedal output in `[0, 1]`.
    #[must_use]
    pub fn normalized(&self) -> f32 {
        f32::from(self.state.percent) / 100.0
    }

    /// Recompute travel from a pointer position. Ignored while released.
    pub fn update(&mut self, pos: Vec2) -> Result<()> {
        let pos = finite_position(pos)?;
        if self.state.active {
            self.state.percent = self.travel_percent(pos);
        }
        Ok(())
    }

    fn travel_percent(&self, pos: Vec2) -> u8 {
        let b = &self.bounds;
        let travel = match self.axis {
            TravelAxis::Vertical => 1.0 - (pos.y - b.min.y) / b.height(),
            TravelAxis::Horizontal => (pos.x - b.min.x) / b.width(),
        };
        let travel = if travel.is_finite() {
            travel.clamp(0.0, 1.0)
        } else {
            0.0
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (travel * 100.0).round() as u8;
        percent
    }
}

impl PointerControl for PedalController {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn press(&mut self, pos: Vec2) -> Result<()> {
        let pos = finite_position(pos)?;
        self.state.active = true;
        self.update(pos)
    }

    fn drag(&mut self, pos: Vec2) -> Result<()> {
        self.update(pos)
    }

    fn release(&mut self) {
        self.state = PedalState::default();
    }

    fn is_engaged(&self) -> bool {
        self.state.active
    }

    fn normalized_value(&self) -> f32 {
        self.normalized()
    }
}
