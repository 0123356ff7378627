//! The control panel: the three controls and the pointer routing between them.
//!
//! A [`ControlPanel`] is a cheap-to-clone handle. The input collector and the
//! control loop each hold one; every control sits behind its own lock, and
//! no method ever holds two locks at once.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actuation::ActuationCommand;
use crate::bounds::Bounds;
use crate::config::WheelConfig;
use crate::control::{ControlId, PointerControl, PointerEvent};
use crate::error::Result;
use crate::pedal::{PedalController, PedalState};
use crate::wheel::{WheelController, WheelState};

/// Screen placement of the three controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub wheel: Bounds,
    pub throttle: Bounds,
    pub brake: Bounds,
}

impl PanelLayout {
    /// The stock arrangement scaled to a screen of `size` pixels: wheel on
    /// the left, tall throttle in the middle, wide brake on the right.
    #[must_use]
    pub fn for_screen(size: Vec2) -> Self {
        let rect = |cx: f32, cy: f32, w: f32, h: f32| {
            Bounds::from_center_size(size * Vec2::new(cx, cy), size * Vec2::new(w, h))
        };
        Self {
            wheel: rect(0.2675, 0.4733, 0.375, 2.0 / 3.0),
            throttle: rect(0.6325, 0.51, 0.14, 0.52),
            brake: rect(0.845, 0.625, 0.25, 0.25),
        }
    }
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self::for_screen(Vec2::new(1280.0, 720.0))
    }
}

/// Consistent read of every control, taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSnapshot {
    pub wheel: WheelState,
    pub throttle: PedalState,
    pub brake: PedalState,
    /// The normalized outputs, clamped into range.
    pub command: ActuationCommand,
}

/// Shared handle to the wheel and both pedals.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    wheel: Arc<Mutex<WheelController>>,
    throttle: Arc<Mutex<PedalController>>,
    brake: Arc<Mutex<PedalController>>,
    /// Button level seen by the last routed event.
    button_down: Arc<AtomicBool>,
}

impl ControlPanel {
    /// Lay the controls out on `layout`. Fails if `wheel` does not validate.
    pub fn new(layout: PanelLayout, wheel: WheelConfig) -> Result<Self> {
        Ok(Self {
            wheel: Arc::new(Mutex::new(WheelController::new(layout.wheel, wheel)?)),
            throttle: Arc::new(Mutex::new(PedalController::throttle(layout.throttle))),
            brake: Arc::new(Mutex::new(PedalController::brake(layout.brake))),
            button_down: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Tuning the wheel was built with.
    #[must_use]
    pub fn wheel_config(&self) -> WheelConfig {
        lock(&self.wheel).config().clone()
    }

    /// Run `f` against one control while holding only that control's lock.
    pub fn with_control<R>(&self, id: ControlId, f: impl FnOnce(&mut dyn PointerControl) -> R) -> R {
        match id {
            ControlId::Wheel => f(&mut *lock(&self.wheel)),
            ControlId::ThrottlePedal => f(&mut *lock(&self.throttle)),
            ControlId::BrakePedal => f(&mut *lock(&self.brake)),
        }
    }

    pub fn press(&self, id: ControlId, pos: Vec2) -> Result<()> {
        self.with_control(id, |c| c.press(pos))
    }

    pub fn drag(&self, id: ControlId, pos: Vec2) -> Result<()> {
        self.with_control(id, |c| c.drag(pos))
    }

    pub fn release(&self, id: ControlId) {
        self.with_control(id, |c| c.release());
    }

    /// Normalized output of one control.
    #[must_use]
    pub fn value(&self, id: ControlId) -> f32 {
        self.with_control(id, |c| c.normalized_value())
    }

    #[must_use]
    pub fn is_engaged(&self, id: ControlId) -> bool {
        self.with_control(id, |c| c.is_engaged())
    }

    /// Which control, if any, a press at `pos` would grab.
    #[must_use]
    pub fn hit_test(&self, pos: Vec2) -> Option<ControlId> {
        ControlId::ALL
            .into_iter()
            .find(|&id| self.with_control(id, |c| c.hit(pos)))
    }

    /// Route a raw pointer sample.
    ///
    /// A button-down edge grabs the first control under the pointer, motion
    /// with the button held updates every engaged control, and a button-up
    /// edge releases all of them. Non-finite samples are rejected before any
    /// state changes.
    pub fn handle_pointer(&self, event: PointerEvent) -> Result<()> {
        let pos = event.position()?;
        let was_down = self.button_down.swap(event.pressed, Ordering::AcqRel);

        match (was_down, event.pressed) {
            (false, true) => {
                if let Some(id) = self.hit_test(pos) {
                    debug!(control = %id, x = pos.x, y = pos.y, "pointer pressed");
                    self.press(id, pos)?;
                }
            }
            (true, true) => {
                for id in ControlId::ALL {
                    self.with_control(id, |c| {
                        if c.is_engaged() {
                            c.drag(pos)
                        } else {
                            Ok(())
                        }
                    })?;
                }
            }
            (true, false) => {
                debug!("pointer released");
                for id in ControlId::ALL {
                    self.release(id);
                }
            }
            (false, false) => {}
        }
        Ok(())
    }

    /// Advance the wheel by one tick and read every control.
    pub fn tick(&self) -> PanelSnapshot {
        let (wheel, steer) = {
            let mut wheel = lock(&self.wheel);
            wheel.tick();
            (wheel.state(), wheel.normalized_steer())
        };
        let (throttle, throttle_value) = pedal_reading(&self.throttle);
        let (brake, brake_value) = pedal_reading(&self.brake);

        PanelSnapshot {
            wheel,
            throttle,
            brake,
            command: ActuationCommand::new(steer, throttle_value, brake_value),
        }
    }

    #[must_use]
    pub fn wheel_state(&self) -> WheelState {
        lock(&self.wheel).state()
    }

    #[must_use]
    pub fn throttle_state(&self) -> PedalState {
        lock(&self.throttle).state()
    }

    #[must_use]
    pub fn brake_state(&self) -> PedalState {
        lock(&self.brake).state()
    }
}

fn pedal_reading(pedal: &Mutex<PedalController>) -> (PedalState, f32) {
    let pedal = lock(pedal);
    (pedal.state(), pedal.normalized())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
