//! Virtual driving controls for a simulated vehicle.
//!
//! A steering wheel and two pedals are driven by pointer input; a control
//! loop samples them at a fixed rate, forwards a normalized
//! [`ActuationCommand`] to the vehicle and keeps a chase camera attached to
//! it.
//!
//! # Design principles
//!
//! - **Pure controls**: [`WheelController`] and [`PedalController`] are plain
//!   state machines with no clock or I/O; time only advances through
//!   [`WheelController::tick`]
//! - **Executor-agnostic sinks**: the world is reached through
//!   [`ActuationSink`], [`CameraSink`] and [`PoseSource`], which return boxed
//!   futures
//! - **Fixed grid**: [`ControlLoop::run`] schedules ticks at
//!   `start + n * period`, so slow ticks do not accumulate drift
//!
//! # Example
//!
//! ```ignore
//! use drivedeck::{ControlConfig, ControlLoop, ControlPanel, PanelLayout, NullSink, SharedPose};
//!
//! let config = ControlConfig::default();
//! let panel = ControlPanel::new(PanelLayout::default(), config.wheel.clone())?;
//! let poses = SharedPose::default();
//! let mut control = ControlLoop::new(config, panel.clone(), vehicle, NullSink, poses)?;
//!
//! let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//! let stats = control.run(stop_rx).await?;
//! ```

pub mod actuation;
pub mod angle;
pub mod bounds;
pub mod camera;
pub mod config;
pub mod control;
mod control_loop;
mod error;
pub mod panel;
pub mod pedal;
pub mod sink;
pub mod wheel;

pub use actuation::ActuationCommand;
pub use bounds::Bounds;
pub use camera::{
    CameraOffset, CameraOrientation, CameraPose, CameraRig, Rotation, VehiclePose,
    chase_camera_pose,
};
pub use config::{CameraConfig, ControlConfig, TargetPolicy, WheelConfig};
pub use control::{ControlId, PointerControl, PointerEvent};
pub use control_loop::{ControlLoop, LoopStats, TickReport};
pub use error::{Error, Result};
pub use panel::{ControlPanel, PanelLayout, PanelSnapshot};
pub use pedal::{PedalController, PedalState, TravelAxis};
pub use sink::{
    ActuationSink, CameraSink, NullSink, PoseSource, RecordingSink, SharedPose, SinkFuture,
};
pub use wheel::{WheelController, WheelPhase, WheelState};

// Re-export glam so callers can build positions without a direct dependency.
pub use glam;
