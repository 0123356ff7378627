//! The simulated world: one vehicle and a spectator camera.
//!
//! [`SimWorld`] is the vehicle-actuation sink and owns the pose slot the
//! control loop reads. [`run_world`] steps it on its own clock, independent
//! of the control loop's cadence.

use std::{
    io::Write,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use drivedeck::{
    ActuationCommand, ActuationSink, CameraPose, CameraSink, SharedPose, SinkFuture,
};
use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::telemetry::{Telemetry, TelemetrySnapshot};
use crate::vehicle::{VehicleParams, VehicleSimState, step};

#[derive(Debug)]
struct VehicleSlot {
    state: VehicleSimState,
    command: ActuationCommand,
    spawned: bool,
}

/// Shared handle to the simulated vehicle.
#[derive(Debug, Clone)]
pub struct SimWorld {
    params: VehicleParams,
    vehicle: Arc<Mutex<VehicleSlot>>,
    poses: SharedPose,
}

impl SimWorld {
    /// Spawn a vehicle at the origin and publish its pose into `poses`.
    pub fn spawn(params: VehicleParams, poses: SharedPose) -> Self {
        let state = VehicleSimState::default();
        poses.set(state.pose());
        info!("vehicle spawned");
        Self {
            params,
            vehicle: Arc::new(Mutex::new(VehicleSlot {
                state,
                command: ActuationCommand::NEUTRAL,
                spawned: true,
            })),
            poses,
        }
    }

    pub fn poses(&self) -> SharedPose {
        self.poses.clone()
    }

    /// Current vehicle state, or `None` once despawned.
    pub fn state(&self) -> Option<VehicleSimState> {
        let slot = self.lock();
        slot.spawned.then_some(slot.state)
    }

    /// Last command received.
    pub fn command(&self) -> ActuationCommand {
        self.lock().command
    }

    /// Step the vehicle by `dt` seconds and publish the new pose.
    ///
    /// Returns the new state and the command it was driven with, or `None`
    /// if the vehicle is gone.
    pub fn advance(&self, dt: f32) -> Option<(VehicleSimState, ActuationCommand)> {
        let mut slot = self.lock();
        if !slot.spawned {
            return None;
        }
        slot.state = step(&self.params, &slot.state, slot.command, dt);
        self.poses.set(slot.state.pose());
        Some((slot.state, slot.command))
    }

    /// Remove the vehicle from the world.
    pub fn despawn(&self) {
        let mut slot = self.lock();
        if slot.spawned {
            slot.spawned = false;
            self.poses.clear();
            info!(
                x = slot.state.position.x,
                y = slot.state.position.y,
                "vehicle despawned"
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, VehicleSlot> {
        self.vehicle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActuationSink for SimWorld {
    fn apply(&self, command: ActuationCommand) -> SinkFuture<'_> {
        // A despawned vehicle still accepts commands; they go nowhere.
        self.lock().command = command;
        Box::pin(async { Ok(()) })
    }
}

/// The spectator camera. Remembers the last pose it was given.
#[derive(Debug, Clone, Default)]
pub struct Spectator {
    pose: Arc<Mutex<Option<CameraPose>>>,
}

impl Spectator {
    pub fn pose(&self) -> Option<CameraPose> {
        *self.pose.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CameraSink for Spectator {
    fn set_pose(&self, pose: CameraPose) -> SinkFuture<'_> {
        *self.pose.lock().unwrap_or_else(PoisonError::into_inner) = Some(pose);
        Box::pin(async { Ok(()) })
    }
}

/// Step `world` at `rate_hz` until `stop` turns true or its sender is dropped.
///
/// Despawns the vehicle once `despawn_after` has elapsed. Returns the number
/// of telemetry rows written. A rate that is not a positive number leaves the
/// world untouched.
pub async fn run_world<W: Write>(
    world: SimWorld,
    rate_hz: f32,
    despawn_after: Option<Duration>,
    mut telemetry: Option<Telemetry<W>>,
    mut stop: watch::Receiver<bool>,
) -> u64 {
    let dt = 1.0 / rate_hz;
    let step_period = match Duration::try_from_secs_f32(dt) {
        Ok(period) if !period.is_zero() => period,
        _ => {
            warn!(rate_hz, "unusable world rate, not stepping");
            return 0;
        }
    };
    let mut interval = tokio::time::interval(step_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    debug!(rate_hz, "world running");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow_and_update() {
                    break;
                }
                continue;
            }
        }

        let elapsed = started.elapsed();
        if despawn_after.is_some_and(|after| elapsed >= after) {
            world.despawn();
        }

        let Some((state, command)) = world.advance(dt) else {
            continue;
        };

        if let Some(out) = &mut telemetry {
            let snapshot = TelemetrySnapshot {
                elapsed: elapsed.as_secs_f32(),
                command,
                state,
            };
            if let Err(e) = out.record(&snapshot) {
                warn!(error = %e, "telemetry write failed, disabling telemetry");
                telemetry = None;
            }
        }
    }

    let Some(out) = telemetry else {
        return 0;
    };
    let rows = out.rows();
    if let Err(e) = out.finish() {
        warn!(error = %e, "telemetry flush failed");
    }
    rows
}
