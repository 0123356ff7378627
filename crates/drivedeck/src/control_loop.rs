//! Fixed-cadence control loop.
//!
//! Each tick reads the panel, forwards an [`ActuationCommand`] and then a
//! chase [`CameraPose`]. Deadlines sit on a fixed grid (`start + n * period`)
//! so a slow tick delays at most the tick after it; whole periods that were
//! missed entirely are skipped.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, warn};

use crate::actuation::ActuationCommand;
use crate::camera::{CameraPose, CameraRig};
use crate::config::{ControlConfig, TargetPolicy};
use crate::error::{Error, Result};
use crate::panel::{ControlPanel, PanelSnapshot};
use crate::sink::{ActuationSink, CameraSink, PoseSource, SinkFuture};

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Zero-based tick number.
    pub tick: u64,
    pub snapshot: PanelSnapshot,
    /// Camera pose forwarded this tick, if the vehicle was found.
    pub camera: Option<CameraPose>,
    /// The vehicle pose was unavailable and the camera step was skipped.
    pub target_lost: bool,
    pub actuation_error: Option<Error>,
    pub camera_error: Option<Error>,
}

impl TickReport {
    #[must_use]
    pub fn command(&self) -> ActuationCommand {
        self.snapshot.command
    }
}

/// Counters accumulated over the loop's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    /// Grid slots skipped because a tick ran past them.
    pub missed_ticks: u64,
    pub target_lost_ticks: u64,
    pub actuation_failures: u64,
    pub camera_failures: u64,
    /// Wall time of the most recent tick.
    pub last_tick: Duration,
    /// Longest tick seen.
    pub max_tick: Duration,
}

/// Samples the panel and the vehicle pose on a fixed clock and feeds the
/// sinks.
pub struct ControlLoop<A, C, P> {
    config: ControlConfig,
    panel: ControlPanel,
    rig: CameraRig,
    actuation: A,
    camera: C,
    poses: P,
    stats: LoopStats,
    target_lost: bool,
}

impl<A, C, P> ControlLoop<A, C, P>
where
    A: ActuationSink,
    C: CameraSink,
    P: PoseSource,
{
    /// Create a loop. Fails if `config` does not validate or `panel` was
    /// built with a different wheel tuning than `config.wheel`.
    pub fn new(
        config: ControlConfig,
        panel: ControlPanel,
        actuation: A,
        camera: C,
        poses: P,
    ) -> Result<Self> {
        config.validate()?;
        if panel.wheel_config() != config.wheel {
            return Err(Error::InvalidConfig {
                field: "wheel",
                detail: "panel wheel tuning differs from the loop config".to_string(),
            });
        }
        let rig = CameraRig::from(&config.camera);
        Ok(Self {
            config,
            panel,
            rig,
            actuation,
            camera,
            poses,
            stats: LoopStats::default(),
            target_lost: false,
        })
    }

    /// The panel this loop samples. Clone it to feed pointer input.
    #[must_use]
    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    #[must_use]
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Run one tick immediately, without pacing.
    pub async fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let tick = self.stats.ticks;
        let limit = self.config.sink_timeout();

        let snapshot = self.panel.tick();
        let command = snapshot.command;

        let actuation_error = forward("actuation", limit, self.actuation.apply(command))
            .await
            .err();
        if let Some(e) = &actuation_error {
            self.stats.actuation_failures += 1;
            warn!(tick, error = %e, "actuation command not applied");
        }

        let (camera, camera_error) = match self.poses.current_pose() {
            Some(vehicle) => {
                if self.target_lost {
                    info!(tick, "tracked vehicle found again");
                    self.target_lost = false;
                }
                let pose = self.rig.pose_for(&vehicle);
                let error = forward("camera", limit, self.camera.set_pose(pose))
                    .await
                    .err();
                if let Some(e) = &error {
                    self.stats.camera_failures += 1;
                    warn!(tick, error = %e, "camera pose not applied");
                }
                (Some(pose), error)
            }
            None => {
                if !self.target_lost {
                    warn!(tick, "tracked vehicle lost, skipping camera updates");
                    self.target_lost = true;
                }
                self.stats.target_lost_ticks += 1;
                (None, None)
            }
        };

        let elapsed = started.elapsed();
        self.stats.ticks += 1;
        self.stats.last_tick = elapsed;
        self.stats.max_tick = self.stats.max_tick.max(elapsed);

        debug!(
            tick,
            steer = command.steer,
            throttle = command.throttle,
            brake = command.brake,
            "tick"
        );

        TickReport {
            tick,
            snapshot,
            camera,
            target_lost: camera.is_none(),
            actuation_error,
            camera_error,
        }
    }

    /// Tick at the configured rate until `stop` turns true or its sender is
    /// dropped.
    ///
    /// Returns the final stats, or [`Error::TargetLost`] when the vehicle
    /// disappears under [`TargetPolicy::RequireTarget`].
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<LoopStats> {
        let period = self.config.tick_period();
        let mut deadline = Instant::now();
        info!(
            rate_hz = self.config.tick_rate_hz,
            period_ms = period.as_secs_f32() * 1000.0,
            "control loop started"
        );

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let report = self.tick().await;
            if report.target_lost && self.config.target_policy == TargetPolicy::RequireTarget {
                warn!(tick = report.tick, "stopping control loop, vehicle required");
                return Err(Error::TargetLost);
            }

            deadline += period;
            let now = Instant::now();
            while deadline + period <= now {
                deadline += period;
                self.stats.missed_ticks += 1;
            }

            if wait_until(deadline, &mut stop).await {
                break;
            }
        }

        info!(
            ticks = self.stats.ticks,
            missed = self.stats.missed_ticks,
            "control loop stopped"
        );
        Ok(self.stats.clone())
    }
}

/// Sleep until `deadline`. Returns `true` if a stop was requested meanwhile.
async fn wait_until(deadline: Instant, stop: &mut watch::Receiver<bool>) -> bool {
    loop {
        tokio::select! {
            () = sleep_until(deadline) => return false,
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow_and_update() {
                    return true;
                }
            }
        }
    }
}

async fn forward(sink: &'static str, limit: Duration, fut: SinkFuture<'_>) -> Result<()> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::SinkTimeout {
            sink,
            timeout: limit,
        }),
    }
}
