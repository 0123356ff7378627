//! Headless session for the drivedeck controls.
//!
//! A scripted pointer drives the virtual wheel and pedals, the control loop
//! forwards their outputs to a kinematic vehicle, and a spectator camera
//! chases it. Runs until Ctrl-C, `--duration`, or (with `--require-target`)
//! until the vehicle disappears.
//!
//! Run with: cargo run -p drivedeck-sim -- --duration 20 --despawn-after 12

mod script;
mod telemetry;
mod vehicle;
mod world;

use std::{error::Error, path::PathBuf, time::Duration};

use clap::Parser;
use drivedeck::{
    ControlConfig, ControlLoop, ControlPanel, PanelLayout, SharedPose, TargetPolicy,
};
use glam::Vec2;
use tokio::sync::watch;
use tracing::{info, warn};

use script::PointerScript;
use telemetry::Telemetry;
use vehicle::{VehicleParams, theoretical_top_speed, turning_radius};
use world::{SimWorld, Spectator};

/// Rate of the scripted pointer thread.
const POINTER_RATE_HZ: f32 = 60.0;
/// Capacity of the pointer event channel.
const POINTER_CHANNEL_CAPACITY: usize = 64;
/// Fastest accepted world physics rate.
const MAX_WORLD_RATE_HZ: f32 = 1000.0;

#[derive(Parser, Debug)]
#[command(about = "Drive a simulated vehicle with scripted virtual wheel and pedal input")]
struct Args {
    /// JSON control configuration; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control loop rate in Hz (20 to 50), overriding the config file.
    #[arg(long)]
    tick_rate: Option<f32>,

    /// Stop after this many seconds. Runs until Ctrl-C when omitted.
    #[arg(long, value_parser = parse_seconds)]
    duration: Option<Duration>,

    /// Remove the vehicle from the world after this many seconds.
    #[arg(long, value_parser = parse_seconds)]
    despawn_after: Option<Duration>,

    /// Stop the control loop when the vehicle disappears.
    #[arg(long)]
    require_target: bool,

    /// Seed for pointer jitter.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Maximum pointer jitter in pixels.
    #[arg(long, default_value = "1.5", value_parser = parse_jitter)]
    jitter: f32,

    /// Screen the panel is laid out on (format: WIDTHxHEIGHT).
    #[arg(long, default_value = "1280x720", value_parser = parse_screen)]
    screen: Vec2,

    /// Physics rate of the simulated world in Hz (1 to 1000).
    #[arg(long, default_value = "100", value_parser = parse_world_rate)]
    world_rate: f32,

    /// Write per-step vehicle telemetry as CSV.
    #[arg(long)]
    telemetry: Option<PathBuf>,
}

/// Parse a `WIDTHxHEIGHT` string into a screen size.
fn parse_screen(s: &str) -> Result<Vec2, String> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        return Err(format!("expected WIDTHxHEIGHT, got '{s}'"));
    };
    let w = w
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid width: {e}"))?;
    let h = h
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid height: {e}"))?;
    if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
        return Err(format!("screen size must be positive, got {w}x{h}"));
    }
    Ok(Vec2::new(w, h))
}

/// Parse a non-negative number of seconds.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs = s
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid seconds: {e}"))?;
    Duration::try_from_secs_f32(secs).map_err(|e| format!("invalid duration {secs}: {e}"))
}

/// Parse a world physics rate in Hz.
fn parse_world_rate(s: &str) -> Result<f32, String> {
    let rate = s
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid rate: {e}"))?;
    if !(1.0..=MAX_WORLD_RATE_HZ).contains(&rate) {
        return Err(format!("rate must be between 1 and {MAX_WORLD_RATE_HZ} Hz, got {rate}"));
    }
    Ok(rate)
}

/// Parse a jitter amplitude in pixels.
fn parse_jitter(s: &str) -> Result<f32, String> {
    let pixels = s
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid jitter: {e}"))?;
    if !(pixels.is_finite() && pixels >= 0.0) {
        return Err(format!("jitter must be a non-negative number, got {pixels}"));
    }
    Ok(pixels)
}

/// Resolve the control configuration from the optional file and CLI overrides.
fn load_config(args: &Args) -> Result<ControlConfig, Box<dyn Error>> {
    let mut config: ControlConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => ControlConfig::default(),
    };
    if let Some(rate) = args.tick_rate {
        config.tick_rate_hz = rate;
    }
    if args.require_target {
        config.target_policy = TargetPolicy::RequireTarget;
    }
    config.validate()?;
    Ok(config)
}

/// Resolves on Ctrl-C or once `duration` has passed.
async fn shutdown_requested(duration: Option<Duration>) {
    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        () = deadline => info!("run duration elapsed"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("received Ctrl-C"),
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C, stopping"),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args = Args::parse();
    let config = load_config(&args)?;
    let layout = PanelLayout::for_screen(args.screen);
    info!(
        rate_hz = config.tick_rate_hz,
        policy = ?config.target_policy,
        width = args.screen.x,
        height = args.screen.y,
        "starting session"
    );

    let params = VehicleParams::default();
    info!(
        top_speed = theoretical_top_speed(&params),
        min_turn_radius = ?turning_radius(&params, 1.0),
        "vehicle model ready"
    );
    let world = SimWorld::spawn(params, SharedPose::default());
    let spectator = Spectator::default();
    let panel = ControlPanel::new(layout, config.wheel.clone())?;

    let (stop_tx, stop_rx) = watch::channel(false);

    // Pointer thread -> collector task -> panel.
    let (pointer_tx, pointer_rx) = async_channel::bounded(POINTER_CHANNEL_CAPACITY);
    let script = PointerScript::demo(layout).with_jitter(args.jitter);
    let pointer_thread =
        script::spawn_pointer_thread(script, POINTER_RATE_HZ, args.seed, pointer_tx)?;
    let collector = tokio::spawn(script::collect_pointer(panel.clone(), pointer_rx.clone()));

    let telemetry = args.telemetry.as_deref().map(Telemetry::create).transpose()?;
    let world_task = tokio::spawn(world::run_world(
        world.clone(),
        args.world_rate,
        args.despawn_after,
        telemetry,
        stop_rx.clone(),
    ));

    let mut control = ControlLoop::new(
        config,
        panel,
        world.clone(),
        spectator.clone(),
        world.poses(),
    )?;
    let mut control_task = tokio::spawn(async move { control.run(stop_rx).await });

    let outcome = tokio::select! {
        joined = &mut control_task => joined,
        () = shutdown_requested(args.duration) => {
            stop_tx.send_replace(true);
            control_task.await
        }
    };

    // The loop may have ended on its own; stop everything else too.
    stop_tx.send_replace(true);
    pointer_rx.close();
    let pointer_events = collector.await?;
    let telemetry_rows = world_task.await?;
    if tokio::task::spawn_blocking(move || pointer_thread.join())
        .await?
        .is_err()
    {
        warn!("pointer thread panicked");
    }

    let stats = match outcome? {
        Ok(stats) => stats,
        Err(drivedeck::Error::TargetLost) => {
            warn!("session ended: vehicle lost");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        ticks = stats.ticks,
        missed = stats.missed_ticks,
        target_lost = stats.target_lost_ticks,
        actuation_failures = stats.actuation_failures,
        camera_failures = stats.camera_failures,
        max_tick_ms = stats.max_tick.as_secs_f32() * 1000.0,
        pointer_events,
        telemetry_rows,
        "session finished"
    );
    if let Some(state) = world.state() {
        info!(
            x = state.position.x,
            y = state.position.y,
            yaw = state.yaw,
            speed = state.speed,
            last_command = ?world.command(),
            "final vehicle state"
        );
    }
    if let Some(camera) = spectator.pose() {
        info!(location = %camera.location, "final camera location");
    }

    Ok(())
}
