//! Scripted pointer input.
//!
//! A [`PointerScript`] stands in for a person at the touchscreen: it works
//! the pedals and the wheel one at a time, lifting the pointer between
//! gestures. The script runs on its own OS thread, the way a UI event loop
//! would, and hands events to the runtime over a channel.

use std::{
    io,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use async_channel::{Receiver, Sender};
use drivedeck::{ControlPanel, PanelLayout, PointerEvent};
use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

/// Time at the end of every phase with the button up (seconds).
const RELEASE_GAP: f32 = 0.1;
/// Time a steering gesture takes to sweep to its angle (seconds).
const STEER_SWEEP: f32 = 1.0;

/// What the pointer does during one phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Hold the throttle at a travel fraction in `[0, 1]`.
    Throttle(f32),
    /// Hold the brake at a travel fraction in `[0, 1]`.
    Brake(f32),
    /// Grab the wheel at its 3 o'clock point and sweep it by this many
    /// degrees (counter-clockwise positive).
    Steer(f32),
    /// Pointer up.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub gesture: Gesture,
    /// Seconds.
    pub duration: f32,
}

impl Phase {
    fn new(gesture: Gesture, duration: f32) -> Self {
        Self { gesture, duration }
    }
}

/// A looping sequence of gestures over a panel layout.
#[derive(Debug, Clone)]
pub struct PointerScript {
    layout: PanelLayout,
    phases: Vec<Phase>,
    /// Maximum random offset per axis (pixels).
    jitter: f32,
}

impl PointerScript {
    pub fn new(layout: PanelLayout, phases: Vec<Phase>) -> Self {
        Self {
            layout,
            phases,
            jitter: 0.0,
        }
    }

    /// Accelerate, turn left, coast, turn right, brake.
    pub fn demo(layout: PanelLayout) -> Self {
        Self::new(
            layout,
            vec![
                Phase::new(Gesture::Throttle(0.8), 4.0),
                Phase::new(Gesture::Steer(60.0), 3.0),
                Phase::new(Gesture::Idle, 1.5),
                Phase::new(Gesture::Throttle(0.5), 2.0),
                Phase::new(Gesture::Steer(-45.0), 2.5),
                Phase::new(Gesture::Brake(0.7), 2.0),
                Phase::new(Gesture::Idle, 1.0),
            ],
        )
    }

    #[must_use]
    pub fn with_jitter(mut self, pixels: f32) -> Self {
        self.jitter = if pixels.is_finite() { pixels.max(0.0) } else { 0.0 };
        self
    }

    /// Length of one pass through every phase (seconds).
    pub fn cycle(&self) -> f32 {
        self.phases.iter().map(|p| p.duration).sum()
    }

    /// The pointer sample `t` seconds into the script.
    pub fn sample(&self, t: f32, rng: &mut impl Rng) -> PointerEvent {
        let Some((phase, local)) = self.phase_at(t) else {
            return PointerEvent::new(0.0, 0.0, false);
        };

        let pressed = phase.gesture != Gesture::Idle && local < phase.duration - RELEASE_GAP;
        let mut pos = self.position(phase.gesture, local);
        if self.jitter > 0.0 {
            pos += Vec2::new(
                rng.random_range(-self.jitter..=self.jitter),
                rng.random_range(-self.jitter..=self.jitter),
            );
        }
        PointerEvent::new(pos.x, pos.y, pressed)
    }

    fn phase_at(&self, t: f32) -> Option<(Phase, f32)> {
        let cycle = self.cycle();
        if cycle <= 0.0 {
            return None;
        }
        let mut local = t.rem_euclid(cycle);
        for phase in &self.phases {
            if local < phase.duration {
                return Some((*phase, local));
            }
            local -= phase.duration;
        }
        self.phases.last().map(|p| (*p, p.duration))
    }

    fn position(&self, gesture: Gesture, local: f32) -> Vec2 {
        let layout = &self.layout;
        match gesture {
            Gesture::Throttle(level) => {
                let b = layout.throttle;
                Vec2::new(b.center().x, b.max.y - level * b.height())
            }
            Gesture::Brake(level) => {
                let b = layout.brake;
                Vec2::new(b.min.x + level * b.width(), b.center().y)
            }
            Gesture::Steer(degrees) => {
                let sweep = degrees * (local / STEER_SWEEP).min(1.0);
                let radius = 0.4 * layout.wheel.height();
                let (sin, cos) = sweep.to_radians().sin_cos();
                // Screen y grows downward.
                layout.wheel.center() + radius * Vec2::new(cos, -sin)
            }
            Gesture::Idle => Vec2::ZERO,
        }
    }
}

/// Run `script` on a dedicated thread, sending a sample every `1 / rate_hz`
/// seconds until the channel closes.
pub fn spawn_pointer_thread(
    script: PointerScript,
    rate_hz: f32,
    seed: u64,
    events: Sender<PointerEvent>,
) -> io::Result<JoinHandle<()>> {
    let interval = Duration::from_secs_f32(1.0 / rate_hz);
    thread::Builder::new()
        .name("pointer-script".to_string())
        .spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let started = Instant::now();
            let mut sent = 0u64;
            loop {
                let event = script.sample(started.elapsed().as_secs_f32(), &mut rng);
                if events.send_blocking(event).is_err() {
                    break;
                }
                sent += 1;
                thread::sleep(interval);
            }
            debug!(sent, "pointer script finished");
        })
}

/// Feed pointer events into `panel` until the channel closes.
///
/// Returns how many events were applied.
pub async fn collect_pointer(panel: ControlPanel, events: Receiver<PointerEvent>) -> u64 {
    let mut applied = 0;
    while let Ok(event) = events.recv().await {
        match panel.handle_pointer(event) {
            Ok(()) => applied += 1,
            Err(e) => warn!(error = %e, "dropping pointer event"),
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use drivedeck::{ControlId, WheelConfig};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    /// Play `script` into `panel` from `from` to `to` seconds at 100 Hz,
    /// ticking the panel along the way.
    fn play(script: &PointerScript, panel: &ControlPanel, from: f32, to: f32) {
        let mut rng = rng();
        let mut t = from;
        while t < to {
            panel.handle_pointer(script.sample(t, &mut rng)).unwrap();
            panel.tick();
            t += 0.01;
        }
    }

    #[test]
    fn test_gestures_land_on_their_controls() {
        let layout = PanelLayout::default();
        let panel = ControlPanel::new(layout, WheelConfig::default()).unwrap();
        let script = PointerScript::demo(layout);
        let mut rng = rng();

        let at = |t: f32, rng: &mut StdRng| {
            let event = script.sample(t, rng);
            panel.hit_test(Vec2::new(event.x, event.y))
        };
        assert_eq!(at(1.0, &mut rng), Some(ControlId::ThrottlePedal));
        assert_eq!(at(4.0, &mut rng), Some(ControlId::Wheel));
        assert_eq!(at(13.0, &mut rng), Some(ControlId::BrakePedal));
    }

    #[test]
    fn test_release_gap_between_phases() {
        let script = PointerScript::demo(PanelLayout::default());
        let mut rng = rng();
        assert!(script.sample(3.5, &mut rng).pressed);
        assert!(!script.sample(3.95, &mut rng).pressed);
        assert!(script.sample(4.05, &mut rng).pressed);
        assert!(!script.sample(7.5, &mut rng).pressed);
    }

    #[test]
    fn test_script_loops() {
        let script = PointerScript::demo(PanelLayout::default());
        assert!((script.cycle() - 16.0).abs() < 1e-5);
        let mut a = rng();
        let mut b = rng();
        assert_eq!(script.sample(1.0, &mut a), script.sample(17.0, &mut b));
    }

    #[test]
    fn test_unusable_jitter_is_ignored() {
        let layout = PanelLayout::default();
        let plain = PointerScript::demo(layout);
        for pixels in [f32::INFINITY, f32::NAN, -3.0] {
            let script = PointerScript::demo(layout).with_jitter(pixels);
            assert_eq!(script.sample(1.0, &mut rng()), plain.sample(1.0, &mut rng()));
        }
    }

    #[test]
    fn test_empty_script_never_presses() {
        let script = PointerScript::new(PanelLayout::default(), Vec::new());
        assert!(!script.sample(1.0, &mut rng()).pressed);
    }

    #[test]
    fn test_demo_drives_the_panel() {
        let layout = PanelLayout::default();
        let panel = ControlPanel::new(layout, WheelConfig::default()).unwrap();
        let script = PointerScript::demo(layout).with_jitter(1.0);

        play(&script, &panel, 0.0, 2.0);
        let throttle = panel.throttle_state();
        assert!(throttle.active);
        assert!((78..=82).contains(&throttle.percent), "{throttle:?}");

        // Two seconds into the left turn the wheel has reached the sweep.
        play(&script, &panel, 2.0, 6.0);
        assert_eq!(panel.throttle_state().percent, 0);
        let wheel = panel.wheel_state();
        assert!(wheel.dragging);
        assert!((wheel.angle - 60.0).abs() < 2.0, "{wheel:?}");

        // Released during the idle phase, the wheel springs back.
        play(&script, &panel, 6.0, 8.5);
        assert!(!panel.wheel_state().dragging);
        assert_eq!(panel.wheel_state().angle, 0.0);
    }

    #[test]
    fn test_thread_and_collector() {
        let layout = PanelLayout::default();
        let panel = ControlPanel::new(layout, WheelConfig::default()).unwrap();
        let (tx, rx) = async_channel::bounded(8);
        let script = PointerScript::new(layout, vec![Phase::new(Gesture::Throttle(0.9), 60.0)]);
        let handle = spawn_pointer_thread(script, 200.0, 3, tx).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let closer = rx.clone();
        let applied = runtime.block_on(async {
            let collector = tokio::spawn(collect_pointer(panel.clone(), rx));
            tokio::time::sleep(Duration::from_millis(100)).await;
            closer.close();
            collector.await.unwrap()
        });

        handle.join().unwrap();
        assert!(applied > 0);
        assert_eq!(panel.throttle_state().percent, 90);
    }
}
