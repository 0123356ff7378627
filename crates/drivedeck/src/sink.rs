//! Seams to the simulated world.
//!
//! The loop pushes [`ActuationCommand`]s and [`CameraPose`]s into sinks and
//! pulls [`VehiclePose`]s from a source. Sinks return boxed futures so they
//! can be used as trait objects and driven by any executor.
//!
//! # Implementations
//!
//! - [`NullSink`]: discards everything
//! - [`RecordingSink`]: keeps every forwarded value in memory
//! - [`SharedPose`]: a pose slot written by the world and read by the loop

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use crate::actuation::ActuationCommand;
use crate::camera::{CameraPose, VehiclePose};
use crate::error::Result;

/// Future returned by sink operations.
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Receives one actuation command per tick.
pub trait ActuationSink: Send + Sync {
    /// Apply a command to the vehicle. A later command supersedes this one.
    fn apply(&self, command: ActuationCommand) -> SinkFuture<'_>;
}

/// Receives the derived camera pose.
pub trait CameraSink: Send + Sync {
    fn set_pose(&self, pose: CameraPose) -> SinkFuture<'_>;
}

/// Supplies the tracked vehicle's pose.
///
/// Called from inside the loop, so implementations must return a snapshot
/// without waiting on I/O. `None` means the vehicle no longer exists.
pub trait PoseSource: Send + Sync {
    fn current_pose(&self) -> Option<VehiclePose>;
}

impl<T: ActuationSink + ?Sized> ActuationSink for Arc<T> {
    fn apply(&self, command: ActuationCommand) -> SinkFuture<'_> {
        (**self).apply(command)
    }
}

impl<T: CameraSink + ?Sized> CameraSink for Arc<T> {
    fn set_pose(&self, pose: CameraPose) -> SinkFuture<'_> {
        (**self).set_pose(pose)
    }
}

impl<T: PoseSource + ?Sized> PoseSource for Arc<T> {
    fn current_pose(&self) -> Option<VehiclePose> {
        (**self).current_pose()
    }
}

/// A sink that accepts and drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ActuationSink for NullSink {
    fn apply(&self, _command: ActuationCommand) -> SinkFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

impl CameraSink for NullSink {
    fn set_pose(&self, _pose: CameraPose) -> SinkFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

/// A sink that remembers everything forwarded to it.
///
/// Clones share the same storage.
#[derive(Debug)]
pub struct RecordingSink<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> RecordingSink<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.lock().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.lock().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, item: T) {
        self.lock().push(item);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingSink<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl ActuationSink for RecordingSink<ActuationCommand> {
    fn apply(&self, command: ActuationCommand) -> SinkFuture<'_> {
        self.push(command);
        Box::pin(async { Ok(()) })
    }
}

impl CameraSink for RecordingSink<CameraPose> {
    fn set_pose(&self, pose: CameraPose) -> SinkFuture<'_> {
        self.push(pose);
        Box::pin(async { Ok(()) })
    }
}

/// Latest known vehicle pose, shared between the world and the loop.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedPose {
    slot: Arc<RwLock<Option<VehiclePose>>>,
}

impl SharedPose {
    #[must_use]
    pub fn new(pose: Option<VehiclePose>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(pose)),
        }
    }

    pub fn set(&self, pose: VehiclePose) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(pose);
    }

    /// Mark the vehicle as gone.
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl PoseSource for SharedPose {
    fn current_pose(&self) -> Option<VehiclePose> {
        *self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[test]
    fn test_null_sink_accepts() {
        block_on(NullSink.apply(ActuationCommand::NEUTRAL)).unwrap();
        block_on(NullSink.set_pose(CameraPose::default())).unwrap();
    }

    #[test]
    fn test_recording_sink_shares_storage() {
        let sink = RecordingSink::<ActuationCommand>::new();
        let view = sink.clone();
        assert!(view.is_empty());

        block_on(sink.apply(ActuationCommand::new(0.5, 1.0, 0.0))).unwrap();
        block_on(sink.apply(ActuationCommand::NEUTRAL)).unwrap();

        assert_eq!(view.len(), 2);
        assert_eq!(view.items()[0].steer, 0.5);
        assert_eq!(view.last(), Some(ActuationCommand::NEUTRAL));
    }

    #[test]
    fn test_shared_pose_set_and_clear() {
        let world = SharedPose::default();
        let reader: Arc<dyn PoseSource> = Arc::new(world.clone());
        assert!(reader.current_pose().is_none());

        let pose = VehiclePose {
            location: glam::Vec3::new(1.0, 2.0, 3.0),
            ..VehiclePose::default()
        };
        world.set(pose);
        assert_eq!(reader.current_pose(), Some(pose));

        world.clear();
        assert!(reader.current_pose().is_none());
    }
}
