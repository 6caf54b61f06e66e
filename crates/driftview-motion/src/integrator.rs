use crate::types::{KinematicState, Position2D, Rotation};
use glam::{Vec2, Vec3};

const NANOS_PER_SEC: f32 = 1_000_000_000.0;

/// Planar dead reckoning by double integration of linear acceleration.
///
/// Acceleration is rotated into the world frame and only its X/Y components
/// are integrated. There is no bias correction, zero-velocity update or
/// outlier rejection, so drift grows without bound.
#[derive(Debug, Default)]
pub struct InertialIntegrator {
    state: KinematicState,
    /// Timestamp of the previous sample. `None` until the first sample seeds it.
    last_timestamp: Option<i64>,
}

impl InertialIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate one acceleration sample.
    ///
    /// The first sample after construction or [`reset`](Self::reset) only
    /// records its timestamp and returns `None`.
    pub fn integrate(
        &mut self,
        timestamp_nanos: i64,
        accel_device: Vec3,
        rotation: &Rotation,
    ) -> Option<Position2D> {
        let world = rotation.rotate(accel_device);

        let last = self.last_timestamp.replace(timestamp_nanos)?;

        // Wire timestamps are untrusted; a wrapped difference must not panic.
        let dt = timestamp_nanos.wrapping_sub(last) as f32 / NANOS_PER_SEC;
        let accel = Vec2::new(world.x, world.y);

        self.state.velocity += accel * dt;
        self.state.position += self.state.velocity * dt;

        Some(self.state.position)
    }

    /// Zero position and velocity and forget the timestamp baseline.
    pub fn reset(&mut self) {
        self.state = KinematicState::default();
        self.last_timestamp = None;
    }

    pub fn state(&self) -> KinematicState {
        self.state
    }

    pub fn is_seeded(&self) -> bool {
        self.last_timestamp.is_some()
    }
}
