use crate::anchor::PoseAnchorNormalizer;
use crate::integrator::InertialIntegrator;
use crate::orientation::OrientationTracker;
use crate::trajectory::TrajectoryStore;
use crate::types::{PoseFrame, Position2D, SensorEvent, SensorType, TrackingState};
use glam::Vec3;
use std::sync::Arc;

/// Receives motion sensor callbacks, one method per channel.
pub trait MotionListener {
    fn on_rotation_vector(&mut self, timestamp_nanos: i64, values: &[f32]);
    fn on_linear_acceleration(&mut self, timestamp_nanos: i64, accel: Vec3);
}

/// Receives per-frame pose source updates.
pub trait PoseListener {
    fn on_pose_frame(&mut self, frame: &PoseFrame);
}

/// Route a raw sensor event to the matching listener method.
///
/// Acceleration events with fewer than three values are dropped.
pub fn dispatch_sensor_event<L: MotionListener + ?Sized>(listener: &mut L, event: &SensorEvent) {
    match event.sensor {
        SensorType::RotationVector => {
            listener.on_rotation_vector(event.timestamp_nanos, &event.values)
        }
        SensorType::LinearAcceleration => {
            if let &[x, y, z, ..] = event.values.as_slice() {
                listener.on_linear_acceleration(event.timestamp_nanos, Vec3::new(x, y, z));
            }
        }
    }
}

/// The dead-reckoning track: orientation + integration feeding the store.
///
/// Sole owner and writer of the rotation and the kinematic state.
pub struct InertialPipeline {
    orientation: OrientationTracker,
    integrator: InertialIntegrator,
    store: Arc<TrajectoryStore>,
    latest: Position2D,
}

impl InertialPipeline {
    pub fn new(store: Arc<TrajectoryStore>) -> Self {
        Self {
            orientation: OrientationTracker::new(),
            integrator: InertialIntegrator::new(),
            store,
            latest: Position2D::ZERO,
        }
    }

    /// Latest dead-reckoned position (origin until the second sample).
    pub fn latest(&self) -> Position2D {
        self.latest
    }

    /// Zero the integrator, clear the dead-reckoning path and re-seed on the
    /// next sample.
    ///
    /// The rotation is kept; it describes the device, not the session.
    pub fn reset(&mut self) {
        self.integrator.reset();
        self.store.reset_inertial();
        self.latest = Position2D::ZERO;
    }

    pub fn integrator(&self) -> &InertialIntegrator {
        &self.integrator
    }
}

impl MotionListener for InertialPipeline {
    fn on_rotation_vector(&mut self, _timestamp_nanos: i64, values: &[f32]) {
        self.orientation.update_orientation(values);
    }

    fn on_linear_acceleration(&mut self, timestamp_nanos: i64, accel: Vec3) {
        let rotation = self.orientation.rotation();
        if let Some(p) = self.integrator.integrate(timestamp_nanos, accel, &rotation) {
            self.latest = p;
            self.store.append_inertial(p);
        }
    }
}

/// The tracker track: anchor normalization feeding the store.
pub struct PoseTrack {
    normalizer: PoseAnchorNormalizer,
    store: Arc<TrajectoryStore>,
    latest: Position2D,
    last_state: Option<TrackingState>,
}

impl PoseTrack {
    pub fn new(store: Arc<TrajectoryStore>) -> Self {
        Self {
            normalizer: PoseAnchorNormalizer::new(),
            store,
            latest: Position2D::ZERO,
            last_state: None,
        }
    }

    /// Latest plotted tracker position (origin until anchored).
    pub fn latest(&self) -> Position2D {
        self.latest
    }

    /// Tracking state of the most recent frame, if any has arrived.
    pub fn last_state(&self) -> Option<TrackingState> {
        self.last_state
    }

    /// Drop the anchor. The reported tracking state is left as is.
    pub fn reset(&mut self) {
        self.normalizer.reset();
        self.latest = Position2D::ZERO;
    }
}

impl PoseListener for PoseTrack {
    fn on_pose_frame(&mut self, frame: &PoseFrame) {
        if self.last_state != Some(frame.tracking) {
            tracing::info!(state = %frame.tracking, "Tracking state changed");
        }
        self.last_state = Some(frame.tracking);

        if let Some(p) = self.normalizer.observe(frame.pose, frame.tracking.is_tracking()) {
            self.latest = p;
            self.store.append_pose_source(p);
        }
    }
}
