use glam::{Mat3, Vec2, Vec3};
use std::fmt;

/// A 2D position on the ground plane, in meters.
pub type Position2D = Vec2;

/// Device-to-world rotation as a 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation(pub Mat3);

impl Rotation {
    pub const IDENTITY: Self = Self(Mat3::IDENTITY);

    /// Map a device-frame vector into the world frame.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        self.0 * v
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One linear-acceleration reading with gravity already removed.
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    /// Monotonic sensor clock, nanoseconds.
    pub timestamp_nanos: i64,
    /// Device-frame acceleration (m/s^2).
    pub accel: Vec3,
}

/// Dead-reckoned position and velocity on the ground plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicState {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Absolute pose reported by the visual-inertial tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsolutePose {
    /// World translation (meters). X/Z span the ground plane, Y is height.
    pub translation: Vec3,
    /// Whether the tracker considers this sample usable.
    pub trackable: bool,
}

/// Tracker self-reported state, mirroring the usual AR session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Tracking,
    Paused,
    Stopped,
}

impl TrackingState {
    pub fn is_tracking(self) -> bool {
        self == TrackingState::Tracking
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackingState::Tracking => "TRACKING",
            TrackingState::Paused => "PAUSED",
            TrackingState::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// One per-frame update from the pose source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseFrame {
    pub timestamp_nanos: i64,
    pub tracking: TrackingState,
    pub pose: AbsolutePose,
}

impl PoseFrame {
    pub fn new(timestamp_nanos: i64, tracking: TrackingState, translation: Vec3) -> Self {
        Self {
            timestamp_nanos,
            tracking,
            pose: AbsolutePose {
                translation,
                trackable: tracking.is_tracking(),
            },
        }
    }
}

/// Motion sensor channels carried by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorType {
    /// Orientation as a rotation vector (quaternion x, y, z and optionally w).
    RotationVector,
    /// Acceleration with gravity removed, device frame.
    LinearAcceleration,
}

/// A raw sensor callback: timestamp, channel, and the channel's values.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub timestamp_nanos: i64,
    pub sensor: SensorType,
    pub values: Vec<f32>,
}

/// Everything the companion device can send.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Sensor(SensorEvent),
    Pose(PoseFrame),
}
