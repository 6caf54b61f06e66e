use crate::types::Position2D;
use glam::Vec2;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// An append-only path that always starts at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Vec2>,
}

impl Polyline {
    /// A polyline holding only the origin.
    pub fn new() -> Self {
        Self {
            points: vec![Vec2::ZERO],
        }
    }

    pub fn push(&mut self, p: Position2D) {
        self.points.push(p);
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a polyline keeps at least its origin point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Vec2 {
        self.points.last().copied().unwrap_or(Vec2::ZERO)
    }

    fn clear_to_origin(&mut self) {
        self.points.clear();
        self.points.push(Vec2::ZERO);
    }
}

impl Default for Polyline {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies of both paths taken for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySnapshot {
    pub inertial: Polyline,
    pub pose_source: Polyline,
    /// Store revision at the time of the copy.
    pub revision: u64,
}

/// The dead-reckoning and pose-source paths for the current session.
///
/// Appends come from two producers on different threads while the renderer
/// copies on its own schedule. Each path has its own lock, held only for a
/// push or a copy, so a reader never sees a half-written path.
#[derive(Debug, Default)]
pub struct TrajectoryStore {
    inertial: Mutex<Polyline>,
    pose_source: Mutex<Polyline>,
    /// Bumped on every mutation so readers can skip unchanged frames.
    revision: AtomicU64,
}

impl TrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_inertial(&self, p: Position2D) {
        self.inertial.lock().push(p);
        self.bump();
    }

    pub fn append_pose_source(&self, p: Position2D) {
        self.pose_source.lock().push(p);
        self.bump();
    }

    /// Clear only the dead-reckoning path back to the origin.
    pub fn reset_inertial(&self) {
        self.inertial.lock().clear_to_origin();
        self.bump();
    }

    /// Clear both paths back to the single origin point.
    pub fn reset(&self) {
        self.inertial.lock().clear_to_origin();
        self.pose_source.lock().clear_to_origin();
        self.bump();
    }

    pub fn snapshot(&self) -> TrajectorySnapshot {
        let revision = self.revision();
        TrajectorySnapshot {
            inertial: self.inertial.lock().clone(),
            pose_source: self.pose_source.lock().clone(),
            revision,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}
