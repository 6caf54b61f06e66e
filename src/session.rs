use driftview_input::ViewportController;
use driftview_motion::listener::{PoseListener, PoseTrack};
use driftview_motion::trajectory::TrajectoryStore;
use driftview_motion::types::{PoseFrame, Position2D};
use driftview_motion::{FeedClient, PoseSource};
use std::sync::Arc;
use tracing::info;

/// Format a position readout with two decimals, e.g. `"DR: 1.00, -0.50"`.
pub fn format_readout(label: &str, p: Position2D) -> String {
    format!("{label}: {:.2}, {:.2}", p.x, p.y)
}

/// One tracking session: both paths, the pose anchor and the view.
pub struct Session {
    store: Arc<TrajectoryStore>,
    feed: FeedClient,
    pose_track: PoseTrack,
    viewport: ViewportController,
    feed_error: Option<String>,
}

impl Session {
    pub fn new(
        store: Arc<TrajectoryStore>,
        feed: FeedClient,
        feed_error: Option<String>,
        initial_scale: f32,
    ) -> Self {
        Self {
            pose_track: PoseTrack::new(store.clone()),
            store,
            feed,
            viewport: ViewportController::new(initial_scale),
            feed_error,
        }
    }

    pub fn store(&self) -> &TrajectoryStore {
        &self.store
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    /// Pull at most one new pose frame from the feed. Returns whether one arrived.
    pub fn poll_pose(&mut self) -> bool {
        match self.feed.poll_pose() {
            Some(frame) => {
                self.apply_pose_frame(&frame);
                true
            }
            None => false,
        }
    }

    pub fn apply_pose_frame(&mut self, frame: &PoseFrame) {
        self.pose_track.on_pose_frame(frame);
    }

    /// Clear both paths, the pose anchor and the inertial state, and re-center
    /// the view. Zoom is kept.
    ///
    /// The feed task clears the dead-reckoning path again when it applies the
    /// inertial reset, so samples it was already draining do not survive.
    pub fn reset_session(&mut self) {
        self.feed.reset_inertial();
        self.pose_track.reset();
        self.store.reset();
        self.viewport.reset_view();
        info!("Session reset");
    }

    pub fn inertial_readout(&self) -> String {
        format_readout("DR", self.feed.inertial_position())
    }

    pub fn pose_readout(&self) -> String {
        format_readout("SLAM", self.pose_track.latest())
    }

    pub fn status(&self) -> String {
        if let Some(message) = &self.feed_error {
            return format!("Feed error: {message}");
        }
        match self.pose_track.last_state() {
            Some(state) => format!("Status: {state}"),
            None => "Status: WAITING".to_string(),
        }
    }

    /// Window title carrying both readouts and the status.
    pub fn title(&self) -> String {
        format!(
            "driftview | {} | {} | {}",
            self.inertial_readout(),
            self.pose_readout(),
            self.status()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftview_motion::types::TrackingState;
    use glam::{Vec2, Vec3};

    fn mock_session() -> Session {
        Session::new(Arc::new(TrajectoryStore::new()), FeedClient::mock(), None, 50.0)
    }

    #[test]
    fn readout_uses_two_decimals() {
        assert_eq!(format_readout("DR", Vec2::new(1.0, -0.5)), "DR: 1.00, -0.50");
        assert_eq!(format_readout("SLAM", Vec2::new(0.126, 12.0)), "SLAM: 0.13, 12.00");
    }

    #[tokio::test]
    async fn fresh_session_reads_zero() {
        let session = mock_session();
        assert_eq!(session.inertial_readout(), "DR: 0.00, 0.00");
        assert_eq!(session.pose_readout(), "SLAM: 0.00, 0.00");
        assert_eq!(session.status(), "Status: WAITING");
    }

    #[tokio::test]
    async fn pose_frames_drive_readout_and_status() {
        let mut session = mock_session();
        session.apply_pose_frame(&PoseFrame::new(0, TrackingState::Tracking, Vec3::new(0.0, 0.0, 0.0)));
        session.apply_pose_frame(&PoseFrame::new(1, TrackingState::Tracking, Vec3::new(2.0, 0.0, -1.0)));
        assert_eq!(session.pose_readout(), "SLAM: 2.00, 1.00");
        assert_eq!(session.status(), "Status: TRACKING");

        session.apply_pose_frame(&PoseFrame::new(2, TrackingState::Paused, Vec3::ZERO));
        assert_eq!(session.pose_readout(), "SLAM: 2.00, 1.00");
        assert_eq!(session.status(), "Status: PAUSED");
        assert_eq!(session.store().snapshot().pose_source.len(), 3);
    }

    #[tokio::test]
    async fn feed_error_replaces_status() {
        let session = Session::new(
            Arc::new(TrajectoryStore::new()),
            FeedClient::mock(),
            Some("connection refused".into()),
            50.0,
        );
        assert_eq!(session.status(), "Feed error: connection refused");
        assert!(session.title().ends_with("Feed error: connection refused"));
    }

    #[tokio::test]
    async fn reset_clears_paths_and_pan_but_keeps_zoom() {
        let mut session = mock_session();
        session.viewport_mut().apply_scale(2.0);
        session.viewport_mut().apply_drag(Vec2::new(-30.0, 10.0));
        session.apply_pose_frame(&PoseFrame::new(0, TrackingState::Tracking, Vec3::new(5.0, 0.0, 5.0)));
        session.apply_pose_frame(&PoseFrame::new(1, TrackingState::Tracking, Vec3::new(6.0, 0.0, 5.0)));

        session.reset_session();

        let state = session.viewport().state();
        assert_eq!(state.scale, 100.0);
        assert_eq!(state.pan, Vec2::ZERO);
        let snapshot = session.store().snapshot();
        assert_eq!(snapshot.pose_source.points(), &[Vec2::ZERO]);
        assert_eq!(snapshot.inertial.points(), &[Vec2::ZERO]);
        assert_eq!(session.pose_readout(), "SLAM: 0.00, 0.00");
        assert_eq!(session.inertial_readout(), "DR: 0.00, 0.00");

        // The next tracked frame becomes the new anchor.
        session.apply_pose_frame(&PoseFrame::new(2, TrackingState::Tracking, Vec3::new(9.0, 0.0, 9.0)));
        assert_eq!(session.store().snapshot().pose_source.last(), Vec2::ZERO);
    }

    #[tokio::test]
    async fn poll_without_feed_data_is_a_no_op() {
        let mut session = mock_session();
        assert!(!session.poll_pose());
        assert_eq!(session.store().snapshot().pose_source.len(), 1);
    }
}
