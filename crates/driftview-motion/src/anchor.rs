use crate::types::{AbsolutePose, Position2D};
use glam::Vec2;

/// Converts absolute tracker poses into a path relative to the session start.
///
/// The first good pose after construction or reset becomes the anchor. Later
/// poses are plotted as `(x - anchor.x, -(z - anchor.z))` so that the
/// tracker's forward (-Z) maps to screen up.
#[derive(Debug, Default)]
pub struct PoseAnchorNormalizer {
    /// Ground-plane `(x, z)` of the anchor pose.
    anchor: Option<Vec2>,
}

impl PoseAnchorNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plot a pose relative to the anchor, setting the anchor if needed.
    ///
    /// Returns `None` and leaves all state untouched when tracking is not good.
    pub fn observe(&mut self, pose: AbsolutePose, is_tracking_good: bool) -> Option<Position2D> {
        if !is_tracking_good {
            return None;
        }

        let ground = Vec2::new(pose.translation.x, pose.translation.z);
        let anchor = *self.anchor.get_or_insert(ground);
        let offset = ground - anchor;
        Some(Vec2::new(offset.x, -offset.y))
    }

    /// Forget the anchor so the next good pose re-anchors.
    pub fn reset(&mut self) {
        self.anchor = None;
    }

    /// The anchor as `(x, z)`, if one has been captured.
    pub fn anchor(&self) -> Option<Vec2> {
        self.anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pose(x: f32, y: f32, z: f32) -> AbsolutePose {
        AbsolutePose {
            translation: Vec3::new(x, y, z),
            trackable: true,
        }
    }

    #[test]
    fn first_good_pose_plots_at_origin() {
        let mut normalizer = PoseAnchorNormalizer::new();
        let p = normalizer.observe(pose(3.5, 1.2, -7.0), true).unwrap();
        assert_eq!(p, Vec2::ZERO);
        assert_eq!(normalizer.anchor(), Some(Vec2::new(3.5, -7.0)));
    }

    #[test]
    fn stream_is_plotted_relative_to_anchor() {
        let mut normalizer = PoseAnchorNormalizer::new();
        let plotted: Vec<Vec2> = [pose(5.0, 0.0, 2.0), pose(6.0, 0.0, 2.0), pose(7.0, 0.0, 3.0)]
            .into_iter()
            .filter_map(|p| normalizer.observe(p, true))
            .collect();
        assert_eq!(
            plotted,
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, -1.0)]
        );
    }

    #[test]
    fn height_is_ignored() {
        let mut normalizer = PoseAnchorNormalizer::new();
        normalizer.observe(pose(0.0, 0.0, 0.0), true);
        let p = normalizer.observe(pose(0.0, 40.0, 0.0), true).unwrap();
        assert_eq!(p, Vec2::ZERO);
    }

    #[test]
    fn untracked_pose_neither_plots_nor_anchors() {
        let mut normalizer = PoseAnchorNormalizer::new();
        assert!(normalizer.observe(pose(9.0, 0.0, 9.0), false).is_none());
        assert!(normalizer.anchor().is_none());

        normalizer.observe(pose(1.0, 0.0, 1.0), true);
        assert!(normalizer.observe(pose(50.0, 0.0, 50.0), false).is_none());
        assert_eq!(normalizer.anchor(), Some(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn reset_reanchors_on_next_good_pose() {
        let mut normalizer = PoseAnchorNormalizer::new();
        normalizer.observe(pose(5.0, 0.0, 2.0), true);
        normalizer.observe(pose(6.0, 0.0, 2.0), true);

        normalizer.reset();
        assert!(normalizer.anchor().is_none());

        let p = normalizer.observe(pose(-4.0, 0.0, 8.0), true).unwrap();
        assert_eq!(p, Vec2::ZERO);
        assert_eq!(normalizer.anchor(), Some(Vec2::new(-4.0, 8.0)));
    }
}
