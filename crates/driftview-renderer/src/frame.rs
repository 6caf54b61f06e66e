use crate::camera::clip_from_world;
use driftview_config::{RenderConfig, Rgba};
use driftview_input::ViewportState;
use driftview_motion::trajectory::TrajectorySnapshot;
use glam::{Affine2, Mat4, Vec2};
use std::borrow::Cow;

/// Grid spans `-GRID_HALF_EXTENT..=GRID_HALF_EXTENT` meters on both axes.
pub const GRID_HALF_EXTENT: i32 = 20;
/// Meters between grid lines.
pub const GRID_SPACING: i32 = 2;

/// A world-space polyline with a world-space width.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke<'a> {
    pub points: Cow<'a, [Vec2]>,
    pub width: f32,
    pub color: Rgba,
}

/// A filled circle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    pub center: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

/// Everything needed to draw one frame, independent of any graphics API.
///
/// Geometry is in world meters; `world_to_screen` maps it to surface pixels.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub width: f32,
    pub height: f32,
    pub world_to_screen: Affine2,
    pub background: Rgba,
    pub grid: Vec<Stroke<'a>>,
    pub inertial: Stroke<'a>,
    pub pose_source: Stroke<'a>,
    pub marker: Disc,
}

impl<'a> Frame<'a> {
    /// Strokes in paint order: grid, dead-reckoning path, tracker path.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke<'a>> {
        self.grid
            .iter()
            .chain(std::iter::once(&self.inertial))
            .chain(std::iter::once(&self.pose_source))
    }

    pub fn clip_from_world(&self) -> Mat4 {
        clip_from_world(self.world_to_screen, self.width, self.height)
    }
}

/// Lays out the grid, both paths and the origin marker for a viewport.
///
/// Stroke widths are divided by the zoom so they stay constant on screen.
pub struct PathRenderer {
    style: RenderConfig,
}

impl PathRenderer {
    pub fn new(style: RenderConfig) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderConfig {
        &self.style
    }

    /// Build the frame for a `width` x `height` pixel surface.
    ///
    /// Reads the viewport and the path snapshot without modifying either.
    pub fn render_frame<'a>(
        &self,
        width: f32,
        height: f32,
        viewport: &ViewportState,
        paths: &'a TrajectorySnapshot,
    ) -> Frame<'a> {
        let grid_width = self.style.grid_stroke_px / viewport.scale;
        let path_width = self.style.path_stroke_px / viewport.scale;
        let extent = GRID_HALF_EXTENT as f32;

        let mut grid = Vec::with_capacity(grid_line_count());
        for i in (-GRID_HALF_EXTENT..=GRID_HALF_EXTENT).step_by(GRID_SPACING as usize) {
            let at = i as f32;
            grid.push(self.grid_line(Vec2::new(at, -extent), Vec2::new(at, extent), grid_width));
            grid.push(self.grid_line(Vec2::new(-extent, at), Vec2::new(extent, at), grid_width));
        }

        Frame {
            width,
            height,
            world_to_screen: viewport.world_to_screen(width, height),
            background: self.style.background_color,
            grid,
            inertial: Stroke {
                points: Cow::Borrowed(paths.inertial.points()),
                width: path_width,
                color: self.style.inertial_color,
            },
            pose_source: Stroke {
                points: Cow::Borrowed(paths.pose_source.points()),
                width: path_width,
                color: self.style.pose_color,
            },
            marker: Disc {
                center: Vec2::ZERO,
                radius: self.style.marker_radius_m,
                color: self.style.marker_color,
            },
        }
    }

    fn grid_line(&self, from: Vec2, to: Vec2, width: f32) -> Stroke<'static> {
        Stroke {
            points: Cow::Owned(vec![from, to]),
            width,
            color: self.style.grid_color,
        }
    }
}

/// Vertical plus horizontal grid lines.
pub fn grid_line_count() -> usize {
    2 * ((2 * GRID_HALF_EXTENT / GRID_SPACING) as usize + 1)
}
