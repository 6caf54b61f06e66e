use driftview_config::clamp_scale;
use glam::{Affine2, Vec2};

/// Zoom and pan of the path view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Pixels per meter, always within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f32,
    /// Screen-space offset in pixels.
    pub pan: Vec2,
}

impl ViewportState {
    /// World (meters, Y up) to screen (pixels, Y down) for a surface of the given size.
    ///
    /// Applied right to left: scale with Y flipped, then pan, then move the
    /// origin to the surface center.
    pub fn world_to_screen(&self, width: f32, height: f32) -> Affine2 {
        Affine2::from_translation(Vec2::new(width / 2.0, height / 2.0))
            * Affine2::from_translation(self.pan)
            * Affine2::from_scale(Vec2::new(self.scale, -self.scale))
    }

    pub fn screen_to_world(&self, width: f32, height: f32) -> Affine2 {
        self.world_to_screen(width, height).inverse()
    }
}

/// Owns the viewport and applies gesture updates to it.
#[derive(Debug)]
pub struct ViewportController {
    state: ViewportState,
}

impl ViewportController {
    pub fn new(initial_scale: f32) -> Self {
        Self {
            state: ViewportState {
                scale: clamp_scale(initial_scale),
                pan: Vec2::ZERO,
            },
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Multiply the zoom by `factor`, clamped to `[MIN_SCALE, MAX_SCALE]`.
    /// A NaN factor is ignored.
    pub fn apply_scale(&mut self, factor: f32) {
        if factor.is_nan() {
            return;
        }
        self.state.scale = clamp_scale(self.state.scale * factor);
    }

    /// Apply a drag step. `distance` is previous minus current pointer
    /// position, so subtracting it makes the content follow the pointer.
    pub fn apply_drag(&mut self, distance: Vec2) {
        self.state.pan -= distance;
    }

    /// Re-center the view. Zoom is kept.
    pub fn reset_view(&mut self) {
        self.state.pan = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftview_config::{MAX_SCALE, MIN_SCALE};

    #[test]
    fn initial_scale_is_clamped() {
        assert_eq!(ViewportController::new(1.0).state().scale, MIN_SCALE);
        assert_eq!(ViewportController::new(9000.0).state().scale, MAX_SCALE);
        assert_eq!(ViewportController::new(50.0).state().scale, 50.0);
    }

    #[test]
    fn nan_initial_scale_uses_default_and_stays_usable() {
        let mut viewport = ViewportController::new(f32::NAN);
        assert_eq!(viewport.state().scale, driftview_config::DEFAULT_SCALE);

        viewport.apply_scale(2.0);
        assert_eq!(viewport.state().scale, 100.0);
    }

    #[test]
    fn scale_stays_in_range_for_any_factor_sequence() {
        let mut viewport = ViewportController::new(50.0);
        let factors = [
            2.0, 10.0, 10.0, 0.5, 1e-6, 0.0, -3.0, 1.5, f32::INFINITY, 0.9, 1e9, f32::NAN, 0.01,
        ];
        for factor in factors {
            viewport.apply_scale(factor);
            let scale = viewport.state().scale;
            assert!((MIN_SCALE..=MAX_SCALE).contains(&scale), "scale {scale} after {factor}");
        }
    }

    #[test]
    fn scale_multiplies_within_range() {
        let mut viewport = ViewportController::new(50.0);
        viewport.apply_scale(2.0);
        assert_eq!(viewport.state().scale, 100.0);
        viewport.apply_scale(0.25);
        assert_eq!(viewport.state().scale, 25.0);
    }

    #[test]
    fn drag_is_inverted() {
        let mut viewport = ViewportController::new(50.0);
        viewport.apply_drag(Vec2::new(10.0, -4.0));
        assert_eq!(viewport.state().pan, Vec2::new(-10.0, 4.0));
    }

    #[test]
    fn reset_view_keeps_zoom() {
        let mut viewport = ViewportController::new(50.0);
        viewport.apply_scale(3.0);
        viewport.apply_drag(Vec2::new(30.0, 30.0));
        viewport.reset_view();
        assert_eq!(viewport.state().pan, Vec2::ZERO);
        assert_eq!(viewport.state().scale, 150.0);
    }

    #[test]
    fn origin_maps_to_surface_center_plus_pan() {
        let state = ViewportState {
            scale: 50.0,
            pan: Vec2::new(12.0, -8.0),
        };
        let t = state.world_to_screen(800.0, 600.0);
        assert_eq!(t.transform_point2(Vec2::ZERO), Vec2::new(412.0, 292.0));
    }

    #[test]
    fn world_up_is_screen_up() {
        let state = ViewportState {
            scale: 20.0,
            pan: Vec2::ZERO,
        };
        let t = state.world_to_screen(100.0, 100.0);
        assert_eq!(t.transform_point2(Vec2::new(1.0, 1.0)), Vec2::new(70.0, 30.0));
    }

    #[test]
    fn screen_to_world_inverts() {
        let state = ViewportState {
            scale: 37.0,
            pan: Vec2::new(-5.0, 19.0),
        };
        let p = Vec2::new(3.25, -1.5);
        let screen = state.world_to_screen(640.0, 480.0).transform_point2(p);
        let back = state.screen_to_world(640.0, 480.0).transform_point2(screen);
        assert!((back - p).length() < 1e-4);
    }
}
