use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Zoom applied per wheel notch.
const WHEEL_STEP: f32 = 1.1;
/// Pixel-precise scrolling (touchpads) reports this many pixels per notch.
const PIXELS_PER_NOTCH: f32 = 100.0;

type ScaleHandler<T> = Box<dyn FnMut(&mut T, f32)>;
type DragHandler<T> = Box<dyn FnMut(&mut T, Vec2)>;

/// Turns window pointer events into scale and drag gestures.
///
/// Scale comes from the mouse wheel or a touchpad pinch and is reported as a
/// multiplicative factor. Drag is reported while the drag button is held, as
/// the distance `previous - current` in pixels. Each gesture calls its own
/// registered handler with the target to update.
pub struct GestureRecognizer<T> {
    on_scale: Option<ScaleHandler<T>>,
    on_drag: Option<DragHandler<T>>,
    drag_button: MouseButton,
    dragging: bool,
    /// Last cursor position in window pixels.
    cursor: Option<Vec2>,
}

impl<T> GestureRecognizer<T> {
    pub fn new() -> Self {
        Self {
            on_scale: None,
            on_drag: None,
            drag_button: MouseButton::Left,
            dragging: false,
            cursor: None,
        }
    }

    pub fn on_scale(mut self, handler: impl FnMut(&mut T, f32) + 'static) -> Self {
        self.on_scale = Some(Box::new(handler));
        self
    }

    pub fn on_drag(mut self, handler: impl FnMut(&mut T, Vec2) + 'static) -> Self {
        self.on_drag = Some(Box::new(handler));
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button != self.drag_button {
            return;
        }
        self.dragging = state == ElementState::Pressed;
    }

    /// Returns true if a drag step was delivered.
    pub fn cursor_moved(&mut self, target: &mut T, x: f64, y: f64) -> bool {
        let current = Vec2::new(x as f32, y as f32);
        let previous = self.cursor.replace(current);

        match (self.dragging, previous, self.on_drag.as_mut()) {
            (true, Some(previous), Some(handler)) => {
                handler(target, previous - current);
                true
            }
            _ => false,
        }
    }

    /// The pointer left the window: end any drag in progress.
    pub fn cursor_left(&mut self) {
        self.dragging = false;
        self.cursor = None;
    }

    /// Returns true if a scale step was delivered.
    pub fn scroll(&mut self, target: &mut T, delta: MouseScrollDelta) -> bool {
        let notches = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_NOTCH,
        };
        if notches == 0.0 {
            return false;
        }
        self.emit_scale(target, WHEEL_STEP.powf(notches))
    }

    /// Touchpad pinch; `delta` is the magnification change for this step.
    pub fn pinch(&mut self, target: &mut T, delta: f64) -> bool {
        if delta == 0.0 {
            return false;
        }
        self.emit_scale(target, 1.0 + delta as f32)
    }

    fn emit_scale(&mut self, target: &mut T, factor: f32) -> bool {
        match self.on_scale.as_mut() {
            Some(handler) => {
                handler(target, factor);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for GestureRecognizer<T> {
    fn default() -> Self {
        Self::new()
    }
}
