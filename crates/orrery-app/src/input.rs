//! Frame-coherent mouse state for the orbit controls.
//!
//! winit events are folded into [`MouseState`] as they arrive; the controls
//! read it once per frame and then [`MouseState::clear_transients`] resets the
//! per-frame deltas.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels of a touchpad scroll counted as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Vec2,
    delta: Vec2,
    left: bool,
    right: bool,
    scroll: f32,
    has_position: bool,
    cursor_in_window: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a `CursorMoved` event. The first sample only sets the position.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if self.has_position {
            self.delta += new_pos - self.position;
        }
        self.position = new_pos;
        self.has_position = true;
    }

    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Right => self.right = pressed,
            _ => {}
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    /// Leaving the window also releases any held button, since the release
    /// event may never arrive.
    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
        self.has_position = false;
        self.left = false;
        self.right = false;
    }

    /// Reset delta and scroll at the end of a frame.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement since the last clear, in logical pixels.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    #[must_use]
    pub fn is_left_pressed(&self) -> bool {
        self.left
    }

    #[must_use]
    pub fn is_right_pressed(&self) -> bool {
        self.right
    }

    /// Wheel lines this frame (positive = away from the user).
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    #[must_use]
    pub fn is_cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }
}
