//! Keyboard and mouse state plus the phase slider widget.

pub mod slider;

pub use slider::*;

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys that auto-repeated this frame while held.
    keys_repeated: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,

    /// Cursor position in physical window pixels.
    cursor_position: Vec2,
    /// Wheel movement this frame, in lines (positive = away from the user).
    scroll_lines: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call after the frame has consumed its input.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_repeated.clear();
        self.mouse_pressed.clear();
        self.scroll_lines = 0.0;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                } else {
                    self.keys_repeated.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    /// Process cursor position update.
    pub fn process_cursor_position(&mut self, position: (f64, f64)) {
        self.cursor_position = Vec2::new(position.0 as f32, position.1 as f32);
    }

    /// Accumulate wheel movement in lines.
    pub fn process_scroll(&mut self, lines: f32) {
        self.scroll_lines += lines;
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Pressed or auto-repeated this frame. For keys that step a value.
    pub fn is_key_stepped(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key) || self.keys_repeated.contains(&key)
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Check if a mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Cursor position in physical window pixels.
    pub fn cursor_position(&self) -> Vec2 {
        self.cursor_position
    }

    /// Wheel movement this frame, in lines.
    pub fn scroll_lines(&self) -> f32 {
        self.scroll_lines
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_once_until_released() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::ArrowLeft, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::ArrowLeft));
        input.end_frame();

        // Key repeat is a step but not a new press.
        input.process_keyboard(KeyCode::ArrowLeft, ElementState::Pressed);
        assert!(!input.is_key_pressed(KeyCode::ArrowLeft));
        assert!(input.is_key_stepped(KeyCode::ArrowLeft));
        input.end_frame();
        assert!(!input.is_key_stepped(KeyCode::ArrowLeft));

        input.process_keyboard(KeyCode::ArrowLeft, ElementState::Released);
        input.process_keyboard(KeyCode::ArrowLeft, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::ArrowLeft));
    }

    #[test]
    fn scroll_accumulates_within_a_frame() {
        let mut input = InputState::new();
        input.process_scroll(1.0);
        input.process_scroll(2.0);
        assert_eq!(input.scroll_lines(), 3.0);
        input.end_frame();
        assert_eq!(input.scroll_lines(), 0.0);
    }

    #[test]
    fn mouse_press_is_per_frame() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(input.is_mouse_held(MouseButton::Left));
        input.end_frame();
        assert!(!input.is_mouse_pressed(MouseButton::Left));
        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.is_mouse_held(MouseButton::Left));
    }
}
