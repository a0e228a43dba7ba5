//! Horizontal range slider that drives the moon phase.

use glam::Vec2;
use orbit::{clamp_phase, PHASE_MAX, PHASE_MIN};

use crate::{InputState, KeyCode, MouseButton};

/// Keyboard and wheel increment.
pub const PHASE_STEP: f32 = 0.5;

/// Track height in pixels.
const TRACK_HEIGHT: f32 = 6.0;
/// Extra pixels above and below the track that still grab the handle.
const GRAB_MARGIN: f32 = 12.0;
/// Distance of the track from the bottom of the window.
const BOTTOM_MARGIN: f32 = 36.0;
/// Left/right inset of the track.
const SIDE_MARGIN: f32 = 48.0;
/// Room reserved on the right for the numeric readout.
const READOUT_WIDTH: f32 = 72.0;

/// Axis-aligned rectangle in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Same rectangle grown by `dy` above and below.
    pub fn grow_y(&self, dy: f32) -> Rect {
        Rect {
            y: self.y - dy,
            h: self.h + dy * 2.0,
            ..*self
        }
    }
}

/// The phase slider: value in `[PHASE_MIN, PHASE_MAX]`, a track laid out along
/// the bottom of the window, and drag state.
#[derive(Debug, Clone)]
pub struct PhaseSlider {
    value: f32,
    track: Rect,
    dragging: bool,
}

impl PhaseSlider {
    pub fn new(initial: f32) -> Self {
        Self {
            value: clamp_phase(initial),
            track: Rect::default(),
            dragging: false,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set the value, clamped. Returns true if it changed.
    pub fn set_value(&mut self, value: f32) -> bool {
        let value = clamp_phase(value);
        let changed = value != self.value;
        self.value = value;
        changed
    }

    /// Position of the value along the track, `0..=1`.
    pub fn fraction(&self) -> f32 {
        (self.value - PHASE_MIN) / (PHASE_MAX - PHASE_MIN)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn track(&self) -> Rect {
        self.track
    }

    /// Center of the handle in window pixels.
    pub fn handle_center(&self) -> Vec2 {
        Vec2::new(
            self.track.x + self.track.w * self.fraction(),
            self.track.y + self.track.h * 0.5,
        )
    }

    /// Text shown next to the track.
    pub fn readout(&self) -> String {
        format!("{:.1}", self.value)
    }

    /// Place the track along the bottom of a `width` x `height` window.
    pub fn layout(&mut self, width: f32, height: f32) {
        let w = (width - SIDE_MARGIN * 2.0 - READOUT_WIDTH).max(1.0);
        self.track = Rect {
            x: SIDE_MARGIN,
            y: (height - BOTTOM_MARGIN - TRACK_HEIGHT).max(0.0),
            w,
            h: TRACK_HEIGHT,
        };
    }

    /// Value under a pointer x coordinate.
    pub fn value_at(&self, x: f32) -> f32 {
        if self.track.w <= 0.0 {
            return self.value;
        }
        let t = ((x - self.track.x) / self.track.w).clamp(0.0, 1.0);
        PHASE_MIN + t * (PHASE_MAX - PHASE_MIN)
    }

    /// Move by a number of steps. Returns true if the value changed.
    pub fn nudge(&mut self, steps: f32) -> bool {
        self.set_value(self.value + steps * PHASE_STEP)
    }

    /// Apply this frame's input. Returns true if the value changed.
    pub fn update(&mut self, input: &InputState) -> bool {
        let cursor = input.cursor_position();
        let mut changed = false;

        if input.is_mouse_pressed(MouseButton::Left) && self.track.grow_y(GRAB_MARGIN).contains(cursor) {
            self.dragging = true;
        }
        if self.dragging {
            changed |= self.set_value(self.value_at(cursor.x));
            if !input.is_mouse_held(MouseButton::Left) {
                self.dragging = false;
            }
        }

        if input.is_key_stepped(KeyCode::ArrowRight) {
            changed |= self.nudge(1.0);
        }
        if input.is_key_stepped(KeyCode::ArrowLeft) {
            changed |= self.nudge(-1.0);
        }
        if input.is_key_pressed(KeyCode::Home) {
            changed |= self.set_value(PHASE_MIN);
        }
        if input.is_key_pressed(KeyCode::End) {
            changed |= self.set_value(PHASE_MAX);
        }
        let scroll = input.scroll_lines();
        if scroll != 0.0 {
            changed |= self.nudge(scroll.signum() * scroll.abs().ceil());
        }

        if changed {
            log::debug!("Phase set to {}", self.readout());
        }
        changed
    }
}
