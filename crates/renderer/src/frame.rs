//! Per-frame callbacks the event loop drives.

use thiserror::Error;
use winit::event::WindowEvent;

use crate::renderer::Renderer;

/// Frame failures that should stop the event loop.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("surface ran out of GPU memory")]
    OutOfMemory,
}

/// Scene logic plugged into the window loop.
///
/// `initialize` runs once after the renderer exists, `render_frame` on every
/// redraw and `resize` after the renderer has resized its own targets.
pub trait FrameHandler {
    fn initialize(&mut self, renderer: &mut Renderer) -> anyhow::Result<()>;

    fn render_frame(&mut self, renderer: &mut Renderer, elapsed: f32) -> anyhow::Result<()>;

    fn resize(&mut self, renderer: &mut Renderer, width: u32, height: u32);

    /// Window events before the loop handles them. Return true to consume.
    fn handle_event(&mut self, _event: &WindowEvent) -> bool {
        false
    }

    /// Checked after each event; true ends the loop.
    fn wants_exit(&self) -> bool {
        false
    }
}
