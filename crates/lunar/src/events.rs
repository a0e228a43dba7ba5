//! Window event handling: routes input to the frame handler and drives redraws.

use engine_core::Time;
use renderer::{FrameError, FrameHandler, Renderer};
use winit::event::WindowEvent;

/// A renderer paired with the scene it draws.
pub struct AppState<H> {
    pub renderer: Renderer,
    pub handler: H,
    pub time: Time,
}

impl<H: FrameHandler> AppState<H> {
    pub fn new(mut renderer: Renderer, mut handler: H) -> anyhow::Result<Self> {
        handler.initialize(&mut renderer)?;
        Ok(Self {
            renderer,
            handler,
            time: Time::new(),
        })
    }

    /// Handle a window event. Returns true if the app should exit.
    pub fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        if self.handler.handle_event(&event) {
            return self.handler.wants_exit();
        }

        match event {
            WindowEvent::CloseRequested => true,
            WindowEvent::Resized(size) => {
                self.renderer.resize(size);
                let (w, h) = self.renderer.dimensions();
                self.handler.resize(&mut self.renderer, w, h);
                false
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.renderer.window.inner_size();
                self.renderer.resize(size);
                let (w, h) = self.renderer.dimensions();
                self.handler.resize(&mut self.renderer, w, h);
                false
            }
            WindowEvent::RedrawRequested => {
                self.time.update();
                let elapsed = self.time.elapsed_seconds();
                if let Err(e) = self.handler.render_frame(&mut self.renderer, elapsed) {
                    if let Some(FrameError::OutOfMemory) = e.downcast_ref::<FrameError>() {
                        log::error!("Render error: {}, exiting", e);
                        return true;
                    }
                    log::error!("Render error: {}", e);
                }
                if self.time.frame_count() % 600 == 0 {
                    log::debug!("{:.0} fps", self.time.fps());
                }
                self.renderer.window.request_redraw();
                self.handler.wants_exit()
            }
            _ => false,
        }
    }
}
