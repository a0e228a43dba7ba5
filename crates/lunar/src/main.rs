//! Lunar Phases: a moon orbiting a fixed camera, lit by a fixed sun, with the
//! phase driven by an on-screen slider.

mod config;
mod events;
mod render;
mod state;

use anyhow::Result;
use renderer::Renderer;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use config::AppConfig;
use events::AppState;
use state::MoonScene;

/// Application handler for winit.
struct App {
    config: AppConfig,
    state: Option<AppState<MoonScene>>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self { config, state: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let mut window_attrs = Window::default_attributes()
            .with_title("Lunar Phases")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        if self.config.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let state = pollster::block_on(Renderer::new(window.clone(), self.config.vsync))
            .and_then(|renderer| AppState::new(renderer, MoonScene::new(&self.config)));
        match state {
            Ok(s) => {
                self.state = Some(s);
                window.request_redraw();
            }
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) {
                event_loop.exit();
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Lunar Phases");
    println!("  Drag the slider, Left/Right or the wheel to change the phase (Home/End jump).");
    println!("  1 Lit | 2 Relief | 3 Mosaic | H toggle HUD | F12 screenshot | Esc quit");

    let config = AppConfig::load();
    log::info!("Starting in {} mode at phase {:.1}", config.mode.label(), config.initial_phase);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
