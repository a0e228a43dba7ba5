//! Scene state: the moon, its controls and the active render variant.

use std::path::PathBuf;

use anyhow::Result;
use glam::Vec3;
use input::{InputState, KeyCode, PhaseSlider};
use orbit::{illuminated_fraction, sun_in_eye_space, OrbitState, PhaseName, ReliefParams, SunLight};
use renderer::{mosaic_image, to_image, Camera, FrameHandler, Mesh, MoonMaterial, MoonShading, Renderer};
use serde::{Deserialize, Serialize};
use winit::event::WindowEvent;

use crate::config::AppConfig;
use crate::render;

/// Which rendering of the moon is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    /// Gray Phong-lit sphere.
    Lit,
    /// Noise-displaced sphere with the color ramp.
    #[default]
    Relief,
    /// Lit sphere averaged into flat cells.
    Mosaic,
}

impl ViewMode {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Digit1 | KeyCode::Numpad1 => Some(ViewMode::Lit),
            KeyCode::Digit2 | KeyCode::Numpad2 => Some(ViewMode::Relief),
            KeyCode::Digit3 | KeyCode::Numpad3 => Some(ViewMode::Mosaic),
            _ => None,
        }
    }

    /// Shader used for the sphere itself. Mosaic averages the lit render.
    pub fn shading(self) -> MoonShading {
        match self {
            ViewMode::Relief => MoonShading::Relief,
            ViewMode::Lit | ViewMode::Mosaic => MoonShading::Lit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Lit => "Lit",
            ViewMode::Relief => "Relief",
            ViewMode::Mosaic => "Mosaic",
        }
    }
}

/// Everything the frame loop needs besides the renderer.
pub struct MoonScene {
    pub(crate) mode: ViewMode,
    pub(crate) slider: PhaseSlider,
    /// False when the HUD is disabled in config: the phase stays fixed.
    pub(crate) slider_enabled: bool,
    /// Runtime HUD visibility (H).
    pub(crate) hud_visible: bool,
    pub(crate) input: InputState,
    pub(crate) camera: Camera,
    pub(crate) mesh: Option<Mesh>,

    pub(crate) sun: SunLight,
    pub(crate) orbit_radius: f32,
    pub(crate) moon_radius: f32,
    pub(crate) sphere_resolution: u32,
    pub(crate) mosaic_cell_size: u32,
    pub(crate) relief: ReliefParams,
    pub(crate) relief_material: MoonMaterial,
    pub(crate) lit_material: MoonMaterial,
    pub(crate) initial_phase: f32,
    pub(crate) background: f32,

    pub(crate) screenshot_requested: bool,
    pub(crate) exit_requested: bool,
    title: String,
}

impl MoonScene {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            mode: config.mode,
            slider: PhaseSlider::new(config.initial_phase),
            slider_enabled: config.show_hud,
            hud_visible: config.show_hud,
            input: InputState::new(),
            camera: Camera::default(),
            mesh: None,
            sun: SunLight::new(Vec3::from_array(config.sun_direction)),
            orbit_radius: config.orbit_radius,
            moon_radius: config.moon_radius,
            sphere_resolution: config.sphere_resolution,
            mosaic_cell_size: config.mosaic_cell_size,
            relief: config.relief.params(),
            relief_material: config.relief.material(),
            lit_material: MoonMaterial::lit(),
            initial_phase: config.initial_phase,
            background: config.background,
            screenshot_requested: false,
            exit_requested: false,
            title: String::new(),
        }
    }

    /// Phase used this frame. Without a slider it is the configured initial phase.
    pub fn phase(&self) -> f32 {
        if self.slider_enabled {
            self.slider.value()
        } else {
            self.initial_phase
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode != self.mode {
            log::info!("View mode: {}", mode.label());
            self.mode = mode;
        }
    }

    fn material(&self) -> &MoonMaterial {
        match self.mode.shading() {
            MoonShading::Relief => &self.relief_material,
            MoonShading::Lit => &self.lit_material,
        }
    }

    /// Window title: mode, phase, name and lit percentage.
    pub fn title_for(&self, phase: f32) -> String {
        format!(
            "Lunar Phases | {} | phase {:.1} | {} | {:.0}% lit",
            self.mode.label(),
            phase,
            PhaseName::from_phase(phase),
            illuminated_fraction(phase) * 100.0
        )
    }

    /// Apply keys that act on the scene rather than the slider.
    fn apply_shortcuts(&mut self) {
        const MODE_KEYS: [KeyCode; 6] = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Numpad1,
            KeyCode::Numpad2,
            KeyCode::Numpad3,
        ];
        for key in MODE_KEYS {
            if self.input.is_key_pressed(key) {
                if let Some(mode) = ViewMode::from_key(key) {
                    self.set_mode(mode);
                }
            }
        }
        if self.input.is_key_pressed(KeyCode::KeyH) {
            self.hud_visible = !self.hud_visible;
            log::info!("HUD {}", if self.hud_visible { "shown" } else { "hidden" });
        }
        if self.input.is_key_pressed(KeyCode::F12) {
            self.screenshot_requested = true;
        }
        if self.input.is_key_pressed(KeyCode::Escape) {
            self.exit_requested = true;
        }
    }

    /// Advance controls and push this frame's uniforms.
    pub(crate) fn update(&mut self, renderer: &mut Renderer, elapsed: f32) {
        self.apply_shortcuts();
        // A hidden slider keeps its value but takes no input.
        if self.slider_enabled && self.hud_visible {
            self.slider.update(&self.input);
        }

        let phase = self.phase();
        let orbit = OrbitState::from_phase(phase, &self.sun, self.orbit_radius);
        self.camera.look_at_moon(&orbit);
        renderer.update_camera(&self.camera);
        renderer.update_moon(
            orbit.model_matrix(self.moon_radius),
            sun_in_eye_space(&orbit, &self.sun),
            self.material(),
            &self.relief,
            elapsed,
        );

        let title = self.title_for(phase);
        if title != self.title {
            renderer.window().set_title(&title);
            self.title = title;
        }
    }

    /// Save the offscreen scene to a PNG in the current directory.
    /// Cell size to mosaic a screenshot with, so it matches what is on screen.
    fn screenshot_cell_size(&self) -> Option<u32> {
        match self.mode {
            ViewMode::Mosaic => Some(self.mosaic_cell_size),
            ViewMode::Lit | ViewMode::Relief => None,
        }
    }

    pub(crate) fn save_screenshot(&self, renderer: &Renderer) -> Result<PathBuf> {
        let mesh = self
            .mesh
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("scene is not initialized"))?;
        let cell_size = self.screenshot_cell_size();
        let image = renderer.read_scene(mesh, self.mode.shading(), |pixels| match cell_size {
            Some(cell_size) => mosaic_image(pixels, cell_size),
            None => to_image(pixels),
        })?;
        let path = PathBuf::from(format!("lunar-phase-{:04.1}.png", self.phase()));
        image.save(&path)?;
        Ok(path)
    }
}

impl FrameHandler for MoonScene {
    fn initialize(&mut self, renderer: &mut Renderer) -> Result<()> {
        self.mesh = Some(Mesh::sphere(renderer.device(), self.sphere_resolution, self.sphere_resolution));
        renderer.set_background(self.background);
        let (w, h) = renderer.dimensions();
        self.resize(renderer, w, h);
        log::info!(
            "Scene ready: {} mode, phase {:.1}, {}x{} sphere",
            self.mode.label(),
            self.phase(),
            self.sphere_resolution,
            self.sphere_resolution
        );
        Ok(())
    }

    fn render_frame(&mut self, renderer: &mut Renderer, elapsed: f32) -> Result<()> {
        self.update(renderer, elapsed);

        if std::mem::take(&mut self.screenshot_requested) {
            match self.save_screenshot(renderer) {
                Ok(path) => log::info!("Saved screenshot to {:?}", path),
                Err(e) => log::error!("Screenshot failed: {}", e),
            }
        }

        let result = render::run(self, renderer);
        self.input.end_frame();
        result
    }

    fn resize(&mut self, _renderer: &mut Renderer, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
        self.slider.layout(width as f32, height as f32);
    }

    fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let winit::keyboard::PhysicalKey::Code(key) = event.physical_key {
                    self.input.process_keyboard(key, event.state);
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.process_mouse_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_cursor_position((position.x, position.y));
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(p) => (p.y / 40.0) as f32,
                };
                self.input.process_scroll(lines);
                true
            }
            _ => false,
        }
    }

    fn wants_exit(&self) -> bool {
        self.exit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input::ElementState;

    #[test]
    fn digits_pick_modes() {
        assert_eq!(ViewMode::from_key(KeyCode::Digit1), Some(ViewMode::Lit));
        assert_eq!(ViewMode::from_key(KeyCode::Numpad2), Some(ViewMode::Relief));
        assert_eq!(ViewMode::from_key(KeyCode::Digit3), Some(ViewMode::Mosaic));
        assert_eq!(ViewMode::from_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn mosaic_averages_the_lit_render() {
        assert_eq!(ViewMode::Mosaic.shading(), MoonShading::Lit);
        assert_eq!(ViewMode::Relief.shading(), MoonShading::Relief);
    }

    #[test]
    fn screenshot_follows_the_mode_on_screen() {
        let config = AppConfig {
            mosaic_cell_size: 12,
            ..AppConfig::default()
        };
        let mut scene = MoonScene::new(&config);
        scene.set_mode(ViewMode::Mosaic);
        assert_eq!(scene.screenshot_cell_size(), Some(12));
        scene.set_mode(ViewMode::Lit);
        assert_eq!(scene.screenshot_cell_size(), None);
        scene.set_mode(ViewMode::Relief);
        assert_eq!(scene.screenshot_cell_size(), None);
    }

    #[test]
    fn disabled_hud_pins_the_initial_phase() {
        let config = AppConfig {
            show_hud: false,
            initial_phase: 7.5,
            ..AppConfig::default()
        };
        let mut scene = MoonScene::new(&config);
        scene.slider.set_value(20.0);
        assert_eq!(scene.phase(), 7.5);
        assert!(!scene.hud_visible);
    }

    #[test]
    fn title_names_the_phase() {
        let scene = MoonScene::new(&AppConfig::default());
        let title = scene.title_for(15.0);
        assert!(title.contains("15.0"), "{title}");
        assert!(title.contains("Full Moon"), "{title}");
        assert!(title.contains("100% lit"), "{title}");
        assert!(scene.title_for(0.0).contains("New Moon"));
    }

    #[test]
    fn shortcuts_switch_mode_hud_and_exit() {
        let mut scene = MoonScene::new(&AppConfig::default());
        scene.input.process_keyboard(KeyCode::Digit3, ElementState::Pressed);
        scene.input.process_keyboard(KeyCode::KeyH, ElementState::Pressed);
        scene.apply_shortcuts();
        assert_eq!(scene.mode, ViewMode::Mosaic);
        assert!(!scene.hud_visible);
        assert!(!scene.wants_exit());

        scene.input.end_frame();
        scene.input.process_keyboard(KeyCode::Escape, ElementState::Pressed);
        scene.apply_shortcuts();
        assert!(scene.wants_exit());
    }
}
