//! Viewer configuration (window, scene constants, shading). Loaded from config.ron at startup.

use glam::Vec3;
use orbit::{clamp_phase, ReliefParams, DEFAULT_MOON_RADIUS, DEFAULT_ORBIT_RADIUS, DEFAULT_PHASE, DEFAULT_SUN_DIRECTION};
use renderer::{MoonMaterial, BACKGROUND_GRAY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::state::ViewMode;

/// Persistent viewer settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_true")]
    pub vsync: bool,
    #[serde(default)]
    pub fullscreen: bool,
    /// Render variant shown at startup.
    #[serde(default)]
    pub mode: ViewMode,
    /// Phase at startup, and the fixed phase when the HUD is disabled.
    #[serde(default = "default_phase")]
    pub initial_phase: f32,
    /// Draw the slider and readout. When false the phase never changes.
    #[serde(default = "default_true")]
    pub show_hud: bool,
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f32,
    #[serde(default = "default_moon_radius")]
    pub moon_radius: f32,
    /// Segments and rings of the UV sphere.
    #[serde(default = "default_sphere_resolution")]
    pub sphere_resolution: u32,
    /// Direction the sunlight travels.
    #[serde(default = "default_sun_direction")]
    pub sun_direction: [f32; 3],
    /// Mosaic cell edge in pixels.
    #[serde(default = "default_cell_size")]
    pub mosaic_cell_size: u32,
    #[serde(default)]
    pub relief: ReliefConfig,
    /// Background gray level, 0..1 display space.
    #[serde(default = "default_background")]
    pub background: f32,
}

/// Relief shader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliefConfig {
    pub noise_scale: f32,
    /// Push along the normal in unit-sphere units (scaled with the moon).
    pub displacement: f32,
    pub time_scale: f32,
    pub ramp_low: [f32; 3],
    pub ramp_high: [f32; 3],
    pub material_color: [f32; 3],
    pub specular_color: [f32; 3],
    pub shininess: f32,
    pub ambient_strength: f32,
}

impl Default for ReliefConfig {
    fn default() -> Self {
        let params = ReliefParams::default();
        let material = MoonMaterial::relief();
        Self {
            noise_scale: params.noise_scale,
            displacement: params.displacement,
            time_scale: params.time_scale,
            ramp_low: material.ramp_low,
            ramp_high: material.ramp_high,
            material_color: material.material_color,
            specular_color: material.specular_color,
            shininess: material.shininess,
            ambient_strength: material.ambient_strength,
        }
    }
}

impl ReliefConfig {
    pub fn params(&self) -> ReliefParams {
        ReliefParams {
            noise_scale: self.noise_scale,
            displacement: self.displacement,
            time_scale: self.time_scale,
        }
    }

    pub fn material(&self) -> MoonMaterial {
        MoonMaterial {
            ramp_low: self.ramp_low,
            ramp_high: self.ramp_high,
            material_color: self.material_color,
            specular_color: self.specular_color,
            shininess: self.shininess,
            ambient_strength: self.ambient_strength,
            ..MoonMaterial::relief()
        }
    }
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}
fn default_phase() -> f32 {
    DEFAULT_PHASE
}
fn default_orbit_radius() -> f32 {
    DEFAULT_ORBIT_RADIUS
}
fn default_moon_radius() -> f32 {
    DEFAULT_MOON_RADIUS
}
fn default_sphere_resolution() -> u32 {
    96
}
fn default_sun_direction() -> [f32; 3] {
    DEFAULT_SUN_DIRECTION.to_array()
}
fn default_cell_size() -> u32 {
    20
}
fn default_background() -> f32 {
    BACKGROUND_GRAY
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            vsync: default_true(),
            fullscreen: false,
            mode: ViewMode::default(),
            initial_phase: default_phase(),
            show_hud: default_true(),
            orbit_radius: default_orbit_radius(),
            moon_radius: default_moon_radius(),
            sphere_resolution: default_sphere_resolution(),
            sun_direction: default_sun_direction(),
            mosaic_cell_size: default_cell_size(),
            relief: ReliefConfig::default(),
            background: default_background(),
        }
    }
}

impl AppConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(data) => match Self::from_ron(&data) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("No config at {:?}, using defaults", path);
                Self::default()
            }
        };
        config.sanitized()
    }

    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Clamp values into ranges the scene can use.
    pub fn sanitized(mut self) -> Self {
        if !self.initial_phase.is_finite() {
            log::warn!("initial_phase is not a number, using {}", DEFAULT_PHASE);
            self.initial_phase = DEFAULT_PHASE;
        }
        self.initial_phase = clamp_phase(self.initial_phase);
        self.mosaic_cell_size = self.mosaic_cell_size.max(1);
        self.sphere_resolution = self.sphere_resolution.clamp(3, 512);
        self.orbit_radius = positive_or(self.orbit_radius, DEFAULT_ORBIT_RADIUS, "orbit_radius");
        self.moon_radius = positive_or(self.moon_radius, DEFAULT_MOON_RADIUS, "moon_radius");
        if self.moon_radius >= self.orbit_radius {
            log::warn!(
                "moon_radius {} does not fit inside orbit_radius {}, using defaults",
                self.moon_radius,
                self.orbit_radius
            );
            self.orbit_radius = DEFAULT_ORBIT_RADIUS;
            self.moon_radius = DEFAULT_MOON_RADIUS;
        }
        self.background = if self.background.is_finite() {
            self.background.clamp(0.0, 1.0)
        } else {
            BACKGROUND_GRAY
        };

        let sun = Vec3::from_array(self.sun_direction);
        self.sun_direction = match sun.try_normalize() {
            Some(dir) => dir.to_array(),
            None => {
                log::warn!("sun_direction {:?} has no length, using default", self.sun_direction);
                DEFAULT_SUN_DIRECTION.normalize().to_array()
            }
        };
        self
    }
}

fn positive_or(value: f32, fallback: f32, name: &str) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("{} must be positive, got {}, using {}", name, value, fallback);
        fallback
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config = AppConfig::from_ron("(mode: Mosaic, mosaic_cell_size: 8, relief: (shininess: 32.0))").unwrap();
        assert_eq!(config.mode, ViewMode::Mosaic);
        assert_eq!(config.mosaic_cell_size, 8);
        assert_eq!(config.relief.shininess, 32.0);
        assert_eq!(config.relief.noise_scale, 4.0);
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.initial_phase, 15.0);
        assert!(config.show_hud);
    }

    #[test]
    fn empty_struct_equals_default() {
        assert_eq!(AppConfig::from_ron("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(AppConfig::from_ron("(mode: Sideways)").is_err());
        assert!(AppConfig::from_ron("not ron at all").is_err());
    }

    #[test]
    fn sanitize_clamps_and_normalizes() {
        let config = AppConfig {
            initial_phase: 42.0,
            mosaic_cell_size: 0,
            sphere_resolution: 1,
            moon_radius: -5.0,
            sun_direction: [0.0, 0.0, 0.0],
            background: 3.0,
            ..AppConfig::default()
        }
        .sanitized();
        assert_eq!(config.initial_phase, 30.0);
        assert_eq!(config.mosaic_cell_size, 1);
        assert_eq!(config.sphere_resolution, 3);
        assert_eq!(config.moon_radius, DEFAULT_MOON_RADIUS);
        assert_eq!(config.background, 1.0);
        let sun = Vec3::from_array(config.sun_direction);
        assert!((sun.length() - 1.0).abs() < 1e-5);
        assert!(sun.x < 0.0 && sun.z > 0.0);
    }

    #[test]
    fn sun_direction_is_normalized() {
        let config = AppConfig {
            sun_direction: [0.0, 0.0, 4.0],
            ..AppConfig::default()
        }
        .sanitized();
        assert_eq!(config.sun_direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::load_from(Path::new("definitely/not/here/config.ron"));
        assert_eq!(config, AppConfig::default().sanitized());
    }

    #[test]
    fn relief_block_maps_to_shader_inputs() {
        let relief = ReliefConfig::default();
        assert_eq!(relief.params(), ReliefParams::default());
        assert_eq!(relief.material(), MoonMaterial::relief());
    }
}
