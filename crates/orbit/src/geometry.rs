//! Orbit placement, tidal lock and the camera's view of the sun.
//!
//! Angles in the orbital plane are measured from +X toward +Z, so a point
//! at angle `a` and distance `r` sits at `(r cos a, 0, r sin a)`.

use std::f32::consts::{PI, TAU};

use engine_core::Transform;
use glam::{Mat4, Quat, Vec3};

use crate::phase::{clamp_phase, phase_offset};

/// Direction light travels from the sun, before normalization.
pub const DEFAULT_SUN_DIRECTION: Vec3 = Vec3::new(-1.0, 0.0, 0.5);
/// Distance from the camera to the moon's center.
pub const DEFAULT_ORBIT_RADIUS: f32 = 300.0;
/// Radius of the moon sphere.
pub const DEFAULT_MOON_RADIUS: f32 = 80.0;

/// The static directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLight {
    direction: Vec3,
}

impl Default for SunLight {
    fn default() -> Self {
        Self::new(DEFAULT_SUN_DIRECTION)
    }
}

impl SunLight {
    /// Build from the direction light travels. A zero or non-finite vector falls back to the default.
    pub fn new(direction: Vec3) -> Self {
        let direction = match direction.try_normalize() {
            Some(d) => d,
            None => {
                log::warn!("Sun direction {:?} cannot be normalized, using default", direction);
                DEFAULT_SUN_DIRECTION.normalize()
            }
        };
        Self { direction }
    }

    /// Unit vector along which light travels.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Unit vector pointing from a lit surface toward the sun.
    pub fn to_sun(&self) -> Vec3 {
        -self.direction
    }

    /// Angle of the light direction projected onto the orbital plane.
    pub fn azimuth(&self) -> f32 {
        self.direction.z.atan2(self.direction.x)
    }
}

/// Where the moon is this frame. Derived from the phase, never stored across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Clamped phase the state was built from.
    pub phase: f32,
    /// Orbital angle in `[0, 2π)`.
    pub angle: f32,
    /// Moon center in world space.
    pub position: Vec3,
    pub radius: f32,
}

impl OrbitState {
    pub fn from_phase(phase: f32, sun: &SunLight, radius: f32) -> Self {
        let phase = clamp_phase(phase);
        let angle = (sun.azimuth() + phase_offset(phase)).rem_euclid(TAU);
        let position = Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin());
        Self {
            phase,
            angle,
            position,
            radius,
        }
    }

    /// Yaw that keeps the moon's +X face pointed at the camera: `(angle + π) mod 2π`.
    pub fn tidal_lock_yaw(&self) -> f32 {
        (self.angle + PI).rem_euclid(TAU)
    }

    /// Rotation about +Y by the tidal-lock yaw, measured like orbital angles.
    pub fn rotation(&self) -> Quat {
        // glam turns +X toward -Z for positive angles; orbital angles turn toward +Z.
        Quat::from_rotation_y(-self.tidal_lock_yaw())
    }

    /// Transform placing a unit sphere as the moon.
    pub fn transform(&self, moon_radius: f32) -> Transform {
        Transform::from_position_rotation(self.position, self.rotation()).with_uniform_scale(moon_radius)
    }

    pub fn model_matrix(&self, moon_radius: f32) -> Mat4 {
        self.transform(moon_radius).to_matrix()
    }
}

/// Orthonormal camera basis for an eye at the origin looking at a target with +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl EyeBasis {
    pub fn looking_at(target: Vec3) -> Self {
        let forward = target.normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);
        Self { forward, right, up }
    }

    /// Express a world-space direction in eye space (camera looks down -Z).
    pub fn to_eye(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.right), v.dot(self.up), -v.dot(self.forward))
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::ZERO, self.forward, Vec3::Y)
    }
}

/// Eye-space vector toward the sun for a camera at the origin looking at the moon.
pub fn sun_in_eye_space(orbit: &OrbitState, sun: &SunLight) -> Vec3 {
    EyeBasis::looking_at(orbit.position).to_eye(sun.to_sun())
}
