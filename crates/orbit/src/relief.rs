//! CPU mirror of the relief displacement in `moon_relief.wgsl`.
//!
//! The shader is the source of truth at runtime; this copy exists so the
//! displacement rule can be checked numerically. Keep both in step.

use glam::{Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

/// Parameters of the vertex displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliefParams {
    /// Frequency of the noise over the unit sphere.
    pub noise_scale: f32,
    /// Maximum push along the normal, in unit-sphere units.
    pub displacement: f32,
    /// How fast the noise field drifts per second.
    pub time_scale: f32,
}

impl Default for ReliefParams {
    fn default() -> Self {
        Self {
            noise_scale: 4.0,
            displacement: 0.1,
            time_scale: 0.2,
        }
    }
}

/// A displaced vertex and its noise value remapped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliefSample {
    pub position: Vec3,
    pub noise: f32,
}

/// Displace an object-space vertex along its normal.
pub fn displace(position: Vec3, normal: Vec3, params: &ReliefParams, time: f32) -> ReliefSample {
    let n = simplex3(position * params.noise_scale + Vec3::splat(time * params.time_scale));
    ReliefSample {
        position: position + normal * (n * params.displacement),
        noise: n * 0.5 + 0.5,
    }
}

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + Vec4::ONE) * x)
}

fn taylor_inv_sqrt(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - r * 0.853_734_7
}

/// `step(edge, x)`: 1 where `x >= edge`, else 0.
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmplt(edge), Vec3::ZERO, Vec3::ONE)
}

fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(x.cmplt(edge), Vec4::ZERO, Vec4::ONE)
}

/// 3D simplex noise (Ashima Arts / Stefan Gustavson), roughly in `[-1, 1]`.
pub fn simplex3(v: Vec3) -> f32 {
    let c = Vec2::new(1.0 / 6.0, 1.0 / 3.0);
    let d = Vec4::new(0.0, 0.5, 1.0, 2.0);

    // First corner
    let i = (v + Vec3::splat(v.dot(Vec3::splat(c.y)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(c.x)));

    // Other corners
    let g = step3(x0.yzx(), x0);
    let l = Vec3::ONE - g;
    let i1 = g.min(l.zxy());
    let i2 = g.max(l.zxy());

    let x1 = x0 - i1 + Vec3::splat(c.x);
    let x2 = x0 - i2 + Vec3::splat(c.y);
    let x3 = x0 - Vec3::splat(d.y);

    // Permutations
    let i = mod289_3(i);
    let p = permute(
        permute(
            permute(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients: 7x7 points over a square, mapped onto an octahedron.
    let n_ = 1.0 / 7.0;
    let ns = n_ * d.wyz() - d.xzx();

    let j = p - 49.0 * (p * ns.z * ns.z).floor();
    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + Vec4::ONE;
    let s1 = b1.floor() * 2.0 + Vec4::ONE;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = b0.xzyw() + s0.xzyw() * sh.xxyy();
    let a1 = b1.xzyw() + s1.xzyw() * sh.zzww();

    let p0 = Vec3::new(a0.x, a0.y, h.x);
    let p1 = Vec3::new(a0.z, a0.w, h.y);
    let p2 = Vec3::new(a1.x, a1.y, h.z);
    let p3 = Vec3::new(a1.z, a1.w, h.w);

    // Normalise gradients
    let norm = taylor_inv_sqrt(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    let p0 = p0 * norm.x;
    let p1 = p1 * norm.y;
    let p2 = p2 * norm.z;
    let p3 = p3 * norm.w;

    // Mix final noise value
    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
        .max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> impl Iterator<Item = Vec3> {
        (0..12).flat_map(|x| {
            (0..12).flat_map(move |y| {
                (0..6).map(move |z| Vec3::new(x as f32 * 0.37 - 2.0, y as f32 * 0.41 - 2.5, z as f32 * 0.53))
            })
        })
    }

    #[test]
    fn noise_is_bounded() {
        for p in grid() {
            let n = simplex3(p);
            assert!(n.is_finite());
            assert!((-1.05..=1.05).contains(&n), "noise {n} out of range at {p:?}");
        }
    }

    #[test]
    fn noise_is_deterministic_and_varies() {
        let values: Vec<f32> = grid().map(simplex3).collect();
        let again: Vec<f32> = grid().map(simplex3).collect();
        assert_eq!(values, again);

        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!(max - min > 0.5, "noise field looks flat: {min}..{max}");
    }

    #[test]
    fn noise_is_continuous() {
        for p in grid() {
            let a = simplex3(p);
            let b = simplex3(p + Vec3::splat(1e-3));
            assert!((a - b).abs() < 0.05);
        }
    }

    #[test]
    fn displacement_moves_only_along_the_normal() {
        let params = ReliefParams::default();
        let normal = Vec3::new(1.0, 2.0, -0.5).normalize();
        let sample = displace(normal, normal, &params, 3.0);

        let offset = sample.position - normal;
        assert!(offset.cross(normal).length() < 1e-5);
        assert!(offset.length() <= params.displacement * 1.05);
        assert!((-0.05..=1.05).contains(&sample.noise));
    }

    #[test]
    fn zero_displacement_keeps_the_sphere() {
        let params = ReliefParams {
            displacement: 0.0,
            ..Default::default()
        };
        let p = Vec3::new(0.0, 0.6, 0.8);
        assert_eq!(displace(p, p, &params, 12.0).position, p);
    }

    #[test]
    fn noise_matches_shader_formula_values() {
        // snoise() from moon_relief.wgsl evaluated in double precision.
        let expected = [
            (Vec3::new(1.5, -2.25, 0.4), -0.237544),
            (Vec3::new(-0.65, 1.9, -3.3), -0.338172),
            (Vec3::new(0.0, 0.0, 0.5), -0.162913),
            (Vec3::new(0.25, 0.5, 0.75), -0.267215),
            (Vec3::new(4.0, -0.5, 1.25), 0.308834),
        ];
        for (p, want) in expected {
            let got = simplex3(p);
            assert!((got - want).abs() < 1e-3, "simplex3({p:?}) = {got}, expected {want}");
        }
    }
}
