//! Mesh data structures and the moon sphere.

use crate::vertex::Vertex;
use glam::Vec3;
use wgpu::util::DeviceExt;

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Create a mesh from vertex and index data.
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// Upload a unit UV sphere with the given resolution.
    pub fn sphere(device: &wgpu::Device, segments: u32, rings: u32) -> Self {
        MeshData::uv_sphere(segments, rings).upload(device)
    }
}

/// Mesh data before GPU upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit-radius UV sphere, counter-clockwise when seen from outside.
    ///
    /// Positions double as normals, so noise sampled on positions sticks to
    /// the surface regardless of the model scale.
    pub fn uv_sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = std::f32::consts::TAU * segment as f32 / segments as f32;
                let position = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                let normal = position.normalize();
                let uv = [segment as f32 / segments as f32, ring as f32 / rings as f32];
                vertices.push(Vertex::new(position.into(), normal.into(), uv));
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        Self { vertices, indices }
    }

    pub fn upload(&self, device: &wgpu::Device) -> Mesh {
        Mesh::new(device, &self.vertices, &self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_counts_match_resolution() {
        let mesh = MeshData::uv_sphere(96, 96);
        assert_eq!(mesh.vertices.len(), 97 * 97);
        assert_eq!(mesh.indices.len(), 96 * 96 * 6);
        let max = *mesh.indices.iter().max().unwrap();
        assert!((max as usize) < mesh.vertices.len());
    }

    #[test]
    fn sphere_vertices_are_on_the_unit_sphere_with_outward_normals() {
        let mesh = MeshData::uv_sphere(24, 16);
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(p.dot(n) > 0.999);
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_outside() {
        let mesh = MeshData::uv_sphere(24, 16);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let face = (b - a).cross(c - a);
            if face.length() < 1e-6 {
                continue; // collapsed triangle at a pole
            }
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn tiny_resolution_is_raised_to_a_closed_shape() {
        let mesh = MeshData::uv_sphere(0, 0);
        assert_eq!(mesh.vertices.len(), 3 * 4);
        assert_eq!(mesh.indices.len(), 3 * 2 * 6);
    }
}
