//! UV sphere shared by every body.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Vertex layout: position (vec3), normal (vec3), uv (vec2).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl SphereVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// A unit sphere tessellated into latitude rows and longitude columns.
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Build a sphere with `width_segments` columns and `height_segments` rows.
    ///
    /// The seam column is duplicated so the equirectangular texture wraps
    /// cleanly; pole rows emit one triangle per column instead of two.
    pub fn uv_sphere(width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row_len = width_segments + 1;

        let mut vertices = Vec::with_capacity((row_len * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();
                let position = Vec3::new(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
                vertices.push(SphereVertex {
                    position: position.to_array(),
                    normal: position.normalize_or_zero().to_array(),
                    uv: [u, v],
                });
            }
        }

        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row_len + ix + 1;
                let b = iy * row_len + ix;
                let c = (iy + 1) * row_len + ix;
                let d = (iy + 1) * row_len + ix + 1;

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_triangle_counts() {
        let mesh = SphereMesh::uv_sphere(32, 32);
        assert_eq!(mesh.vertices.len(), 33 * 33);
        // Two triangles per quad, minus one per column at each pole.
        assert_eq!(mesh.triangle_count(), 32 * (2 * 32 - 2));
    }

    #[test]
    fn test_vertices_on_unit_sphere() {
        let mesh = SphereMesh::uv_sphere(32, 32);
        for vertex in &mesh.vertices {
            let len = Vec3::from(vertex.position).length();
            assert!((len - 1.0).abs() < 1e-5, "vertex length {len}");
        }
    }

    #[test]
    fn test_normals_match_positions() {
        let mesh = SphereMesh::uv_sphere(16, 8);
        for vertex in mesh.vertices.iter().filter(|v| v.uv[1] > 0.0 && v.uv[1] < 1.0) {
            let diff = Vec3::from(vertex.normal) - Vec3::from(vertex.position);
            assert!(diff.length() < 1e-5);
        }
    }

    #[test]
    fn test_uvs_in_range() {
        let mesh = SphereMesh::uv_sphere(32, 32);
        for vertex in &mesh.vertices {
            assert!((0.0..=1.0).contains(&vertex.uv[0]));
            assert!((0.0..=1.0).contains(&vertex.uv[1]));
        }
    }

    #[test]
    fn test_indices_valid() {
        let mesh = SphereMesh::uv_sphere(32, 32);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_triangles_face_outward() {
        let mesh = SphereMesh::uv_sphere(12, 6);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn test_degenerate_segments_are_raised() {
        let mesh = SphereMesh::uv_sphere(0, 0);
        assert_eq!(mesh.vertices.len(), 4 * 3);
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<SphereVertex>(), 32);
        assert_eq!(SphereVertex::layout().array_stride, 32);
    }
}
