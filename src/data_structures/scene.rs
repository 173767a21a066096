//! The fixed scene: a green ground plane and two white box buildings.
//!
//! All geometry is generated from a handful of constants and uploaded once.
//! Vertices of a building are laid out as two rings of four (front face at
//! `min.y`, back face at `max.y` in footprint space), bottom-top-top-bottom,
//! which lets every face be stitched from the same index pattern.

use std::time::Duration;

use cgmath::{Deg, Matrix4, Point2};

/// Per-vertex data as stored in the vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl SceneVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

pub const GROUND_COLOUR: [f32; 3] = [0.0, 1.0, 0.0];
pub const BUILDING_COLOUR: [f32; 3] = [1.0, 1.0, 1.0];

/// The ground never samples more than one texel.
pub const GROUND: [SceneVertex; 4] = [
    ground_vertex(-5.0, -5.0),
    ground_vertex(5.0, -5.0),
    ground_vertex(5.0, 5.0),
    ground_vertex(-5.0, 5.0),
];

pub const GROUND_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const fn ground_vertex(x: f32, z: f32) -> SceneVertex {
    SceneVertex {
        position: [x, 0.0, z],
        color: GROUND_COLOUR,
        tex_coords: [0.0, 0.0],
    }
}

/// An axis-aligned box standing on the ground.
///
/// `min`/`max` span the footprint in the XZ plane (`Point2::y` is world Z).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Building {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
    pub height: f32,
}

/// Face quads over a building's eight vertices; each is split into two
/// triangles sharing the first corner.
const BUILDING_FACES: [[u32; 4]; 6] = [
    [0, 1, 2, 3],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
    [4, 5, 6, 7],
];

impl Building {
    pub const VERTEX_COUNT: usize = 8;
    pub const INDEX_COUNT: usize = 36;

    pub const fn new(min: (f32, f32), max: (f32, f32), height: f32) -> Self {
        Self {
            min: Point2 { x: min.0, y: min.1 },
            max: Point2 { x: max.0, y: max.1 },
            height,
        }
    }

    pub fn vertices(&self) -> [SceneVertex; Self::VERTEX_COUNT] {
        let (x0, x1) = (self.min.x, self.max.x);
        let h = self.height;
        let ring = |z: f32| {
            [
                ([x0, 0.0, z], [0.0, 1.0]),
                ([x0, h, z], [0.0, 0.0]),
                ([x1, h, z], [1.0, 0.0]),
                ([x1, 0.0, z], [1.0, 1.0]),
            ]
        };
        let [a, b, c, d] = ring(self.min.y);
        let [e, f, g, k] = ring(self.max.y);
        [a, b, c, d, e, f, g, k].map(|(position, tex_coords)| SceneVertex {
            position,
            color: BUILDING_COLOUR,
            tex_coords,
        })
    }

    /// Triangle list indices, offset by `base` (the index of this building's
    /// first vertex in the shared buffer).
    pub fn indices(&self, base: u32) -> [u32; Self::INDEX_COUNT] {
        let mut out = [0; Self::INDEX_COUNT];
        for (face, [a, b, c, d]) in BUILDING_FACES.iter().enumerate() {
            let tri = [a, b, c, c, d, a].map(|i| i + base);
            out[face * 6..face * 6 + 6].copy_from_slice(&tri);
        }
        out
    }
}

pub const BUILDINGS: [Building; 2] = [
    Building::new((-1.0, -1.0), (1.0, 1.0), 2.0),
    Building::new((2.0, 2.0), (4.0, 4.0), 3.0),
];

/// CPU-side copy of everything that goes into the vertex and index buffers.
#[derive(Debug, Clone)]
pub struct SceneGeometry {
    pub vertices: Vec<SceneVertex>,
    pub indices: Vec<u32>,
}

impl SceneGeometry {
    pub fn new() -> Self {
        let mut vertices = GROUND.to_vec();
        let mut indices = GROUND_INDICES.to_vec();
        for building in &BUILDINGS {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&building.vertices());
            indices.extend_from_slice(&building.indices(base));
        }
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

impl Default for SceneGeometry {
    fn default() -> Self {
        Self::new()
    }
}

/// The whole scene turns around +Y at `spin` per second.
pub fn model_matrix(elapsed: Duration, spin: Deg<f32>) -> Matrix4<f32> {
    Matrix4::from_angle_y(Deg(spin.0 * elapsed.as_secs_f32()))
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector4};

    use super::*;

    #[test]
    fn counts_match_fixed_scene() {
        let geometry = SceneGeometry::new();
        assert_eq!(geometry.vertex_count(), 20);
        assert_eq!(geometry.index_count(), 78);
        assert_eq!(geometry.index_count() % 3, 0);
    }

    #[test]
    fn indices_stay_in_bounds() {
        let geometry = SceneGeometry::new();
        let n = geometry.vertex_count() as u32;
        assert!(geometry.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn first_building_layout() {
        let v = BUILDINGS[0].vertices();
        let positions: Vec<[f32; 3]> = v.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [-1.0, 0.0, -1.0],
                [-1.0, 2.0, -1.0],
                [1.0, 2.0, -1.0],
                [1.0, 0.0, -1.0],
                [-1.0, 0.0, 1.0],
                [-1.0, 2.0, 1.0],
                [1.0, 2.0, 1.0],
                [1.0, 0.0, 1.0],
            ]
        );
        assert_eq!(v[0].tex_coords, [0.0, 1.0]);
        assert_eq!(v[6].tex_coords, [1.0, 0.0]);
        assert!(v.iter().all(|v| v.color == BUILDING_COLOUR));
    }

    #[test]
    fn second_building_indices_are_offset() {
        let geometry = SceneGeometry::new();
        assert_eq!(
            &geometry.indices[42..54],
            &[12, 13, 14, 14, 15, 12, 12, 13, 17, 17, 16, 12]
        );
        assert_eq!(&geometry.indices[72..], &[16, 17, 18, 18, 19, 16]);
    }

    #[test]
    fn ground_is_flat_and_green() {
        let geometry = SceneGeometry::new();
        for v in &geometry.vertices[..4] {
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.color, GROUND_COLOUR);
        }
        assert_eq!(&geometry.indices[..6], &GROUND_INDICES);
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SceneVertex>(), 32);
        let desc = SceneVertex::desc();
        assert_eq!(desc.array_stride, 32);
        let offsets: Vec<_> = desc.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn model_spins_fifty_degrees_per_second() {
        let model = model_matrix(Duration::from_secs(0), Deg(50.0));
        assert_eq!(model, Matrix4::from_angle_y(Deg(0.0)));

        let model = model_matrix(Duration::from_millis(1800), Deg(50.0));
        let x = model * Vector4::new(1.0, 0.0, 0.0, 0.0);
        // 90 degrees about +Y sends +X to -Z.
        assert!((x.truncate() - cgmath::Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
    }
}
