//! Cube mesh uploaded once for the manual pass
//!
//! 24 vertices (4 per face, so every face gets flat per-vertex colors) and
//! 36 indices, 2 triangles per face.

use crate::context::{BufferDesc, BufferId, BufferKind, GraphicsContext};
use crate::error::SetupError;

/// Vertices in the cube mesh
pub const CUBE_VERTEX_COUNT: usize = 24;

/// Indices in the cube mesh
pub const CUBE_INDEX_COUNT: u32 = 36;

/// Vertex positions, 4 per face: back, front, left, right, bottom, top
#[rustfmt::skip]
pub const CUBE_POSITIONS: [f32; CUBE_VERTEX_COUNT * 3] = [
    -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,
    -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,
    -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,
     1.0, -1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
    -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,   1.0,  1.0, -1.0,
];

/// Per-vertex RGB colors, one flat color per face
#[rustfmt::skip]
pub const CUBE_COLORS: [f32; CUBE_VERTEX_COUNT * 3] = [
    0.5, 0.3, 0.7,  0.5, 0.3, 0.7,  0.5, 0.3, 0.7,  0.5, 0.3, 0.7,
    1.0, 1.0, 0.3,  1.0, 1.0, 0.3,  1.0, 1.0, 0.3,  1.0, 1.0, 0.3,
    0.0, 0.0, 1.0,  0.0, 0.0, 1.0,  0.0, 0.0, 1.0,  0.0, 0.0, 1.0,
    1.0, 0.0, 0.0,  1.0, 0.0, 0.0,  1.0, 0.0, 0.0,  1.0, 0.0, 0.0,
    1.0, 1.0, 0.0,  1.0, 1.0, 0.0,  1.0, 1.0, 0.0,  1.0, 1.0, 0.0,
    0.0, 1.0, 0.0,  0.0, 1.0, 0.0,  0.0, 1.0, 0.0,  0.0, 1.0, 0.0,
];

/// Triangle list, two triangles per face
#[rustfmt::skip]
pub const CUBE_INDICES: [u16; CUBE_INDEX_COUNT as usize] = [
    0, 1, 2,     0, 2, 3,
    4, 5, 6,     4, 6, 7,
    8, 9, 10,    8, 10, 11,
    12, 13, 14,  12, 14, 15,
    16, 17, 18,  16, 18, 19,
    20, 21, 22,  20, 22, 23,
];

/// GPU buffers holding the cube mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeGeometry {
    pub vertices: BufferId,
    pub colors: BufferId,
    pub indices: BufferId,
    pub index_count: u32,
}

impl CubeGeometry {
    /// Create and fill the three cube buffers.
    ///
    /// Any failure aborts the whole upload; buffers created before the
    /// failing one are not handed out.
    pub fn upload(ctx: &mut dyn GraphicsContext) -> Result<Self, SetupError> {
        let vertices = ctx.create_buffer(&BufferDesc {
            label: "cube vertices",
            kind: BufferKind::Vertex,
            contents: bytemuck::cast_slice(&CUBE_POSITIONS),
        })?;
        let colors = ctx.create_buffer(&BufferDesc {
            label: "cube colors",
            kind: BufferKind::Vertex,
            contents: bytemuck::cast_slice(&CUBE_COLORS),
        })?;
        let indices = ctx.create_buffer(&BufferDesc {
            label: "cube indices",
            kind: BufferKind::Index,
            contents: bytemuck::cast_slice(&CUBE_INDICES),
        })?;

        log::info!(
            "Uploaded cube geometry: {} vertices, {} indices",
            CUBE_VERTEX_COUNT,
            CUBE_INDEX_COUNT
        );

        Ok(Self {
            vertices,
            colors,
            indices,
            index_count: CUBE_INDEX_COUNT,
        })
    }
}
