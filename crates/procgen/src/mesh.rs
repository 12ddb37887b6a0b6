//! Flat vertex/index buffers handed over by the asset pipeline.
//!
//! Buffers follow the usual interleaving-free layout: 3 floats per position and
//! normal, 4 floats (RGBA) per vertex color, 3 indices per triangle.

use glam::Vec3;
use thiserror::Error;

/// Reasons a set of mesh buffers cannot be sampled.
#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("position buffer length {0} is not a multiple of 3")]
    PositionStride(usize),
    #[error("normal buffer has {normals} floats, expected {expected}")]
    NormalCount { normals: usize, expected: usize },
    #[error("color buffer has {colors} floats, expected {expected} (RGBA per vertex)")]
    ColorCount { colors: usize, expected: usize },
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexStride(usize),
    #[error("index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        slot: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Validated triangle mesh with optional per-vertex colors.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    positions: Vec<f32>,
    normals: Vec<f32>,
    colors: Option<Vec<f32>>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Validate and wrap raw buffers. An empty index buffer is valid.
    pub fn new(
        positions: Vec<f32>,
        normals: Vec<f32>,
        colors: Option<Vec<f32>>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionStride(positions.len()));
        }
        let vertex_count = positions.len() / 3;
        if normals.len() != positions.len() {
            return Err(MeshError::NormalCount {
                normals: normals.len(),
                expected: positions.len(),
            });
        }
        if let Some(colors) = &colors {
            if colors.len() != vertex_count * 4 {
                return Err(MeshError::ColorCount {
                    colors: colors.len(),
                    expected: vertex_count * 4,
                });
            }
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexStride(indices.len()));
        }
        if let Some((slot, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                slot,
                index,
                vertex_count,
            });
        }

        Ok(Self {
            positions,
            normals,
            colors,
            indices,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[vertex * 3..vertex * 3 + 3])
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[vertex * 3..vertex * 3 + 3])
    }

    /// RGBA of a vertex. Meshes without colors read as opaque white.
    pub fn color(&self, vertex: usize) -> [f32; 4] {
        match &self.colors {
            Some(colors) => {
                let c = &colors[vertex * 4..vertex * 4 + 4];
                [c[0], c[1], c[2], c[3]]
            }
            None => [1.0; 4],
        }
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_buffers() -> (Vec<f32>, Vec<f32>) {
        (
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        )
    }

    #[test]
    fn accepts_valid_triangle() {
        let (p, n) = triangle_buffers();
        let mesh = MeshData::new(p, n, Some(vec![1.0; 12]), vec![0, 1, 2]).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.position(1), Vec3::X);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let (p, n) = triangle_buffers();
        let err = MeshData::new(p, n, None, vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                slot: 2,
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn rejects_short_color_buffer() {
        let (p, n) = triangle_buffers();
        let err = MeshData::new(p, n, Some(vec![1.0; 9]), vec![0, 1, 2]).unwrap_err();
        assert!(matches!(err, MeshError::ColorCount { colors: 9, expected: 12 }));
    }

    #[test]
    fn empty_index_buffer_is_valid() {
        let (p, n) = triangle_buffers();
        let mesh = MeshData::new(p, n, None, Vec::new()).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.color(0), [1.0; 4]);
    }
}
