//! Ground generation using noise functions.
//!
//! Produces a square grid with fractal-noise heights and per-vertex RGBA where
//! the red channel is the vegetation density map read by the surface sampler.
//!
//! **Seed-based determinism:** all noise is derived from `config.seed`, so the
//! same seed always produces the same heights and density at every (x, z).

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use noise::{NoiseFn, Perlin, Simplex};

use crate::mesh::{MeshData, MeshError};

/// Derive a deterministic u32 noise seed from a world seed and an offset.
#[inline]
fn deterministic_noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Vertex for the ground mesh. `color.r` carries vegetation density.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Configuration for ground generation.
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// Size of terrain in world units.
    pub size: f32,
    /// Number of vertices per side.
    pub resolution: u32,
    /// Maximum height of terrain.
    pub height_scale: f32,
    /// Noise frequency (lower = smoother).
    pub frequency: f64,
    /// Number of octaves for fractal noise.
    pub octaves: u32,
    /// Lacunarity (frequency multiplier per octave).
    pub lacunarity: f64,
    /// Persistence (amplitude multiplier per octave).
    pub persistence: f64,
    /// Seed for random generation.
    pub seed: u64,
    /// Frequency of the meadow/bare-ground density pattern.
    pub density_frequency: f64,
    /// World Y of the water surface. Nothing grows below it.
    pub water_level: Option<f32>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            resolution: 101,
            height_scale: 8.0,
            frequency: 0.015,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 0,
            density_frequency: 0.04,
            water_level: Some(1.5),
        }
    }
}

/// Generated ground data.
#[derive(Debug)]
pub struct TerrainData {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
    /// Row-major heights, `resolution × resolution`, z rows then x columns.
    pub heightmap: Vec<f32>,
    pub config: TerrainConfig,
}

impl TerrainData {
    /// Generate the ground grid from configuration.
    pub fn generate(config: TerrainConfig) -> Self {
        let perlin = Perlin::new(deterministic_noise_seed(config.seed, 0));
        let simplex = Simplex::new(deterministic_noise_seed(config.seed, 1));
        let density_noise = Perlin::new(deterministic_noise_seed(config.seed, 2));

        let res = config.resolution.max(2) as usize;
        let step = config.size / (res - 1) as f32;
        let half_size = config.size / 2.0;

        let mut vertices = Vec::with_capacity(res * res);
        let mut heightmap = Vec::with_capacity(res * res);

        for z in 0..res {
            for x in 0..res {
                let world_x = x as f32 * step - half_size;
                let world_z = z as f32 * step - half_size;

                let height = Self::fractal_noise(&perlin, &simplex, world_x as f64, world_z as f64, &config);
                let world_y = height as f32 * config.height_scale;
                heightmap.push(world_y);

                let density = Self::density_at(&density_noise, world_x as f64, world_z as f64, world_y, &config);

                vertices.push(TerrainVertex {
                    position: [world_x, world_y, world_z],
                    normal: [0.0, 1.0, 0.0],
                    uv: [x as f32 / (res - 1) as f32, z as f32 / (res - 1) as f32],
                    color: [density, density * 0.5, 0.0, 1.0],
                });
            }
        }

        Self::calculate_normals(&mut vertices, res);

        let mut indices = Vec::with_capacity((res - 1) * (res - 1) * 6);
        for z in 0..(res - 1) {
            for x in 0..(res - 1) {
                let top_left = (z * res + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * res + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend([top_left, bottom_left, top_right]);
                indices.extend([top_right, bottom_left, bottom_right]);
            }
        }

        log::info!(
            "Generated ground: {}x{} vertices, {} triangles (seed {})",
            res,
            res,
            indices.len() / 3,
            config.seed
        );

        Self {
            vertices,
            indices,
            heightmap,
            config,
        }
    }

    pub fn resolution(&self) -> usize {
        self.config.resolution.max(2) as usize
    }

    /// Flatten into validated buffers for the sampler and vertex scatters.
    pub fn to_mesh_data(&self) -> Result<MeshData, MeshError> {
        let mut positions = Vec::with_capacity(self.vertices.len() * 3);
        let mut normals = Vec::with_capacity(self.vertices.len() * 3);
        let mut colors = Vec::with_capacity(self.vertices.len() * 4);
        for v in &self.vertices {
            positions.extend_from_slice(&v.position);
            normals.extend_from_slice(&v.normal);
            colors.extend_from_slice(&v.color);
        }
        MeshData::new(positions, normals, Some(colors), self.indices.clone())
    }

    /// Sample height at a world position, matching the mesh triangulation.
    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let res = self.resolution();
        let half_size = self.config.size / 2.0;
        let step = self.config.size / (res - 1) as f32;

        let gx = (x + half_size) / step;
        let gz = (z + half_size) / step;

        let x0 = (gx.floor().max(0.0) as usize).min(res - 2);
        let z0 = (gz.floor().max(0.0) as usize).min(res - 2);

        let fx = (gx - x0 as f32).clamp(0.0, 1.0);
        let fz = (gz - z0 as f32).clamp(0.0, 1.0);

        let h00 = self.heightmap[z0 * res + x0];
        let h10 = self.heightmap[z0 * res + x0 + 1];
        let h01 = self.heightmap[(z0 + 1) * res + x0];
        let h11 = self.heightmap[(z0 + 1) * res + x0 + 1];

        // Diagonal runs from bottom-left to top-right.
        if fx + fz <= 1.0 {
            h00 + fx * (h10 - h00) + fz * (h01 - h00)
        } else {
            h11 + (1.0 - fx) * (h01 - h11) + (1.0 - fz) * (h10 - h11)
        }
    }

    /// Check if a world position is within the ground bounds.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let half = self.config.size / 2.0;
        x >= -half && x <= half && z >= -half && z <= half
    }

    fn fractal_noise(perlin: &Perlin, simplex: &Simplex, x: f64, z: f64, config: &TerrainConfig) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = config.frequency;
        let mut max_value = 0.0;

        for _ in 0..config.octaves.max(1) {
            let perlin_sample = perlin.get([x * frequency, z * frequency]);
            let simplex_sample = simplex.get([x * frequency + 1000.0, z * frequency + 1000.0]);

            value += (perlin_sample * 0.7 + simplex_sample * 0.3) * amplitude;
            max_value += amplitude;

            amplitude *= config.persistence;
            frequency *= config.lacunarity;
        }

        // Normalize to 0-1 range
        (value / max_value + 1.0) * 0.5
    }

    /// Meadow patches in [0, 1], zero under water.
    fn density_at(noise: &Perlin, x: f64, z: f64, height: f32, config: &TerrainConfig) -> f32 {
        if let Some(water) = config.water_level {
            if height <= water {
                return 0.0;
            }
        }
        let f = config.density_frequency;
        let raw = (noise.get([x * f, z * f]) + 1.0) * 0.5;
        // Sharpen into patches with soft borders.
        let t = ((raw - 0.35) / 0.3).clamp(0.0, 1.0) as f32;
        t * t * (3.0 - 2.0 * t)
    }

    fn calculate_normals(vertices: &mut [TerrainVertex], resolution: usize) {
        let mut normals: Vec<Vec3> = vec![Vec3::ZERO; vertices.len()];

        for z in 0..(resolution - 1) {
            for x in 0..(resolution - 1) {
                let i0 = z * resolution + x;
                let i1 = i0 + 1;
                let i2 = (z + 1) * resolution + x;
                let i3 = i2 + 1;

                let v0: Vec3 = vertices[i0].position.into();
                let v1: Vec3 = vertices[i1].position.into();
                let v2: Vec3 = vertices[i2].position.into();
                let v3: Vec3 = vertices[i3].position.into();

                let n1 = (v2 - v0).cross(v1 - v0).normalize_or_zero();
                normals[i0] += n1;
                normals[i2] += n1;
                normals[i1] += n1;

                let n2 = (v2 - v1).cross(v3 - v1).normalize_or_zero();
                normals[i1] += n2;
                normals[i2] += n2;
                normals[i3] += n2;
            }
        }

        for (i, vertex) in vertices.iter_mut().enumerate() {
            let n = normals[i].try_normalize().unwrap_or(Vec3::Y);
            vertex.normal = [n.x, n.y, n.z];
        }
    }
}
