//! Area-weighted point sampling over a vertex-colored triangle mesh.
//!
//! Each triangle receives `round(density * area * color)` points where
//! `color` is the mean of one color channel over its three vertices, so a
//! painted density map on the ground controls where vegetation ends up.
//!
//! **Seed-based determinism:** the generator is seeded from a string per call.
//! Same seed, density and buffers always give the same ordered point list.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::mesh::MeshData;

/// A sampled point on the surface. Produced once per scatter pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    /// Interpolated value of the selected color channel at this point.
    pub density_weight: f32,
}

/// Which vertex color channel drives the density.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorChannel {
    #[default]
    Red,
    Green,
    Blue,
    Alpha,
    /// Rec. 709 luma of RGB.
    Luminance,
}

impl ColorChannel {
    pub fn select(self, color: [f32; 4]) -> f32 {
        match self {
            ColorChannel::Red => color[0],
            ColorChannel::Green => color[1],
            ColorChannel::Blue => color[2],
            ColorChannel::Alpha => color[3],
            ColorChannel::Luminance => 0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2],
        }
    }
}

/// Hash a seed string into a u64 (FNV-1a, stable across platforms and releases).
pub fn seed_from_str(seed: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in seed.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Counters from one sampling pass, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    pub triangles: usize,
    pub degenerate: usize,
    pub points: usize,
}

/// Converts a colored mesh into a weighted point cloud.
#[derive(Debug, Clone)]
pub struct SurfaceSampler {
    /// Points per unit area at full channel intensity.
    pub density: f32,
    pub channel: ColorChannel,
    pub seed: String,
}

impl SurfaceSampler {
    pub fn new(density: f32, seed: impl Into<String>) -> Self {
        Self {
            density,
            channel: ColorChannel::Red,
            seed: seed.into(),
        }
    }

    pub fn with_channel(mut self, channel: ColorChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Sample using the configured color channel.
    pub fn sample(&self, mesh: &MeshData) -> Vec<SurfacePoint> {
        let channel = self.channel;
        self.sample_with(mesh, |color| channel.select(color)).0
    }

    /// Sample with an arbitrary color → weight selector.
    pub fn sample_with<F>(&self, mesh: &MeshData, selector: F) -> (Vec<SurfacePoint>, SampleStats)
    where
        F: Fn([f32; 4]) -> f32,
    {
        let density = if self.density.is_finite() && self.density >= 0.0 {
            self.density as f64
        } else {
            log::warn!("Scatter density {} is invalid, treating as 0", self.density);
            0.0
        };

        let mut rng = StdRng::seed_from_u64(seed_from_str(&self.seed));
        let mut points = Vec::new();
        let mut stats = SampleStats::default();

        for tri in mesh.indices().chunks_exact(3) {
            stats.triangles += 1;
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);

            let v0 = mesh.position(i0);
            let v1 = mesh.position(i1);
            let v2 = mesh.position(i2);

            let area = heron_area(v0, v1, v2);
            if area == 0.0 {
                stats.degenerate += 1;
            }

            let w0 = selector(mesh.color(i0));
            let w1 = selector(mesh.color(i1));
            let w2 = selector(mesh.color(i2));
            let overall_color = (w0 as f64 + w1 as f64 + w2 as f64) / 3.0;

            let expected = density * area * overall_color;
            let mut nb_points = if expected > 0.0 { expected.round() as usize } else { 0 };

            // The coin is tossed for every empty triangle, zero-weight ones included,
            // so the generator sequence only depends on the triangle order.
            if nb_points == 0 && rng.gen::<f64>() < expected {
                nb_points = 1;
            }

            if nb_points == 0 {
                continue;
            }

            let n0 = mesh.normal(i0);
            let n1 = mesh.normal(i1);
            let n2 = mesh.normal(i2);

            for _ in 0..nb_points {
                let lambda: f32 = rng.gen();
                let mu: f32 = rng.gen();
                let lm = lambda * mu;

                // Skewed toward v0; kept as is, scatter output depends on it.
                let position = v0 + (v1 - v0) * lambda + (v2 - v1) * lm;
                let normal = (n0 + (n1 - n0) * lambda + (n2 - n1) * lm).normalize_or_zero();
                let density_weight = w0 + (w1 - w0) * lambda + (w2 - w1) * lm;

                points.push(SurfacePoint {
                    position,
                    normal,
                    density_weight,
                });
            }
        }

        stats.points = points.len();
        if stats.degenerate > 0 {
            log::debug!("{} degenerate triangles contributed no points", stats.degenerate);
        }
        (points, stats)
    }
}

/// Triangle area by Heron's formula, in f64. Degenerate and NaN input give 0.
fn heron_area(v0: Vec3, v1: Vec3, v2: Vec3) -> f64 {
    let a = (v1 - v0).as_dvec3().length();
    let b = (v2 - v1).as_dvec3().length();
    let c = (v0 - v2).as_dvec3().length();
    let p = (a + b + c) / 2.0;
    let squared = p * (p - a) * (p - b) * (p - c);
    if squared > 0.0 {
        squared.sqrt()
    } else {
        0.0
    }
}
