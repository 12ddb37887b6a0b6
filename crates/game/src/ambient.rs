//! Ambient dynamic scatters: birds, rain, drifting leaves, ducks and airplanes.
//!
//! Each is a fixed-count scatter. Initial placement goes through an
//! [`InstanceCustomizer`]; per-frame motion through a [`ParticleUpdater`].

use std::f32::consts::{FRAC_PI_2, PI};

use engine_core::{RenderRegistry, Transform, Vec3};
use glam::{EulerRot, Quat};
use physics::{ColliderHandle, PhysicsWorld, SpatialQuery};
use procgen::{
    seed_from_str, AlphaMode, FrameContext, InstanceBuffer, InstanceCustomizer, InstanceDelta, MaterialDesc,
    NoCustomization, ParticleUpdater, ScatterEngine, ScatterInstance, ScatterOptions, ShapeMesh, SurfacePoint,
    SurfaceProbe,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Milliseconds in one 60 Hz frame.
const FRAME_MS: f32 = 1000.0 / 60.0;

/// Upward ray against the ground collider.
pub struct GroundProbe<'a> {
    pub physics: &'a PhysicsWorld,
    pub ground: ColliderHandle,
}

impl SurfaceProbe for GroundProbe<'_> {
    fn surface_above(&self, origin: Vec3) -> Option<Vec3> {
        self.physics
            .raycast_target(self.ground, origin, Vec3::Y, f32::MAX)
            .map(|hit| hit.point)
    }
}

fn textured(name: &str, texture: &str, alpha_mode: AlphaMode) -> MaterialDesc {
    MaterialDesc {
        albedo_texture: Some(texture.to_string()),
        alpha_mode,
        double_sided: true,
        ..MaterialDesc::new(name)
    }
}

// ── Birds ──────────────────────────────────────────────────────────────────

/// Billboards circling the origin; far birds move slower.
#[derive(Debug, Clone, Copy)]
pub struct Birds {
    pub range: f32,
    pub altitude: f32,
}

impl Default for Birds {
    fn default() -> Self {
        Self {
            range: 2000.0,
            altitude: 45.0,
        }
    }
}

impl InstanceCustomizer for Birds {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, rng: &mut StdRng) -> InstanceDelta {
        let r = self.range;
        let position = Vec3::new(
            r * (0.5 - rng.gen::<f32>()),
            self.altitude + r * (0.5 - rng.gen::<f32>()) / 45.0,
            r * (0.5 - rng.gen::<f32>()),
        );
        InstanceDelta {
            transform: Transform::from_position(position),
            material_index: None,
        }
    }
}

impl ParticleUpdater for Birds {
    fn update_particle(&mut self, _: usize, instance: &mut ScatterInstance, frame: &FrameContext<'_>) {
        let position = instance.transform.position;
        let d = position.length();
        if d < 1e-3 {
            return;
        }
        let angle = frame.dt_ms / -50.0 / d;
        instance.transform.position = Quat::from_rotation_y(angle) * position;
    }
}

// ── Rain ───────────────────────────────────────────────────────────────────

/// Drops falling through a box that follows the camera target.
#[derive(Debug, Clone)]
pub struct Rain {
    pub box_size: f32,
    pub box_height: f32,
    rng: StdRng,
}

impl Rain {
    pub fn new(seed: &str) -> Self {
        Self {
            box_size: 60.0,
            box_height: 20.0,
            rng: StdRng::seed_from_u64(seed_from_str(seed)),
        }
    }
}

impl InstanceCustomizer for Rain {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, rng: &mut StdRng) -> InstanceDelta {
        let position = Vec3::new(
            rng.gen::<f32>() * self.box_size,
            rng.gen::<f32>() * self.box_height,
            rng.gen::<f32>() * self.box_size,
        );
        InstanceDelta {
            transform: Transform {
                position,
                rotation: Quat::from_euler(EulerRot::YXZ, PI * rng.gen::<f32>(), PI, 0.0),
                scale: Vec3::ONE,
            },
            material_index: None,
        }
    }
}

impl ParticleUpdater for Rain {
    fn update_particle(&mut self, _: usize, instance: &mut ScatterInstance, frame: &FrameContext<'_>) {
        let s = 0.012 * frame.dt_ms;
        let p = &mut instance.transform.position;
        p.y += s * frame.gravity_y * 24.0;

        if p.y < 0.0 {
            let target = frame.follow_target;
            p.y += self.box_height;
            p.x = target.x + (self.rng.gen::<f32>() - 0.5) * self.box_size;
            p.z = target.z + (self.rng.gen::<f32>() - 0.5) * self.box_size;
        }
    }
}

// ── Debris ─────────────────────────────────────────────────────────────────

/// Leaves drifting on the wind, settling a while where they land.
#[derive(Debug, Clone)]
pub struct Debris {
    /// Ticks a landed leaf floats up instead of falling.
    pub rest_ticks: u32,
    /// Leaves further than this from the target respawn near it.
    pub respawn_distance: f32,
    grounded: Vec<u32>,
    rng: StdRng,
}

impl Debris {
    pub fn new(seed: &str) -> Self {
        Self {
            rest_ticks: 60,
            respawn_distance: 30.0,
            grounded: Vec::new(),
            rng: StdRng::seed_from_u64(seed_from_str(seed)),
        }
    }

    pub fn is_grounded(&self, index: usize) -> bool {
        self.grounded.get(index).is_some_and(|&t| t > 0)
    }
}

impl InstanceCustomizer for Debris {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, rng: &mut StdRng) -> InstanceDelta {
        let position = Vec3::new(rng.gen::<f32>() * 20.0, rng.gen::<f32>() * 20.0, rng.gen::<f32>() * 20.0);
        let scale = (1.0 + rng.gen::<f32>()) / 2.0;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            PI * rng.gen::<f32>(),
            PI * rng.gen::<f32>(),
            PI * rng.gen::<f32>(),
        );
        InstanceDelta {
            transform: Transform {
                position,
                rotation,
                scale: Vec3::splat(scale),
            },
            material_index: None,
        }
    }
}

impl ParticleUpdater for Debris {
    fn update_particle(&mut self, index: usize, instance: &mut ScatterInstance, frame: &FrameContext<'_>) {
        if self.grounded.len() <= index {
            self.grounded.resize(index + 1, 0);
        }

        let s = 0.012 * frame.dt_ms;
        let frames = frame.dt_ms / FRAME_MS;
        // Resting leaves lift off slowly while the wind keeps pushing them.
        let lift = if self.grounded[index] > 0 {
            -frame.gravity_y * 0.125 * frames
        } else {
            frame.gravity_y * 0.25 * frames
        };
        let t = &mut instance.transform;
        t.position += Vec3::new(-0.15 * s, lift, -0.1 * s);
        t.rotation = (t.rotation
            * Quat::from_euler(
                EulerRot::XYZ,
                0.25 * self.rng.gen::<f32>() * frames,
                0.15 * self.rng.gen::<f32>() * frames,
                0.125 * self.rng.gen::<f32>() * frames,
            ))
        .normalize();

        if self.grounded[index] > 0 {
            self.grounded[index] -= 1;
        } else if let Some(hit) = frame.surface.and_then(|s| s.surface_above(t.position)) {
            self.grounded[index] = self.rest_ticks;
            t.position.y = hit.y + 0.1;
        }

        let target = frame.follow_target;
        if instance.transform.position.distance(target) > self.respawn_distance {
            self.grounded[index] = 0;
            instance.transform.position = target
                + Vec3::new(
                    15.0 + self.rng.gen::<f32>() * 10.0,
                    self.rng.gen::<f32>() * 20.0,
                    10.0 + self.rng.gen::<f32>() * 10.0,
                );
        }
    }
}

// ── Ducks ──────────────────────────────────────────────────────────────────

/// Billboards bobbing on the water.
#[derive(Debug, Clone, Copy)]
pub struct Ducks {
    pub range: f32,
    pub water_level: f32,
    pub floating: f32,
}

impl Ducks {
    pub fn new(water_level: f32) -> Self {
        Self {
            range: 1000.0,
            water_level,
            floating: 0.15,
        }
    }
}

impl InstanceCustomizer for Ducks {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, rng: &mut StdRng) -> InstanceDelta {
        let position = Vec3::new(
            self.range * (0.5 - rng.gen::<f32>()),
            self.water_level + self.floating,
            self.range * (0.5 - rng.gen::<f32>()),
        );
        InstanceDelta {
            transform: Transform::from_position(position),
            material_index: None,
        }
    }
}

// ── Airplanes ──────────────────────────────────────────────────────────────

/// High-altitude planes crossing the sky along +Z.
#[derive(Debug, Clone)]
pub struct Airplanes {
    pub range: f32,
    pub liveries: usize,
    rng: StdRng,
}

impl Airplanes {
    pub fn new(seed: &str) -> Self {
        Self {
            range: 1000.0,
            liveries: 4,
            rng: StdRng::seed_from_u64(seed_from_str(seed)),
        }
    }
}

impl InstanceCustomizer for Airplanes {
    fn customize_instance(&self, _: usize, _: Option<&SurfacePoint>, rng: &mut StdRng) -> InstanceDelta {
        let livery = rng.gen_range(0..self.liveries.max(1));
        // The last livery is a smaller jet.
        let scale = if livery == 3 { 0.75 } else { 1.0 };
        let r = self.range;
        let position = Vec3::new(
            (rng.gen::<f32>() - 0.5) * 2.0 * r,
            300.0 + rng.gen::<f32>() * 400.0,
            (rng.gen::<f32>() - 0.5) * 2.0 * r,
        );
        InstanceDelta {
            transform: Transform {
                position,
                rotation: Quat::from_euler(EulerRot::XYZ, FRAC_PI_2, 0.0, FRAC_PI_2),
                scale: Vec3::splat(scale),
            },
            material_index: Some(livery),
        }
    }
}

impl ParticleUpdater for Airplanes {
    fn update_particle(&mut self, _: usize, instance: &mut ScatterInstance, frame: &FrameContext<'_>) {
        let p = &mut instance.transform.position;
        p.z += 0.025 * frame.dt_ms;

        let target = frame.follow_target;
        if p.z - target.z > self.range {
            p.x = target.x + (self.rng.gen::<f32>() - 0.5) * 2.0 * self.range;
            p.z = target.z - self.range;
        }
    }
}

// ── Layers ─────────────────────────────────────────────────────────────────

/// One ambient scatter and the strategy that animates it.
pub struct AmbientLayer {
    pub buffer: InstanceBuffer,
    updater: Option<Box<dyn ParticleUpdater + Send>>,
}

impl AmbientLayer {
    pub fn update(&mut self, frame: &FrameContext<'_>) {
        match &mut self.updater {
            Some(updater) => self.buffer.update_particles(updater.as_mut(), frame),
            None => self.buffer.update_billboards(frame.camera_position),
        }
    }
}

/// How many of each ambient thing to build.
#[derive(Debug, Clone)]
pub struct AmbienceSettings {
    pub seed: String,
    pub rain: bool,
    pub dense_rain: bool,
    pub birds: usize,
    pub debris: usize,
    pub ducks_per_kind: usize,
    pub airplanes: usize,
    pub water_level: Option<f32>,
}

#[derive(Default)]
pub struct Ambience {
    pub layers: Vec<AmbientLayer>,
}

impl Ambience {
    pub fn build(settings: &AmbienceSettings, engine: &mut ScatterEngine, registry: &mut dyn RenderRegistry) -> Self {
        let mut layers = Vec::new();
        let seed = |what: &str| format!("{} {}", settings.seed, what);

        if settings.birds > 0 {
            let birds = Birds::default();
            let options = ScatterOptions {
                label: "birds".to_string(),
                billboard: true,
                dynamic: true,
                seed: seed("birds"),
                cast_shadows: false,
                reflect_in_water: false,
                ..Default::default()
            };
            let buffer = engine.scatter_count(
                vec![ShapeMesh::quad("bird", 2.0, 2.0 * (183.0 / 326.0))],
                vec![textured("bird", "flying bird.png", AlphaMode::Test)],
                settings.birds,
                &options,
                &birds,
                &NoCustomization,
                registry,
            );
            layers.push(AmbientLayer {
                buffer,
                updater: Some(Box::new(birds)),
            });
        }

        if settings.rain {
            let dense = settings.dense_rain;
            let rain = Rain::new(&seed("rain respawn"));
            let options = ScatterOptions {
                label: "rain".to_string(),
                dynamic: true,
                seed: seed("rain"),
                cast_shadows: false,
                ..Default::default()
            };
            let (width, height, texture) = if dense {
                (2.0, 4.0, "dense rain.png")
            } else {
                (2.0 / 16.0, 1.0, "rain.png")
            };
            let buffer = engine.scatter_count(
                vec![ShapeMesh::quad("rain drop", width, height)],
                vec![textured("rain", texture, AlphaMode::Blend)],
                if dense { 4 * 1024 } else { 1024 },
                &options,
                &rain,
                &NoCustomization,
                registry,
            );
            layers.push(AmbientLayer {
                buffer,
                updater: Some(Box::new(rain)),
            });
        }

        if settings.debris > 0 {
            let debris = Debris::new(&seed("debris respawn"));
            let options = ScatterOptions {
                label: "debris".to_string(),
                dynamic: true,
                seed: seed("debris"),
                reflect_in_water: false,
                ..Default::default()
            };
            let buffer = engine.scatter_count(
                vec![ShapeMesh::quad("dry leaf", 0.3, 0.3)],
                vec![textured("dry leaf", "dry leaf.png", AlphaMode::Test)],
                settings.debris,
                &options,
                &debris,
                &NoCustomization,
                registry,
            );
            layers.push(AmbientLayer {
                buffer,
                updater: Some(Box::new(debris)),
            });
        }

        if let Some(level) = settings.water_level.filter(|_| settings.ducks_per_kind > 0) {
            let ducks = Ducks::new(level);
            let options = ScatterOptions {
                label: "ducks".to_string(),
                billboard: true,
                seed: seed("ducks"),
                cast_shadows: false,
                ..Default::default()
            };
            let materials = ["duck 1.png", "duck 2.png"]
                .iter()
                .map(|texture| MaterialDesc {
                    roughness: 0.2,
                    ..textured("duck", texture, AlphaMode::Test)
                })
                .collect();
            let buffer = engine.scatter_count(
                vec![ShapeMesh::quad("duck", 1.0, 1.0), ShapeMesh::quad("duck", 1.0, 1.0)],
                materials,
                settings.ducks_per_kind,
                &options,
                &ducks,
                &NoCustomization,
                registry,
            );
            layers.push(AmbientLayer { buffer, updater: None });
        }

        if settings.airplanes > 0 {
            let planes = Airplanes::new(&seed("airplanes respawn"));
            let options = ScatterOptions {
                label: "airplanes".to_string(),
                dynamic: true,
                seed: seed("airplanes"),
                cast_shadows: false,
                reflect_in_water: false,
                ..Default::default()
            };
            let materials = (1..=4)
                .map(|i| textured("plane", &format!("plane {}.png", i), AlphaMode::Test))
                .collect();
            let buffer = engine.scatter_count(
                vec![ShapeMesh::quad("airplane", 20.0, 20.0)],
                materials,
                settings.airplanes,
                &options,
                &planes,
                &NoCustomization,
                registry,
            );
            layers.push(AmbientLayer {
                buffer,
                updater: Some(Box::new(planes)),
            });
        }

        Self { layers }
    }

    pub fn update(&mut self, frame: &FrameContext<'_>) {
        for layer in &mut self.layers {
            layer.update(frame);
        }
    }

    pub fn layer(&self, label: &str) -> Option<&AmbientLayer> {
        self.layers.iter().find(|l| l.buffer.label == label)
    }
}
