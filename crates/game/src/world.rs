//! Ground, water and the grass scattered over them.
//!
//! The ground is generated on a worker thread. Until it arrives the ground
//! handle stays `Pending` and surface following is skipped; the grass passes
//! run once, on the tick the terrain lands.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use engine_core::{AssetHandle, RenderRegistry};
use physics::{ColliderHandle, PhysicsWorld};
use procgen::{
    ColorChannel, GrassMaterial, InstanceBuffer, MaterialDesc, RandomJitter, ScatterEngine, ScatterOptions, ShapeMesh,
    SurfaceSampler, TerrainConfig, TerrainData, VertexThresholdScatter,
};

use crate::config::GameConfig;

/// Colliders the locomotion code casts rays against.
#[derive(Debug, Clone, Default)]
pub struct Surfaces {
    pub ground: AssetHandle<ColliderHandle>,
    pub water: Option<ColliderHandle>,
}

/// How the grass passes are built.
#[derive(Debug, Clone)]
pub struct GrassSettings {
    pub seed: String,
    pub density: f32,
    pub channel: ColorChannel,
    pub align_to_normal: f32,
    pub vertex_grass: bool,
    pub texture: String,
}

impl GrassSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            seed: config.scatter_seed.clone(),
            density: config.grass_density,
            channel: config.grass_channel.into(),
            align_to_normal: config.align_to_normal,
            vertex_grass: config.vertex_grass,
            texture: "grass.png".to_string(),
        }
    }
}

pub struct MeadowWorld {
    pub surfaces: Surfaces,
    pub terrain: AssetHandle<TerrainData>,
    /// Static grass buffers, frozen after placement.
    pub grass: Vec<InstanceBuffer>,
    grass_settings: GrassSettings,
    loader: Option<Receiver<TerrainData>>,
}

impl MeadowWorld {
    /// Create the world with water in place and the ground still pending.
    pub fn new(physics: &mut PhysicsWorld, water_level: Option<f32>, grass_settings: GrassSettings) -> Self {
        let water = water_level.map(|level| {
            log::info!("Water surface at y={:.2}", level);
            physics.add_water_surface(level)
        });
        Self {
            surfaces: Surfaces {
                ground: AssetHandle::Pending,
                water,
            },
            terrain: AssetHandle::Pending,
            grass: Vec::new(),
            grass_settings,
            loader: None,
        }
    }

    /// Generate the ground in the background.
    pub fn start_loading(&mut self, config: TerrainConfig) {
        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("terrain".to_string())
            .spawn(move || {
                let _ = tx.send(TerrainData::generate(config));
            });
        match spawned {
            Ok(_) => self.loader = Some(rx),
            Err(e) => {
                self.terrain.fail(format!("terrain worker: {}", e));
                self.surfaces.ground.fail("terrain worker did not start");
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Pick up the ground if the worker finished. Returns true on the tick it lands.
    pub fn poll(&mut self, physics: &mut PhysicsWorld, engine: &mut ScatterEngine, registry: &mut dyn RenderRegistry) -> bool {
        let Some(rx) = &self.loader else {
            return false;
        };
        match rx.try_recv() {
            Ok(data) => {
                self.loader = None;
                self.on_ground_loaded(data, physics, engine, registry);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.loader = None;
                self.terrain.fail("terrain worker exited without a result");
                self.surfaces.ground.fail("no terrain");
                false
            }
        }
    }

    /// Install a generated ground: heightfield collider, then the grass passes.
    pub fn on_ground_loaded(
        &mut self,
        data: TerrainData,
        physics: &mut PhysicsWorld,
        engine: &mut ScatterEngine,
        registry: &mut dyn RenderRegistry,
    ) {
        let res = data.resolution();
        let size = data.config.size;
        match physics.add_terrain_heightfield(&data.heightmap, res, res, size, size) {
            Some(handle) => self.surfaces.ground.complete(handle),
            None => self.surfaces.ground.fail("heightfield rejected"),
        }

        let mesh = match data.to_mesh_data() {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("Ground mesh unusable, no grass: {}", e);
                self.terrain.complete(data);
                return;
            }
        };

        let settings = &self.grass_settings;
        let material = GrassMaterial {
            texture: settings.texture.clone(),
        };

        let sampler = SurfaceSampler::new(settings.density, settings.seed.clone()).with_channel(settings.channel);
        let points = sampler.sample(&mesh);
        let options = ScatterOptions {
            label: "grass".to_string(),
            align_to_normal: settings.align_to_normal,
            seed: settings.seed.clone(),
            ..Default::default()
        };
        self.grass.push(engine.scatter(
            ShapeMesh::quad("grass", 1.0, 1.0),
            MaterialDesc::new("grass"),
            &points,
            &options,
            &RandomJitter::default(),
            &material,
            registry,
        ));

        if settings.vertex_grass {
            let options = ScatterOptions {
                label: "grass tufts".to_string(),
                align_to_normal: settings.align_to_normal,
                seed: format!("{} tufts", settings.seed),
                ..Default::default()
            };
            self.grass.push(engine.scatter_vertices(
                ShapeMesh::quad("grass tuft", 25.0, 25.0),
                MaterialDesc::new("grass tuft"),
                &mesh,
                &options,
                &VertexThresholdScatter::default(),
                &material,
                registry,
            ));
        }

        self.terrain.complete(data);
    }

    /// Ground height under a point, if the ground is in.
    pub fn ground_height(&self, x: f32, z: f32) -> Option<f32> {
        self.terrain
            .loaded()
            .filter(|t| t.contains(x, z))
            .map(|t| t.sample_height(x, z))
    }

    pub fn grass_instances(&self) -> usize {
        self.grass.iter().map(InstanceBuffer::len).sum()
    }
}
