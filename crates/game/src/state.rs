//! Scene state: avatars, world, camera and the presentation collaborators.

use std::f32::consts::PI;
use std::time::Duration;

use animation::{LocomotionState, MorphGroup};
use engine_core::{Entity, Name, Player, Quat, Time, Vec3, World};
use input::KeyBindings;
use physics::PhysicsWorld;
use presentation::{AnimationLayers, ClipLayer, FollowCamera, InstanceId, OverlayController, RenderHooks, TextStyle};
use procgen::{seed_from_str, ScatterEngine, TerrainConfig, TerrainData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ambient::{Ambience, AmbienceSettings};
use crate::config::GameConfig;
use crate::daycycle::{DayCycle, Lighting};
use crate::player::{AvatarBody, LocomotionController};
use crate::world::{GrassSettings, MeadowWorld};

/// Where avatars appear before they fall onto the ground.
const SPAWN_HEIGHT: f32 = 10.0;

/// Clip lengths of the avatar model, seconds.
const AVATAR_CLIPS: [(LocomotionState, f32); 4] = [
    (LocomotionState::Walking, 1.1),
    (LocomotionState::Idle, 4.0),
    (LocomotionState::Sitting, 2.5),
    (LocomotionState::Posing, 3.0),
];

/// A walking, sitting, posing person in the meadow.
pub struct Avatar {
    pub controller: LocomotionController,
    pub layers: AnimationLayers,
}

impl Avatar {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        let mut body = AvatarBody::new(position);
        body.orientation = Quat::from_rotation_y(yaw);

        let mut controller = LocomotionController::new(body);
        controller.blender.add_morph_group(MorphGroup::new("Smile", ["Head.Smile"]));
        controller
            .blender
            .add_morph_group(MorphGroup::new("Male", ["Body.Male", "Head.Male"]));

        let mut layers = AnimationLayers::new();
        for (state, _) in AVATAR_CLIPS {
            layers.expect_clip(state.clip_name());
        }

        Self { controller, layers }
    }

    pub fn position(&self) -> Vec3 {
        self.controller.body.position
    }

    /// Head height, where overlay labels hang from.
    pub fn head(&self) -> Vec3 {
        self.position() + Vec3::Y * self.controller.body.vertical_offset
    }
}

pub struct GameScene {
    pub world: World,
    pub physics: PhysicsWorld,
    pub meadow: MeadowWorld,
    pub scatter: ScatterEngine,
    pub hooks: RenderHooks,
    pub overlay: OverlayController,
    pub camera: FollowCamera,
    pub ambience: Ambience,
    pub day: DayCycle,
    pub lighting: Lighting,
    pub time: Time,
    pub bindings: KeyBindings,
    pub player: Entity,
    pub footsteps_playing: bool,
    pub(crate) rng: StdRng,
}

impl GameScene {
    /// Build the scene with water, avatars and ambience. The ground comes later.
    pub fn new(config: &GameConfig) -> Self {
        let mut physics = PhysicsWorld::new();
        let meadow = MeadowWorld::new(&mut physics, config.water_level, GrassSettings::from_config(config));
        let mut scatter = ScatterEngine::new();
        let mut hooks = RenderHooks::new();
        let mut overlay = OverlayController::new();
        let mut world = World::new();

        let ambience = Ambience::build(
            &AmbienceSettings {
                seed: config.scatter_seed.clone(),
                rain: config.rain,
                dense_rain: config.dense_rain,
                birds: config.birds,
                debris: config.debris,
                ducks_per_kind: config.ducks_per_kind,
                airplanes: config.airplanes,
                water_level: config.water_level,
            },
            &mut scatter,
            &mut hooks,
        );

        let player = spawn_avatar(
            &mut world,
            &mut physics,
            &mut overlay,
            &config.player_name,
            Vec3::new(0.0, SPAWN_HEIGHT, 0.0),
            0.0,
        );
        world.insert_one(player, Player).ok();

        for (i, name) in config.npcs.iter().enumerate() {
            let (offset, yaw) = npc_placement(i);
            spawn_avatar(
                &mut world,
                &mut physics,
                &mut overlay,
                name,
                Vec3::new(0.0, SPAWN_HEIGHT, 0.0) + offset,
                yaw,
            );
        }

        log::info!("Scene ready: {} avatars", config.npcs.len() + 1);

        let day = DayCycle::new();
        let mut scene = Self {
            world,
            physics,
            meadow,
            scatter,
            hooks,
            overlay,
            camera: FollowCamera::new(Vec3::new(0.0, SPAWN_HEIGHT, 0.0)),
            ambience,
            lighting: day.lighting(),
            day,
            time: Time::new(),
            bindings: KeyBindings::default(),
            player,
            footsteps_playing: false,
            rng: StdRng::seed_from_u64(seed_from_str(&config.scatter_seed)),
        };
        for name in &config.male_body {
            if !scene.set_body_shape(name, true) {
                log::warn!("male_body lists unknown avatar '{}'", name);
            }
        }
        scene
    }

    /// Start generating the ground in the background.
    pub fn start_loading(&mut self, terrain: TerrainConfig) {
        self.meadow.start_loading(terrain);
    }

    /// Install an already generated ground right away.
    pub fn install_ground(&mut self, terrain: TerrainData) {
        self.meadow
            .on_ground_loaded(terrain, &mut self.physics, &mut self.scatter, &mut self.hooks);
    }

    pub fn avatar_named(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(e, _)| e)
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.world.get::<&Avatar>(self.player).ok().map(|a| a.position())
    }

    /// The avatar model arrived: clips and morph targets become usable.
    pub fn deliver_avatar_models(&mut self) {
        for (_, avatar) in self.world.query_mut::<&mut Avatar>() {
            for (state, duration) in AVATAR_CLIPS {
                avatar.layers.deliver_clip(ClipLayer::new(state.clip_name(), duration));
            }
            for morph in ["Head.Smile", "Body.Male", "Head.Male"] {
                avatar.layers.deliver_morph(morph);
            }
        }
    }

    /// Switch the masculine body shape on or off. False if no such avatar.
    pub fn set_body_shape(&mut self, name: &str, male: bool) -> bool {
        let Some(entity) = self.avatar_named(name) else {
            return false;
        };
        self.world
            .get::<&mut Avatar>(entity)
            .map(|mut avatar| avatar.controller.blender.set_morph("Male", male))
            .unwrap_or(false)
    }

    /// Stop smiling once an avatar has nothing left to say.
    pub fn quiet_down(&mut self, speaker: Entity) {
        if self.overlay.is_speaking(speaker) {
            return;
        }
        if let Ok(mut avatar) = self.world.get::<&mut Avatar>(speaker) {
            avatar.controller.blender.set_morph("Smile", false);
        }
    }

    /// Show a speech line above `speaker`. Clicking it keeps the conversation going.
    pub fn say(&mut self, speaker: &str, text: &str) -> Option<InstanceId> {
        let Some(entity) = self.avatar_named(speaker) else {
            log::warn!("Nobody called '{}' to say '{}'", speaker, text);
            return None;
        };
        let id = self.overlay.show_text(text, entity, TextStyle::Speech);
        let speaker = speaker.to_string();
        self.overlay.on_interact(
            id,
            Box::new(move |id| log::info!("Talking to {} ({:?})", speaker, id)),
        );
        if let Ok(mut avatar) = self.world.get::<&mut Avatar>(entity) {
            avatar.controller.blender.set_morph("Smile", true);
        }
        Some(id)
    }

    /// Capture the current view onto a board standing near the player.
    pub fn take_screenshot(&mut self) -> Option<InstanceId> {
        let around = self.player_position()?;
        let offset = Vec3::new(self.rng.gen_range(-60.0..60.0), 6.0, self.rng.gen_range(-60.0..60.0));
        let payload = bytemuck::bytes_of(&self.camera.uniform()).to_vec();
        let id = self.overlay.add_screenshot_board(around, offset, payload);
        self.overlay
            .on_interact(id, Box::new(|id| log::info!("Opening screenshot {:?}", id)));
        Some(id)
    }

    /// World position of every overlay label.
    pub fn label_positions(&self) -> Vec<(InstanceId, Vec3)> {
        self.overlay
            .label_positions(|entity| self.world.get::<&Avatar>(entity).ok().map(|a| a.head()))
    }

    /// Advance the frame clock by a fixed step. Out-of-range steps count as zero.
    pub fn advance_clock(&mut self, dt: f32) {
        self.time
            .advance(Duration::try_from_secs_f32(dt.max(0.0)).unwrap_or(Duration::ZERO));
    }
}

/// Second NPC stands off to the side facing back; the rest line up along +X.
fn npc_placement(index: usize) -> (Vec3, f32) {
    match index {
        1 => (Vec3::new(-20.0, 0.0, -10.0), PI),
        i => (Vec3::new(4.0 * (i as f32 + 1.0), 0.0, 0.0), 0.0),
    }
}

fn spawn_avatar(
    world: &mut World,
    physics: &mut PhysicsWorld,
    overlay: &mut OverlayController,
    name: &str,
    position: Vec3,
    yaw: f32,
) -> Entity {
    let mut avatar = Avatar::new(position, yaw);
    avatar.controller.attach_body(physics);
    let entity = world.spawn((Name::new(name), avatar));
    overlay.show_text(name, entity, TextStyle::Persistent);
    log::debug!("Spawned avatar '{}' at {:?}", name, position);
    entity
}
