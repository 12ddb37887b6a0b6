//! Per-tick update: input, avatars, camera, ambience, daylight, overlay, physics.

use engine_core::{Player, Vec3};
use input::{ElementState, InputProvider, InputState, LocomotionIntent};
use procgen::{FrameContext, SurfaceProbe};

use crate::ambient::GroundProbe;
use crate::config::GameConfig;
use crate::player::{camera_is_underwater, LocomotionEvent};
use crate::state::{Avatar, GameScene};

/// Longest step a single tick simulates; a stalled frame is capped to this.
pub const MAX_TICK_SECONDS: f32 = 0.25;

/// Feed the scripted key presses and speech lines for `tick` into the scene.
pub fn run_script(scene: &mut GameScene, input: &mut InputState, config: &GameConfig, tick: u32) {
    input.begin_frame();
    for entry in &config.script {
        let Some(key) = entry.key_code() else {
            continue;
        };
        let down = config.keys_down(tick).any(|k| k == key);
        match (down, input.is_key_held(key)) {
            (true, false) => input.process_keyboard(key, ElementState::Pressed),
            (false, true) => input.process_keyboard(key, ElementState::Released),
            _ => {}
        }
    }

    for line in config.speech.iter().filter(|s| s.at_tick == tick) {
        scene.say(&line.speaker, &line.text);
    }
}

/// Advance the whole scene by `dt` seconds.
pub fn tick(scene: &mut GameScene, input: &mut dyn InputProvider, dt: f32) {
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_TICK_SECONDS) } else { 0.0 };
    scene.advance_clock(dt);

    if scene.meadow.poll(&mut scene.physics, &mut scene.scatter, &mut scene.hooks) {
        log::info!("Ground loaded: {} grass instances", scene.meadow.grass_instances());
        scene.deliver_avatar_models();
    }

    let intent = LocomotionIntent::sample(input, &scene.bindings);
    if intent.toggle_camera_lock {
        scene.camera.toggle_lock();
        log::info!("Camera {}", if scene.camera.is_locked() { "locked" } else { "following" });
    }
    if intent.screenshot {
        if let Some(id) = scene.take_screenshot() {
            log::info!("Screenshot {:?} placed", id);
        }
    }

    for event in move_avatars(scene, &intent, dt) {
        match event {
            LocomotionEvent::FovTransition(fov) => scene.camera.tween_fov_to(fov),
            LocomotionEvent::ShadowFrustumRefresh => scene.hooks.split_frustum(),
            LocomotionEvent::FootstepsStarted => {
                if !scene.footsteps_playing {
                    log::debug!("Footsteps on");
                }
                scene.footsteps_playing = true;
            }
            LocomotionEvent::FootstepsStopped => {
                if scene.footsteps_playing {
                    log::debug!("Footsteps off");
                }
                scene.footsteps_playing = false;
            }
        }
    }

    follow_player(scene, dt);
    update_ambience(scene, dt);

    scene.lighting = scene.day.advance(dt);
    for expired in scene.overlay.update(dt) {
        scene.quiet_down(expired.anchor);
    }
    scene.physics.step();
}

/// Move every avatar. The player follows the keyboard, the rest stand idle.
/// Returns the player's locomotion events.
fn move_avatars(scene: &mut GameScene, intent: &LocomotionIntent, dt: f32) -> Vec<LocomotionEvent> {
    let idle = LocomotionIntent::default();
    let mut player_events = Vec::new();

    for (_, (avatar, player)) in scene.world.query_mut::<(&mut Avatar, Option<&Player>)>() {
        let intent = if player.is_some() { intent } else { &idle };
        let events = avatar
            .controller
            .update(intent, &scene.physics, &scene.meadow.surfaces, dt);
        if let Some(body) = avatar.controller.rigid_body() {
            scene.physics.set_kinematic_position(body, avatar.controller.body.position);
        }
        avatar.controller.animate(dt, &mut avatar.layers);
        avatar.layers.advance(dt);

        if player.is_some() {
            player_events = events;
        }
    }
    player_events
}

fn follow_player(scene: &mut GameScene, dt: f32) {
    let Ok(avatar) = scene.world.get::<&Avatar>(scene.player) else {
        return;
    };
    let body = &avatar.controller.body;
    scene.camera.update(dt, body.position, body.orientation);
    drop(avatar);

    let underwater = camera_is_underwater(&scene.physics, scene.meadow.surfaces.water, scene.camera.position());
    if scene.camera.set_underwater(underwater) {
        log::debug!("Camera {} water", if underwater { "under" } else { "above" });
    }
}

fn update_ambience(scene: &mut GameScene, dt: f32) {
    let follow_target = scene.player_position().unwrap_or(Vec3::ZERO);
    let probe = scene
        .meadow
        .surfaces
        .ground
        .loaded()
        .map(|&ground| GroundProbe {
            physics: &scene.physics,
            ground,
        });
    let frame = FrameContext {
        dt_ms: dt * 1000.0,
        camera_position: scene.camera.position(),
        follow_target,
        gravity_y: scene.physics.gravity_y() / 60.0,
        surface: probe.as_ref().map(|p| p as &dyn SurfaceProbe),
    };
    scene.ambience.update(&frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScriptedKey, ScriptedSpeech};
    use animation::LocomotionState;
    use input::{KeyCode, NoInput};
    use presentation::SPEECH_SECONDS;
    use procgen::{TerrainConfig, TerrainData};

    const DT: f32 = 1.0 / 60.0;

    fn quiet_config() -> GameConfig {
        GameConfig {
            water_level: None,
            rain: false,
            birds: 4,
            debris: 2,
            ducks_per_kind: 0,
            airplanes: 1,
            script: Vec::new(),
            speech: Vec::new(),
            ..Default::default()
        }
    }

    fn small_ground() -> TerrainData {
        TerrainData::generate(TerrainConfig {
            size: 20.0,
            resolution: 11,
            water_level: None,
            ..Default::default()
        })
    }

    fn press(input: &mut InputState, key: KeyCode) {
        input.begin_frame();
        input.process_keyboard(key, ElementState::Pressed);
    }

    #[test]
    fn avatars_hang_until_the_ground_arrives() {
        let mut scene = GameScene::new(&quiet_config());
        for _ in 0..30 {
            tick(&mut scene, &mut NoInput, DT);
        }
        assert_eq!(scene.player_position().unwrap().y, 10.0);
    }

    #[test]
    fn player_settles_on_the_ground() {
        let mut scene = GameScene::new(&quiet_config());
        scene.install_ground(small_ground());
        for _ in 0..600 {
            tick(&mut scene, &mut NoInput, DT);
        }
        let pos = scene.player_position().unwrap();
        let ground = scene.meadow.ground_height(pos.x, pos.z).unwrap();
        assert!((pos.y - (ground + 2.0)).abs() < 0.1, "player at {}, ground at {}", pos.y, ground);
    }

    #[test]
    fn sitting_tweens_fov_and_refreshes_shadows() {
        let mut scene = GameScene::new(&quiet_config());
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyR);
        tick(&mut scene, &mut input, DT);

        assert!(scene.camera.is_tweening());
        assert_eq!(scene.hooks.frustum_splits(), 1);
        let avatar = scene.world.get::<&Avatar>(scene.player).unwrap();
        assert!(avatar.controller.is_sitting());
    }

    #[test]
    fn camera_lock_and_screenshot_keys() {
        let mut scene = GameScene::new(&quiet_config());
        let mut input = InputState::new();

        press(&mut input, KeyCode::KeyL);
        tick(&mut scene, &mut input, DT);
        assert!(scene.camera.is_locked());

        press(&mut input, KeyCode::KeyC);
        tick(&mut scene, &mut input, DT);
        assert_eq!(scene.overlay.boards().len(), 1);
        let id = scene.overlay.boards()[0].id;
        assert!(scene.overlay.interact(id));
    }

    #[test]
    fn walking_starts_footsteps_and_only_moves_the_player() {
        let mut scene = GameScene::new(&quiet_config());
        let elizabeth = scene.avatar_named("Elizabeth").unwrap();
        let npc_start = scene.world.get::<&Avatar>(elizabeth).unwrap().position();
        let start = scene.player_position().unwrap();

        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        for _ in 0..30 {
            tick(&mut scene, &mut input, DT);
            input.begin_frame();
        }

        assert!(scene.footsteps_playing);
        assert!(scene.player_position().unwrap().distance(start) > 0.5);
        assert_eq!(scene.world.get::<&Avatar>(elizabeth).unwrap().position(), npc_start);
    }

    #[test]
    fn script_presses_and_releases_keys() {
        let config = GameConfig {
            script: vec![ScriptedKey {
                key: "W".to_string(),
                from_tick: 2,
                ticks: 3,
            }],
            ..quiet_config()
        };
        let mut scene = GameScene::new(&config);
        let mut input = InputState::new();

        run_script(&mut scene, &mut input, &config, 1);
        assert!(!input.is_key_held(KeyCode::KeyW));
        run_script(&mut scene, &mut input, &config, 2);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        run_script(&mut scene, &mut input, &config, 4);
        assert!(input.is_key_held(KeyCode::KeyW));
        assert!(!input.is_key_pressed(KeyCode::KeyW));
        run_script(&mut scene, &mut input, &config, 5);
        assert!(input.is_key_released(KeyCode::KeyW));
        assert!(!input.is_key_held(KeyCode::KeyW));
    }

    #[test]
    fn scripted_speech_expires() {
        let config = GameConfig {
            speech: vec![ScriptedSpeech {
                speaker: "Gloria".to_string(),
                text: "Nice ducks.".to_string(),
                at_tick: 0,
            }],
            ..quiet_config()
        };
        let mut scene = GameScene::new(&config);
        let mut input = InputState::new();
        run_script(&mut scene, &mut input, &config, 0);
        assert_eq!(scene.overlay.labels().len(), 4);

        let ticks = (SPEECH_SECONDS / DT).ceil() as usize + 2;
        for _ in 0..ticks {
            tick(&mut scene, &mut input, DT);
        }
        assert_eq!(scene.overlay.labels().len(), 3);
    }

    #[test]
    fn day_moves_on() {
        let mut scene = GameScene::new(&quiet_config());
        let before = scene.lighting;
        for _ in 0..120 {
            tick(&mut scene, &mut NoInput, DT);
        }
        assert_ne!(scene.lighting.light_direction, before.light_direction);
        assert!(scene.time.frame_count() >= 120);
    }

    #[test]
    fn smile_fades_when_speech_ends() {
        let mut scene = GameScene::new(&quiet_config());
        scene.deliver_avatar_models();
        scene.say("Gloria", "Nice ducks.").unwrap();
        let gloria = scene.avatar_named("Gloria").unwrap();
        let smile = |scene: &GameScene| {
            let avatar = scene.world.get::<&Avatar>(gloria).unwrap();
            (
                avatar.controller.blender.morphie("Smile").unwrap(),
                avatar.layers.morph_influence("Head.Smile").unwrap(),
            )
        };

        for _ in 0..60 {
            tick(&mut scene, &mut NoInput, DT);
        }
        let (morph, influence) = smile(&scene);
        assert_eq!(morph.target, 1.0);
        assert!(influence > 0.5, "smiling at {}", influence);

        // Speech lasts SPEECH_SECONDS; the morph needs half a second to relax.
        let ticks = ((SPEECH_SECONDS + 1.0) / DT).ceil() as usize;
        for _ in 0..ticks {
            tick(&mut scene, &mut NoInput, DT);
        }
        let (morph, influence) = smile(&scene);
        assert_eq!(morph.target, 0.0);
        assert_eq!(morph.value, 0.0);
        assert_eq!(influence, 0.0);
    }

    #[test]
    fn stalled_frames_are_capped() {
        let mut scene = GameScene::new(&quiet_config());
        scene.install_ground(small_ground());
        let before = scene.player_position().unwrap();

        for dt in [1.0e20, f32::MAX, f32::INFINITY, f32::NAN, -1.0] {
            tick(&mut scene, &mut NoInput, dt);
        }

        let pos = scene.player_position().unwrap();
        assert!(pos.is_finite(), "player at {:?}", pos);
        // One capped tick of gravity at most, then snapped onto the ground.
        assert!((pos.y - before.y).abs() < 10.0);
        assert_eq!(scene.time.frame_count(), 5);
        assert!(scene.lighting.daylight.is_finite());

        let avatar = scene.world.get::<&Avatar>(scene.player).unwrap();
        for state in [LocomotionState::Idle, LocomotionState::Walking, LocomotionState::Sitting, LocomotionState::Posing] {
            let w = avatar.controller.blender.weight(state);
            assert!((0.0..=1.0).contains(&w), "{:?} weight {}", state, w);
        }
    }
}
