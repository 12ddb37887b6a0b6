//! Meadow: a small social world of walking, sitting and posing avatars.
//!
//! Runs headless at a fixed tick rate. The keyboard is replaced by the key
//! script in `config.ron`, so a run is reproducible from its config alone.

mod ambient;
mod config;
mod daycycle;
mod player;
mod state;
mod update;
mod world;

use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use input::InputState;

use config::GameConfig;
use state::GameScene;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════╗");
    println!("║                   Meadow                     ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  W / S   - Walk / back   │  A / D - Turn     ║");
    println!("║  E       - Run           │  R     - Sit      ║");
    println!("║  P       - Pose          │  L     - Camera   ║");
    println!("║  C       - Screenshot    │  B     - Busy     ║");
    println!("╚══════════════════════════════════════════════╝");

    log::info!("Starting Meadow...");

    let config = GameConfig::load();
    ensure!(
        config.tick_seconds > 0.0 && config.tick_seconds.is_finite(),
        "tick_seconds must be positive, got {}",
        config.tick_seconds
    );

    let mut scene = GameScene::new(&config);
    scene.start_loading(config.terrain());

    let mut input = InputState::new();
    let step = Duration::try_from_secs_f32(config.tick_seconds).context("tick_seconds does not fit a Duration")?;
    let started = Instant::now();

    for tick in 0..config.ticks {
        let frame_start = Instant::now();
        update::run_script(&mut scene, &mut input, &config, tick);
        update::tick(&mut scene, &mut input, config.tick_seconds);

        if let Some(rest) = step.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let player = scene
        .player_position()
        .context("player avatar vanished from the scene")?;
    log::info!(
        "Ran {} ticks in {:.1}s: player at ({:.1}, {:.1}, {:.1}), {} grass, {} screenshots, daylight {:.2}",
        scene.time.frame_count(),
        started.elapsed().as_secs_f32(),
        player.x,
        player.y,
        player.z,
        scene.meadow.grass_instances(),
        scene.overlay.boards().len(),
        scene.lighting.daylight,
    );
    if let engine_core::AssetHandle::Failed(reason) = &scene.meadow.terrain {
        log::warn!("Ground never loaded: {}", reason);
    }

    Ok(())
}
