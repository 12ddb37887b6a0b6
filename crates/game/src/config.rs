//! Meadow configuration (world, scatter, ambience, demo script). Loaded from config.ron at startup.

use input::KeyCode;
use procgen::{ColorChannel, TerrainConfig};
use serde::{Deserialize, Serialize};

/// Which vertex color channel drives grass density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DensityChannel {
    #[default]
    Red,
    Green,
    Blue,
    Alpha,
    Luminance,
}

impl From<DensityChannel> for ColorChannel {
    fn from(channel: DensityChannel) -> Self {
        match channel {
            DensityChannel::Red => ColorChannel::Red,
            DensityChannel::Green => ColorChannel::Green,
            DensityChannel::Blue => ColorChannel::Blue,
            DensityChannel::Alpha => ColorChannel::Alpha,
            DensityChannel::Luminance => ColorChannel::Luminance,
        }
    }
}

/// One held key in the headless demo script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedKey {
    /// Letter key name ("W", "KeyR").
    pub key: String,
    /// First tick the key is down.
    pub from_tick: u32,
    /// Number of ticks it stays down.
    #[serde(default = "default_hold_ticks")]
    pub ticks: u32,
}

impl ScriptedKey {
    pub fn key_code(&self) -> Option<KeyCode> {
        input::parse_key(&self.key)
    }

    pub fn is_down(&self, tick: u32) -> bool {
        tick >= self.from_tick && tick < self.from_tick.saturating_add(self.ticks)
    }
}

/// A line an avatar says at a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedSpeech {
    pub speaker: String,
    pub text: String,
    pub at_tick: u32,
}

/// Persistent settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed string for every scatter pass (same seed, same meadow).
    #[serde(default = "default_scatter_seed")]
    pub scatter_seed: String,
    /// Grass instances per unit area at full density.
    #[serde(default = "default_grass_density")]
    pub grass_density: f32,
    #[serde(default)]
    pub grass_channel: DensityChannel,
    /// 0 keeps grass upright, 1 tilts it with the slope.
    #[serde(default = "default_align_to_normal")]
    pub align_to_normal: f32,
    /// Also place one grass tuft per dense ground vertex.
    #[serde(default = "default_true")]
    pub vertex_grass: bool,

    #[serde(default = "default_terrain_size")]
    pub terrain_size: f32,
    #[serde(default = "default_terrain_resolution")]
    pub terrain_resolution: u32,
    #[serde(default = "default_terrain_height")]
    pub terrain_height: f32,
    #[serde(default)]
    pub terrain_seed: u64,
    /// `None` disables water.
    #[serde(default = "default_water_level")]
    pub water_level: Option<f32>,

    /// Ticks the headless loop runs for.
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Fixed tick length in seconds.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f32,

    #[serde(default)]
    pub rain: bool,
    #[serde(default)]
    pub dense_rain: bool,
    #[serde(default = "default_birds")]
    pub birds: usize,
    #[serde(default = "default_debris")]
    pub debris: usize,
    #[serde(default = "default_ducks")]
    pub ducks_per_kind: usize,
    #[serde(default = "default_airplanes")]
    pub airplanes: usize,

    /// Name shown above the local avatar.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Extra avatars without input.
    #[serde(default = "default_npcs")]
    pub npcs: Vec<String>,
    /// Avatars built with the masculine body shape.
    #[serde(default)]
    pub male_body: Vec<String>,
    #[serde(default = "default_script")]
    pub script: Vec<ScriptedKey>,
    #[serde(default = "default_speech")]
    pub speech: Vec<ScriptedSpeech>,
}

fn default_scatter_seed() -> String {
    "meadow".to_string()
}
fn default_grass_density() -> f32 {
    0.5
}
fn default_align_to_normal() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_terrain_size() -> f32 {
    200.0
}
fn default_terrain_resolution() -> u32 {
    101
}
fn default_terrain_height() -> f32 {
    8.0
}
fn default_water_level() -> Option<f32> {
    Some(1.5)
}
fn default_ticks() -> u32 {
    600
}
fn default_tick_seconds() -> f32 {
    1.0 / 60.0
}
fn default_birds() -> usize {
    75
}
fn default_debris() -> usize {
    22
}
fn default_ducks() -> usize {
    121
}
fn default_airplanes() -> usize {
    4
}
fn default_hold_ticks() -> u32 {
    1
}
fn default_player_name() -> String {
    "Anya of Earth".to_string()
}
fn default_npcs() -> Vec<String> {
    vec!["Elizabeth".to_string(), "Gloria".to_string()]
}
fn default_script() -> Vec<ScriptedKey> {
    vec![
        ScriptedKey {
            key: "W".to_string(),
            from_tick: 30,
            ticks: 120,
        },
        ScriptedKey {
            key: "A".to_string(),
            from_tick: 90,
            ticks: 30,
        },
        ScriptedKey {
            key: "R".to_string(),
            from_tick: 240,
            ticks: 1,
        },
        ScriptedKey {
            key: "C".to_string(),
            from_tick: 300,
            ticks: 1,
        },
        ScriptedKey {
            key: "R".to_string(),
            from_tick: 420,
            ticks: 1,
        },
        ScriptedKey {
            key: "P".to_string(),
            from_tick: 480,
            ticks: 1,
        },
    ]
}
fn default_speech() -> Vec<ScriptedSpeech> {
    vec![ScriptedSpeech {
        speaker: "Elizabeth".to_string(),
        text: "Lovely day for a walk!".to_string(),
        at_tick: 60,
    }]
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scatter_seed: default_scatter_seed(),
            grass_density: default_grass_density(),
            grass_channel: DensityChannel::default(),
            align_to_normal: default_align_to_normal(),
            vertex_grass: default_true(),
            terrain_size: default_terrain_size(),
            terrain_resolution: default_terrain_resolution(),
            terrain_height: default_terrain_height(),
            terrain_seed: 0,
            water_level: default_water_level(),
            ticks: default_ticks(),
            tick_seconds: default_tick_seconds(),
            rain: false,
            dense_rain: false,
            birds: default_birds(),
            debris: default_debris(),
            ducks_per_kind: default_ducks(),
            airplanes: default_airplanes(),
            player_name: default_player_name(),
            npcs: default_npcs(),
            male_body: Vec::new(),
            script: default_script(),
            speech: default_speech(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    /// A missing file is written out with the defaults so it can be edited.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            return Self::from_ron(&data).unwrap_or_else(|e| {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            });
        }
        let config = Self::default();
        config.save();
        config
    }

    /// Parse and sanitize a RON document.
    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        let config: Self = ron::from_str(data)?;
        Ok(config.sanitized())
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    /// Clamp values the world cannot use.
    fn sanitized(mut self) -> Self {
        if !(self.grass_density >= 0.0) {
            log::warn!("grass_density {} clamped to 0", self.grass_density);
            self.grass_density = 0.0;
        }
        self.align_to_normal = if self.align_to_normal.is_finite() {
            self.align_to_normal.clamp(0.0, 1.0)
        } else {
            default_align_to_normal()
        };
        if self.terrain_resolution < 2 {
            log::warn!("terrain_resolution {} too small, using 2", self.terrain_resolution);
            self.terrain_resolution = 2;
        }
        if !(self.tick_seconds > 0.0) {
            log::warn!("tick_seconds {} invalid, using 1/60", self.tick_seconds);
            self.tick_seconds = default_tick_seconds();
        }
        self.script.retain(|k| {
            let ok = k.key_code().is_some();
            if !ok {
                log::warn!("Dropping scripted key '{}'", k.key);
            }
            ok
        });
        self
    }

    pub fn terrain(&self) -> TerrainConfig {
        TerrainConfig {
            size: self.terrain_size,
            resolution: self.terrain_resolution,
            height_scale: self.terrain_height,
            seed: self.terrain_seed,
            water_level: self.water_level,
            ..Default::default()
        }
    }

    /// Keys the script holds down on `tick`.
    pub fn keys_down(&self, tick: u32) -> impl Iterator<Item = KeyCode> + '_ {
        self.script
            .iter()
            .filter(move |k| k.is_down(tick))
            .filter_map(ScriptedKey::key_code)
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = GameConfig::from_ron("()").unwrap();
        assert_eq!(config.scatter_seed, "meadow");
        assert_eq!(config.birds, 75);
        assert_eq!(config.water_level, Some(1.5));
        assert_eq!(config.npcs, vec!["Elizabeth".to_string(), "Gloria".to_string()]);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = GameConfig::from_ron("(rain: true, grass_channel: Green, water_level: None)").unwrap();
        assert!(config.rain);
        assert_eq!(config.grass_channel, DensityChannel::Green);
        assert_eq!(config.water_level, None);
        assert_eq!(config.terrain().water_level, None);
        assert!(config.male_body.is_empty());

        let config = GameConfig::from_ron(r#"(male_body: ["Gloria"])"#).unwrap();
        assert_eq!(config.male_body, vec!["Gloria".to_string()]);
    }

    #[test]
    fn bad_values_are_sanitized() {
        let config = GameConfig::from_ron(
            r#"(grass_density: -3.0, align_to_normal: 7.0, tick_seconds: 0.0,
                script: [(key: "W", from_tick: 0), (key: "F12", from_tick: 0)])"#,
        )
        .unwrap();
        assert_eq!(config.grass_density, 0.0);
        assert_eq!(config.align_to_normal, 1.0);
        assert!(config.tick_seconds > 0.0);
        assert_eq!(config.script.len(), 1);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(GameConfig::from_ron("not ron at all {").is_err());
    }

    #[test]
    fn script_holds_keys_for_their_ticks() {
        let config = GameConfig::default();
        assert_eq!(config.keys_down(29).count(), 0);
        assert!(config.keys_down(30).any(|k| k == KeyCode::KeyW));
        assert!(config.keys_down(100).any(|k| k == KeyCode::KeyA));
        assert_eq!(config.keys_down(150).count(), 0);
    }

    #[test]
    fn round_trips_through_pretty_ron() {
        let config = GameConfig::default();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let back = GameConfig::from_ron(&text).unwrap();
        assert_eq!(back.script, config.script);
        assert_eq!(back.player_name, config.player_name);
    }
}
