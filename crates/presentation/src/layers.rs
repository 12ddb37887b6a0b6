//! Per-avatar animation layers fed by the blender.
//!
//! Clips and morph targets arrive with the avatar model. Until they do, weight
//! updates for them are dropped without complaint and retried next tick.

use std::collections::BTreeMap;

use animation::AnimationSink;
use engine_core::AssetHandle;

/// A looping clip and its current blend weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipLayer {
    pub name: String,
    pub duration: f32,
    pub time: f32,
    pub weight: f32,
}

impl ClipLayer {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            time: 0.0,
            weight: 0.0,
        }
    }

    /// Play forward, looping. Silent clips stay put.
    pub fn advance(&mut self, dt: f32) {
        if self.weight <= 0.0 || self.duration <= 0.0 {
            return;
        }
        self.time = (self.time + dt).rem_euclid(self.duration);
    }
}

#[derive(Debug, Default)]
pub struct AnimationLayers {
    clips: BTreeMap<String, AssetHandle<ClipLayer>>,
    morphs: BTreeMap<String, AssetHandle<f32>>,
    skipped: u64,
}

impl AnimationLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a clip that the model loader will deliver later.
    pub fn expect_clip(&mut self, name: &str) {
        self.clips.entry(name.to_string()).or_default();
    }

    pub fn deliver_clip(&mut self, clip: ClipLayer) {
        log::info!("Animation clip '{}' loaded ({:.2}s)", clip.name, clip.duration);
        self.clips.entry(clip.name.clone()).or_default().complete(clip);
    }

    pub fn fail_clip(&mut self, name: &str, reason: &str) {
        self.clips
            .entry(name.to_string())
            .or_default()
            .fail(format!("clip '{}': {}", name, reason));
    }

    /// Register a loaded morph target with zero influence.
    pub fn deliver_morph(&mut self, name: &str) {
        self.morphs.entry(name.to_string()).or_default().complete(0.0);
    }

    pub fn clip(&self, name: &str) -> Option<&ClipLayer> {
        self.clips.get(name).and_then(AssetHandle::loaded)
    }

    pub fn clip_weight(&self, name: &str) -> Option<f32> {
        self.clip(name).map(|c| c.weight)
    }

    pub fn morph_influence(&self, name: &str) -> Option<f32> {
        self.morphs.get(name).and_then(AssetHandle::loaded).copied()
    }

    /// Updates dropped because their target was not loaded.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn advance(&mut self, dt: f32) {
        for clip in self.clips.values_mut().filter_map(AssetHandle::loaded_mut) {
            clip.advance(dt);
        }
    }
}

impl AnimationSink for AnimationLayers {
    fn set_weight(&mut self, clip: &str, weight: f32) {
        match self.clips.get_mut(clip).and_then(AssetHandle::loaded_mut) {
            Some(layer) => layer.weight = weight.clamp(0.0, 1.0),
            None => {
                self.skipped += 1;
                log::trace!("Clip '{}' not loaded, weight {} skipped", clip, weight);
            }
        }
    }

    fn set_morph_influence(&mut self, morph: &str, influence: f32) {
        match self.morphs.get_mut(morph).and_then(AssetHandle::loaded_mut) {
            Some(value) => *value = influence.clamp(0.0, 1.0),
            None => {
                self.skipped += 1;
                log::trace!("Morph '{}' not loaded, influence {} skipped", morph, influence);
            }
        }
    }
}
