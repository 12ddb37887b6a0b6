//! Output side of the blender.

use std::collections::BTreeMap;

/// Receives per-clip weights and per-morph influences once per tick.
pub trait AnimationSink {
    fn set_weight(&mut self, clip: &str, weight: f32);
    fn set_morph_influence(&mut self, morph: &str, influence: f32);
}

/// Read-only snapshot of one tick's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlendFrame {
    pub clips: BTreeMap<String, f32>,
    pub morphs: BTreeMap<String, f32>,
}

impl BlendFrame {
    pub fn clip(&self, name: &str) -> Option<f32> {
        self.clips.get(name).copied()
    }

    pub fn morph(&self, name: &str) -> Option<f32> {
        self.morphs.get(name).copied()
    }

    /// Forward everything to a sink, clips first.
    pub fn apply_to(&self, sink: &mut dyn AnimationSink) {
        for (clip, &weight) in &self.clips {
            sink.set_weight(clip, weight);
        }
        for (morph, &influence) in &self.morphs {
            sink.set_morph_influence(morph, influence);
        }
    }
}

impl AnimationSink for BlendFrame {
    fn set_weight(&mut self, clip: &str, weight: f32) {
        self.clips.insert(clip.to_string(), weight);
    }

    fn set_morph_influence(&mut self, morph: &str, influence: f32) {
        self.morphs.insert(morph.to_string(), influence);
    }
}
