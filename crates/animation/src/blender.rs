//! Locomotion blend weights.
//!
//! Every state owns an independent weight in [0, 1]. Requested states blend in
//! at `speed`, the rest blend out 1.5× faster. Idle is requested only when no
//! other state is. Weights are clamped after every step, so a stalled frame
//! with a huge `dt` lands exactly on a bound.

use crate::morph::{MorphGroup, Morphie};
use crate::sink::{AnimationSink, BlendFrame};

pub const WALKING_CLIP: &str = "Walking";
pub const IDLE_CLIP: &str = "Idle";
pub const SITTING_CLIP: &str = "Sitting";
pub const POSING_CLIP: &str = "Posing";

/// The clip an avatar is currently playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LocomotionState {
    #[default]
    Idle,
    Walking,
    Sitting,
    Posing,
}

impl LocomotionState {
    pub const ALL: [LocomotionState; 4] = [
        LocomotionState::Idle,
        LocomotionState::Walking,
        LocomotionState::Sitting,
        LocomotionState::Posing,
    ];

    pub fn clip_name(self) -> &'static str {
        match self {
            LocomotionState::Idle => IDLE_CLIP,
            LocomotionState::Walking => WALKING_CLIP,
            LocomotionState::Sitting => SITTING_CLIP,
            LocomotionState::Posing => POSING_CLIP,
        }
    }

    /// Active state for a set of flags. Posing wins over sitting, sitting over walking.
    pub fn from_flags(flags: StateFlags) -> Self {
        if flags.posing {
            LocomotionState::Posing
        } else if flags.sitting {
            LocomotionState::Sitting
        } else if flags.walking {
            LocomotionState::Walking
        } else {
            LocomotionState::Idle
        }
    }
}

/// Which states the locomotion code is requesting this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFlags {
    pub walking: bool,
    pub sitting: bool,
    pub posing: bool,
}

impl StateFlags {
    pub fn idle(&self) -> bool {
        !(self.walking || self.sitting || self.posing)
    }
}

/// Blend tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendConfig {
    /// Blend-in rate per second.
    pub speed: f32,
    /// Blend-out rate relative to `speed`.
    pub fade_out_factor: f32,
    /// Linear rate of cosmetic morphs per second.
    pub morph_rate: f32,
    /// Exponent of the cosmetic ease-in curve.
    pub morph_exponent: i32,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            fade_out_factor: 1.5,
            morph_rate: 2.0,
            morph_exponent: 2,
        }
    }
}

/// Per-state weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationWeights {
    pub walking: f32,
    pub sitting: f32,
    pub idle: f32,
    pub posing: f32,
}

impl Default for AnimationWeights {
    /// Fully idle.
    fn default() -> Self {
        Self {
            walking: 0.0,
            sitting: 0.0,
            idle: 1.0,
            posing: 0.0,
        }
    }
}

impl AnimationWeights {
    pub fn get(&self, state: LocomotionState) -> f32 {
        match state {
            LocomotionState::Idle => self.idle,
            LocomotionState::Walking => self.walking,
            LocomotionState::Sitting => self.sitting,
            LocomotionState::Posing => self.posing,
        }
    }

    fn get_mut(&mut self, state: LocomotionState) -> &mut f32 {
        match state {
            LocomotionState::Idle => &mut self.idle,
            LocomotionState::Walking => &mut self.walking,
            LocomotionState::Sitting => &mut self.sitting,
            LocomotionState::Posing => &mut self.posing,
        }
    }
}

/// Eases locomotion weights and cosmetic morphs every tick.
#[derive(Debug, Clone, Default)]
pub struct AnimationBlender {
    pub config: BlendConfig,
    weights: AnimationWeights,
    morph_groups: Vec<MorphGroup>,
}

impl AnimationBlender {
    pub fn new(config: BlendConfig) -> Self {
        Self {
            config,
            weights: AnimationWeights::default(),
            morph_groups: Vec::new(),
        }
    }

    pub fn weights(&self) -> AnimationWeights {
        self.weights
    }

    pub fn weight(&self, state: LocomotionState) -> f32 {
        self.weights.get(state)
    }

    /// The weight sits on 0 or 1, so a new toggle may start.
    pub fn is_at_rest(&self, state: LocomotionState) -> bool {
        let w = self.weights.get(state);
        w == 0.0 || w == 1.0
    }

    /// Overwrite weights (clamped). For restoring saved avatars.
    pub fn set_weights(&mut self, weights: AnimationWeights) {
        self.weights = weights;
        for state in LocomotionState::ALL {
            let w = self.weights.get_mut(state);
            *w = w.clamp(0.0, 1.0);
        }
    }

    // ── Morphs ──────────────────────────────────────────────────────────

    /// Register a morph group. A group with an existing name replaces it.
    pub fn add_morph_group(&mut self, group: MorphGroup) {
        if let Some(existing) = self.morph_groups.iter_mut().find(|g| g.name == group.name) {
            *existing = group;
        } else {
            self.morph_groups.push(group);
        }
    }

    /// Turn a cosmetic blend (e.g. "Smile") on or off. Unknown names are ignored.
    pub fn set_morph(&mut self, name: &str, on: bool) -> bool {
        match self.morph_groups.iter_mut().find(|g| g.name == name) {
            Some(group) => {
                group.morphie.set_on(on);
                true
            }
            None => {
                log::debug!("No morph group named '{}'", name);
                false
            }
        }
    }

    pub fn morphie(&self, name: &str) -> Option<Morphie> {
        self.morph_groups.iter().find(|g| g.name == name).map(|g| g.morphie)
    }

    // ── Tick ────────────────────────────────────────────────────────────

    /// Advance all weights by `dt` seconds and return this tick's output.
    pub fn advance(&mut self, flags: StateFlags, dt: f32) -> BlendFrame {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let rise = dt * self.config.speed;
        let fall = dt * self.config.speed * self.config.fade_out_factor;

        let requested = [
            (LocomotionState::Walking, flags.walking),
            (LocomotionState::Sitting, flags.sitting),
            (LocomotionState::Posing, flags.posing),
            (LocomotionState::Idle, flags.idle()),
        ];
        for (state, on) in requested {
            let w = self.weights.get_mut(state);
            let next = if on { *w + rise } else { *w - fall };
            *w = next.clamp(0.0, 1.0);
        }

        for group in &mut self.morph_groups {
            group.morphie.update(dt, self.config.morph_rate);
        }

        self.frame()
    }

    /// Current output without advancing.
    pub fn frame(&self) -> BlendFrame {
        let mut frame = BlendFrame::default();
        for state in LocomotionState::ALL {
            frame.set_weight(state.clip_name(), self.weights.get(state));
        }
        for group in &self.morph_groups {
            for (target, influence) in group.influences(self.config.morph_exponent) {
                frame.set_morph_influence(target, influence);
            }
        }
        frame
    }

    /// Advance and push the result straight into a sink.
    pub fn advance_into(&mut self, flags: StateFlags, dt: f32, sink: &mut dyn AnimationSink) {
        self.advance(flags, dt).apply_to(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking() -> StateFlags {
        StateFlags {
            walking: true,
            ..Default::default()
        }
    }

    fn sitting() -> StateFlags {
        StateFlags {
            sitting: true,
            ..Default::default()
        }
    }

    #[test]
    fn one_walking_tick_from_idle() {
        let mut blender = AnimationBlender::default();
        blender.advance(walking(), 0.1);
        let w = blender.weights();
        assert!((w.walking - 0.4).abs() < 1e-6, "walking {}", w.walking);
        assert!((w.idle - 0.4).abs() < 1e-6, "idle {}", w.idle);
        assert_eq!(w.sitting, 0.0);
        assert_eq!(w.posing, 0.0);
    }

    #[test]
    fn idle_update_is_idempotent_when_fully_idle() {
        let mut blender = AnimationBlender::new(BlendConfig::default());
        let before = blender.weights();
        for _ in 0..10 {
            blender.advance(StateFlags::default(), 0.016);
        }
        assert_eq!(blender.weights(), before);
    }

    #[test]
    fn huge_dt_stays_in_bounds() {
        let mut blender = AnimationBlender::new(BlendConfig::default());
        for flags in [walking(), sitting(), StateFlags::default(), walking()] {
            blender.advance(flags, 1.0e6);
            for state in LocomotionState::ALL {
                let w = blender.weight(state);
                assert!((0.0..=1.0).contains(&w), "{:?} = {}", state, w);
            }
        }
        assert_eq!(blender.weight(LocomotionState::Walking), 1.0);
        assert_eq!(blender.weight(LocomotionState::Idle), 0.0);
    }

    #[test]
    fn nan_dt_changes_nothing() {
        let mut blender = AnimationBlender::new(BlendConfig::default());
        blender.advance(walking(), f32::NAN);
        assert_eq!(blender.weights(), AnimationWeights::default());
    }

    #[test]
    fn blend_out_is_faster_than_blend_in() {
        let mut blender = AnimationBlender::new(BlendConfig::default());
        blender.advance(sitting(), 0.05);
        let w = blender.weights();
        assert!((w.sitting - 0.2).abs() < 1e-6);
        assert!((w.idle - 0.7).abs() < 1e-6);
    }

    #[test]
    fn rest_guard_reports_mid_transition() {
        let mut blender = AnimationBlender::new(BlendConfig::default());
        assert!(blender.is_at_rest(LocomotionState::Sitting));
        blender.advance(sitting(), 0.125);
        assert!(!blender.is_at_rest(LocomotionState::Sitting));
        blender.advance(sitting(), 1.0);
        assert!(blender.is_at_rest(LocomotionState::Sitting));
    }

    #[test]
    fn frame_contains_every_clip_and_group_target() {
        let mut blender = AnimationBlender::new(BlendConfig::default());
        blender.add_morph_group(MorphGroup::new("Smile", ["Face.Smile"]));
        blender.add_morph_group(MorphGroup::new("Male", ["Body.Male", "Face.Male"]));
        assert!(blender.set_morph("Male", true));
        assert!(!blender.set_morph("Frown", true));

        let frame = blender.advance(StateFlags::default(), 0.25);
        for state in LocomotionState::ALL {
            assert!(frame.clip(state.clip_name()).is_some());
        }
        assert_eq!(frame.morph("Face.Smile"), Some(0.0));
        let body = frame.morph("Body.Male").unwrap();
        assert_eq!(Some(body), frame.morph("Face.Male"));
        assert!((body - 0.25).abs() < 1e-6);
    }

    #[test]
    fn state_priority() {
        let flags = StateFlags {
            walking: true,
            sitting: true,
            posing: false,
        };
        assert_eq!(LocomotionState::from_flags(flags), LocomotionState::Sitting);
        let posing_while_seated = StateFlags {
            posing: true,
            ..flags
        };
        assert_eq!(LocomotionState::from_flags(posing_while_seated), LocomotionState::Posing);
        assert_eq!(LocomotionState::from_flags(StateFlags::default()), LocomotionState::Idle);
    }
}
