//! Cosmetic morph blends.
//!
//! A [`Morphie`] is one `(value, target)` pair stepping linearly toward a binary
//! target. A [`MorphGroup`] drives any number of morph targets from a single
//! morphie, so every target in the group always receives the same influence.

/// Linear blend toward 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Morphie {
    pub value: f32,
    pub target: f32,
}

impl Morphie {
    pub fn new(value: f32) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self { value, target: value }
    }

    /// Switch the target on or off.
    pub fn set_on(&mut self, on: bool) {
        self.target = if on { 1.0 } else { 0.0 };
    }

    pub fn is_on(&self) -> bool {
        self.target >= 0.5
    }

    /// Step toward the target by `rate * dt`, never past it.
    pub fn update(&mut self, dt: f32, rate: f32) {
        let step = (rate * dt).max(0.0);
        if self.value < self.target {
            self.value = (self.value + step).min(self.target);
        } else if self.value > self.target {
            self.value = (self.value - step).max(self.target);
        }
        self.value = self.value.clamp(0.0, 1.0);
    }

    /// Eased influence: slow start, fast finish.
    pub fn influence(&self, exponent: i32) -> f32 {
        self.value.clamp(0.0, 1.0).powi(exponent)
    }
}

/// Morph targets on several sub-meshes that move in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphGroup {
    pub name: String,
    pub targets: Vec<String>,
    pub morphie: Morphie,
}

impl MorphGroup {
    pub fn new(name: impl Into<String>, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            morphie: Morphie::default(),
        }
    }

    /// `(target, influence)` for every target, all sharing one value.
    pub fn influences(&self, exponent: i32) -> impl Iterator<Item = (&str, f32)> + '_ {
        let influence = self.morphie.influence(exponent);
        self.targets.iter().map(move |t| (t.as_str(), influence))
    }
}
