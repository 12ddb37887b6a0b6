//! Keyboard input for avatar locomotion.
//!
//! [`InputState`] tracks held keys and unconsumed presses. Gameplay code reads
//! it through the [`InputProvider`] trait so avatars without a keyboard (NPCs,
//! scripted demos) can plug in their own source.

use std::collections::HashSet;

/// Source of key state queried once per tick.
pub trait InputProvider {
    /// Key is currently held.
    fn pressed(&self, key: KeyCode) -> bool;
    /// Key went down since the last call. Consumes the press.
    fn single_press(&mut self, key: KeyCode) -> bool;
}

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Presses not yet consumed by `single_press`.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat does not count as a fresh press.
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame and not consumed yet.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }
}

impl InputProvider for InputState {
    fn pressed(&self, key: KeyCode) -> bool {
        self.is_key_held(key)
    }

    fn single_press(&mut self, key: KeyCode) -> bool {
        self.keys_pressed.remove(&key)
    }
}

/// Provider that never reports input (NPC avatars).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputProvider for NoInput {
    fn pressed(&self, _: KeyCode) -> bool {
        false
    }

    fn single_press(&mut self, _: KeyCode) -> bool {
        false
    }
}

// ── Bindings ───────────────────────────────────────────────────────────────

/// Keys driving the avatar and camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub run: KeyCode,
    pub back: KeyCode,
    pub turn_left: KeyCode,
    pub turn_right: KeyCode,
    /// Counts as movement input without translating (keeps the walk cycle going).
    pub busy: KeyCode,
    pub sit: KeyCode,
    pub pose: KeyCode,
    pub camera_lock: KeyCode,
    pub screenshot: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            run: KeyCode::KeyE,
            back: KeyCode::KeyS,
            turn_left: KeyCode::KeyA,
            turn_right: KeyCode::KeyD,
            busy: KeyCode::KeyB,
            sit: KeyCode::KeyR,
            pose: KeyCode::KeyP,
            camera_lock: KeyCode::KeyL,
            screenshot: KeyCode::KeyC,
        }
    }
}

/// Everything the locomotion code reads from input in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocomotionIntent {
    pub forward: bool,
    pub run: bool,
    pub back: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub busy: bool,
    pub toggle_sit: bool,
    pub toggle_pose: bool,
    pub toggle_camera_lock: bool,
    pub screenshot: bool,
}

impl LocomotionIntent {
    /// Sample held keys and consume the toggle presses.
    pub fn sample(provider: &mut dyn InputProvider, bindings: &KeyBindings) -> Self {
        Self {
            forward: provider.pressed(bindings.forward),
            run: provider.pressed(bindings.run),
            back: provider.pressed(bindings.back),
            turn_left: provider.pressed(bindings.turn_left),
            turn_right: provider.pressed(bindings.turn_right),
            busy: provider.pressed(bindings.busy),
            toggle_sit: provider.single_press(bindings.sit),
            toggle_pose: provider.single_press(bindings.pose),
            toggle_camera_lock: provider.single_press(bindings.camera_lock),
            screenshot: provider.single_press(bindings.screenshot),
        }
    }

    /// Any input that keeps the avatar walking.
    pub fn is_moving(&self) -> bool {
        self.forward || self.run || self.back || self.turn_left || self.turn_right || self.busy
    }
}

/// Parse a letter key name ("W", "KeyW", "r") into a key code.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let letter = name.strip_prefix("Key").unwrap_or(name);
    let mut chars = letter.chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        log::warn!("Unsupported key name '{}'", name);
        return None;
    }
    let key = match c {
        'A' => KeyCode::KeyA,
        'B' => KeyCode::KeyB,
        'C' => KeyCode::KeyC,
        'D' => KeyCode::KeyD,
        'E' => KeyCode::KeyE,
        'L' => KeyCode::KeyL,
        'P' => KeyCode::KeyP,
        'R' => KeyCode::KeyR,
        'S' => KeyCode::KeyS,
        'W' => KeyCode::KeyW,
        _ => {
            log::warn!("Key '{}' has no binding", name);
            return None;
        }
    };
    Some(key)
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;
