//! Floating text labels, screenshot boards and their interaction callbacks.
//!
//! Labels hang off an avatar's head. Speech lines vanish after five seconds;
//! name labels stay. Clickable things are identified by [`InstanceId`] and their
//! callbacks live in a side table owned by the controller.

use std::collections::HashMap;

use engine_core::{Entity, Lifetime, Transform, Vec3};

/// How long a speech line stays up.
pub const SPEECH_SECONDS: f32 = 5.0;

const FONT_SIZE: f32 = 48.0;
const PLANE_HEIGHT: f32 = 0.25;
/// Average glyph advance relative to the font size.
const GLYPH_ADVANCE: f32 = 0.55;

/// Identifier of anything the overlay can show or pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

pub type InteractionCallback = Box<dyn FnMut(InstanceId) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// White text, never expires (avatar names).
    Persistent,
    /// Dark text on a rounded white card, removed after [`SPEECH_SECONDS`].
    Speech,
}

/// A billboard text plane attached to an avatar.
#[derive(Debug, Clone)]
pub struct TextLabel {
    pub id: InstanceId,
    pub text: String,
    pub anchor: Entity,
    pub style: TextStyle,
    /// Offset below the anchor bone.
    pub offset: Vec3,
    pub width: f32,
    pub height: f32,
    lifetime: Option<Lifetime>,
}

impl TextLabel {
    /// Plane width for a string, keeping the text's aspect ratio.
    pub fn plane_width(text: &str) -> f32 {
        let texture_height = 1.5 * FONT_SIZE;
        let texture_width = text.chars().count() as f32 * FONT_SIZE * GLYPH_ADVANCE + 32.0;
        texture_width * (PLANE_HEIGHT / texture_height)
    }
}

/// A captured frame shown as a board in the world.
#[derive(Debug, Clone)]
pub struct ScreenshotBoard {
    pub id: InstanceId,
    pub transform: Transform,
    pub width: f32,
    pub height: f32,
    pub payload: Vec<u8>,
}

#[derive(Default)]
pub struct OverlayController {
    next_id: u64,
    labels: Vec<TextLabel>,
    boards: Vec<ScreenshotBoard>,
    callbacks: HashMap<InstanceId, InteractionCallback>,
}

impl OverlayController {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    /// Show `text` above `anchor`.
    pub fn show_text(&mut self, text: &str, anchor: Entity, style: TextStyle) -> InstanceId {
        let id = self.allocate();
        let (offset, lifetime) = match style {
            TextStyle::Persistent => (Vec3::new(0.0, -1.0, 0.0), None),
            TextStyle::Speech => (Vec3::new(0.0, -0.667, 0.0), Some(Lifetime::new(SPEECH_SECONDS))),
        };
        log::debug!("Overlay text {:?} '{}' ({:?})", id, text, style);
        self.labels.push(TextLabel {
            id,
            text: text.to_string(),
            anchor,
            style,
            offset,
            width: TextLabel::plane_width(text),
            height: PLANE_HEIGHT,
            lifetime,
        });
        id
    }

    /// Place a screenshot board near `around`, facing it.
    pub fn add_screenshot_board(&mut self, around: Vec3, offset: Vec3, payload: Vec<u8>) -> InstanceId {
        let id = self.allocate();
        let mut transform = Transform::from_position(around + offset);
        transform.face_towards(around);
        log::info!("Screenshot board {:?} ({} bytes)", id, payload.len());
        self.boards.push(ScreenshotBoard {
            id,
            transform,
            width: 19.2,
            height: 10.8,
            payload,
        });
        id
    }

    /// Attach a callback run when `id` is picked.
    pub fn on_interact(&mut self, id: InstanceId, callback: InteractionCallback) {
        self.callbacks.insert(id, callback);
    }

    /// Run the callback for `id`. Returns false if nothing is registered.
    pub fn interact(&mut self, id: InstanceId) -> bool {
        match self.callbacks.get_mut(&id) {
            Some(callback) => {
                callback(id);
                true
            }
            None => false,
        }
    }

    /// Expire speech lines and drop their callbacks. Returns the expired labels.
    pub fn update(&mut self, dt: f32) -> Vec<TextLabel> {
        let mut expired = Vec::new();
        self.labels.retain_mut(|label| {
            let done = label.lifetime.as_mut().is_some_and(|l| l.update(dt));
            if done {
                expired.push(label.clone());
            }
            !done
        });
        for label in &expired {
            self.callbacks.remove(&label.id);
        }
        expired
    }

    /// `anchor` still has a speech line up.
    pub fn is_speaking(&self, anchor: Entity) -> bool {
        self.labels
            .iter()
            .any(|l| l.anchor == anchor && l.style == TextStyle::Speech)
    }

    /// Remove every label anchored to an avatar that left.
    pub fn detach(&mut self, anchor: Entity) {
        let callbacks = &mut self.callbacks;
        self.labels.retain(|label| {
            let keep = label.anchor != anchor;
            if !keep {
                callbacks.remove(&label.id);
            }
            keep
        });
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    pub fn label(&self, id: InstanceId) -> Option<&TextLabel> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn boards(&self) -> &[ScreenshotBoard] {
        &self.boards
    }

    pub fn board(&self, id: InstanceId) -> Option<&ScreenshotBoard> {
        self.boards.iter().find(|b| b.id == id)
    }

    /// World position of each label given a lookup from anchor to head position.
    pub fn label_positions<F>(&self, mut head_of: F) -> Vec<(InstanceId, Vec3)>
    where
        F: FnMut(Entity) -> Option<Vec3>,
    {
        self.labels
            .iter()
            .filter_map(|label| head_of(label.anchor).map(|head| (label.id, head + label.offset)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::World;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn anchor() -> Entity {
        let mut world = World::new();
        world.spawn(())
    }

    #[test]
    fn speech_vanishes_after_five_seconds() {
        let mut overlay = OverlayController::new();
        let who = anchor();
        let name = overlay.show_text("Anya of Earth", who, TextStyle::Persistent);
        let line = overlay.show_text("Hello!", who, TextStyle::Speech);

        assert!(overlay.update(4.9).is_empty());
        assert!(overlay.label(line).is_some());
        assert!(overlay.is_speaking(who));

        let expired = overlay.update(0.2);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, line);
        assert_eq!(expired[0].anchor, who);
        assert!(overlay.label(line).is_none());
        assert!(overlay.label(name).is_some());
        assert!(!overlay.is_speaking(who));
    }

    #[test]
    fn callbacks_are_looked_up_by_id() {
        let mut overlay = OverlayController::new();
        let who = anchor();
        let line = overlay.show_text("Talk to me", who, TextStyle::Speech);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        overlay.on_interact(
            line,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(overlay.interact(line));
        assert!(!overlay.interact(InstanceId(999)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        overlay.update(SPEECH_SECONDS + 0.1);
        assert!(!overlay.interact(line));
    }

    #[test]
    fn screenshot_board_faces_player() {
        let mut overlay = OverlayController::new();
        let player = Vec3::new(10.0, 2.0, 0.0);
        let id = overlay.add_screenshot_board(player, Vec3::new(0.0, 6.0, 30.0), vec![1, 2, 3]);
        let board = overlay.board(id).unwrap();
        assert_eq!(board.payload, vec![1, 2, 3]);
        let facing = board.transform.rotation * Vec3::Z;
        let to_player = (player - board.transform.position).normalize();
        assert!((facing - to_player).length() < 1e-5);
    }

    #[test]
    fn label_positions_follow_anchor() {
        let mut overlay = OverlayController::new();
        let who = anchor();
        overlay.show_text("Gloria", who, TextStyle::Persistent);
        let positions = overlay.label_positions(|_| Some(Vec3::new(0.0, 4.0, 0.0)));
        assert_eq!(positions.len(), 1);
        assert!((positions[0].1.y - 3.0).abs() < 1e-6);

        overlay.detach(who);
        assert!(overlay.labels().is_empty());
    }

    #[test]
    fn longer_text_gets_wider_plane() {
        assert!(TextLabel::plane_width("Hi") < TextLabel::plane_width("Hello there"));
    }
}
