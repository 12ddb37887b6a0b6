//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for the kinds of things in the meadow.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (ground plane, terrain heightfield)
    Environment = 1 << 0,
    /// Player and NPC avatars
    Avatar = 1 << 1,
    /// Water surface sensors
    Water = 1 << 2,
}

impl CollisionGroup {
    fn bits(groups: &[CollisionGroup]) -> Group {
        Group::from_bits_retain(groups.iter().fold(0, |acc, g| acc | *g as u32))
    }

    /// Create a collision group for environment.
    pub fn environment() -> InteractionGroups {
        InteractionGroups::new(Self::bits(&[Self::Environment]), Group::ALL)
    }

    /// Avatars block each other and stand on the environment.
    pub fn avatar() -> InteractionGroups {
        InteractionGroups::new(
            Self::bits(&[Self::Avatar]),
            Self::bits(&[Self::Environment, Self::Avatar]),
        )
    }

    /// Water only reports overlaps with avatars.
    pub fn water() -> InteractionGroups {
        InteractionGroups::new(Self::bits(&[Self::Water]), Self::bits(&[Self::Avatar]))
    }
}
