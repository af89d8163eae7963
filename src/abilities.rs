use crate::enums::Capability;
use bevy::prelude::*;

/// Tier ceilings
pub const MAX_JUMP_TIER: u8 = 3;
pub const MAX_VISION_TIER: u8 = 2;
pub const MAX_DASH_TIER: u8 = 2;

/// Horizontal speeds per dash tier, units per second
pub const SLOW_MOVE_SPEED: f32 = 200.0;
pub const NORMAL_MOVE_SPEED: f32 = 350.0;
pub const FAST_MOVE_SPEED: f32 = 500.0;

/// Ability set - the player's current capability tiers.
///
/// Fields are private so every mutation goes through `downgrade`, `upgrade`
/// or `reset`, which clamp to each capability's bounds.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilitySet {
    jump_tier: u8,
    vision_tier: u8,
    dash_tier: u8,
    can_move_left: bool,
    can_shoot_arrows: bool,
}

impl Default for AbilitySet {
    fn default() -> Self {
        Self::full()
    }
}

impl AbilitySet {
    /// Every capability at its ceiling
    pub fn full() -> Self {
        Self {
            jump_tier: MAX_JUMP_TIER,
            vision_tier: MAX_VISION_TIER,
            dash_tier: MAX_DASH_TIER,
            can_move_left: true,
            can_shoot_arrows: true,
        }
    }

    /// Every capability at its floor
    pub fn empty() -> Self {
        Self {
            jump_tier: 0,
            vision_tier: 0,
            dash_tier: 0,
            can_move_left: false,
            can_shoot_arrows: false,
        }
    }

    /// Build a set from explicit tiers, clamping out-of-range values
    pub fn with_tiers(
        jump_tier: u8,
        vision_tier: u8,
        dash_tier: u8,
        can_move_left: bool,
        can_shoot_arrows: bool,
    ) -> Self {
        Self {
            jump_tier: jump_tier.min(MAX_JUMP_TIER),
            vision_tier: vision_tier.min(MAX_VISION_TIER),
            dash_tier: dash_tier.min(MAX_DASH_TIER),
            can_move_left,
            can_shoot_arrows,
        }
    }

    pub fn jump_tier(&self) -> u8 {
        self.jump_tier
    }

    pub fn vision_tier(&self) -> u8 {
        self.vision_tier
    }

    pub fn dash_tier(&self) -> u8 {
        self.dash_tier
    }

    pub fn can_move_left(&self) -> bool {
        self.can_move_left
    }

    pub fn can_shoot_arrows(&self) -> bool {
        self.can_shoot_arrows
    }

    /// Airborne jumps allowed between ground contacts
    pub fn max_jumps(&self) -> u32 {
        match self.jump_tier {
            3 => 4,
            2 => 2,
            1 => 1,
            _ => 0,
        }
    }

    pub fn move_speed(&self) -> f32 {
        match self.dash_tier {
            2 => FAST_MOVE_SPEED,
            1 => NORMAL_MOVE_SPEED,
            _ => SLOW_MOVE_SPEED,
        }
    }

    /// Opacity of the full-screen darkening overlay
    pub fn vision_alpha(&self) -> f32 {
        match self.vision_tier {
            2 => 0.0,
            1 => 0.3,
            _ => 0.6,
        }
    }

    pub fn can_dash(&self) -> bool {
        self.dash_tier == MAX_DASH_TIER
    }

    /// Current level of a capability, booleans counted as 0 or 1
    pub fn tier(&self, capability: Capability) -> u8 {
        match capability {
            Capability::Jump => self.jump_tier,
            Capability::Vision => self.vision_tier,
            Capability::Dash => self.dash_tier,
            Capability::MoveLeft => u8::from(self.can_move_left),
            Capability::Arrows => u8::from(self.can_shoot_arrows),
        }
    }

    pub fn ceiling(capability: Capability) -> u8 {
        match capability {
            Capability::Jump => MAX_JUMP_TIER,
            Capability::Vision => MAX_VISION_TIER,
            Capability::Dash => MAX_DASH_TIER,
            Capability::MoveLeft | Capability::Arrows => 1,
        }
    }

    pub fn can_downgrade(&self, capability: Capability) -> bool {
        self.tier(capability) > 0
    }

    pub fn can_upgrade(&self, capability: Capability) -> bool {
        self.tier(capability) < Self::ceiling(capability)
    }

    /// Lower a capability by one tier. Returns false when already at the floor.
    pub fn downgrade(&mut self, capability: Capability) -> bool {
        if !self.can_downgrade(capability) {
            return false;
        }
        match capability {
            Capability::Jump => self.jump_tier -= 1,
            Capability::Vision => self.vision_tier -= 1,
            Capability::Dash => self.dash_tier -= 1,
            Capability::MoveLeft => self.can_move_left = false,
            Capability::Arrows => self.can_shoot_arrows = false,
        }
        true
    }

    /// Raise a capability by one tier. Returns false when already at the ceiling.
    pub fn upgrade(&mut self, capability: Capability) -> bool {
        if !self.can_upgrade(capability) {
            return false;
        }
        match capability {
            Capability::Jump => self.jump_tier += 1,
            Capability::Vision => self.vision_tier += 1,
            Capability::Dash => self.dash_tier += 1,
            Capability::MoveLeft => self.can_move_left = true,
            Capability::Arrows => self.can_shoot_arrows = true,
        }
        true
    }

    pub fn reset(&mut self) {
        *self = Self::full();
    }

    /// Capabilities that can still be given up, in canonical order
    pub fn downgradable(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.can_downgrade(*c))
            .collect()
    }

    /// Capabilities that can still be regained, in canonical order
    pub fn upgradable(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.can_upgrade(*c))
            .collect()
    }

    /// Player-facing name of the capability's current tier
    pub fn describe(&self, capability: Capability) -> &'static str {
        match capability {
            Capability::Jump => match self.jump_tier {
                3 => "Flight (4 jumps)",
                2 => "Double Jump",
                1 => "Single Jump",
                _ => "No Jump",
            },
            Capability::Vision => match self.vision_tier {
                2 => "Perfect Vision",
                1 => "Dim Vision",
                _ => "Blur Vision",
            },
            Capability::Dash => match self.dash_tier {
                2 => "Dash",
                1 => "Normal Speed",
                _ => "Slow Walk",
            },
            Capability::MoveLeft if self.can_move_left => "Can Move Left",
            Capability::MoveLeft => "Cannot Move Left",
            Capability::Arrows if self.can_shoot_arrows => "Can Shoot Arrows",
            Capability::Arrows => "No Arrows",
        }
    }
}
