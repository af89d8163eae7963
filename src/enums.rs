/// Capability - one of the five tiered abilities the player can lose or regain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Jump,
    Vision,
    Dash,
    MoveLeft,
    Arrows,
}

impl Capability {
    /// Canonical order used for interstitial panels
    pub const ALL: [Capability; 5] = [
        Capability::Jump,
        Capability::Vision,
        Capability::Dash,
        Capability::MoveLeft,
        Capability::Arrows,
    ];

    /// What the player notices once this capability is downgraded
    pub fn loss_effect(self) -> &'static str {
        match self {
            Capability::Jump => "Reduced jump height/count",
            Capability::Vision => "Screen becomes darker",
            Capability::Dash => "Slower movement speed",
            Capability::MoveLeft => "Cannot move left anymore",
            Capability::Arrows => "Cannot shoot arrows",
        }
    }
}

/// Facing direction - sign of horizontal motion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_sign() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::Right.sign(), 1.0);
        assert_eq!(Facing::default(), Facing::Right);
    }
}
