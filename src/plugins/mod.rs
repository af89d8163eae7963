pub mod ability;
pub mod level;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod render;
pub mod session;

pub use ability::AbilityPlugin;
pub use level::LevelPlugin;
pub use physics::PhysicsPlugin;
pub use player::PlayerPlugin;
pub use projectile::ProjectilePlugin;
pub use render::RenderPlugin;
pub use session::SessionPlugin;

use bevy::prelude::*;

/// Per-frame ordering of gameplay systems inside `Update`
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Player,
    Physics,
    Contacts,
    Session,
    Materialize,
    Effects,
}

/// Chain the gameplay sets so a frame runs input, player decisions, physics,
/// contact checks, session transitions, level rebuilds, then effects
pub fn configure_game_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Player,
            GameSet::Physics,
            GameSet::Contacts,
            GameSet::Session,
            GameSet::Materialize,
            GameSet::Effects,
        )
            .chain(),
    );
}
