use bevy::app::AppExit;
use bevy::prelude::*;
use waning_flight::LevelCatalog;
use waning_flight::plugins::session::SessionEffect;
use waning_flight::plugins::{
    AbilityPlugin, LevelPlugin, PhysicsPlugin, PlayerPlugin, ProjectilePlugin, RenderPlugin,
    SessionPlugin,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = LevelCatalog::builtin()?;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Waning Flight".to_string(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(AbilityPlugin)
        .add_plugins(LevelPlugin::new(catalog))
        .add_plugins(PlayerPlugin)
        .add_plugins(PhysicsPlugin)
        .add_plugins(ProjectilePlugin)
        .add_plugins(SessionPlugin::default())
        .add_plugins(RenderPlugin)
        .add_systems(Last, exit_on_menu_request)
        .run();

    Ok(())
}

/// There is no menu scene, so a menu request ends the game
fn exit_on_menu_request(
    mut effects: EventReader<SessionEffect>,
    mut exit: EventWriter<AppExit>,
) {
    if effects
        .read()
        .any(|effect| *effect == SessionEffect::ReturnToMenu)
    {
        info!("Returning to menu");
        exit.send(AppExit);
    }
}
