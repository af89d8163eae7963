use crate::abilities::AbilitySet;
use crate::components::{Arrow, Collider, Fireball, Goal, Hazard, Patrol, Player, Position, Solid};
use crate::level::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::plugins::player::PlayerController;
use crate::plugins::session::{PANEL_COLUMNS, Session, SessionPhase};
use bevy::ecs::query::Has;
use bevy::prelude::*;

/// Interstitial grid layout, world units
const PANEL_START_X: f32 = 240.0;
const PANEL_START_Y: f32 = 320.0;
const PANEL_BOX_SIZE: f32 = 280.0;
const PANEL_SPACING: f32 = 40.0;

/// Draw order
const Z_LEVEL: f32 = 0.0;
const Z_PROJECTILE: f32 = 5.0;
const Z_PLAYER: f32 = 10.0;
const Z_BACKDROP: f32 = 20.0;
const Z_PANEL: f32 = 21.0;
const Z_VISION: f32 = 100.0;

/// Plugin for the placeholder sprite presentation
pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelView>()
            .add_systems(Startup, (setup_camera, setup_vision_overlay))
            .add_systems(
                PostUpdate,
                (
                    attach_sprites_system,
                    sync_transforms_system,
                    tint_player_system,
                    update_vision_overlay_system,
                    update_panel_system,
                    fit_camera_projection,
                )
                    .chain(),
            );
    }
}

#[derive(Component)]
pub struct GameCamera;

#[derive(Component)]
pub struct VisionOverlay;

/// Part of the interstitial panel currently on screen
#[derive(Component)]
pub struct PanelUi;

/// What the panel entities were last built from
#[derive(Resource, Default, Debug, PartialEq)]
pub struct PanelView {
    pub boxes: Vec<Color>,
}

/// Convert a y-down world position into Bevy's centred, y-up space
pub fn world_to_screen(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x - WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0 - y, z)
}

/// Centre of the `index`-th interstitial box in world space
pub fn panel_box_center(index: usize) -> Vec2 {
    let col = (index % PANEL_COLUMNS) as f32;
    let row = (index / PANEL_COLUMNS) as f32;
    Vec2::new(
        PANEL_START_X + col * (PANEL_BOX_SIZE + PANEL_SPACING),
        PANEL_START_Y + row * (PANEL_BOX_SIZE + PANEL_SPACING),
    )
}

/// Box colours for the open interstitial, empty when none is open
pub fn panel_colors(phase: &SessionPhase) -> Vec<Color> {
    match phase {
        SessionPhase::AbilityChoice(panel) => (0..panel.options.len())
            .map(|i| {
                if i == panel.cursor {
                    Color::rgb_u8(0x55, 0x55, 0x55)
                } else {
                    Color::rgb_u8(0x33, 0x33, 0x33)
                }
            })
            .collect(),
        SessionPhase::AbilityGain(panel) => panel
            .options
            .iter()
            .enumerate()
            .map(|(i, capability)| {
                if panel.picked.contains(capability) {
                    Color::rgb_u8(0x44, 0xff, 0x44)
                } else if i == panel.cursor {
                    Color::rgb_u8(0x33, 0x66, 0x33)
                } else {
                    Color::rgb_u8(0x22, 0x44, 0x22)
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2dBundle::default(), GameCamera));
}

fn setup_vision_overlay(mut commands: Commands, abilities: Res<AbilitySet>) {
    commands.spawn((
        VisionOverlay,
        SpriteBundle {
            sprite: Sprite {
                color: Color::rgba(0.0, 0.0, 0.0, abilities.vision_alpha()),
                custom_size: Some(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT)),
                ..default()
            },
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, Z_VISION)),
            ..default()
        },
    ));
}

/// Give every new collider a coloured placeholder sprite
#[allow(clippy::type_complexity)]
fn attach_sprites_system(
    mut commands: Commands,
    query: Query<
        (
            Entity,
            &Position,
            &Collider,
            Has<Player>,
            Has<Solid>,
            Has<Hazard>,
            Has<Patrol>,
            Has<Goal>,
            Has<Arrow>,
            Has<Fireball>,
        ),
        Added<Collider>,
    >,
) {
    for (entity, position, collider, player, solid, hazard, enemy, goal, arrow, fireball) in
        query.iter()
    {
        let (color, z) = if player {
            (Color::rgb(0.95, 0.85, 0.55), Z_PLAYER)
        } else if fireball {
            (Color::rgb(1.0, 0.45, 0.1), Z_PROJECTILE)
        } else if arrow {
            (Color::rgb(0.8, 0.7, 0.5), Z_PROJECTILE)
        } else if enemy {
            (Color::rgb(0.6, 0.1, 0.6), Z_LEVEL)
        } else if hazard {
            (Color::rgb(0.85, 0.15, 0.1), Z_LEVEL)
        } else if goal {
            (Color::rgb(0.3, 0.6, 1.0), Z_LEVEL)
        } else if solid {
            (Color::rgb(0.45, 0.4, 0.35), Z_LEVEL)
        } else {
            continue;
        };

        commands.entity(entity).insert(SpriteBundle {
            sprite: Sprite {
                color,
                custom_size: Some(Vec2::new(collider.width, collider.height)),
                ..default()
            },
            transform: Transform::from_translation(world_to_screen(position.x, position.y, z)),
            ..default()
        });
    }
}

fn sync_transforms_system(
    mut query: Query<(&Position, &mut Transform, Option<&PlayerController>)>,
) {
    for (position, mut transform, controller) in query.iter_mut() {
        transform.translation = world_to_screen(position.x, position.y, transform.translation.z);
        if let Some(controller) = controller {
            // Screen y points up, so clockwise world tilt is negative here
            transform.rotation = Quat::from_rotation_z(-controller.rotation);
        }
    }
}

fn tint_player_system(mut query: Query<(&PlayerController, &mut Sprite), Changed<PlayerController>>) {
    for (controller, mut sprite) in query.iter_mut() {
        sprite.color = if controller.is_dead {
            Color::rgb(1.0, 0.0, 0.0)
        } else {
            Color::rgb(0.95, 0.85, 0.55)
        };
    }
}

fn update_vision_overlay_system(
    abilities: Res<AbilitySet>,
    mut query: Query<&mut Sprite, With<VisionOverlay>>,
) {
    if !abilities.is_changed() {
        return;
    }
    for mut sprite in query.iter_mut() {
        sprite.color.set_a(abilities.vision_alpha());
    }
}

/// Rebuild the interstitial boxes whenever their look changes
fn update_panel_system(
    mut commands: Commands,
    session: Res<Session>,
    mut view: ResMut<PanelView>,
    existing: Query<Entity, With<PanelUi>>,
) {
    let boxes = panel_colors(session.phase());
    if boxes == view.boxes {
        return;
    }

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    if !boxes.is_empty() {
        commands.spawn((
            PanelUi,
            SpriteBundle {
                sprite: Sprite {
                    color: Color::rgba(0.0, 0.0, 0.0, 0.9),
                    custom_size: Some(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT)),
                    ..default()
                },
                transform: Transform::from_translation(Vec3::new(0.0, 0.0, Z_BACKDROP)),
                ..default()
            },
        ));
        for (index, color) in boxes.iter().enumerate() {
            let center = panel_box_center(index);
            commands.spawn((
                PanelUi,
                SpriteBundle {
                    sprite: Sprite {
                        color: *color,
                        custom_size: Some(Vec2::splat(PANEL_BOX_SIZE)),
                        ..default()
                    },
                    transform: Transform::from_translation(world_to_screen(
                        center.x, center.y, Z_PANEL,
                    )),
                    ..default()
                },
            ));
        }
    }

    view.boxes = boxes;
}

/// Scale the projection so the whole world fits the window
fn fit_camera_projection(
    windows: Query<&Window>,
    mut camera_query: Query<&mut OrthographicProjection, With<GameCamera>>,
) {
    let Ok(mut projection) = camera_query.get_single_mut() else {
        return;
    };
    let Some(window) = windows.iter().next() else {
        return;
    };
    if window.width() <= 0.0 || window.height() <= 0.0 {
        return;
    }

    let scale = (WORLD_WIDTH / window.width()).max(WORLD_HEIGHT / window.height());
    projection.scale = scale;
}
