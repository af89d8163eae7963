use crate::components::{
    Arrow, Collider, Fireball, FireballEmitter, Hazard, LevelEntity, Lifetime, Patrol, Position,
    Velocity,
};
use crate::level::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::plugins::GameSet;
use crate::plugins::physics::aabb_overlap;
use crate::plugins::player::ArrowShot;
use bevy::prelude::*;

/// Projectile constants
pub const ARROW_SPEED: f32 = 800.0; // units per second
pub const ARROW_LIFETIME: f32 = 3.0; // seconds
pub const ARROW_WIDTH: f32 = 90.0;
pub const ARROW_HEIGHT: f32 = 46.0;
pub const FIREBALL_FALL_SPEED: f32 = 400.0; // units per second
pub const FIREBALL_WIDTH: f32 = 96.0;
pub const FIREBALL_HEIGHT: f32 = 97.0;
/// How far below the visible area a fireball may fall before removal
pub const FIREBALL_KILL_MARGIN: f32 = 200.0;
pub const CLEANUP_INTERVAL: f32 = 0.1; // seconds

/// Repeating sweep for projectiles that left the play area
#[derive(Resource)]
pub struct ProjectileCleanup {
    pub timer: Timer,
}

impl Default for ProjectileCleanup {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(CLEANUP_INTERVAL, TimerMode::Repeating),
        }
    }
}

/// Plugin for arrows and falling fireballs
pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProjectileCleanup>()
            .add_event::<ArrowShot>()
            .add_systems(Update, arrow_hit_system.in_set(GameSet::Contacts))
            .add_systems(
                Update,
                (
                    emit_fireballs_system,
                    spawn_arrows_system,
                    expire_lifetimes_system,
                    cleanup_offscreen_system,
                )
                    .chain()
                    .in_set(GameSet::Effects),
            );
    }
}

/// True when a fireball has fallen far enough past the bottom edge
pub fn fireball_out_of_bounds(position: &Position) -> bool {
    position.y > WORLD_HEIGHT + FIREBALL_KILL_MARGIN
}

/// True when an arrow has left the visible area
pub fn arrow_out_of_bounds(position: &Position) -> bool {
    position.x < 0.0 || position.x > WORLD_WIDTH || position.y < 0.0 || position.y > WORLD_HEIGHT
}

fn emit_fireballs_system(
    mut commands: Commands,
    time: Res<Time>,
    mut emitters: Query<&mut FireballEmitter>,
) {
    for mut emitter in emitters.iter_mut() {
        if emitter.tick(time.delta()) {
            commands.spawn((
                LevelEntity,
                Fireball,
                Hazard,
                Position::new(emitter.x, emitter.y),
                Velocity::new(0.0, FIREBALL_FALL_SPEED),
                Collider::new(FIREBALL_WIDTH, FIREBALL_HEIGHT),
            ));
        }
    }
}

fn spawn_arrows_system(mut commands: Commands, mut shots: EventReader<ArrowShot>) {
    for shot in shots.read() {
        commands.spawn((
            LevelEntity,
            Arrow {
                direction: shot.direction,
            },
            Position::new(shot.origin.x, shot.origin.y),
            Velocity::new(shot.direction.sign() * ARROW_SPEED, 0.0),
            Collider::new(ARROW_WIDTH, ARROW_HEIGHT),
            Lifetime::from_seconds(ARROW_LIFETIME),
        ));
    }
}

fn expire_lifetimes_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Lifetime)>,
) {
    for (entity, mut lifetime) in query.iter_mut() {
        if lifetime.0.tick(time.delta()).finished() {
            commands.entity(entity).despawn();
        }
    }
}

fn cleanup_offscreen_system(
    mut commands: Commands,
    time: Res<Time>,
    mut cleanup: ResMut<ProjectileCleanup>,
    fireballs: Query<(Entity, &Position), With<Fireball>>,
    arrows: Query<(Entity, &Position, &Lifetime), With<Arrow>>,
) {
    if !cleanup.timer.tick(time.delta()).just_finished() {
        return;
    }

    for (entity, position) in fireballs.iter() {
        if fireball_out_of_bounds(position) {
            commands.entity(entity).despawn();
        }
    }
    for (entity, position, lifetime) in arrows.iter() {
        // Expired arrows were already despawned this frame
        if !lifetime.0.finished() && arrow_out_of_bounds(position) {
            commands.entity(entity).despawn();
        }
    }
}

/// Arrows destroy the first moving enemy they touch, and themselves
fn arrow_hit_system(
    mut commands: Commands,
    arrows: Query<(Entity, &Position, &Collider), With<Arrow>>,
    enemies: Query<(Entity, &Position, &Collider), With<Patrol>>,
) {
    let mut destroyed: Vec<Entity> = Vec::new();

    for (arrow, arrow_pos, arrow_collider) in arrows.iter() {
        let target = enemies.iter().find(|(enemy, enemy_pos, enemy_collider)| {
            !destroyed.contains(enemy)
                && aabb_overlap(arrow_pos, arrow_collider, enemy_pos, enemy_collider)
        });
        if let Some((enemy, _, _)) = target {
            commands.entity(enemy).despawn();
            commands.entity(arrow).despawn();
            destroyed.push(enemy);
            info!("Arrow destroyed an enemy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Facing;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(ProjectilePlugin);
        app
    }

    fn spawn_enemy(app: &mut App, x: f32, y: f32) -> Entity {
        app.world
            .spawn((
                LevelEntity,
                Hazard,
                Patrol::new(x, 200.0, 100.0),
                Position::new(x, y),
                Collider::new(80.0, 100.0),
            ))
            .id()
    }

    fn spawn_arrow(app: &mut App, x: f32, y: f32) -> Entity {
        app.world
            .spawn((
                LevelEntity,
                Arrow {
                    direction: Facing::Right,
                },
                Position::new(x, y),
                Collider::new(ARROW_WIDTH, ARROW_HEIGHT),
                Lifetime::from_seconds(ARROW_LIFETIME),
            ))
            .id()
    }

    #[test]
    fn test_fireball_bounds() {
        assert!(!fireball_out_of_bounds(&Position::new(500.0, 1200.0)));
        assert!(fireball_out_of_bounds(&Position::new(500.0, 1281.0)));
        // Fireballs start above the screen
        assert!(!fireball_out_of_bounds(&Position::new(500.0, -60.0)));
    }

    #[test]
    fn test_arrow_bounds() {
        assert!(!arrow_out_of_bounds(&Position::new(960.0, 540.0)));
        assert!(arrow_out_of_bounds(&Position::new(-1.0, 540.0)));
        assert!(arrow_out_of_bounds(&Position::new(1921.0, 540.0)));
    }

    #[test]
    fn test_arrow_destroys_enemy() {
        let mut app = test_app();
        let enemy = spawn_enemy(&mut app, 800.0, 990.0);
        let arrow = spawn_arrow(&mut app, 760.0, 990.0);

        app.update();

        assert!(app.world.get_entity(enemy).is_none());
        assert!(app.world.get_entity(arrow).is_none());
    }

    #[test]
    fn test_two_arrows_one_enemy() {
        let mut app = test_app();
        let enemy = spawn_enemy(&mut app, 800.0, 990.0);
        let first = spawn_arrow(&mut app, 760.0, 990.0);
        let second = spawn_arrow(&mut app, 840.0, 990.0);

        app.update();

        assert!(app.world.get_entity(enemy).is_none());
        // Only one arrow is spent on the enemy
        let survivors = [first, second]
            .iter()
            .filter(|e| app.world.get_entity(**e).is_some())
            .count();
        assert_eq!(survivors, 1);
    }

    #[test]
    fn test_arrow_misses_distant_enemy() {
        let mut app = test_app();
        let enemy = spawn_enemy(&mut app, 1500.0, 990.0);
        let arrow = spawn_arrow(&mut app, 400.0, 990.0);

        app.update();

        assert!(app.world.get_entity(enemy).is_some());
        assert!(app.world.get_entity(arrow).is_some());
    }

    #[test]
    fn test_arrow_shot_spawns_arrow() {
        let mut app = test_app();
        app.world
            .resource_mut::<Events<ArrowShot>>()
            .send(ArrowShot {
                origin: Vec2::new(300.0, 900.0),
                direction: Facing::Left,
            });

        app.update();

        let (arrow, velocity) = app
            .world
            .query::<(&Arrow, &Velocity)>()
            .single(&app.world);
        assert_eq!(arrow.direction, Facing::Left);
        assert_eq!(velocity.x, -ARROW_SPEED);
    }

    #[test]
    fn test_emitter_drops_fireball_without_delay() {
        let mut app = test_app();
        app.world
            .spawn((LevelEntity, FireballEmitter::new(500.0, -60.0, 0.0, 2.0)));

        app.update();

        let (position, velocity) = app
            .world
            .query_filtered::<(&Position, &Velocity), With<Fireball>>()
            .single(&app.world);
        assert_eq!(*position, Position::new(500.0, -60.0));
        assert_eq!(velocity.y, FIREBALL_FALL_SPEED);
    }
}
