use crate::components::{Collider, GroundedState, Position, Solid, Velocity};
use crate::level::WORLD_WIDTH;
use crate::plugins::GameSet;
use bevy::prelude::*;

/// Physics constants
pub const GRAVITY: f32 = 1200.0; // units per second squared, positive = down
const MAX_FRAME_DELTA: f32 = 1.0 / 30.0;
/// Penetration below this depth counts as touching, not overlapping
const CONTACT_EPSILON: f32 = 0.01;

/// Minimal stand-in for the physics collaborator: gravity, integration and
/// axis-separated resolution of bodies against solid geometry
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (apply_gravity, move_bodies, integrate_velocity)
                .chain()
                .in_set(GameSet::Physics),
        );
    }
}

/// Whether two centred boxes overlap (touching edges do not count)
pub fn aabb_overlap(
    a_pos: &Position,
    a_collider: &Collider,
    b_pos: &Position,
    b_collider: &Collider,
) -> bool {
    penetration(a_pos, a_collider, b_pos, b_collider).is_some_and(|p| p.x > 0.0 && p.y > 0.0)
}

/// Overlap depth on each axis, or None when the boxes are apart
fn penetration(a_pos: &Position, a: &Collider, b_pos: &Position, b: &Collider) -> Option<Vec2> {
    let dx = (a.width + b.width) / 2.0 - (a_pos.x - b_pos.x).abs();
    let dy = (a.height + b.height) / 2.0 - (a_pos.y - b_pos.y).abs();
    (dx > 0.0 && dy > 0.0).then_some(Vec2::new(dx, dy))
}

fn penetrates(a_pos: &Position, a: &Collider, b_pos: &Position, b: &Collider) -> bool {
    penetration(a_pos, a, b_pos, b).is_some_and(|p| p.x > CONTACT_EPSILON && p.y > CONTACT_EPSILON)
}

/// Move one body for `dt` seconds against `solids`, x axis first.
/// Returns true when the body ended the step standing on a solid.
pub fn step_body(
    position: &mut Position,
    velocity: &mut Velocity,
    collider: &Collider,
    solids: &[(Position, Collider)],
    dt: f32,
) -> bool {
    position.x += velocity.x * dt;
    for (solid_pos, solid) in solids {
        if !penetrates(position, collider, solid_pos, solid) {
            continue;
        }
        let reach = (collider.width + solid.width) / 2.0;
        if velocity.x > 0.0 {
            position.x = solid_pos.x - reach;
            velocity.x = 0.0;
        } else if velocity.x < 0.0 {
            position.x = solid_pos.x + reach;
            velocity.x = 0.0;
        }
    }

    let mut grounded = false;
    position.y += velocity.y * dt;
    for (solid_pos, solid) in solids {
        if !penetrates(position, collider, solid_pos, solid) {
            continue;
        }
        let reach = (collider.height + solid.height) / 2.0;
        if velocity.y > 0.0 {
            // Falling onto the top face
            position.y = solid_pos.y - reach;
            velocity.y = 0.0;
            grounded = true;
        } else if velocity.y < 0.0 {
            position.y = solid_pos.y + reach;
            velocity.y = 0.0;
        }
    }

    let half_width = collider.width / 2.0;
    position.x = position.x.clamp(half_width, WORLD_WIDTH - half_width);

    grounded
}

fn frame_delta(time: &Time) -> f32 {
    time.delta_seconds().min(MAX_FRAME_DELTA)
}

/// Apply gravity to every body that can stand on ground
fn apply_gravity(mut query: Query<&mut Velocity, With<GroundedState>>, time: Res<Time>) {
    let delta_time = frame_delta(&time);

    for mut velocity in query.iter_mut() {
        velocity.y += GRAVITY * delta_time;
    }
}

/// Integrate bodies against solids and record ground contact
fn move_bodies(
    mut bodies: Query<(&mut Position, &mut Velocity, &Collider, &mut GroundedState)>,
    solids: Query<(&Position, &Collider), (With<Solid>, Without<GroundedState>)>,
    time: Res<Time>,
) {
    let delta_time = frame_delta(&time);
    let solids: Vec<(Position, Collider)> = solids.iter().map(|(p, c)| (*p, *c)).collect();

    for (mut position, mut velocity, collider, mut grounded) in bodies.iter_mut() {
        grounded.is_grounded =
            step_body(&mut position, &mut velocity, collider, &solids, delta_time);
    }
}

/// Integrate free-flying entities (projectiles) without collision
fn integrate_velocity(
    mut query: Query<(&mut Position, &Velocity), Without<GroundedState>>,
    time: Res<Time>,
) {
    let delta_time = frame_delta(&time);

    for (mut position, velocity) in query.iter_mut() {
        position.x += velocity.x * delta_time;
        position.y += velocity.y * delta_time;
    }
}
