use crate::abilities::AbilitySet;
use crate::components::{Collider, GroundedState, Player, PlayerIntent, Position, Velocity};
use crate::enums::Facing;
use crate::plugins::GameSet;
use crate::plugins::level::LevelSequencer;
use bevy::prelude::*;

/// Movement constants
pub const JUMP_VELOCITY: f32 = -550.0; // units per second (negative = up)
pub const DASH_SPEED: f32 = 1200.0; // units per second
pub const DASH_DURATION: f32 = 0.4; // seconds
pub const DASH_COOLDOWN: f32 = 1.0; // seconds
pub const ARROW_COOLDOWN: f32 = 0.5; // seconds
pub const ARROW_SPAWN_OFFSET: f32 = 60.0; // units ahead of the player centre
pub const DEATH_POP_VELOCITY: f32 = -300.0; // units per second
pub const DEATH_SPIN: f32 = 500.0; // degrees per second
pub const PLAYER_WIDTH: f32 = 72.0;
pub const PLAYER_HEIGHT: f32 = 84.0;

const TILT_PER_VELOCITY: f32 = 0.0003;
const MAX_TILT: f32 = 0.2;

/// Request to spawn an arrow, emitted by the controller
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct ArrowShot {
    pub origin: Vec2,
    pub direction: Facing,
}

/// Per-player runtime state driven by intents and the ability set
#[derive(Component, Clone, Debug, PartialEq)]
pub struct PlayerController {
    pub jump_count: u32,
    pub is_dead: bool,
    pub is_dashing: bool,
    pub dash_direction: Facing,
    pub facing: Facing,
    /// Elapsed-time stamps, in seconds
    pub dash_ends_at: f32,
    pub last_dash_at: Option<f32>,
    pub last_arrow_at: Option<f32>,
    pub controls_enabled: bool,
    /// Radians
    pub rotation: f32,
    pub angular_velocity: f32,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            jump_count: 0,
            is_dead: false,
            is_dashing: false,
            dash_direction: Facing::Right,
            facing: Facing::Right,
            dash_ends_at: 0.0,
            last_dash_at: None,
            last_arrow_at: None,
            controls_enabled: true,
            rotation: 0.0,
            angular_velocity: 0.0,
        }
    }
}

fn cooled_down(last: Option<f32>, now: f32, cooldown: f32) -> bool {
    last.is_none_or(|at| now - at >= cooldown)
}

impl PlayerController {
    /// Run one control tick. Returns the arrow to spawn, if any.
    pub fn update(
        &mut self,
        intent: &PlayerIntent,
        grounded: bool,
        now: f32,
        abilities: &AbilitySet,
        position: &Position,
        velocity: &mut Velocity,
    ) -> Option<ArrowShot> {
        if self.is_dead || !self.controls_enabled {
            return None;
        }

        if self.is_dashing && now >= self.dash_ends_at {
            self.is_dashing = false;
        }

        // Ground contact ends any dash; a new one may start below
        if grounded {
            self.jump_count = 0;
            self.is_dashing = false;
        }

        if intent.dash_just_pressed
            && abilities.can_dash()
            && cooled_down(self.last_dash_at, now, DASH_COOLDOWN)
        {
            self.is_dashing = true;
            self.dash_direction = self.facing;
            self.dash_ends_at = now + DASH_DURATION;
            self.last_dash_at = Some(now);
            self.jump_count = 0;
            debug!("Dash {:?}", self.dash_direction);
        }

        if self.is_dashing {
            velocity.x = self.dash_direction.sign() * DASH_SPEED;
            self.update_tilt(velocity);
            return None;
        }

        let speed = abilities.move_speed();
        if intent.move_left && abilities.can_move_left() {
            velocity.x = -speed;
            self.facing = Facing::Left;
        } else if intent.move_right {
            velocity.x = speed;
            self.facing = Facing::Right;
        } else {
            velocity.x = 0.0;
        }

        if intent.jump_just_pressed && self.jump_count < abilities.max_jumps() {
            velocity.y = JUMP_VELOCITY;
            self.jump_count += 1;
        }

        let mut shot = None;
        if abilities.can_shoot_arrows()
            && intent.shoot_just_pressed
            && cooled_down(self.last_arrow_at, now, ARROW_COOLDOWN)
        {
            self.last_arrow_at = Some(now);
            shot = Some(ArrowShot {
                origin: Vec2::new(
                    position.x + self.facing.sign() * ARROW_SPAWN_OFFSET,
                    position.y,
                ),
                direction: self.facing,
            });
        }

        self.update_tilt(velocity);
        shot
    }

    fn update_tilt(&mut self, velocity: &Velocity) {
        self.rotation = (velocity.y * TILT_PER_VELOCITY).clamp(-MAX_TILT, MAX_TILT);
    }

    /// Kill the player. Returns false if it was already dead.
    pub fn die(&mut self, velocity: &mut Velocity) -> bool {
        if self.is_dead {
            return false;
        }
        self.is_dead = true;
        self.is_dashing = false;
        velocity.x = 0.0;
        velocity.y = DEATH_POP_VELOCITY;
        self.angular_velocity = DEATH_SPIN.to_radians();
        true
    }

    /// Bring the player back at `at` with a clean slate
    pub fn revive(&mut self, at: Vec2, position: &mut Position, velocity: &mut Velocity) {
        self.is_dead = false;
        self.is_dashing = false;
        self.jump_count = 0;
        self.rotation = 0.0;
        self.angular_velocity = 0.0;
        position.x = at.x;
        position.y = at.y;
        *velocity = Velocity::default();
    }
}

/// Plugin for player input, control and spawning
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ArrowShot>()
            .add_systems(Startup, spawn_player)
            .add_systems(Update, process_input_system.in_set(GameSet::Input))
            .add_systems(
                Update,
                (player_control_system, spin_dead_player_system)
                    .chain()
                    .in_set(GameSet::Player),
            );
    }
}

fn spawn_player(mut commands: Commands, sequencer: Res<LevelSequencer>) {
    let start = sequencer.current().start;
    commands.spawn((
        Player,
        PlayerController::default(),
        PlayerIntent::default(),
        Position::new(start.x, start.y),
        Velocity::default(),
        Collider::new(PLAYER_WIDTH, PLAYER_HEIGHT),
        GroundedState::default(),
    ));
    info!("Player spawned at ({}, {})", start.x, start.y);
}

/// Process keyboard input and translate to PlayerIntent
fn process_input_system(
    keyboard: Res<Input<KeyCode>>,
    mut query: Query<&mut PlayerIntent, With<Player>>,
) {
    for mut intent in query.iter_mut() {
        intent.move_left = keyboard.any_pressed([KeyCode::Left, KeyCode::A]);
        intent.move_right = keyboard.any_pressed([KeyCode::Right, KeyCode::D]);
        intent.jump_just_pressed =
            keyboard.any_just_pressed([KeyCode::Up, KeyCode::W, KeyCode::Space]);
        intent.dash_just_pressed = keyboard.just_pressed(KeyCode::X);
        intent.shoot_just_pressed = keyboard.just_pressed(KeyCode::F);
    }
}

fn player_control_system(
    time: Res<Time>,
    abilities: Res<AbilitySet>,
    mut shots: EventWriter<ArrowShot>,
    mut query: Query<
        (
            &mut PlayerController,
            &PlayerIntent,
            &GroundedState,
            &Position,
            &mut Velocity,
        ),
        With<Player>,
    >,
) {
    let now = time.elapsed_seconds();
    for (mut controller, intent, grounded, position, mut velocity) in query.iter_mut() {
        if let Some(shot) = controller.update(
            intent,
            grounded.is_grounded,
            now,
            &abilities,
            position,
            &mut velocity,
        ) {
            shots.send(shot);
        }
    }
}

/// Dead players keep spinning until revived
fn spin_dead_player_system(time: Res<Time>, mut query: Query<&mut PlayerController>) {
    let delta = time.delta_seconds();
    for mut controller in query.iter_mut() {
        if controller.is_dead {
            let spin = controller.angular_velocity * delta;
            controller.rotation += spin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_player() -> (PlayerController, Position, Velocity) {
        (
            PlayerController::default(),
            Position::new(500.0, 900.0),
            Velocity::default(),
        )
    }

    fn press(configure: impl FnOnce(&mut PlayerIntent)) -> PlayerIntent {
        let mut intent = PlayerIntent::default();
        configure(&mut intent);
        intent
    }

    #[test]
    fn test_horizontal_movement_uses_ability_speed() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::with_tiers(3, 2, 1, true, true);
        let intent = press(|i| i.move_right = true);

        controller.update(&intent, true, 0.0, &abilities, &position, &mut velocity);

        assert_eq!(velocity.x, abilities.move_speed());
        assert_eq!(controller.facing, Facing::Right);
    }

    #[test]
    fn test_move_left_blocked_without_capability() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::with_tiers(3, 2, 2, false, true);
        let intent = press(|i| i.move_left = true);

        controller.update(&intent, true, 0.0, &abilities, &position, &mut velocity);

        assert_eq!(velocity.x, 0.0);
        assert_eq!(controller.facing, Facing::Right);
    }

    #[test]
    fn test_right_still_works_when_left_is_lost() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::with_tiers(3, 2, 2, false, true);
        let intent = press(|i| {
            i.move_left = true;
            i.move_right = true;
        });

        controller.update(&intent, true, 0.0, &abilities, &position, &mut velocity);

        assert_eq!(velocity.x, abilities.move_speed());
    }

    #[test]
    fn test_single_jump_tier_rejects_air_jump() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::with_tiers(1, 2, 2, true, true);
        let jump = press(|i| i.jump_just_pressed = true);

        controller.update(&jump, true, 0.0, &abilities, &position, &mut velocity);
        assert_eq!(velocity.y, JUMP_VELOCITY);
        assert_eq!(controller.jump_count, 1);

        velocity.y = -200.0;
        controller.update(&jump, false, 0.1, &abilities, &position, &mut velocity);
        assert_eq!(velocity.y, -200.0);
        assert_eq!(controller.jump_count, 1);
    }

    #[test]
    fn test_flight_allows_four_jumps() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::full();
        let jump = press(|i| i.jump_just_pressed = true);

        for n in 0..6 {
            velocity.y = 0.0;
            controller.update(&jump, false, n as f32, &abilities, &position, &mut velocity);
        }
        assert_eq!(controller.jump_count, 4);
    }

    #[test]
    fn test_no_jump_at_tier_zero() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::with_tiers(0, 2, 2, true, true);
        let jump = press(|i| i.jump_just_pressed = true);

        controller.update(&jump, true, 0.0, &abilities, &position, &mut velocity);

        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn test_landing_resets_jump_count() {
        let (mut controller, position, mut velocity) = create_test_player();
        controller.jump_count = 2;

        controller.update(
            &PlayerIntent::default(),
            true,
            0.0,
            &AbilitySet::full(),
            &position,
            &mut velocity,
        );

        assert_eq!(controller.jump_count, 0);
    }

    #[test]
    fn test_dash_forces_velocity_and_blocks_jump() {
        let (mut controller, position, mut velocity) = create_test_player();
        controller.facing = Facing::Left;
        let intent = press(|i| {
            i.dash_just_pressed = true;
            i.jump_just_pressed = true;
        });

        controller.update(&intent, false, 2.0, &AbilitySet::full(), &position, &mut velocity);

        assert!(controller.is_dashing);
        assert_eq!(velocity.x, -DASH_SPEED);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn test_dash_ends_after_duration() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::full();
        let dash = press(|i| i.dash_just_pressed = true);
        let idle = PlayerIntent::default();

        controller.update(&dash, false, 1.0, &abilities, &position, &mut velocity);
        // Airborne, so only the timer can end it
        controller.update(&idle, false, 1.3, &abilities, &position, &mut velocity);
        assert!(controller.is_dashing);
        assert_eq!(velocity.x, DASH_SPEED);

        controller.update(&idle, false, 1.41, &abilities, &position, &mut velocity);
        assert!(!controller.is_dashing);
        assert_eq!(velocity.x, 0.0);
    }

    #[test]
    fn test_landing_ends_air_dash() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::full();
        let dash = press(|i| i.dash_just_pressed = true);
        let idle = PlayerIntent::default();

        controller.update(&dash, false, 1.0, &abilities, &position, &mut velocity);
        controller.update(&idle, false, 1.05, &abilities, &position, &mut velocity);
        assert!(controller.is_dashing);

        controller.update(&idle, true, 1.1, &abilities, &position, &mut velocity);
        assert!(!controller.is_dashing);
        assert_eq!(velocity.x, 0.0);
    }

    #[test]
    fn test_ground_dash_applies_then_clears_next_grounded_tick() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::full();
        let dash = press(|i| i.dash_just_pressed = true);
        let walk = press(|i| i.move_right = true);

        controller.update(&dash, true, 1.0, &abilities, &position, &mut velocity);
        assert!(controller.is_dashing);
        assert_eq!(velocity.x, DASH_SPEED);

        controller.update(&walk, true, 1.1, &abilities, &position, &mut velocity);
        assert!(!controller.is_dashing);
        assert_eq!(velocity.x, abilities.move_speed());
    }

    #[test]
    fn test_dash_cooldown() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::full();
        let dash = press(|i| i.dash_just_pressed = true);

        controller.update(&dash, true, 0.0, &abilities, &position, &mut velocity);
        assert_eq!(controller.last_dash_at, Some(0.0));

        controller.update(&dash, true, 0.6, &abilities, &position, &mut velocity);
        assert_eq!(controller.last_dash_at, Some(0.0));

        controller.update(&dash, true, 1.0, &abilities, &position, &mut velocity);
        assert_eq!(controller.last_dash_at, Some(1.0));
    }

    #[test]
    fn test_dash_requires_top_tier() {
        let (mut controller, position, mut velocity) = create_test_player();
        let abilities = AbilitySet::with_tiers(3, 2, 1, true, true);
        let dash = press(|i| i.dash_just_pressed = true);

        controller.update(&dash, true, 5.0, &abilities, &position, &mut velocity);

        assert!(!controller.is_dashing);
    }

    #[test]
    fn test_dash_resets_jump_count() {
        let (mut controller, position, mut velocity) = create_test_player();
        controller.jump_count = 4;
        let dash = press(|i| i.dash_just_pressed = true);

        controller.update(&dash, false, 3.0, &AbilitySet::full(), &position, &mut velocity);

        assert_eq!(controller.jump_count, 0);
    }

    #[test]
    fn test_shoot_spawns_arrow_ahead() {
        let (mut controller, position, mut velocity) = create_test_player();
        controller.facing = Facing::Left;
        let shoot = press(|i| i.shoot_just_pressed = true);

        let shot = controller
            .update(&shoot, true, 0.0, &AbilitySet::full(), &position, &mut velocity)
            .unwrap();

        assert_eq!(shot.direction, Facing::Left);
        assert_eq!(shot.origin, Vec2::new(440.0, 900.0));
    }

    #[test]
    fn test_shoot_cooldown_and_capability() {
        let (mut controller, position, mut velocity) = create_test_player();
        let shoot = press(|i| i.shoot_just_pressed = true);
        let abilities = AbilitySet::full();

        assert!(controller.update(&shoot, true, 0.0, &abilities, &position, &mut velocity).is_some());
        assert!(controller.update(&shoot, true, 0.3, &abilities, &position, &mut velocity).is_none());
        assert!(controller.update(&shoot, true, 0.5, &abilities, &position, &mut velocity).is_some());

        let unarmed = AbilitySet::with_tiers(3, 2, 2, true, false);
        assert!(controller.update(&shoot, true, 5.0, &unarmed, &position, &mut velocity).is_none());
    }

    #[test]
    fn test_tilt_follows_vertical_velocity() {
        let (mut controller, position, mut velocity) = create_test_player();
        velocity.y = 10_000.0;

        controller.update(
            &PlayerIntent::default(),
            false,
            0.0,
            &AbilitySet::full(),
            &position,
            &mut velocity,
        );

        assert_eq!(controller.rotation, MAX_TILT);
    }

    #[test]
    fn test_disabled_controls_ignore_input() {
        let (mut controller, position, mut velocity) = create_test_player();
        controller.controls_enabled = false;
        let intent = press(|i| {
            i.move_right = true;
            i.jump_just_pressed = true;
        });

        let shot = controller.update(&intent, true, 0.0, &AbilitySet::full(), &position, &mut velocity);

        assert!(shot.is_none());
        assert_eq!(velocity, Velocity::default());
    }

    #[test]
    fn test_die_is_idempotent() {
        let (mut controller, _, mut velocity) = create_test_player();

        assert!(controller.die(&mut velocity));
        assert_eq!(velocity.y, DEATH_POP_VELOCITY);

        velocity.y = 100.0;
        assert!(!controller.die(&mut velocity));
        assert_eq!(velocity.y, 100.0);
    }

    #[test]
    fn test_dead_player_ignores_input() {
        let (mut controller, position, mut velocity) = create_test_player();
        controller.die(&mut velocity);
        let intent = press(|i| i.move_right = true);

        controller.update(&intent, true, 0.0, &AbilitySet::full(), &position, &mut velocity);

        assert_eq!(velocity.x, 0.0);
    }

    #[test]
    fn test_revive_resets_state() {
        let (mut controller, mut position, mut velocity) = create_test_player();
        controller.jump_count = 3;
        controller.die(&mut velocity);
        controller.rotation = 1.5;

        controller.revive(Vec2::new(150.0, 950.0), &mut position, &mut velocity);

        assert!(!controller.is_dead);
        assert_eq!(controller.jump_count, 0);
        assert_eq!(controller.rotation, 0.0);
        assert_eq!(controller.angular_velocity, 0.0);
        assert_eq!(position, Position::new(150.0, 950.0));
        assert_eq!(velocity, Velocity::default());
    }

    #[test]
    fn test_keyboard_maps_to_intent() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Input<KeyCode>>()
            .add_systems(Update, process_input_system);
        let player = app.world.spawn((Player, PlayerIntent::default())).id();

        {
            let mut keyboard = app.world.resource_mut::<Input<KeyCode>>();
            keyboard.press(KeyCode::A);
            keyboard.press(KeyCode::Space);
            keyboard.press(KeyCode::F);
        }
        app.update();

        let intent = app.world.get::<PlayerIntent>(player).unwrap();
        assert!(intent.move_left);
        assert!(!intent.move_right);
        assert!(intent.jump_just_pressed);
        assert!(!intent.dash_just_pressed);
        assert!(intent.shoot_just_pressed);
    }
}
