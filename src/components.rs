use crate::enums::Facing;
use bevy::prelude::*;

/// Position component - world coordinates of the entity centre (y grows downward)
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Velocity component - units per second
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Collider component - axis-aligned box centred on the entity position
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
}

impl Collider {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Grounded state - written by the physics step, read by the controller
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundedState {
    pub is_grounded: bool,
}

/// Player marker component
#[derive(Component)]
pub struct Player;

/// Player intent component - held directions plus edge-triggered actions
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct PlayerIntent {
    pub move_left: bool,
    pub move_right: bool,
    pub jump_just_pressed: bool,
    pub dash_just_pressed: bool,
    pub shoot_just_pressed: bool,
}

/// Marks every entity instantiated for the current level
#[derive(Component)]
pub struct LevelEntity;

/// Solid geometry the player stands on
#[derive(Component)]
pub struct Solid;

/// Anything whose overlap with the player kills it
#[derive(Component)]
pub struct Hazard;

/// Goal portal of the current level
#[derive(Component)]
pub struct Goal;

/// Horizontal back-and-forth motion around `origin_x`
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Patrol {
    pub origin_x: f32,
    pub range: f32,
    /// Seconds to sweep from one end to the other
    pub half_period: f32,
    pub elapsed: f32,
    pub facing: Facing,
}

impl Patrol {
    pub const MIN_HALF_PERIOD: f32 = 0.2;

    pub fn new(origin_x: f32, range: f32, speed: f32) -> Self {
        let half_period = if speed > 0.0 {
            (range / speed).max(Self::MIN_HALF_PERIOD)
        } else {
            Self::MIN_HALF_PERIOD
        };
        Self {
            origin_x,
            range,
            half_period,
            elapsed: 0.0,
            facing: Facing::Right,
        }
    }

    /// Sine-eased yoyo starting at the left end of the sweep
    pub fn x_at(&self, elapsed: f32) -> f32 {
        let phase = std::f32::consts::PI * elapsed / self.half_period;
        self.origin_x - self.range / 2.0 * phase.cos()
    }

    /// Advance the patrol clock and return the new horizontal position
    pub fn advance(&mut self, delta: f32) -> f32 {
        self.elapsed += delta;
        // Direction flips each time a full sweep completes
        let sweeps = (self.elapsed / self.half_period) as u64;
        self.facing = if sweeps % 2 == 0 {
            Facing::Right
        } else {
            Facing::Left
        };
        self.x_at(self.elapsed)
    }
}

/// Periodically drops fireballs from a fixed point
#[derive(Component, Clone, Debug)]
pub struct FireballEmitter {
    pub x: f32,
    pub y: f32,
    pub timer: Timer,
    pub interval: f32,
}

impl FireballEmitter {
    /// `delay` and `interval` are in seconds
    pub fn new(x: f32, y: f32, delay: f32, interval: f32) -> Self {
        Self {
            x,
            y,
            timer: Timer::from_seconds(delay.max(0.0), TimerMode::Once),
            interval,
        }
    }

    /// Tick the emitter, returning true when a fireball should drop this frame
    pub fn tick(&mut self, delta: std::time::Duration) -> bool {
        self.timer.tick(delta);
        if self.timer.just_finished() {
            self.timer = Timer::from_seconds(self.interval, TimerMode::Repeating);
            return true;
        }
        false
    }
}

/// Falling fireball projectile
#[derive(Component)]
pub struct Fireball;

/// Arrow shot by the player
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Arrow {
    pub direction: Facing,
}

/// Fixed time-to-live for short-lived entities
#[derive(Component, Clone, Debug)]
pub struct Lifetime(pub Timer);

impl Lifetime {
    pub fn from_seconds(seconds: f32) -> Self {
        Self(Timer::from_seconds(seconds, TimerMode::Once))
    }
}
