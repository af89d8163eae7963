use bevy::prelude::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// World dimensions in game units (y grows downward)
pub const WORLD_WIDTH: f32 = 1920.0;
pub const WORLD_HEIGHT: f32 = 1080.0;

/// Implicit ground strip present in every level
pub const GROUND_TOP: f32 = WORLD_HEIGHT - 40.0;
pub const GROUND_HEIGHT: f32 = 80.0;

/// Goal portal box, anchored at its bottom centre
pub const PORTAL_WIDTH: f32 = 100.0;
pub const PORTAL_HEIGHT: f32 = 132.0;

/// Fireball timing defaults, milliseconds
pub const DEFAULT_FIREBALL_DELAY_MS: f32 = 0.0;
pub const DEFAULT_FIREBALL_INTERVAL_MS: f32 = 2000.0;

const BUILTIN_CATALOG: &str = include_str!("../levels/catalog.json");

/// A point in world space
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Obstacle entry of a level definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObstacleDef {
    /// Solid block, `(x, y)` is the top-left corner
    Platform { x: f32, y: f32, w: f32, h: f32 },
    /// Row of `count` spikes, `(x, y)` is the bottom-left corner of the first
    Spikes { x: f32, y: f32, count: u32, size: f32 },
    /// Lava pool, `(x, y)` is the top-left corner
    Lava { x: f32, y: f32, w: f32, h: f32 },
    /// Enemy patrolling `range` units centred on `(x, y)`
    MovingEnemy {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        range: f32,
        speed: f32,
    },
    /// Fireball drop point; `delay` and `interval` are in milliseconds
    Fireball {
        x: f32,
        y: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval: Option<f32>,
    },
}

impl ObstacleDef {
    /// Whether touching this obstacle (or what it spawns) kills the player
    pub fn is_hazard(&self) -> bool {
        !self.is_solid()
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, ObstacleDef::Platform { .. })
    }

    /// Number of placements this entry materializes into
    pub fn unit_count(&self) -> usize {
        match self {
            ObstacleDef::Spikes { count, .. } => *count as usize,
            _ => 1,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            ObstacleDef::Platform { w, h, .. } | ObstacleDef::Lava { w, h, .. } => {
                if *w <= 0.0 || *h <= 0.0 {
                    return Err("obstacle has invalid dimensions".to_string());
                }
            }
            ObstacleDef::Spikes { count, size, .. } => {
                if *count == 0 {
                    return Err("spikes need at least one unit".to_string());
                }
                if *size <= 0.0 {
                    return Err("spike size must be positive".to_string());
                }
            }
            ObstacleDef::MovingEnemy {
                w, h, range, speed, ..
            } => {
                if *w <= 0.0 || *h <= 0.0 {
                    return Err("enemy has invalid dimensions".to_string());
                }
                if *range < 0.0 {
                    return Err("enemy patrol range cannot be negative".to_string());
                }
                if *speed <= 0.0 {
                    return Err("enemy speed must be positive".to_string());
                }
            }
            ObstacleDef::Fireball {
                delay, interval, ..
            } => {
                if delay.is_some_and(|d| d < 0.0) {
                    return Err("fireball delay cannot be negative".to_string());
                }
                if interval.is_some_and(|i| i <= 0.0) {
                    return Err("fireball interval must be positive".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Immutable level definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    pub start: Point,
    pub goal: Point,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    /// Completing this level asks the player to give up a capability
    #[serde(default)]
    pub is_lose_level: bool,
    /// Completing this level lets the player regain capabilities
    #[serde(default)]
    pub is_gain_level: bool,
}

/// What a placement turns into when spawned
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementKind {
    Ground,
    Platform,
    Spike,
    Lava,
    Enemy { range: f32, speed: f32 },
    /// Timings in seconds
    FireballEmitter { delay: f32, interval: f32 },
    Goal,
}

/// One object of a materialized level: centre and size in world units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub kind: PlacementKind,
    pub center: Vec2,
    pub size: Vec2,
}

impl Placement {
    pub fn is_hazard(&self) -> bool {
        matches!(
            self.kind,
            PlacementKind::Spike | PlacementKind::Lava | PlacementKind::Enemy { .. }
        )
    }

    pub fn is_solid(&self) -> bool {
        matches!(self.kind, PlacementKind::Ground | PlacementKind::Platform)
    }
}

impl LevelDefinition {
    pub fn instruction_text(&self) -> &str {
        self.instruction
            .as_deref()
            .unwrap_or("Reach the portal to complete!")
    }

    /// Deterministic layout: ground, one goal, then obstacles in declaration order
    pub fn layout(&self) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(self.obstacles.len() + 2);

        placements.push(Placement {
            kind: PlacementKind::Ground,
            center: Vec2::new(WORLD_WIDTH / 2.0, GROUND_TOP + GROUND_HEIGHT / 2.0),
            size: Vec2::new(WORLD_WIDTH, GROUND_HEIGHT),
        });

        placements.push(Placement {
            kind: PlacementKind::Goal,
            center: Vec2::new(self.goal.x, self.goal.y - PORTAL_HEIGHT / 2.0),
            size: Vec2::new(PORTAL_WIDTH, PORTAL_HEIGHT),
        });

        for obstacle in &self.obstacles {
            match *obstacle {
                ObstacleDef::Platform { x, y, w, h } => placements.push(Placement {
                    kind: PlacementKind::Platform,
                    center: Vec2::new(x + w / 2.0, y + h / 2.0),
                    size: Vec2::new(w, h),
                }),
                ObstacleDef::Spikes { x, y, count, size } => {
                    // Units sit edge to edge so neighbouring hitboxes never overlap
                    for i in 0..count {
                        let left = x + i as f32 * size;
                        placements.push(Placement {
                            kind: PlacementKind::Spike,
                            center: Vec2::new(left + size / 2.0, y - size / 2.0),
                            size: Vec2::new(size, size),
                        });
                    }
                }
                ObstacleDef::Lava { x, y, w, h } => placements.push(Placement {
                    kind: PlacementKind::Lava,
                    center: Vec2::new(x + w / 2.0, y + h / 2.0),
                    size: Vec2::new(w, h),
                }),
                ObstacleDef::MovingEnemy {
                    x,
                    y,
                    w,
                    h,
                    range,
                    speed,
                } => placements.push(Placement {
                    kind: PlacementKind::Enemy { range, speed },
                    center: Vec2::new(x, y),
                    size: Vec2::new(w, h),
                }),
                ObstacleDef::Fireball {
                    x,
                    y,
                    delay,
                    interval,
                } => placements.push(Placement {
                    kind: PlacementKind::FireballEmitter {
                        delay: delay.unwrap_or(DEFAULT_FIREBALL_DELAY_MS) / 1000.0,
                        interval: interval.unwrap_or(DEFAULT_FIREBALL_INTERVAL_MS) / 1000.0,
                    },
                    center: Vec2::new(x, y),
                    size: Vec2::ZERO,
                }),
            }
        }

        placements
    }
}

/// Ordered, validated list of levels
#[derive(Clone, Debug, PartialEq)]
pub struct LevelCatalog {
    levels: Vec<LevelDefinition>,
}

impl LevelCatalog {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, LevelLoadError> {
        if levels.is_empty() {
            return Err(LevelLoadError::EmptyCatalog);
        }
        for (index, level) in levels.iter().enumerate() {
            validate_level(index, level)?;
        }
        Ok(Self { levels })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LevelLoadError> {
        let levels: Vec<LevelDefinition> = serde_json::from_str(json)
            .map_err(|e| LevelLoadError::ParseError(e.to_string()))?;
        Self::new(levels)
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self, LevelLoadError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn into_levels(self) -> Vec<LevelDefinition> {
        self.levels
    }
}

fn validate_level(index: usize, level: &LevelDefinition) -> Result<(), LevelLoadError> {
    let invalid = |reason: String| LevelLoadError::ValidationError {
        index,
        name: level.name.clone(),
        reason,
    };

    if level.name.trim().is_empty() {
        return Err(invalid("level name cannot be empty".to_string()));
    }

    for (i, obstacle) in level.obstacles.iter().enumerate() {
        obstacle
            .validate()
            .map_err(|reason| invalid(format!("obstacle {}: {}", i, reason)))?;
    }

    Ok(())
}

/// Level catalog errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelLoadError {
    #[error("failed to parse level catalog: {0}")]
    ParseError(String),
    #[error("level catalog is empty")]
    EmptyCatalog,
    #[error("level {index} ({name}) is invalid: {reason}")]
    ValidationError {
        index: usize,
        name: String,
        reason: String,
    },
}
