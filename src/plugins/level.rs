use crate::components::{
    Collider, FireballEmitter, Goal, Hazard, LevelEntity, Patrol, Position, Solid,
};
use crate::level::{LevelCatalog, LevelDefinition, Placement, PlacementKind};
use crate::plugins::GameSet;
use bevy::prelude::*;

/// Resource owning the level catalog and the cursor into it
#[derive(Resource, Clone, Debug)]
pub struct LevelSequencer {
    levels: Vec<LevelDefinition>,
    current_index: usize,
    materialize_requested: bool,
}

impl LevelSequencer {
    /// Start at the first level with a materialization pending
    pub fn new(catalog: LevelCatalog) -> Self {
        Self {
            levels: catalog.into_levels(),
            current_index: 0,
            materialize_requested: true,
        }
    }

    pub fn current(&self) -> &LevelDefinition {
        &self.levels[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.levels.len()
    }

    /// Jump to `index`, clamped into the catalog, and re-materialize
    pub fn goto(&mut self, index: usize) {
        self.current_index = index.min(self.levels.len().saturating_sub(1));
        self.materialize_requested = true;
    }

    /// Advance one level. Returns false when already at the last level.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.goto(self.current_index + 1);
        true
    }

    pub fn restart(&mut self) {
        self.goto(0);
    }

    pub fn materialize_requested(&self) -> bool {
        self.materialize_requested
    }

    /// Consume the pending materialization request, if any
    pub fn take_materialize_request(&mut self) -> bool {
        std::mem::take(&mut self.materialize_requested)
    }
}

/// Plugin for level sequencing, materialization and moving hazards
pub struct LevelPlugin {
    catalog: LevelCatalog,
}

impl LevelPlugin {
    pub fn new(catalog: LevelCatalog) -> Self {
        Self { catalog }
    }
}

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LevelSequencer::new(self.catalog.clone()))
            .add_systems(Update, advance_patrols_system.in_set(GameSet::Physics))
            .add_systems(
                Update,
                materialize_current_level_system.in_set(GameSet::Materialize),
            );
    }
}

/// Spawn the entity for one placement of a level layout
pub fn spawn_placement(commands: &mut Commands, placement: &Placement) -> Entity {
    let center = placement.center;
    let collider = Collider::new(placement.size.x, placement.size.y);
    let mut entity = commands.spawn((LevelEntity, Position::new(center.x, center.y)));

    match placement.kind {
        PlacementKind::Ground | PlacementKind::Platform => {
            entity.insert((Solid, collider));
        }
        PlacementKind::Spike | PlacementKind::Lava => {
            entity.insert((Hazard, collider));
        }
        PlacementKind::Enemy { range, speed } => {
            let patrol = Patrol::new(center.x, range, speed);
            let start_x = patrol.x_at(0.0);
            entity.insert((Hazard, collider, patrol, Position::new(start_x, center.y)));
        }
        PlacementKind::FireballEmitter { delay, interval } => {
            entity.insert(FireballEmitter::new(center.x, center.y, delay, interval));
        }
        PlacementKind::Goal => {
            entity.insert((Goal, collider));
        }
    }

    entity.id()
}

/// Discard the previous level's entities and spawn the current layout
fn materialize_current_level_system(
    mut commands: Commands,
    mut sequencer: ResMut<LevelSequencer>,
    level_entities: Query<Entity, With<LevelEntity>>,
) {
    if !sequencer.materialize_requested() {
        return;
    }
    sequencer.take_materialize_request();

    for entity in level_entities.iter() {
        commands.entity(entity).despawn();
    }

    let level = sequencer.current();
    let layout = level.layout();
    for placement in &layout {
        spawn_placement(&mut commands, placement);
    }

    info!(
        "Level {}: {} ({} objects)",
        sequencer.current_index() + 1,
        level.name,
        layout.len()
    );
    info!("{}", level.instruction_text());
}

/// Move patrolling enemies along their sweep
fn advance_patrols_system(time: Res<Time>, mut query: Query<(&mut Patrol, &mut Position)>) {
    let delta = time.delta_seconds();
    for (mut patrol, mut position) in query.iter_mut() {
        position.x = patrol.advance(delta);
    }
}
