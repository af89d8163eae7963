use crate::abilities::AbilitySet;
use crate::enums::Capability;
use crate::plugins::GameSet;
use bevy::prelude::*;

/// Plugin owning the ability set resource
pub struct AbilityPlugin;

impl Plugin for AbilityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AbilitySet>()
            .init_resource::<AbilitySnapshot>()
            .add_systems(Update, log_ability_changes_system.in_set(GameSet::Effects));
    }
}

/// Last ability set that was reported
#[derive(Resource, Default, Debug)]
pub struct AbilitySnapshot(pub AbilitySet);

/// Capabilities whose tier differs between two sets, in canonical order
pub fn changed_capabilities(before: &AbilitySet, after: &AbilitySet) -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|c| before.tier(*c) != after.tier(*c))
        .collect()
}

fn log_ability_changes_system(abilities: Res<AbilitySet>, mut snapshot: ResMut<AbilitySnapshot>) {
    if !abilities.is_changed() {
        return;
    }

    for capability in changed_capabilities(&snapshot.0, &abilities) {
        if abilities.tier(capability) < snapshot.0.tier(capability) {
            warn!(
                "{:?} weakened to {} ({})",
                capability,
                abilities.describe(capability),
                capability.loss_effect()
            );
        } else {
            info!("{:?} restored to {}", capability, abilities.describe(capability));
        }
    }
    snapshot.0 = *abilities;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_capabilities() {
        let before = AbilitySet::full();
        let mut after = before;
        after.downgrade(Capability::Vision);
        after.downgrade(Capability::Arrows);

        assert_eq!(
            changed_capabilities(&before, &after),
            vec![Capability::Vision, Capability::Arrows]
        );
        assert!(changed_capabilities(&after, &after).is_empty());
    }

    #[test]
    fn test_plugin_starts_at_full_abilities() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(AbilityPlugin);

        app.update();

        assert_eq!(*app.world.resource::<AbilitySet>(), AbilitySet::full());
    }

    #[test]
    fn test_snapshot_follows_changes() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(AbilityPlugin);
        app.update();

        app.world
            .resource_mut::<AbilitySet>()
            .downgrade(Capability::Jump);
        app.update();

        let snapshot = app.world.resource::<AbilitySnapshot>();
        assert_eq!(snapshot.0.jump_tier(), 2);
    }
}
