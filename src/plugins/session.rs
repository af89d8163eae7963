use crate::abilities::AbilitySet;
use crate::components::{Collider, Goal, Hazard, Player, Position, Velocity};
use crate::enums::Capability;
use crate::level::WORLD_HEIGHT;
use crate::plugins::level::LevelSequencer;
use crate::plugins::physics::aabb_overlap;
use crate::plugins::player::PlayerController;
use crate::plugins::{GameSet, configure_game_sets};
use bevy::prelude::*;
use std::time::Duration;

/// Session timing, in seconds
pub const DEATH_DELAY: f32 = 1.5;
pub const GOAL_DELAY: f32 = 0.5;
pub const GAIN_CONFIRM_DELAY: f32 = 1.0;

/// Falling this far below the world kills the player
pub const FALL_LIMIT: f32 = WORLD_HEIGHT + 100.0;
pub const MAX_GAIN_PICKS: usize = 3;
/// Interstitial options are laid out in rows of this many
pub const PANEL_COLUMNS: usize = 3;

/// What happens once the death animation has played out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeathPolicy {
    #[default]
    RespawnAtLevelStart,
    RestartFromFirstLevel,
    Defeated,
}

/// Cursor step inside an interstitial grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Up,
    Down,
}

/// Move a cursor over `len` options laid out `PANEL_COLUMNS` wide, clamped
pub fn move_grid_cursor(cursor: usize, len: usize, step: CursorMove) -> usize {
    let Some(last) = len.checked_sub(1) else {
        return 0;
    };
    match step {
        CursorMove::Left => cursor.saturating_sub(1),
        CursorMove::Right => (cursor + 1).min(last),
        CursorMove::Up => cursor.saturating_sub(PANEL_COLUMNS),
        CursorMove::Down => (cursor + PANEL_COLUMNS).min(last),
    }
}

/// Options offered after a lose level; exactly one is given up
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoicePanel {
    pub options: Vec<Capability>,
    pub cursor: usize,
}

/// Options offered after a gain level; up to `picks_allowed` distinct ones are regained
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GainPanel {
    pub options: Vec<Capability>,
    pub picked: Vec<Capability>,
    pub picks_allowed: usize,
    pub cursor: usize,
}

impl GainPanel {
    pub fn is_complete(&self) -> bool {
        self.picked.len() >= self.picks_allowed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionPhase {
    Playing,
    Dying,
    Completing,
    AbilityChoice(ChoicePanel),
    AbilityGain(GainPanel),
    Won,
    Defeated,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Won | SessionPhase::Defeated)
    }
}

/// Outcome of an interstitial selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Accepted,
    Rejected,
}

/// Side effects the session asks the world to carry out
#[derive(Event, Clone, Debug, PartialEq)]
pub enum SessionEffect {
    KillPlayer,
    Respawn(Vec2),
    SetControls(bool),
    GoalReached,
    Won { levels: usize },
    Defeated,
    ReturnToMenu,
}

/// Per-run game loop: deaths, level completion, interstitials and the win.
///
/// The session never touches entities. Transitions queue `SessionEffect`s
/// which `SessionPlugin` publishes and applies to the player.
#[derive(Resource, Debug)]
pub struct Session {
    phase: SessionPhase,
    is_resetting: bool,
    death_policy: DeathPolicy,
    pending: Option<Timer>,
    deaths: u32,
    effects: Vec<SessionEffect>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DeathPolicy::default())
    }
}

impl Session {
    pub fn new(death_policy: DeathPolicy) -> Self {
        Self {
            phase: SessionPhase::Playing,
            is_resetting: false,
            death_policy,
            pending: None,
            deaths: 0,
            effects: Vec::new(),
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_resetting(&self) -> bool {
        self.is_resetting
    }

    pub fn death_policy(&self) -> DeathPolicy {
        self.death_policy
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Drain the effects queued since the last call
    pub fn take_effects(&mut self) -> Vec<SessionEffect> {
        std::mem::take(&mut self.effects)
    }

    fn schedule(&mut self, seconds: f32) {
        self.pending = Some(Timer::from_seconds(seconds, TimerMode::Once));
    }

    /// Hazard contact or fall. Returns false when ignored.
    pub fn player_hit(&mut self) -> bool {
        if self.is_resetting || self.phase != SessionPhase::Playing {
            return false;
        }
        self.phase = SessionPhase::Dying;
        self.is_resetting = true;
        self.deaths += 1;
        self.effects.push(SessionEffect::KillPlayer);
        self.schedule(DEATH_DELAY);
        info!("Player died (deaths: {})", self.deaths);
        true
    }

    /// Goal contact or level skip. Returns false when ignored.
    pub fn complete_level(&mut self) -> bool {
        if self.is_resetting || self.phase != SessionPhase::Playing {
            return false;
        }
        self.phase = SessionPhase::Completing;
        self.is_resetting = true;
        self.effects.push(SessionEffect::GoalReached);
        self.schedule(GOAL_DELAY);
        true
    }

    /// Advance the pending transition timer, resolving it when it fires
    pub fn tick(
        &mut self,
        delta: Duration,
        sequencer: &mut LevelSequencer,
        abilities: &mut AbilitySet,
    ) {
        let Some(timer) = self.pending.as_mut() else {
            return;
        };
        if !timer.tick(delta).just_finished() {
            return;
        }
        self.pending = None;

        // The phase is re-checked here since a restart may have superseded the timer
        if self.phase == SessionPhase::Dying {
            self.resolve_death(sequencer);
        } else if self.phase == SessionPhase::Completing {
            self.resolve_completion(sequencer, abilities);
        } else if matches!(&self.phase, SessionPhase::AbilityGain(panel) if panel.is_complete()) {
            self.effects.push(SessionEffect::SetControls(true));
            self.advance(sequencer);
        }
    }

    fn resolve_death(&mut self, sequencer: &mut LevelSequencer) {
        match self.death_policy {
            DeathPolicy::RespawnAtLevelStart => {
                sequencer.goto(sequencer.current_index());
                self.respawn(sequencer);
            }
            DeathPolicy::RestartFromFirstLevel => {
                sequencer.restart();
                self.respawn(sequencer);
            }
            DeathPolicy::Defeated => {
                self.phase = SessionPhase::Defeated;
                self.effects.push(SessionEffect::SetControls(false));
                self.effects.push(SessionEffect::Defeated);
                info!("Defeated after {} deaths", self.deaths);
            }
        }
    }

    fn resolve_completion(&mut self, sequencer: &mut LevelSequencer, abilities: &AbilitySet) {
        let level = sequencer.current();
        let (lose_level, gain_level) = (level.is_lose_level, level.is_gain_level);

        if lose_level {
            let options = abilities.downgradable();
            if options.is_empty() {
                info!("Nothing left to lose, skipping ability choice");
                self.advance(sequencer);
                return;
            }
            self.phase = SessionPhase::AbilityChoice(ChoicePanel { options, cursor: 0 });
            self.effects.push(SessionEffect::SetControls(false));
            info!("Choose an ability to lose");
        } else if gain_level {
            let options = abilities.upgradable();
            let picks_allowed = options.len().min(MAX_GAIN_PICKS);
            if picks_allowed == 0 {
                info!("Nothing to regain, skipping ability gain");
                self.advance(sequencer);
                return;
            }
            self.phase = SessionPhase::AbilityGain(GainPanel {
                options,
                picked: Vec::new(),
                picks_allowed,
                cursor: 0,
            });
            self.effects.push(SessionEffect::SetControls(false));
            info!("Choose {} abilities to regain", picks_allowed);
        } else {
            self.advance(sequencer);
        }
    }

    /// Move to the next level, or win when none remain
    fn advance(&mut self, sequencer: &mut LevelSequencer) {
        if sequencer.next() {
            self.respawn(sequencer);
        } else {
            let levels = sequencer.len();
            self.phase = SessionPhase::Won;
            self.effects.push(SessionEffect::SetControls(false));
            self.effects.push(SessionEffect::Won { levels });
            info!("All {} levels complete", levels);
        }
    }

    fn respawn(&mut self, sequencer: &LevelSequencer) {
        self.phase = SessionPhase::Playing;
        self.is_resetting = false;
        self.effects
            .push(SessionEffect::Respawn(sequencer.current().start.to_vec2()));
    }

    /// Give up `capability` on the lose interstitial
    pub fn choose_loss(
        &mut self,
        capability: Capability,
        sequencer: &mut LevelSequencer,
        abilities: &mut AbilitySet,
    ) -> Selection {
        let SessionPhase::AbilityChoice(panel) = &self.phase else {
            return Selection::Rejected;
        };
        if !panel.options.contains(&capability) || !abilities.downgrade(capability) {
            return Selection::Rejected;
        }
        info!("Lost {:?}: {}", capability, capability.loss_effect());
        self.effects.push(SessionEffect::SetControls(true));
        self.advance(sequencer);
        Selection::Accepted
    }

    /// Regain `capability` on the gain interstitial
    pub fn choose_gain(&mut self, capability: Capability, abilities: &mut AbilitySet) -> Selection {
        let SessionPhase::AbilityGain(panel) = &mut self.phase else {
            return Selection::Rejected;
        };
        if panel.is_complete()
            || !panel.options.contains(&capability)
            || panel.picked.contains(&capability)
            || !abilities.upgrade(capability)
        {
            return Selection::Rejected;
        }
        panel.picked.push(capability);
        info!("Regained {:?}: {}", capability, abilities.describe(capability));

        if panel.is_complete() {
            self.schedule(GAIN_CONFIRM_DELAY);
        }
        Selection::Accepted
    }

    /// Select the option under the cursor of the open interstitial
    pub fn confirm(
        &mut self,
        sequencer: &mut LevelSequencer,
        abilities: &mut AbilitySet,
    ) -> Selection {
        let (highlighted, losing) = match &self.phase {
            SessionPhase::AbilityChoice(panel) => (panel.options.get(panel.cursor).copied(), true),
            SessionPhase::AbilityGain(panel) => (panel.options.get(panel.cursor).copied(), false),
            _ => return Selection::Rejected,
        };
        match highlighted {
            Some(capability) if losing => self.choose_loss(capability, sequencer, abilities),
            Some(capability) => self.choose_gain(capability, abilities),
            None => Selection::Rejected,
        }
    }

    pub fn move_cursor(&mut self, step: CursorMove) {
        let (cursor, len) = match &mut self.phase {
            SessionPhase::AbilityChoice(panel) => (&mut panel.cursor, panel.options.len()),
            SessionPhase::AbilityGain(panel) => (&mut panel.cursor, panel.options.len()),
            _ => return,
        };
        *cursor = move_grid_cursor(*cursor, len, step);
    }

    /// Full restart: abilities to maximum, first level, fresh player.
    /// Allowed while playing or from a terminal phase.
    pub fn restart(&mut self, sequencer: &mut LevelSequencer, abilities: &mut AbilitySet) -> bool {
        if self.is_resetting && !self.phase.is_terminal() {
            return false;
        }
        abilities.reset();
        sequencer.restart();
        self.pending = None;
        self.effects.push(SessionEffect::SetControls(true));
        self.respawn(sequencer);
        info!("Session restarted");
        true
    }

    pub fn request_menu(&mut self) {
        self.effects.push(SessionEffect::ReturnToMenu);
    }
}

/// Plugin for the per-level game loop
#[derive(Default)]
pub struct SessionPlugin {
    pub death_policy: DeathPolicy,
}

impl SessionPlugin {
    pub fn with_death_policy(death_policy: DeathPolicy) -> Self {
        Self { death_policy }
    }
}

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        configure_game_sets(app);
        app.insert_resource(Session::new(self.death_policy))
            .add_event::<SessionEffect>()
            .add_systems(Update, detect_contacts_system.in_set(GameSet::Contacts))
            .add_systems(
                Update,
                (
                    session_hotkeys_system,
                    interstitial_input_system,
                    tick_session_system,
                    publish_session_effects_system,
                )
                    .chain()
                    .in_set(GameSet::Session),
            )
            .add_systems(
                Update,
                apply_session_effects_system.in_set(GameSet::Effects),
            );
    }
}

/// Check the player against hazards, the fall limit and the goal
fn detect_contacts_system(
    mut session: ResMut<Session>,
    players: Query<(&Position, &Collider, &PlayerController), With<Player>>,
    hazards: Query<(&Position, &Collider), With<Hazard>>,
    goals: Query<(&Position, &Collider), With<Goal>>,
) {
    let Ok((position, collider, controller)) = players.get_single() else {
        return;
    };
    if session.is_resetting() || controller.is_dead {
        return;
    }

    let hit = position.y > FALL_LIMIT
        || hazards
            .iter()
            .any(|(hazard_pos, hazard)| aabb_overlap(position, collider, hazard_pos, hazard));
    if hit {
        session.player_hit();
        return;
    }

    let reached_goal = goals
        .iter()
        .any(|(goal_pos, goal)| aabb_overlap(position, collider, goal_pos, goal));
    if reached_goal {
        session.complete_level();
    }
}

fn session_hotkeys_system(
    keyboard: Res<Input<KeyCode>>,
    mut session: ResMut<Session>,
    mut sequencer: ResMut<LevelSequencer>,
    mut abilities: ResMut<AbilitySet>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        session.request_menu();
    }

    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    let restart_requested = (shift && keyboard.just_pressed(KeyCode::R))
        || (session.phase().is_terminal() && keyboard.just_pressed(KeyCode::Space));
    if restart_requested {
        session.restart(&mut sequencer, &mut abilities);
        return;
    }

    if keyboard.just_pressed(KeyCode::Semicolon) && session.complete_level() {
        info!("Skipped level {}", sequencer.current_index() + 1);
    }
}

/// Keyboard navigation of the ability interstitials
fn interstitial_input_system(
    keyboard: Res<Input<KeyCode>>,
    mut session: ResMut<Session>,
    mut sequencer: ResMut<LevelSequencer>,
    mut abilities: ResMut<AbilitySet>,
) {
    if !matches!(
        session.phase(),
        SessionPhase::AbilityChoice(_) | SessionPhase::AbilityGain(_)
    ) {
        return;
    }

    let steps = [
        ([KeyCode::Left, KeyCode::A], CursorMove::Left),
        ([KeyCode::Right, KeyCode::D], CursorMove::Right),
        ([KeyCode::Up, KeyCode::W], CursorMove::Up),
        ([KeyCode::Down, KeyCode::S], CursorMove::Down),
    ];
    for (keys, step) in steps {
        if keyboard.any_just_pressed(keys) {
            session.move_cursor(step);
        }
    }

    if keyboard.any_just_pressed([KeyCode::Return, KeyCode::NumpadEnter, KeyCode::Space])
        && session.confirm(&mut sequencer, &mut abilities) == Selection::Rejected
    {
        debug!("Selection rejected");
    }
}

fn tick_session_system(
    time: Res<Time>,
    mut session: ResMut<Session>,
    mut sequencer: ResMut<LevelSequencer>,
    mut abilities: ResMut<AbilitySet>,
) {
    session.tick(time.delta(), &mut sequencer, &mut abilities);
}

fn publish_session_effects_system(
    mut session: ResMut<Session>,
    mut effects: EventWriter<SessionEffect>,
) {
    let queued = session.take_effects();
    if !queued.is_empty() {
        effects.send_batch(queued);
    }
}

/// Carry out session effects on the player entity
fn apply_session_effects_system(
    mut effects: EventReader<SessionEffect>,
    mut players: Query<(&mut PlayerController, &mut Position, &mut Velocity), With<Player>>,
) {
    for effect in effects.read() {
        let Ok((mut controller, mut position, mut velocity)) = players.get_single_mut() else {
            warn!("No player to apply {:?}", effect);
            continue;
        };
        match effect {
            SessionEffect::KillPlayer => {
                controller.die(&mut velocity);
            }
            SessionEffect::Respawn(at) => {
                controller.revive(*at, &mut position, &mut velocity);
            }
            SessionEffect::SetControls(enabled) => {
                controller.controls_enabled = *enabled;
                if !enabled {
                    velocity.x = 0.0;
                }
            }
            SessionEffect::GoalReached => debug!("Goal reached"),
            SessionEffect::Won { levels } => info!("You won! {} levels cleared", levels),
            SessionEffect::Defeated => info!("Game over"),
            SessionEffect::ReturnToMenu => {}
        }
    }
}
