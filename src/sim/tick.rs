//! Per-tick session control
//!
//! The session controller owns the single mutable `SessionState` and the
//! collaborator handles, and advances everything through `Session::tick`.
//! Phases: Starting -> Playing <-> Paused, Playing -> GameOver ->
//! (restart | exit). While Paused nothing moves; delayed continuations are
//! countdown entries in the state, never blocking waits.

use std::collections::VecDeque;

use glam::Vec2;

use super::events::{self, Contact, Delivery, GameAction, Receiver, Role, RoleRegistry, Tag};
use super::level::LevelSequencer;
use super::score::{FinalScore, NoBonus, ScoreModifier};
use super::spawn::{SpawnScheduler, SpawnTable};
use super::state::{DelayedAction, DelayedEffect, EntityId, SessionPhase, SessionState, Shot};
use crate::consts::{FREEZE_SCALE, GAME_OVER_DELAY, LANE_SNAP_RATE};
use crate::presenter::{NullPresenter, Presenter, SoundId};
use crate::settings::{self, Settings};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::tuning::{ConfigError, SessionConfig};
use crate::{highscores, move_toward};

/// Input edges for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Fire the shot in this slot.
    pub fire: Option<usize>,
    /// Pause toggle while playing; exit to menu on the game-over screen.
    pub pause: bool,
    /// Restart on the game-over screen.
    pub confirm: bool,
}

/// What a resolved shot did this tick.
enum ShotOutcome {
    /// Destroyed a matching target.
    Hit(EntityId),
    /// Touched the wrong kind; the shot is spent, the target unharmed.
    Blocked,
    /// Flew off the end of the lane.
    Gone,
}

/// Top-level orchestrator for one play session.
///
/// Owns the session state exclusively; the scheduler, sequencer and score
/// engine only ever mutate it from inside [`Session::tick`].
pub struct Session {
    pub state: SessionState,
    config: SessionConfig,
    scheduler: SpawnScheduler,
    sequencer: LevelSequencer,
    registry: RoleRegistry,
    queue: VecDeque<Delivery>,
    presenter: Box<dyn Presenter>,
    store: Box<dyn KeyValueStore>,
    modifier: Box<dyn ScoreModifier>,
    settings: Settings,
    /// High score for this context, refreshed when the session finalizes.
    pub high_score: f64,
    /// Set when the player asks to leave to the menu after game over.
    pub exit_requested: bool,
}

impl Session {
    /// Build a session with silent collaborators (headless/test use).
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_collaborators(
            config,
            seed,
            Box::new(NullPresenter),
            Box::new(MemoryStore::new()),
            Box::new(NoBonus),
        )
    }

    /// Build a session. Fails rather than run with undefined spawn behavior.
    pub fn with_collaborators(
        config: SessionConfig,
        seed: u64,
        presenter: Box<dyn Presenter>,
        store: Box<dyn KeyValueStore>,
        modifier: Box<dyn ScoreModifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = SpawnTable::build(&config.spawns)?;
        let sequencer = LevelSequencer::new(config.levels.clone())?;
        let settings = Settings::load(store.as_ref());
        let high_score = highscores::load(store.as_ref(), &config.name).high_score;

        let mut state = SessionState::new(seed, &config);
        sequencer.apply(&mut state);

        let mut registry = RoleRegistry::new();
        registry.register(Role::Controller, Receiver::Controller);
        registry.register(Role::Player, Receiver::Player);
        registry.register(Role::SoundSource, Receiver::SoundSource);

        let mut session = Self {
            state,
            config,
            scheduler: SpawnScheduler::new(table),
            sequencer,
            registry,
            queue: VecDeque::new(),
            presenter,
            store,
            modifier,
            settings,
            high_score,
            exit_requested: false,
        };
        log::info!(
            "session `{}`: seed {seed}, {} lanes, {} levels, high score {:.0}",
            session.config.name,
            session.config.lanes.len(),
            session.sequencer.len(),
            session.high_score,
        );
        session.presenter.show_ready();
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Settled score, once the game-over sequence has finalized.
    pub fn final_score(&self) -> Option<FinalScore> {
        self.state.score.final_result()
    }

    /// Advance the session by one fixed timestep.
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        match self.state.phase {
            SessionPhase::Paused => {
                if input.pause {
                    self.state.phase = SessionPhase::Playing;
                    log::info!("resumed");
                }
            }
            SessionPhase::Starting => {
                self.state.time_ticks += 1;
                self.state.score.animate(dt);
                self.state.start_delay -= dt;
                if self.state.start_delay <= 0.0 {
                    self.state.phase = SessionPhase::Playing;
                    log::info!(
                        "play begins on `{}`",
                        self.sequencer.get(self.state.level_index).name
                    );
                    self.show_start_tip();
                }
            }
            SessionPhase::GameOver => {
                self.state.time_ticks += 1;
                // The game-over sequence and the score easing keep running.
                self.drive_delayed(dt);
                self.state.score.animate(dt);
                if input.confirm {
                    self.restart();
                } else if input.pause {
                    self.exit_requested = true;
                    log::info!("exit to menu requested");
                }
            }
            SessionPhase::Playing => {
                if input.pause {
                    self.state.phase = SessionPhase::Paused;
                    log::info!("paused");
                    return;
                }
                self.state.time_ticks += 1;
                self.drive_player(input, dt);
                self.drive_world(dt);
                if self.state.phase != SessionPhase::Playing {
                    return; // a collision ended the run mid-tick
                }
                self.scheduler
                    .tick(&mut self.state, &self.sequencer, &self.config, dt);
                self.drive_delayed(dt);
                self.state.score.animate(dt);
                self.check_level_completion();
            }
        }
    }

    /// Reset to a fresh run of the same configuration and seed.
    pub fn restart(&mut self) {
        log::info!("restarting session");
        self.state = SessionState::new(self.state.seed, &self.config);
        self.sequencer.apply(&mut self.state);
        self.registry.register(Role::Player, Receiver::Player);
        self.exit_requested = false;
        self.queue.clear();
        self.presenter.show_ready();
    }

    // --- PLAYER ---

    fn drive_player(&mut self, input: &TickInput, dt: f32) {
        let move_delay = self.config.move_delay;
        let fire_rate = self.config.fire_rate;
        let lane_count = self.config.lanes.len();

        if self.state.move_cooldown > 0.0 {
            self.state.move_cooldown -= dt;
        } else if !self.state.player_dead {
            let step = i32::from(input.move_right) - i32::from(input.move_left);
            if step != 0 {
                let lane = (self.state.current_lane as i32 + step).clamp(0, lane_count as i32 - 1);
                self.state.current_lane = lane as usize;
                self.state.move_cooldown = move_delay;
            }
        }

        // Ease the world position toward the lane; part of the tick contract
        // even though only the presenter consumes it.
        let target = self.config.lanes[self.state.current_lane];
        self.state.player_x = move_toward(self.state.player_x, target, LANE_SNAP_RATE * dt);

        if self.state.fire_cooldown < fire_rate {
            self.state.fire_cooldown += dt;
        }
        if let Some(slot) = input.fire {
            if !self.state.player_dead
                && slot < self.config.shots.len()
                && self.state.fire_cooldown >= fire_rate
            {
                self.state.fire_cooldown = 0.0;
                let id = self.state.next_entity_id();
                let lane = self.state.current_lane;
                self.state.shots.push(Shot {
                    id,
                    slot,
                    lane,
                    dist: 0.0,
                    speed: self.config.shot_speed,
                });
                self.presenter.play_sound(SoundId::Shoot);
            }
        }
    }

    // --- WORLD ---

    fn drive_world(&mut self, dt: f32) {
        for shot in &mut self.state.shots {
            shot.dist += shot.speed * dt;
        }
        let scale = self.state.enemy_speed_scale;
        for entity in &mut self.state.entities {
            if !entity.dormant {
                entity.dist -= entity.speed * scale * dt;
            }
        }
        self.resolve_shot_hits();
        self.resolve_arrivals();
    }

    fn resolve_shot_hits(&mut self) {
        let mut outcomes: Vec<(EntityId, ShotOutcome)> = Vec::new();
        for shot in &self.state.shots {
            // The nearest occupant the shot has passed is the one it struck
            // first.
            let target = self
                .state
                .entities
                .iter()
                .filter(|e| !e.dormant && e.lane == shot.lane && e.dist <= shot.dist)
                .min_by(|a, b| {
                    a.dist
                        .partial_cmp(&b.dist)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(entity) = target {
                let matches = self.state.shot_frenzy
                    || self.config.spawns[entity.kind].tag == self.config.shots[shot.slot].target;
                let outcome = if matches {
                    ShotOutcome::Hit(entity.id)
                } else {
                    ShotOutcome::Blocked
                };
                outcomes.push((shot.id, outcome));
            } else if shot.dist >= self.config.lane_length {
                outcomes.push((shot.id, ShotOutcome::Gone));
            }
        }

        for (shot_id, outcome) in outcomes {
            self.state.shots.retain(|shot| shot.id != shot_id);
            match outcome {
                ShotOutcome::Hit(target) => {
                    self.presenter.play_sound(SoundId::Hit);
                    self.kill_entity(target);
                }
                ShotOutcome::Blocked | ShotOutcome::Gone => {
                    self.presenter.play_sound(SoundId::Miss);
                    self.enqueue(Receiver::Controller, GameAction::ResetStreak, None);
                }
            }
        }
        self.drain_deliveries();
    }

    fn resolve_arrivals(&mut self) {
        let arrived: Vec<EntityId> = self
            .state
            .entities
            .iter()
            .filter(|e| !e.dormant && e.dist <= 0.0)
            .map(|e| e.id)
            .collect();
        if arrived.is_empty() {
            return;
        }

        let player_tag = Tag::player();
        for id in arrived {
            let Some(index) = self.state.entities.iter().position(|e| e.id == id) else {
                continue;
            };
            let entity = self.state.entities.remove(index);
            let kind = &self.config.spawns[entity.kind];

            if !self.state.player_dead && entity.lane == self.state.current_lane {
                // Contact with the player: the entity's own rules decide
                // what happens.
                events::dispatch(
                    &kind.touch_rules,
                    &kind.touch_tags,
                    &player_tag,
                    Contact {
                        itself: Some(Receiver::Entity(entity.id)),
                        touched: Some(Receiver::Player),
                        initiator: Some(entity.id),
                    },
                    &self.registry,
                    &mut self.queue,
                );
            } else {
                // Slipped past the line of defense: the barrier's rules
                // decide (items just despawn, hostiles end the run).
                events::dispatch(
                    &self.config.barrier.touch_rules,
                    &self.config.barrier.touch_tags,
                    &kind.tag,
                    Contact {
                        itself: None,
                        touched: Some(Receiver::Entity(entity.id)),
                        initiator: None,
                    },
                    &self.registry,
                    &mut self.queue,
                );
            }
            if entity.is_boss {
                self.state.boss_id = None;
            }
        }
        self.drain_deliveries();
    }

    // --- DELAYED CONTINUATIONS ---

    fn drive_delayed(&mut self, dt: f32) {
        if self.state.pending.is_empty() {
            return;
        }
        let mut fired = Vec::new();
        for action in &mut self.state.pending {
            action.remaining -= dt;
            if action.remaining <= 0.0 {
                fired.push(action.effect);
            }
        }
        if fired.is_empty() {
            return;
        }
        self.state.pending.retain(|action| action.remaining > 0.0);
        for effect in fired {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: DelayedEffect) {
        match effect {
            DelayedEffect::ActivateBoss { id } => {
                let speed = self.sequencer.get(self.state.level_index).enemy_speed;
                if let Some(boss) = self.state.entities.iter_mut().find(|e| e.id == id) {
                    boss.dormant = false;
                    boss.speed = speed;
                    self.state.boss_spawned = true;
                    log::info!("boss active on lane {}", boss.lane);
                }
            }
            DelayedEffect::FinishGameOver => {
                let result = self.state.score.finalize(
                    self.store.as_mut(),
                    self.modifier.as_ref(),
                    &self.config.name,
                );
                self.high_score = result.high_score;
                self.presenter.play_sound(SoundId::GameOver);
            }
            DelayedEffect::Unfreeze => {
                self.state.enemy_speed_scale = 1.0;
                log::debug!("freeze expired");
            }
            DelayedEffect::EndShotFrenzy => {
                self.state.shot_frenzy = false;
            }
        }
    }

    // --- DISPATCH ---

    fn enqueue(&mut self, receiver: Receiver, action: GameAction, initiator: Option<EntityId>) {
        self.queue.push_back(Delivery {
            receiver,
            action,
            initiator,
        });
    }

    /// FIFO drain; handlers may enqueue further deliveries, bounded in
    /// practice by collision-rule list sizes.
    fn drain_deliveries(&mut self) {
        while let Some(delivery) = self.queue.pop_front() {
            self.apply_delivery(delivery);
        }
    }

    fn apply_delivery(&mut self, delivery: Delivery) {
        match delivery.receiver {
            Receiver::Controller => self.controller_action(delivery),
            Receiver::Player => {
                if let GameAction::Die = delivery.action {
                    self.player_die();
                }
            }
            Receiver::Entity(id) => {
                if let GameAction::Die = delivery.action {
                    self.kill_entity(id);
                }
            }
            Receiver::SoundSource => {
                if let GameAction::PlaySound { sound } = delivery.action {
                    self.presenter.play_sound(sound);
                }
            }
        }
    }

    fn controller_action(&mut self, delivery: Delivery) {
        match delivery.action {
            GameAction::HitBonus => {
                let at = delivery
                    .initiator
                    .and_then(|id| self.state.entities.iter().find(|e| e.id == id))
                    .map(|e| e.pos(&self.config.lanes))
                    .unwrap_or_else(|| crate::lane_point(self.state.player_x, 0.0));
                self.award_hit(at);
            }
            GameAction::ChangeKillCount { amount } => {
                self.state.kills = self.state.kills.saturating_add_signed(amount);
            }
            GameAction::ResetStreak => self.miss(),
            GameAction::GameOver { delay } => self.begin_game_over(delay),
            GameAction::Freeze { duration } => {
                self.state.enemy_speed_scale = FREEZE_SCALE;
                self.state
                    .pending
                    .retain(|a| a.effect != DelayedEffect::Unfreeze);
                self.state.pending.push(DelayedAction {
                    remaining: duration,
                    effect: DelayedEffect::Unfreeze,
                });
                log::debug!("enemies frozen for {duration}s");
            }
            GameAction::KillAll => {
                let ids: Vec<EntityId> = self
                    .state
                    .entities
                    .iter()
                    .filter(|e| !e.dormant)
                    .map(|e| e.id)
                    .collect();
                for id in ids {
                    self.kill_entity(id);
                }
            }
            GameAction::ShotFrenzy { duration } => {
                self.state.shot_frenzy = true;
                self.state
                    .pending
                    .retain(|a| a.effect != DelayedEffect::EndShotFrenzy);
                self.state.pending.push(DelayedAction {
                    remaining: duration,
                    effect: DelayedEffect::EndShotFrenzy,
                });
                log::debug!("shots hit everything for {duration}s");
            }
            GameAction::PlaySound { sound } => self.presenter.play_sound(sound),
            // The controller can't die; stray deliveries are dropped.
            GameAction::Die => {}
        }
    }

    // --- SCORING AND OUTCOMES ---

    /// Kill credit: counter, streak-multiplied bonus, bonus popup.
    fn kill_entity(&mut self, id: EntityId) {
        let Some(index) = self.state.entities.iter().position(|e| e.id == id) else {
            return;
        };
        let entity = self.state.entities.remove(index);
        if entity.is_boss {
            self.state.boss_id = None;
            log::info!("boss down");
        }
        let at = entity.pos(&self.config.lanes);
        self.state.kills += 1;
        self.award_hit(at);
    }

    fn award_hit(&mut self, at: Vec2) {
        if self.state.score.streak > 1 {
            self.show_streak_tip();
        }
        let gained = self.state.score.on_hit(self.config.hit_bonus);
        self.presenter.show_bonus(gained, at);
    }

    fn miss(&mut self) {
        self.show_miss_tip();
        self.state.score.on_miss();
    }

    fn player_die(&mut self) {
        if self.state.player_dead {
            return;
        }
        self.state.player_dead = true;
        self.registry.unregister(Role::Player);
        self.presenter.play_sound(SoundId::PlayerDie);
        log::info!("player down");
        self.enqueue(
            Receiver::Controller,
            GameAction::GameOver {
                delay: GAME_OVER_DELAY,
            },
            None,
        );
    }

    fn begin_game_over(&mut self, delay: f32) {
        if self.state.phase == SessionPhase::GameOver {
            return;
        }
        self.state.phase = SessionPhase::GameOver;
        self.show_lose_tip();
        // Spawning stops with the phase change; pending gameplay
        // continuations are abandoned. Only the game-over sequence ticks on.
        self.state
            .pending
            .retain(|a| matches!(a.effect, DelayedEffect::FinishGameOver));
        self.state.pending.push(DelayedAction {
            remaining: delay,
            effect: DelayedEffect::FinishGameOver,
        });
        log::info!("game over in {delay}s");
    }

    // --- LEVEL FLOW ---

    fn check_level_completion(&mut self) {
        if self.sequencer.is_terminal(self.state.level_index) {
            // Advance would be a no-op; the last level plays forever.
            return;
        }
        let level = self.sequencer.get(self.state.level_index);
        let complete = if level.boss.is_some() {
            // The boss counts as one kill beyond the regular budget.
            self.state.kills >= level.enemy_count + 1
                && self.state.boss_spawned
                && !self.state.boss_alive()
        } else {
            self.state.kills >= level.enemy_count
        };
        if !complete {
            return;
        }
        if self.sequencer.advance(&mut self.state) {
            let name = self.sequencer.get(self.state.level_index).name.clone();
            self.presenter.show_level_up(&name);
            self.presenter.play_sound(SoundId::LevelUp);
        }
    }

    // --- TIPS ---

    /// One-shot gate: true exactly once per flag while tips are enabled.
    fn tip_ready(&mut self, key: &str) -> bool {
        if !self.settings.show_tips || settings::tip_seen(self.store.as_ref(), key) {
            return false;
        }
        settings::mark_tip_seen(self.store.as_mut(), key);
        true
    }

    fn show_start_tip(&mut self) {
        if self.tip_ready(settings::START_TIP_KEY) {
            self.presenter.show_start_tip();
        }
    }

    fn show_streak_tip(&mut self) {
        if self.tip_ready(settings::STREAK_TIP_KEY) {
            self.presenter.show_streak_tip();
        }
    }

    fn show_miss_tip(&mut self) {
        if self.tip_ready(settings::MISS_TIP_KEY) {
            self.presenter.show_miss_tip();
        }
    }

    fn show_lose_tip(&mut self) {
        if self.tip_ready(settings::LOSE_TIP_KEY) {
            self.presenter.show_lose_tip();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::highscores::TOTAL_SCORE_KEY;
    use crate::sim::state::LaneEntity;

    fn session() -> Session {
        Session::new(SessionConfig::demo(), 12345).unwrap()
    }

    fn playing_session() -> Session {
        let mut session = session();
        session.state.phase = SessionPhase::Playing;
        session
    }

    fn push_entity(session: &mut Session, kind_name: &str, lane: usize, dist: f32, speed: f32) -> EntityId {
        let kind = session.config().kind_index(kind_name).unwrap();
        let id = session.state.next_entity_id();
        session.state.entities.push(LaneEntity {
            id,
            kind,
            lane,
            dist,
            speed,
            dormant: false,
            is_boss: false,
        });
        id
    }

    #[test]
    fn test_starting_counts_down_then_plays() {
        let mut session = session();
        assert_eq!(session.state.phase, SessionPhase::Starting);

        let input = TickInput::default();
        for _ in 0..61 {
            session.tick(&input, SIM_DT);
        }
        assert_eq!(session.state.phase, SessionPhase::Playing);
    }

    #[test]
    fn test_pause_freezes_state_bit_for_bit() {
        let mut session = playing_session();
        // Let some world state accumulate first.
        for _ in 0..120 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        session.tick(
            &TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(session.state.phase, SessionPhase::Paused);

        let frozen = session.state.clone();
        let busy_input = TickInput {
            move_right: true,
            fire: Some(0),
            ..Default::default()
        };
        for _ in 0..30 {
            session.tick(&busy_input, SIM_DT);
        }
        assert_eq!(session.state, frozen);

        // Unpause resumes exactly where we left off.
        session.tick(
            &TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(session.state.phase, SessionPhase::Playing);
    }

    #[test]
    fn test_same_seed_and_script_stay_identical() {
        let mut a = session();
        let mut b = session();

        for t in 0..1200u32 {
            let input = TickInput {
                move_left: t % 97 == 0,
                move_right: t % 31 == 0,
                fire: if t % 7 == 0 {
                    Some((t / 7) as usize % 3)
                } else {
                    None
                },
                ..Default::default()
            };
            a.tick(&input, SIM_DT);
            b.tick(&input, SIM_DT);
        }
        assert_eq!(a.state, b.state);
    }

    #[test]
    fn test_move_input_clamps_and_respects_cooldown() {
        let mut session = playing_session();
        session.state.move_cooldown = 0.0;
        assert_eq!(session.state.current_lane, 1);

        let right = TickInput {
            move_right: true,
            ..Default::default()
        };
        // Two consecutive held ticks: only one lane step lands, the
        // cooldown eats the second.
        session.tick(&right, SIM_DT);
        session.tick(&right, SIM_DT);
        assert_eq!(session.state.current_lane, 2);

        // Once the cooldown elapses we are already at the right edge.
        for _ in 0..30 {
            session.tick(&right, SIM_DT);
        }
        assert_eq!(session.state.current_lane, 2);
    }

    #[test]
    fn test_shot_kills_matching_enemy_and_scores() {
        let mut session = playing_session();
        push_entity(&mut session, "raider", 1, 1.0, 0.0);

        session.tick(
            &TickInput {
                fire: Some(0), // bolt targets Raider
                ..Default::default()
            },
            SIM_DT,
        );
        for _ in 0..30 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert!(session.state.entities.is_empty());
        assert!(session.state.shots.is_empty());
        assert_eq!(session.state.kills, 1);
        assert_eq!(session.state.score.raw, 10.0);
        assert_eq!(session.state.score.streak, 2);
    }

    #[test]
    fn test_wrong_shot_type_resets_streak_not_score() {
        let mut session = playing_session();
        session.state.score.on_hit(10);
        session.state.score.on_hit(10);
        assert_eq!(session.state.score.streak, 3);
        let raw = session.state.score.raw;

        push_entity(&mut session, "brute", 1, 1.0, 0.0);
        session.tick(
            &TickInput {
                fire: Some(0), // bolt cannot hurt a Brute
                ..Default::default()
            },
            SIM_DT,
        );
        for _ in 0..30 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert_eq!(session.state.score.streak, 1);
        assert_eq!(session.state.score.raw, raw);
        assert_eq!(session.state.entities.len(), 1, "target is unharmed");
        assert!(session.state.shots.is_empty(), "shot is spent");
    }

    #[test]
    fn test_shot_off_the_lane_end_is_a_miss() {
        let mut session = playing_session();
        session.state.remaining_spawns = 0; // nothing else on the lanes
        session.state.score.streak = 5;

        session.tick(
            &TickInput {
                fire: Some(0),
                ..Default::default()
            },
            SIM_DT,
        );
        // 20 units at 10/s with nothing to hit.
        for _ in 0..150 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert!(session.state.shots.is_empty());
        assert_eq!(session.state.score.streak, 1);
    }

    #[test]
    fn test_enemy_reaching_player_ends_the_run() {
        let mut session = playing_session();
        push_entity(&mut session, "raider", 1, 0.05, 1.0);

        for _ in 0..10 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert!(session.state.player_dead);
        assert_eq!(session.state.phase, SessionPhase::GameOver);
        assert!(session.final_score().is_none(), "finalize waits for the delay");

        for _ in 0..120 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert!(session.final_score().is_some());
    }

    #[test]
    fn test_enemy_slipping_past_another_lane_hits_the_barrier() {
        let mut session = playing_session();
        // Player is in lane 1; the raider arrives in lane 0.
        push_entity(&mut session, "raider", 0, 0.05, 1.0);

        for _ in 0..10 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert_eq!(session.state.phase, SessionPhase::GameOver);
        assert!(!session.state.player_dead, "the barrier ends the run, not the player");
    }

    #[test]
    fn test_supply_pickup_awards_credit_without_ending_the_run() {
        let mut session = playing_session();
        push_entity(&mut session, "supply", 1, 0.05, 1.0);

        for _ in 0..10 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert_eq!(session.state.phase, SessionPhase::Playing);
        assert_eq!(session.state.kills, 1);
        assert_eq!(session.state.score.raw, 10.0);
        assert!(session.state.entities.is_empty());
    }

    #[test]
    fn test_supply_slipping_past_despawns_quietly() {
        let mut session = playing_session();
        push_entity(&mut session, "supply", 0, 0.05, 1.0);

        for _ in 0..10 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert_eq!(session.state.phase, SessionPhase::Playing);
        assert_eq!(session.state.kills, 0);
        assert!(session.state.entities.is_empty());
    }

    #[test]
    fn test_coolant_freezes_then_restores_enemy_speed() {
        let mut session = playing_session();
        push_entity(&mut session, "coolant", 1, 0.05, 1.0);

        for _ in 0..10 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(session.state.enemy_speed_scale, FREEZE_SCALE);
        assert!(
            session
                .state
                .pending
                .iter()
                .any(|a| a.effect == DelayedEffect::Unfreeze)
        );

        // 3 seconds later the freeze expires.
        for _ in 0..200 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(session.state.enemy_speed_scale, 1.0);
    }

    #[test]
    fn test_boss_completion_requires_all_three_conditions() {
        let mut config = SessionConfig::demo();
        config.levels[0].boss = Some("warden".into());
        config.levels[0].enemy_count = 5;

        let satisfied = |session: &mut Session| {
            session.state.phase = SessionPhase::Playing;
            session.state.kills = 6;
            session.state.boss_spawned = true;
            session.state.boss_id = None;
            session.state.remaining_spawns = 0;
        };

        // All three conditions hold: the level advances.
        let mut session = Session::new(config.clone(), 1).unwrap();
        satisfied(&mut session);
        session.tick(&TickInput::default(), SIM_DT);
        assert_eq!(session.state.level_index, 1);

        // Not enough kills.
        let mut session = Session::new(config.clone(), 1).unwrap();
        satisfied(&mut session);
        session.state.kills = 5;
        session.tick(&TickInput::default(), SIM_DT);
        assert_eq!(session.state.level_index, 0);

        // Boss never spawned.
        let mut session = Session::new(config.clone(), 1).unwrap();
        satisfied(&mut session);
        session.state.boss_spawned = false;
        session.tick(&TickInput::default(), SIM_DT);
        assert_eq!(session.state.level_index, 0);

        // Boss still alive.
        let mut session = Session::new(config.clone(), 1).unwrap();
        satisfied(&mut session);
        session.state.boss_id = Some(999);
        session.tick(&TickInput::default(), SIM_DT);
        assert_eq!(session.state.level_index, 0);
    }

    #[test]
    fn test_level_without_boss_completes_on_kill_target() {
        let mut session = playing_session();
        session.state.kills = 10; // GROVE's budget
        session.tick(&TickInput::default(), SIM_DT);

        assert_eq!(session.state.level_index, 1);
        assert_eq!(session.state.kills, 0);
        assert_eq!(session.state.remaining_spawns, 15);
    }

    #[test]
    fn test_game_over_finalizes_exactly_once() {
        let mut session = playing_session();
        session.state.score.on_hit(10);
        push_entity(&mut session, "raider", 1, 0.05, 1.0);

        for _ in 0..200 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        let total = session.store().get_int(TOTAL_SCORE_KEY, 0);
        assert!(session.final_score().is_some());
        assert_eq!(total, 10);

        for _ in 0..200 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(session.store().get_int(TOTAL_SCORE_KEY, 0), total);
    }

    #[test]
    fn test_restart_and_exit_from_game_over() {
        let mut session = playing_session();
        push_entity(&mut session, "raider", 1, 0.05, 1.0);
        for _ in 0..200 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(session.state.phase, SessionPhase::GameOver);

        session.tick(
            &TickInput {
                pause: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert!(session.exit_requested);

        session.tick(
            &TickInput {
                confirm: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(session.state.phase, SessionPhase::Starting);
        assert!(!session.exit_requested);
        assert!(session.state.entities.is_empty());
        assert_eq!(session.state.score.raw, 0.0);
        assert!(!session.state.player_dead);
    }

    #[test]
    fn test_shot_frenzy_lets_any_slot_hit() {
        let mut session = playing_session();
        session.state.remaining_spawns = 0;
        push_entity(&mut session, "brute", 1, 1.0, 0.0);

        session.enqueue(
            Receiver::Controller,
            GameAction::ShotFrenzy { duration: 1.0 },
            None,
        );
        session.drain_deliveries();
        assert!(session.state.shot_frenzy);

        // A bolt cannot normally hurt a Brute; during the frenzy it can.
        session.tick(
            &TickInput {
                fire: Some(0),
                ..Default::default()
            },
            SIM_DT,
        );
        for _ in 0..30 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert!(session.state.entities.is_empty());
        assert_eq!(session.state.kills, 1);

        // The frenzy expires on schedule.
        for _ in 0..60 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        assert!(!session.state.shot_frenzy);
    }

    #[test]
    fn test_kill_all_credits_every_live_enemy() {
        let mut session = playing_session();
        push_entity(&mut session, "raider", 0, 5.0, 0.0);
        push_entity(&mut session, "brute", 1, 6.0, 0.0);
        push_entity(&mut session, "raider", 2, 7.0, 0.0);

        session.enqueue(Receiver::Controller, GameAction::KillAll, None);
        session.drain_deliveries();

        assert!(session.state.entities.is_empty());
        assert_eq!(session.state.kills, 3);
        // Streak compounds across the sweep: 10x1 + 10x2 + 10x3.
        assert_eq!(session.state.score.raw, 60.0);
    }

    #[test]
    fn test_boss_sequence_activates_after_delay() {
        let mut config = SessionConfig::demo();
        config.levels[0].boss = Some("warden".into());
        config.levels[0].enemy_count = 0;
        config.levels[0].boss_delay = 0.5;

        let mut session = Session::new(config, 3).unwrap();
        session.state.phase = SessionPhase::Playing;
        session.state.remaining_spawns = 0;

        session.tick(&TickInput::default(), SIM_DT);
        let boss_id = session.state.boss_id.expect("boss staged");
        let boss = session
            .state
            .entities
            .iter()
            .find(|e| e.id == boss_id)
            .unwrap();
        assert!(boss.dormant);
        assert!(!session.state.boss_spawned);

        for _ in 0..40 {
            session.tick(&TickInput::default(), SIM_DT);
        }
        let boss = session
            .state
            .entities
            .iter()
            .find(|e| e.id == boss_id)
            .unwrap();
        assert!(!boss.dormant);
        assert!(boss.speed > 0.0);
        assert!(session.state.boss_spawned);
    }

    #[test]
    fn test_game_over_abandons_boss_activation() {
        let mut config = SessionConfig::demo();
        config.levels[0].boss = Some("warden".into());
        config.levels[0].enemy_count = 0;
        config.levels[0].boss_delay = 5.0;

        let mut session = Session::new(config, 3).unwrap();
        session.state.phase = SessionPhase::Playing;
        session.state.remaining_spawns = 0;
        session.tick(&TickInput::default(), SIM_DT);
        assert!(session.state.boss_id.is_some());

        // A raider gets through while the boss is still dormant.
        push_entity(&mut session, "raider", 1, 0.01, 1.0);
        for _ in 0..600 {
            session.tick(&TickInput::default(), SIM_DT);
        }

        assert_eq!(session.state.phase, SessionPhase::GameOver);
        // The activation was cancelled: the boss stays dormant forever.
        let boss = session.state.entities.iter().find(|e| e.is_boss).unwrap();
        assert!(boss.dormant);
        assert!(!session.state.boss_spawned);
        assert!(
            !session
                .state
                .pending
                .iter()
                .any(|a| matches!(a.effect, DelayedEffect::ActivateBoss { .. }))
        );
    }
}
