//! Session state and entity types
//!
//! The single mutable `SessionState` instance is owned by the session
//! controller; every other component reads it or requests mutation through
//! the per-tick call chain.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::score::ScoreStreak;
use super::spawn::LaneOrder;
use crate::tuning::SessionConfig;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Countdown before play begins; the ready indicator is up.
    Starting,
    /// Active gameplay
    Playing,
    /// Frozen: no simulated time advances.
    Paused,
    /// Run ended; waiting for restart or exit.
    GameOver,
}

/// Entity id, unique within a session.
pub type EntityId = u32;

/// A spawned lane occupant (enemy, boss, or pickup) advancing toward the
/// player. Spawns at `lane_length` and reaches the player at distance 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneEntity {
    pub id: EntityId,
    /// Index into the session's spawn kinds.
    pub kind: usize,
    pub lane: usize,
    /// Distance from the player along the lane.
    pub dist: f32,
    pub speed: f32,
    /// Dormant entities (a boss awaiting activation) neither move nor collide.
    pub dormant: bool,
    pub is_boss: bool,
}

impl LaneEntity {
    /// World-space position, given the session's lane X coordinates.
    pub fn pos(&self, lanes: &[f32]) -> Vec2 {
        let x = lanes.get(self.lane).copied().unwrap_or(0.0);
        crate::lane_point(x, self.dist)
    }
}

/// A projectile travelling away from the player along a lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub id: EntityId,
    /// Index into the configured shot slots.
    pub slot: usize,
    pub lane: usize,
    pub dist: f32,
    pub speed: f32,
}

/// Effects that fire after a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DelayedEffect {
    /// Wake the dormant boss and set it moving.
    ActivateBoss { id: EntityId },
    /// Show the game-over screen and finalize the score.
    FinishGameOver,
    /// Restore enemy speed after a freeze.
    Unfreeze,
    /// Shots stop hitting every tag.
    EndShotFrenzy,
}

/// A scheduled continuation, decremented each simulated tick. Pending
/// gameplay continuations are abandoned when the session leaves Playing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayedAction {
    pub remaining: f32,
    pub effect: DelayedEffect,
}

/// Complete session state (deterministic, serializable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Live RNG state
    pub rng: Pcg32,
    pub phase: SessionPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Countdown before Starting becomes Playing.
    pub start_delay: f32,

    // Player
    pub current_lane: usize,
    /// World X, eased toward the current lane's position.
    pub player_x: f32,
    pub move_cooldown: f32,
    /// Counts up to the configured fire rate.
    pub fire_cooldown: f32,
    pub player_dead: bool,

    // Level progress
    pub level_index: usize,
    /// Regular enemies still to spawn this level.
    pub remaining_spawns: u32,
    /// Kills scored this level (the boss counts as one).
    pub kills: u32,
    pub boss_spawned: bool,
    /// Live boss entity, if one is on the field (dormant or active).
    pub boss_id: Option<EntityId>,
    pub spawn_countdown: f32,
    /// Shuffled lane traversal for spawn placement.
    pub lane_order: LaneOrder,

    /// Streak-multiplied scoring with the animated display value.
    pub score: ScoreStreak,

    // Entities (sorted by id for determinism)
    pub entities: Vec<LaneEntity>,
    pub shots: Vec<Shot>,

    // Timed modifiers
    pub shot_frenzy: bool,
    pub enemy_speed_scale: f32,

    /// Scheduled continuations.
    pub pending: Vec<DelayedAction>,

    next_id: EntityId,
}

impl SessionState {
    /// Fresh state for a validated configuration.
    pub fn new(seed: u64, config: &SessionConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let lane_order = LaneOrder::new(config.lanes.len(), &mut rng);
        let start_lane = config.start_lane.min(config.lanes.len().saturating_sub(1));
        Self {
            seed,
            rng,
            phase: SessionPhase::Starting,
            time_ticks: 0,
            start_delay: config.start_delay,
            current_lane: start_lane,
            player_x: config.lanes.get(start_lane).copied().unwrap_or(0.0),
            move_cooldown: config.move_delay,
            fire_cooldown: config.fire_rate,
            player_dead: false,
            level_index: 0,
            remaining_spawns: 0,
            kills: 0,
            boss_spawned: false,
            boss_id: None,
            spawn_countdown: 0.0,
            lane_order,
            score: ScoreStreak::new(),
            entities: Vec::new(),
            shots: Vec::new(),
            shot_frenzy: false,
            enemy_speed_scale: 1.0,
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The boss completion condition needs to know whether the boss entity
    /// reference is still live.
    pub fn boss_alive(&self) -> bool {
        self.boss_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique_and_increasing() {
        let mut state = SessionState::new(7, &SessionConfig::demo());
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_new_state_starts_in_starting_phase() {
        let config = SessionConfig::demo();
        let state = SessionState::new(7, &config);
        assert_eq!(state.phase, SessionPhase::Starting);
        assert_eq!(state.current_lane, config.start_lane);
        assert_eq!(state.player_x, config.lanes[config.start_lane]);
        assert_eq!(state.enemy_speed_scale, 1.0);
    }

    #[test]
    fn test_same_seed_same_initial_state() {
        let config = SessionConfig::demo();
        assert_eq!(
            SessionState::new(99, &config),
            SessionState::new(99, &config)
        );
    }
}
