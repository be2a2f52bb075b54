//! Weighted spawn table, shuffled lane traversal, and the spawn scheduler
//!
//! The table is flattened once at session build: each kind appears as many
//! times as its weight, so a uniform index pick is weight-proportional.
//! Lanes are consumed in shuffled rounds so every lane receives a spawn
//! before any lane repeats.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{Tag, TouchRule};
use super::level::LevelSequencer;
use super::state::{DelayedAction, DelayedEffect, LaneEntity, SessionState};
use crate::consts::BOSS_SPAWN_SETBACK;
use crate::tuning::{ConfigError, SessionConfig};

/// A spawnable entity kind, authored once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnKind {
    pub name: String,
    /// Tag shots and touch filters match against.
    pub tag: Tag,
    /// Tags this kind reacts to on contact.
    #[serde(default)]
    pub touch_tags: Vec<Tag>,
    /// Dispatched when the touch filter matches.
    #[serde(default)]
    pub touch_rules: Vec<TouchRule>,
    /// Relative spawn weight. Zero keeps the kind out of the pool (bosses).
    pub weight: u32,
}

/// Flattened weighted pool over spawn-kind indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTable {
    pool: Vec<usize>,
}

impl SpawnTable {
    /// Build the pool; each kind index appears `weight` times. Fails when
    /// the total weight is zero, which would leave nothing to spawn.
    pub fn build(kinds: &[SpawnKind]) -> Result<Self, ConfigError> {
        let total: u64 = kinds.iter().map(|kind| u64::from(kind.weight)).sum();
        if total == 0 {
            return Err(ConfigError::ZeroSpawnWeight);
        }
        let mut pool = Vec::with_capacity(total as usize);
        for (index, kind) in kinds.iter().enumerate() {
            for _ in 0..kind.weight {
                pool.push(index);
            }
        }
        Ok(Self { pool })
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Uniform pick; higher-weight kinds come up proportionally more often.
    pub fn pick(&self, rng: &mut Pcg32) -> usize {
        self.pool[rng.random_range(0..self.pool.len())]
    }
}

/// Shuffled traversal over lane indices.
///
/// Each round visits every lane exactly once; when the cursor wraps, the
/// order is reshuffled. The permutation is uniform (Fisher-Yates via
/// `SliceRandom::shuffle`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneOrder {
    order: Vec<usize>,
    cursor: usize,
}

impl LaneOrder {
    pub fn new(lane_count: usize, rng: &mut Pcg32) -> Self {
        let mut order: Vec<usize> = (0..lane_count).collect();
        order.shuffle(rng);
        Self { order, cursor: 0 }
    }

    /// Next lane in the traversal, reshuffling when a round completes.
    pub fn next(&mut self, rng: &mut Pcg32) -> usize {
        if self.order.is_empty() {
            return 0;
        }
        if self.cursor >= self.order.len() {
            self.order.shuffle(rng);
            self.cursor = 0;
        }
        let lane = self.order[self.cursor];
        self.cursor += 1;
        lane
    }
}

/// Decides, once per tick, whether a regular enemy or the boss appears and
/// on which lane.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    table: SpawnTable,
}

impl SpawnScheduler {
    pub fn new(table: SpawnTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SpawnTable {
        &self.table
    }

    /// Advance the spawn countdown: emit regular spawns while the level's
    /// budget lasts, then stage the boss sequence if the level has one.
    pub fn tick(
        &self,
        state: &mut SessionState,
        levels: &LevelSequencer,
        config: &SessionConfig,
        dt: f32,
    ) {
        let level = levels.get(state.level_index);

        if state.remaining_spawns > 0 {
            state.spawn_countdown -= dt;
            if state.spawn_countdown > 0.0 {
                return;
            }
            state.spawn_countdown = level.spawn_interval;

            let kind = self.table.pick(&mut state.rng);
            let lane = state.lane_order.next(&mut state.rng);
            let id = state.next_entity_id();
            state.entities.push(LaneEntity {
                id,
                kind,
                lane,
                dist: config.lane_length,
                speed: level.enemy_speed,
                dormant: false,
                is_boss: false,
            });
            state.remaining_spawns -= 1;
            log::debug!(
                "spawned `{}` on lane {lane} ({} left this level)",
                config.spawns[kind].name,
                state.remaining_spawns
            );
        } else if !state.boss_spawned && state.boss_id.is_none() {
            let Some(boss_name) = &level.boss else {
                return;
            };
            let Some(kind) = config.kind_index(boss_name) else {
                return; // validated at build; stay total regardless
            };

            // The boss materializes dormant on the middle lane and only
            // starts moving once the delayed activation fires.
            let lane = config.lanes.len() / 2;
            let id = state.next_entity_id();
            state.entities.push(LaneEntity {
                id,
                kind,
                lane,
                dist: config.lane_length - BOSS_SPAWN_SETBACK,
                speed: 0.0,
                dormant: true,
                is_boss: true,
            });
            state.boss_id = Some(id);
            state.pending.push(DelayedAction {
                remaining: level.boss_delay,
                effect: DelayedEffect::ActivateBoss { id },
            });
            log::info!(
                "boss `{boss_name}` staged on lane {lane}, activates in {}s",
                level.boss_delay
            );
        }
    }
}
