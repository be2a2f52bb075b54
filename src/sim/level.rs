//! Level definitions and progression
//!
//! Levels are authored once and read-only afterwards; the sequencer walks
//! them in order and re-derives the per-level parameters held in session
//! state. The last level is terminal: the session stays on it indefinitely.

use serde::{Deserialize, Serialize};

use super::state::SessionState;
use crate::tuning::ConfigError;

fn default_boss_delay() -> f32 {
    2.0
}

/// A single level: difficulty parameters and the optional end-of-level boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Shown by the presenter on level-up.
    pub name: String,
    /// Kills needed to clear the level; also the number of regular spawns.
    pub enemy_count: u32,
    /// Movement speed for enemies spawned in this level.
    pub enemy_speed: f32,
    /// Seconds between regular spawns.
    pub spawn_interval: f32,
    /// Spawn-kind name of the boss, if the level ends with one.
    #[serde(default)]
    pub boss: Option<String>,
    /// Seconds between the last regular spawn and boss activation.
    #[serde(default = "default_boss_delay")]
    pub boss_delay: f32,
}

/// Ordered level list with advance/terminal semantics.
#[derive(Debug, Clone)]
pub struct LevelSequencer {
    levels: Vec<LevelDefinition>,
}

impl LevelSequencer {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        false // construction rejects empty lists
    }

    /// Definition at `index`, clamped to the terminal level.
    pub fn get(&self, index: usize) -> &LevelDefinition {
        &self.levels[index.min(self.levels.len() - 1)]
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.levels.len() - 1
    }

    /// Advance to the next level, resetting per-level counters and
    /// re-deriving spawn parameters. At the terminal level this is a no-op
    /// and returns `false`; the session remains playable there.
    pub fn advance(&self, state: &mut SessionState) -> bool {
        if self.is_terminal(state.level_index) {
            return false;
        }
        state.level_index += 1;
        state.kills = 0;
        state.boss_spawned = false;
        state.boss_id = None;
        self.apply(state);
        log::info!(
            "advanced to level {} `{}`",
            state.level_index + 1,
            self.get(state.level_index).name
        );
        true
    }

    /// Re-derive the active level's spawn budget and cadence into `state`.
    pub fn apply(&self, state: &mut SessionState) {
        let level = self.get(state.level_index);
        state.remaining_spawns = level.enemy_count;
        state.spawn_countdown = level.spawn_interval;
    }
}
