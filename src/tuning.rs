//! Data-driven session configuration
//!
//! Everything a session needs is authored here (or deserialized from JSON)
//! before play starts and never mutated afterwards. Validation is fatal at
//! build time: a session must fail to start rather than run with undefined
//! spawn behavior.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::GAME_OVER_DELAY;
use crate::presenter::SoundId;
use crate::sim::events::{GameAction, Role, Tag, TargetSelector, TouchRule};
use crate::sim::level::LevelDefinition;
use crate::sim::spawn::SpawnKind;

/// Errors that keep a session from being built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("total spawn weight is zero; the pool would be empty")]
    ZeroSpawnWeight,
    #[error("level list is empty")]
    NoLevels,
    #[error("lane list is empty")]
    NoLanes,
    #[error("spawn interval must be positive in level `{0}`")]
    BadSpawnInterval(String),
    #[error("level `{level}` names unknown boss kind `{kind}`")]
    UnknownBossKind { level: String, kind: String },
    #[error("shot slot `{slot}` targets tag `{target}` that no spawn kind carries")]
    UnknownShotTarget { slot: String, target: String },
}

/// A projectile type the player can fire. Each slot destroys exactly one
/// enemy tag; anything else it touches is a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSlot {
    pub name: String,
    pub target: Tag,
}

/// Static trigger across the lane ends, behind the player. Fires when a
/// spawn slips past the line of defense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub touch_tags: Vec<Tag>,
    pub touch_rules: Vec<TouchRule>,
}

/// Everything authored before a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Context name scoping persisted records (`<name>HighScore`).
    pub name: String,
    /// Lane X positions, left to right.
    pub lanes: Vec<f32>,
    /// Length of a lane; spawns appear at the far end, opposite the player.
    pub lane_length: f32,
    /// Lane the player starts in.
    pub start_lane: usize,
    /// Seconds before another lane change is accepted. Don't set this to 0
    /// or a held key crosses every lane in a single frame.
    pub move_delay: f32,
    /// Seconds before play begins.
    pub start_delay: f32,
    /// Seconds between shots.
    pub fire_rate: f32,
    pub shot_speed: f32,
    pub shots: Vec<ShotSlot>,
    /// Base score for a hit, multiplied by the streak.
    pub hit_bonus: u32,
    pub spawns: Vec<SpawnKind>,
    pub levels: Vec<LevelDefinition>,
    pub barrier: Barrier,
}

impl SessionConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Index of the spawn kind called `name`.
    pub fn kind_index(&self, name: &str) -> Option<usize> {
        self.spawns.iter().position(|kind| kind.name == name)
    }

    /// Build-time checks; anything that fails here must keep the session
    /// from starting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes.is_empty() {
            return Err(ConfigError::NoLanes);
        }
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for level in &self.levels {
            if level.spawn_interval <= 0.0 {
                return Err(ConfigError::BadSpawnInterval(level.name.clone()));
            }
            if let Some(boss) = &level.boss {
                if self.kind_index(boss).is_none() {
                    return Err(ConfigError::UnknownBossKind {
                        level: level.name.clone(),
                        kind: boss.clone(),
                    });
                }
            }
        }
        for slot in &self.shots {
            if !self.spawns.iter().any(|kind| kind.tag == slot.target) {
                return Err(ConfigError::UnknownShotTarget {
                    slot: slot.name.clone(),
                    target: slot.target.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Three-lane demo battlefield: two enemy breeds, two pickups, and a
    /// boss guarding the last level.
    pub fn demo() -> Self {
        let hostile = |name: &str, weight: u32| SpawnKind {
            name: name.to_owned(),
            tag: Tag::new(capitalize(name)),
            touch_tags: vec![Tag::player()],
            touch_rules: vec![TouchRule::new(TargetSelector::Touched, GameAction::Die)],
            weight,
        };

        Self {
            name: "Grovewatch".into(),
            lanes: vec![-2.0, 0.0, 2.0],
            lane_length: 20.0,
            start_lane: 1,
            move_delay: 0.1,
            start_delay: 1.0,
            fire_rate: 0.2,
            shot_speed: 10.0,
            shots: vec![
                ShotSlot {
                    name: "bolt".into(),
                    target: Tag::new("Raider"),
                },
                ShotSlot {
                    name: "shell".into(),
                    target: Tag::new("Brute"),
                },
                ShotSlot {
                    name: "lance".into(),
                    target: Tag::new("Warden"),
                },
            ],
            hit_bonus: 10,
            spawns: vec![
                hostile("raider", 4),
                hostile("brute", 2),
                // Boss: referenced by name from the level list, never pooled.
                hostile("warden", 0),
                SpawnKind {
                    name: "supply".into(),
                    tag: Tag::new("Supply"),
                    touch_tags: vec![Tag::player()],
                    touch_rules: vec![
                        TouchRule::new(
                            TargetSelector::Role(Role::Controller),
                            GameAction::HitBonus,
                        ),
                        TouchRule::new(
                            TargetSelector::Role(Role::Controller),
                            GameAction::ChangeKillCount { amount: 1 },
                        ),
                        TouchRule::new(
                            TargetSelector::Role(Role::SoundSource),
                            GameAction::PlaySound {
                                sound: SoundId::Pickup,
                            },
                        ),
                    ],
                    weight: 1,
                },
                SpawnKind {
                    name: "coolant".into(),
                    tag: Tag::new("Coolant"),
                    touch_tags: vec![Tag::player()],
                    touch_rules: vec![
                        TouchRule::new(
                            TargetSelector::Role(Role::Controller),
                            GameAction::Freeze { duration: 3.0 },
                        ),
                        TouchRule::new(
                            TargetSelector::Role(Role::SoundSource),
                            GameAction::PlaySound {
                                sound: SoundId::Pickup,
                            },
                        ),
                    ],
                    weight: 1,
                },
            ],
            levels: vec![
                LevelDefinition {
                    name: "GROVE".into(),
                    enemy_count: 10,
                    enemy_speed: 1.5,
                    spawn_interval: 2.0,
                    boss: None,
                    boss_delay: 2.0,
                },
                LevelDefinition {
                    name: "THICKET".into(),
                    enemy_count: 15,
                    enemy_speed: 2.0,
                    spawn_interval: 1.5,
                    boss: None,
                    boss_delay: 2.0,
                },
                LevelDefinition {
                    name: "HEARTWOOD".into(),
                    enemy_count: 20,
                    enemy_speed: 2.5,
                    spawn_interval: 1.2,
                    boss: Some("warden".into()),
                    boss_delay: 2.0,
                },
            ],
            barrier: Barrier {
                touch_tags: vec![Tag::new("Raider"), Tag::new("Brute"), Tag::new("Warden")],
                touch_rules: vec![TouchRule::new(
                    TargetSelector::Role(Role::Controller),
                    GameAction::GameOver {
                        delay: GAME_OVER_DELAY,
                    },
                )],
            },
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
