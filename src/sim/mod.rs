//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod events;
pub mod level;
pub mod score;
pub mod spawn;
pub mod state;
pub mod tick;

pub use events::{
    Contact, Delivery, GameAction, Receiver, Role, RoleRegistry, Tag, TargetSelector, TouchRule,
    dispatch,
};
pub use level::{LevelDefinition, LevelSequencer};
pub use score::{FinalScore, FlatBonus, NoBonus, ScoreModifier, ScoreStreak};
pub use spawn::{LaneOrder, SpawnKind, SpawnScheduler, SpawnTable};
pub use state::{
    DelayedAction, DelayedEffect, EntityId, LaneEntity, SessionPhase, SessionState, Shot,
};
pub use tick::{Session, TickInput};
