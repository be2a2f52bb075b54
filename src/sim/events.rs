//! Collision-triggered event dispatch
//!
//! A collision between two entities turns into zero or more actions on named
//! receivers, so neither entity's type hard-codes the other. Rules are
//! authored per spawn kind; actions are a closed enum routed to whichever
//! receiver a rule's target selector resolves to.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::EntityId;
use crate::presenter::SoundId;

/// Tag carried by collidable entities. Shots and touch filters match on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The player's fixed tag.
    pub fn player() -> Self {
        Self::new("Player")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical roles a receiver can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The session controller: scoring, level flow, game over.
    Controller,
    /// The player entity.
    Player,
    /// The audio sink, when one is registered.
    SoundSource,
}

/// Who a touch rule delivers its action to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSelector {
    /// The entity that was touched by the rule's owner.
    Touched,
    /// The rule's owner itself.
    Itself,
    /// The unique live receiver registered under a role.
    Role(Role),
}

/// Closed set of actions a touch rule can request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameAction {
    /// Kill the receiving entity, with kill credit.
    Die,
    /// Award the hit bonus, multiplied by the current streak.
    HitBonus,
    /// Adjust the kill counter for the current level.
    ChangeKillCount { amount: i32 },
    /// Drop the streak back to its floor.
    ResetStreak,
    /// End the session after a delay.
    GameOver { delay: f32 },
    /// Slow every live enemy for a duration.
    Freeze { duration: f32 },
    /// Kill every live enemy, with credit.
    KillAll,
    /// Shots hit every tag for a duration.
    ShotFrenzy { duration: f32 },
    /// Fire-and-forget sound request.
    PlaySound { sound: SoundId },
}

/// A single collision rule: when the owner's touch filter matches, deliver
/// `action` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchRule {
    pub target: TargetSelector,
    pub action: GameAction,
}

impl TouchRule {
    pub fn new(target: TargetSelector, action: GameAction) -> Self {
        Self { target, action }
    }
}

/// A concrete receiver a delivery lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    /// The session controller.
    Controller,
    /// The player.
    Player,
    /// A live lane entity.
    Entity(EntityId),
    /// The registered audio sink.
    SoundSource,
}

/// One queued delivery: `action` applied to `receiver`, optionally carrying
/// the collision initiator as its parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub receiver: Receiver,
    pub action: GameAction,
    pub initiator: Option<EntityId>,
}

/// The two sides of a collision, resolved to concrete receivers.
///
/// `itself` is `None` when the rule owner is scenery (the lane-end barrier);
/// deliveries whose selector cannot resolve are silently dropped.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Receiver standing for the rule owner.
    pub itself: Option<Receiver>,
    /// Receiver standing for the entity that was touched.
    pub touched: Option<Receiver>,
    /// Initiating entity carried as the action parameter.
    pub initiator: Option<EntityId>,
}

/// Maps logical roles to the single live receiver serving each one.
///
/// Dispatch to an unregistered role is a silent no-op: UI or sound state may
/// simply be absent, and collision rules fire and forget.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    entries: HashMap<Role, Receiver>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, role: Role, receiver: Receiver) {
        let _ = self.entries.insert(role, receiver);
    }

    pub fn unregister(&mut self, role: Role) {
        let _ = self.entries.remove(&role);
    }

    pub fn resolve(&self, role: Role) -> Option<Receiver> {
        self.entries.get(&role).copied()
    }
}

/// Resolve a collision into queued deliveries, in rule declaration order.
///
/// A touched tag outside the owner's filter produces no dispatch at all;
/// that is how "only enemies hit the player" filtering is expressed. Each
/// rule fires at most once per collision.
pub fn dispatch(
    rules: &[TouchRule],
    filter: &[Tag],
    touched_tag: &Tag,
    contact: Contact,
    registry: &RoleRegistry,
    out: &mut VecDeque<Delivery>,
) {
    if !filter.iter().any(|tag| tag == touched_tag) {
        return;
    }

    for rule in rules {
        let receiver = match rule.target {
            TargetSelector::Touched => contact.touched,
            TargetSelector::Itself => contact.itself,
            TargetSelector::Role(role) => registry.resolve(role),
        };
        let Some(receiver) = receiver else {
            continue;
        };
        out.push_back(Delivery {
            receiver,
            action: rule.action,
            initiator: contact.initiator,
        });
    }
}
