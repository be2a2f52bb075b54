//! Scoring and consecutive-hit streak tracking
//!
//! Every hit is worth the base bonus times the current streak; a miss drops
//! the streak back to its floor of 1. The displayed score eases toward the
//! raw score so the HUD counts up instead of jumping.

use serde::{Deserialize, Serialize};

use crate::consts::SCORE_ANIM_RATE;
use crate::highscores::{self, TOTAL_SCORE_KEY};
use crate::storage::KeyValueStore;

/// Additive end-of-session bonus from an external provider.
pub trait ScoreModifier {
    /// Bonus folded into the raw score during finalize.
    fn bonus(&self) -> f64;
}

/// No external bonus.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBonus;

impl ScoreModifier for NoBonus {
    fn bonus(&self) -> f64 {
        0.0
    }
}

/// Fixed per-reward bonus: `count` rewards worth `per_reward` each.
#[derive(Debug, Clone, Copy)]
pub struct FlatBonus {
    pub count: u32,
    pub per_reward: f64,
}

impl ScoreModifier for FlatBonus {
    fn bonus(&self) -> f64 {
        f64::from(self.count) * self.per_reward
    }
}

/// Result of closing out a session's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Raw score plus the external bonus.
    pub final_score: f64,
    /// High score for the session context after settling.
    pub high_score: f64,
    pub new_high: bool,
    /// Cumulative total across every session, after adding this one.
    pub lifetime_total: i64,
}

/// Streak-multiplied score accumulator with an animated display value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStreak {
    /// Current streak multiplier; 1 is the floor.
    pub streak: u32,
    /// Raw (true) score.
    pub raw: f64,
    /// Displayed score, eased toward `raw` each tick.
    pub display: f64,
    final_result: Option<FinalScore>,
}

impl Default for ScoreStreak {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStreak {
    pub fn new() -> Self {
        Self {
            streak: 1,
            raw: 0.0,
            display: 0.0,
            final_result: None,
        }
    }

    /// Award `base_bonus x streak`, then grow the streak. Returns the points
    /// gained so the caller can show the bonus popup.
    pub fn on_hit(&mut self, base_bonus: u32) -> f64 {
        let gained = f64::from(base_bonus) * f64::from(self.streak);
        self.raw += gained;
        self.streak += 1;
        gained
    }

    /// A miss drops the streak to the floor; the raw score keeps its value.
    pub fn on_miss(&mut self) {
        self.streak = 1;
    }

    /// Ease the displayed score toward the raw score. Strictly monotone and
    /// never overshoots; snaps once the remainder stops being visible.
    pub fn animate(&mut self, dt: f32) {
        if self.display >= self.raw {
            return;
        }
        let t = (f64::from(dt) * f64::from(SCORE_ANIM_RATE)).min(1.0);
        self.display += (self.raw - self.display) * t;
        if self.raw - self.display < 0.5 {
            self.display = self.raw;
        }
    }

    /// The settled result, once `finalize` has run.
    pub fn final_result(&self) -> Option<FinalScore> {
        self.final_result
    }

    /// Close out the session: fold in the external bonus, settle the
    /// persisted high score for `context`, and add to the lifetime total.
    ///
    /// Idempotent: repeat calls return the first result without touching the
    /// store again, so the cumulative total cannot be double-counted.
    pub fn finalize(
        &mut self,
        store: &mut dyn KeyValueStore,
        modifier: &dyn ScoreModifier,
        context: &str,
    ) -> FinalScore {
        if let Some(result) = self.final_result {
            return result;
        }

        let final_score = self.raw + modifier.bonus();
        let key = highscores::high_score_key(context);
        let previous = store.get_float(&key, 0.0);
        let new_high = final_score > previous;
        let high_score = if new_high {
            store.set_float(&key, final_score);
            final_score
        } else {
            previous
        };

        let lifetime_total = store.get_int(TOTAL_SCORE_KEY, 0) + final_score.round() as i64;
        store.set_int(TOTAL_SCORE_KEY, lifetime_total);

        let result = FinalScore {
            final_score,
            high_score,
            new_high,
            lifetime_total,
        };
        self.final_result = Some(result);
        log::info!(
            "final score {final_score:.0} (high {high_score:.0}{}), lifetime {lifetime_total}",
            if new_high { ", new record" } else { "" }
        );
        result
    }
}
