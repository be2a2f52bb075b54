//! High score records
//!
//! Thin views over the key-value store: one high score per session context
//! plus a lifetime total across all sessions. Key shapes match what the
//! score engine writes during finalize.

use crate::storage::KeyValueStore;

/// Cumulative score across every session ever played.
pub const TOTAL_SCORE_KEY: &str = "TotalScore";

/// Storage key for a context's high score.
pub fn high_score_key(context: &str) -> String {
    format!("{context}HighScore")
}

/// Snapshot of the records for one session context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Records {
    pub high_score: f64,
    pub lifetime_total: i64,
}

/// Read the current records for `context`; absent keys read as zero.
pub fn load(store: &dyn KeyValueStore, context: &str) -> Records {
    Records {
        high_score: store.get_float(&high_score_key(context), 0.0),
        lifetime_total: store.get_int(TOTAL_SCORE_KEY, 0),
    }
}
