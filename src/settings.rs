//! Player preferences
//!
//! Persisted through the key-value store, separately from session records.
//! Gameplay tips are shown once each; re-enabling tips re-arms them.

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

/// Whether tips are shown at all; 1 = on, 0 = off.
const SHOW_TIPS_KEY: &str = "ShowTips";
const MASTER_VOLUME_KEY: &str = "MasterVolume";
const SFX_VOLUME_KEY: &str = "SfxVolume";

/// One-shot tip flags; non-zero means the tip has been seen.
pub const START_TIP_KEY: &str = "StartTip";
pub const STREAK_TIP_KEY: &str = "StreakTip";
pub const MISS_TIP_KEY: &str = "MissTip";
pub const LOSE_TIP_KEY: &str = "LoseTip";

const TIP_KEYS: [&str; 4] = [START_TIP_KEY, STREAK_TIP_KEY, MISS_TIP_KEY, LOSE_TIP_KEY];

/// Preferences read at session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Show one-time gameplay tips.
    pub show_tips: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_tips: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
        }
    }
}

impl Settings {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();
        Self {
            show_tips: store.get_float(SHOW_TIPS_KEY, 1.0) == 1.0,
            master_volume: store.get_float(MASTER_VOLUME_KEY, f64::from(defaults.master_volume))
                as f32,
            sfx_volume: store.get_float(SFX_VOLUME_KEY, f64::from(defaults.sfx_volume)) as f32,
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        store.set_float(SHOW_TIPS_KEY, if self.show_tips { 1.0 } else { 0.0 });
        store.set_float(MASTER_VOLUME_KEY, f64::from(self.master_volume));
        store.set_float(SFX_VOLUME_KEY, f64::from(self.sfx_volume));
    }

    /// Toggle tips on or off. Turning them back on also re-arms the
    /// one-shot flags so every tip shows again.
    pub fn toggle_tips(&mut self, store: &mut dyn KeyValueStore, show: bool) {
        if show && !self.show_tips {
            reset_tips(store);
        }
        self.show_tips = show;
        self.save(store);
    }
}

/// Has this one-shot tip already been shown?
pub fn tip_seen(store: &dyn KeyValueStore, key: &str) -> bool {
    store.get_int(key, 0) != 0
}

/// Record that a one-shot tip was shown.
pub fn mark_tip_seen(store: &mut dyn KeyValueStore, key: &str) {
    store.set_int(key, 1);
}

/// Re-arm every one-shot tip.
pub fn reset_tips(store: &mut dyn KeyValueStore) {
    for key in TIP_KEYS {
        store.set_int(key, 0);
    }
}
