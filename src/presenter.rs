//! Presentation and audio collaborator
//!
//! Fire-and-forget notifications out of the simulation. Implementations must
//! never block the tick and get no return channel; a missing collaborator is
//! simply the default no-op body.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Sounds the session can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundId {
    Shoot,
    Hit,
    Miss,
    Pickup,
    PlayerDie,
    LevelUp,
    GameOver,
}

/// Receives presentation notifications from the session.
pub trait Presenter {
    /// The ready indicator shown during the start countdown.
    fn show_ready(&mut self) {}
    fn show_level_up(&mut self, _level_name: &str) {}
    fn show_start_tip(&mut self) {}
    fn show_streak_tip(&mut self) {}
    fn show_miss_tip(&mut self) {}
    fn show_lose_tip(&mut self) {}
    /// Bonus popup at a world position.
    fn show_bonus(&mut self, _amount: f64, _at: Vec2) {}
    fn play_sound(&mut self, _sound: SoundId) {}
}

/// Silent presenter for headless and test use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Logs every notification; used by the demo binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_ready(&mut self) {
        log::info!("READY? GO!");
    }

    fn show_level_up(&mut self, level_name: &str) {
        log::info!("LEVEL UP: {level_name}");
    }

    fn show_start_tip(&mut self) {
        log::info!("tip: move between lanes and fire the matching shot");
    }

    fn show_streak_tip(&mut self) {
        log::info!("tip: consecutive hits multiply your bonus");
    }

    fn show_miss_tip(&mut self) {
        log::info!("tip: the wrong shot type resets your streak");
    }

    fn show_lose_tip(&mut self) {
        log::info!("tip: don't let anything past your line");
    }

    fn show_bonus(&mut self, amount: f64, at: Vec2) {
        log::info!("+{amount:.0} at ({:.1}, {:.1})", at.x, at.y);
    }

    fn play_sound(&mut self, sound: SoundId) {
        log::debug!("sound: {sound:?}");
    }
}
