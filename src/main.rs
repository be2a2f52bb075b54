//! Lane Warden demo entry point
//!
//! Runs a headless session with a simple autopilot and logs the outcome.
//! Pass a seed as the first argument to replay a specific run.

use anyhow::{Context, Result};

use lane_warden::consts::SIM_DT;
use lane_warden::presenter::LogPresenter;
use lane_warden::sim::{FlatBonus, Session, SessionPhase, TickInput};
use lane_warden::storage::FileStore;
use lane_warden::tuning::SessionConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("seed must be an integer")?,
        None => 0xC0FFEE,
    };

    let store = FileStore::open("lane_warden_records.json");
    let mut session = Session::with_collaborators(
        SessionConfig::demo(),
        seed,
        Box::new(LogPresenter),
        Box::new(store),
        Box::new(FlatBonus {
            count: 2,
            per_reward: 10.0,
        }),
    )?;

    // Three simulated minutes, or until the run ends.
    let max_ticks = (180.0 / SIM_DT) as u32;
    for _ in 0..max_ticks {
        let input = autopilot(&session);
        session.tick(&input, SIM_DT);
        if session.final_score().is_some() {
            break;
        }
    }

    match session.final_score() {
        Some(result) => log::info!(
            "run over: final {:.0}, high {:.0}, lifetime {}",
            result.final_score,
            result.high_score,
            result.lifetime_total
        ),
        None => log::info!(
            "time up on level {}: score {:.0} (streak x{})",
            session.state.level_index + 1,
            session.state.score.raw,
            session.state.score.streak
        ),
    }
    Ok(())
}

/// Chase the nearest hostile: line up with its lane, fire the matching slot.
fn autopilot(session: &Session) -> TickInput {
    if session.state.phase != SessionPhase::Playing {
        return TickInput::default();
    }

    let config = session.config();
    let target = session
        .state
        .entities
        .iter()
        .filter(|e| !e.dormant)
        .filter_map(|e| {
            let slot = config
                .shots
                .iter()
                .position(|s| s.target == config.spawns[e.kind].tag)?;
            Some((e, slot))
        })
        .min_by(|(a, _), (b, _)| {
            a.dist
                .partial_cmp(&b.dist)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let Some((threat, slot)) = target else {
        return TickInput::default();
    };

    let mut input = TickInput::default();
    if threat.lane < session.state.current_lane {
        input.move_left = true;
    } else if threat.lane > session.state.current_lane {
        input.move_right = true;
    } else {
        input.fire = Some(slot);
    }
    input
}
