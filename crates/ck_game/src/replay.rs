use ck_core::input::Action;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::session::{GameEvent, GameSession};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Action names (`move_left`, `jump`, ...) held for this frame.
    #[serde(default)]
    pub held: Vec<String>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

/// Result of driving a session through a replay without a window.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub ticks: u64,
    pub events: Vec<(u64, GameEvent)>,
}

impl ReplaySequence {
    /// One held-action set per tick.
    pub fn expanded_inputs(&self) -> Result<Vec<Vec<Action>>, String> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let held = frame
                .held
                .iter()
                .map(|name| name.parse::<Action>())
                .collect::<Result<Vec<_>, _>>()?;
            for _ in 0..frame.repeat.max(1) {
                out.push(held.clone());
            }
        }
        Ok(out)
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    replay
        .expanded_inputs()
        .map(|_| ())
        .map_err(|e| format!("Replay validation failed: {e}"))
}

/// Feed every replay tick into `session`. Stops early once the game finishes.
pub fn run_replay(session: &mut GameSession, replay: &ReplaySequence) -> Result<ReplaySummary, String> {
    let inputs = replay.expanded_inputs()?;
    let mut summary = ReplaySummary {
        ticks: 0,
        events: Vec::new(),
    };
    for held in &inputs {
        session.input.set_held(held);
        let events = session.tick();
        summary.ticks += 1;
        let tick = summary.ticks;
        let finished = events.contains(&GameEvent::Finished);
        summary
            .events
            .extend(events.into_iter().map(|event| (tick, event)));
        if finished {
            break;
        }
    }
    Ok(summary)
}

const fn default_repeat() -> u32 {
    1
}
