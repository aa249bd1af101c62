//! One running game: input, character, level sequence and the tick counter.

use ck_core::animation::frame_phase;
use ck_core::geometry::Vec2;
use ck_core::input::InputState;

use crate::config::{GameConfig, Playfield};
use crate::controller::{CharacterAction, CharacterController};
use crate::level::LevelDef;
use crate::sequencer::{LevelSequencer, SequencerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Died,
    Respawned,
    LevelAdvanced { index: usize },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Complete,
}

/// Per-frame snapshot a renderer needs to pick a sprite cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterView {
    pub position: Vec2,
    pub facing_left: bool,
    pub action: CharacterAction,
    pub global_tick: u64,
    pub stagger_ticks: u32,
}

impl CharacterView {
    pub fn frame_phase(&self, frame_count: usize) -> Option<usize> {
        frame_phase(self.global_tick, self.stagger_ticks, frame_count)
    }
}

pub struct GameSession {
    pub input: InputState,
    pub controller: CharacterController,
    pub sequencer: LevelSequencer,
    pub global_tick: u64,
    pub playfield: Playfield,
    pub stagger_ticks: u32,
    phase: Phase,
}

impl GameSession {
    pub fn new(config: &GameConfig, levels: Vec<LevelDef>) -> Self {
        let spawn = Vec2::new(config.spawn.x, config.spawn.y);
        Self {
            input: InputState::new(),
            controller: CharacterController::new(spawn, config.controller),
            sequencer: LevelSequencer::new(levels, config.start_level),
            global_tick: 0,
            playfield: config.playfield,
            stagger_ticks: config.stagger_ticks,
            phase: Phase::Playing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// One logical step. No-op once the game is complete.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase == Phase::Complete {
            return events;
        }

        let report = self.controller.update(
            &self.input,
            self.sequencer.platforms(),
            &self.playfield,
        );
        if report.jumped {
            log::trace!("Jump at x={:.1}", self.controller.position.x);
        }
        if report.landed {
            log::debug!("Landed at ({:.1}, {:.1})", self.controller.position.x, self.controller.position.y);
        }
        if report.roll_started || report.roll_finished {
            log::trace!(
                "Roll {} on tick {}",
                if report.roll_started { "started" } else { "finished" },
                self.global_tick
            );
        }
        if report.died {
            log::info!("Character died on level {}", self.sequencer.current_index());
            events.push(GameEvent::Died);
        }

        match self
            .sequencer
            .check_advance(&mut self.controller, self.playfield.width)
        {
            Some(SequencerEvent::Advanced { index }) => {
                events.push(GameEvent::LevelAdvanced { index });
            }
            Some(SequencerEvent::Finished) => {
                self.phase = Phase::Complete;
                events.push(GameEvent::Finished);
            }
            None => {}
        }

        if report.respawned {
            self.global_tick = 0;
            log::info!("Respawned at ({:.0}, {:.0})", self.controller.spawn.x, self.controller.spawn.y);
            events.push(GameEvent::Respawned);
        } else {
            self.global_tick += 1;
        }

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "tick {} action={} pos=({:.1}, {:.1}) vy={:.1}",
                self.global_tick,
                self.controller.action,
                self.controller.position.x,
                self.controller.position.y,
                self.controller.velocity_y
            );
        }
        events
    }

    pub fn character_view(&self) -> CharacterView {
        CharacterView {
            position: self.controller.position,
            facing_left: self.controller.facing_left,
            action: self.controller.action,
            global_tick: self.global_tick,
            stagger_ticks: self.stagger_ticks,
        }
    }

    /// A reload counts as a level change, so it also clears a pending death.
    pub fn reload_levels(&mut self, levels: Vec<LevelDef>) {
        self.sequencer.replace_levels(levels);
        if self.controller.is_dead() {
            self.controller.respawn();
            self.global_tick = 0;
            log::info!("Level reload cleared death, respawned at spawn");
        }
    }
}
