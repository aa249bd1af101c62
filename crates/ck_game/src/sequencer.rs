//! Ordered level list and the right-edge advance rule.

use crate::controller::CharacterController;
use crate::level::LevelDef;
use crate::platform::PlatformSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    Advanced { index: usize },
    Finished,
}

pub struct LevelSequencer {
    levels: Vec<LevelDef>,
    current_index: usize,
    platforms: PlatformSet,
    finished: bool,
}

impl LevelSequencer {
    pub fn new(levels: Vec<LevelDef>, start_index: usize) -> Self {
        let current_index = if start_index < levels.len() {
            start_index
        } else {
            if !levels.is_empty() {
                log::warn!(
                    "Start level {} out of range ({} levels), starting at 0",
                    start_index,
                    levels.len()
                );
            }
            0
        };
        let platforms = levels
            .get(current_index)
            .map(activate)
            .unwrap_or_default();
        Self {
            levels,
            current_index,
            platforms,
            finished: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn current_level(&self) -> Option<&LevelDef> {
        self.levels.get(self.current_index)
    }

    /// Platforms of the active level.
    pub fn platforms(&self) -> &PlatformSet {
        &self.platforms
    }

    /// Run after the controller update. When the character has crossed the
    /// right edge, activate the next level and move it back to `x = 0`; `y`,
    /// velocity and action carry over. Past the last level the sequence ends.
    pub fn check_advance(
        &mut self,
        controller: &mut CharacterController,
        viewport_width: f32,
    ) -> Option<SequencerEvent> {
        if self.finished || controller.position.x <= viewport_width {
            return None;
        }

        let next = self.current_index + 1;
        if next >= self.levels.len() {
            self.finished = true;
            log::info!("Last level cleared");
            return Some(SequencerEvent::Finished);
        }

        self.current_index = next;
        self.platforms = activate(&self.levels[next]);
        controller.position.x = 0.0;
        log::info!(
            "Advanced to level {} '{}'",
            next,
            self.levels[next].level_id
        );
        Some(SequencerEvent::Advanced { index: next })
    }

    /// Swap in a reloaded level list, keeping the current index where possible.
    pub fn replace_levels(&mut self, levels: Vec<LevelDef>) {
        if levels.is_empty() {
            log::warn!("Ignoring reload with no levels");
            return;
        }
        self.current_index = self.current_index.min(levels.len() - 1);
        self.platforms = activate(&levels[self.current_index]);
        self.levels = levels;
        log::info!(
            "Levels reloaded: {} level(s), active index {}",
            self.levels.len(),
            self.current_index
        );
    }
}

fn activate(level: &LevelDef) -> PlatformSet {
    let platforms = level.to_platform_set();
    if platforms.is_empty() {
        log::warn!("Level '{}' has no platforms", level.level_id);
    }
    platforms
}
