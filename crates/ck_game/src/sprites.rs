//! Registry of sprite-sheet animation tables, keyed by `sheet_id`.
//!
//! Wraps the core `AnimationTable` with lookups that never fail the frame:
//! an unknown sheet or clip yields `None` and is logged once per pair.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ck_core::animation::{load_sheet_file, AnimationTable, ClipSpec, FrameRect, SheetLayout};

pub const PLAYER_SHEET: &str = "player";
pub const ENDING_SHEET: &str = "ending";

pub struct AnimationRegistry {
    tables: HashMap<String, AnimationTable>,
    /// (sheet, clip) pairs already reported missing.
    warned: HashSet<(String, String)>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    /// Registry with the built-in player and ending tables.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(default_player_sheet());
        registry.insert(default_ending_sheet());
        registry
    }

    pub fn insert(&mut self, table: AnimationTable) {
        self.tables.insert(table.sheet_id.clone(), table);
    }

    /// Load a sheet file and register it, replacing any table with the same id.
    pub fn load_file(&mut self, path: &Path) -> Result<String, String> {
        let table = load_sheet_file(path)?;
        let id = table.sheet_id.clone();
        self.insert(table);
        Ok(id)
    }

    /// Load `path` when it exists; otherwise keep the current table and warn.
    pub fn load_file_or_keep(&mut self, path: &Path) -> Result<(), String> {
        if !path.exists() {
            log::warn!(
                "Sheet file '{}' not found, keeping built-in table",
                path.display()
            );
            return Ok(());
        }
        let id = self.load_file(path)?;
        log::info!("Loaded sheet '{}' from {}", id, path.display());
        Ok(())
    }

    pub fn table(&self, sheet_id: &str) -> Option<&AnimationTable> {
        self.tables.get(sheet_id)
    }

    /// Frames of `clip` in `sheet_id`. Missing sheets or clips are skipped
    /// with a single warning per pair.
    pub fn clip(&mut self, sheet_id: &str, clip: &str) -> Option<&[FrameRect]> {
        let found = self
            .tables
            .get(sheet_id)
            .is_some_and(|table| table.clip(clip).is_some());
        if !found {
            if self.warned.insert((sheet_id.to_string(), clip.to_string())) {
                log::warn!("Animation '{}' not found in sheet '{}'", clip, sheet_id);
            }
            return None;
        }
        self.tables.get(sheet_id).and_then(|table| table.clip(clip))
    }
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 8-column sheet of 32x32 cells. `run` spans rows 2 and 3.
pub fn default_player_sheet() -> AnimationTable {
    AnimationTable::build(
        PLAYER_SHEET,
        SheetLayout {
            columns: 8,
            cell_width: 32,
            cell_height: 32,
        },
        &[
            ClipSpec::new("idle", 4, 0),
            ClipSpec::new("run", 16, 2),
            ClipSpec::new("jump", 8, 4),
            ClipSpec::new("roll", 8, 5),
            ClipSpec::new("hit", 4, 6),
            ClipSpec::new("death", 4, 7),
        ],
    )
}

pub fn default_ending_sheet() -> AnimationTable {
    AnimationTable::build(
        ENDING_SHEET,
        SheetLayout {
            columns: 8,
            cell_width: 32,
            cell_height: 32,
        },
        &[
            ClipSpec::new("idle", 2, 0),
            ClipSpec::new("blink", 2, 1),
            ClipSpec::new("walk", 4, 2),
            ClipSpec::new("run", 8, 3),
            ClipSpec::new("sit", 6, 4),
            ClipSpec::new("jump", 8, 5),
            ClipSpec::new("death", 4, 6),
            ClipSpec::new("fall", 8, 7),
            ClipSpec::new("attack", 8, 8),
        ],
    )
}
