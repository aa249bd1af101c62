//! Sprite-sheet animation tables and deterministic frame selection.
//!
//! A sheet is a uniform grid of cells. Each clip is declared by its first row
//! and frame count; clips longer than one row wrap onto the following rows.
//! The cell rectangles are pure derived data, so they are built once into an
//! [`AnimationTable`] and only looked up afterwards.
//!
//! Frame selection is tick-based: every frame is held for `stagger` ticks, so
//! `phase = (tick / stagger) % frame_count`. No wall-clock time is involved,
//! which keeps replays bit-identical.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Grid geometry of a sprite sheet image.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub columns: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

/// Declarative clip entry: `frames` cells starting at column 0 of `row`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClipSpec {
    pub name: String,
    pub frames: u32,
    pub row: u32,
}

impl ClipSpec {
    pub fn new(name: &str, frames: u32, row: u32) -> Self {
        Self {
            name: name.to_string(),
            frames,
            row,
        }
    }
}

/// Source rectangle of one frame inside the sheet image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct AnimationTable {
    pub sheet_id: String,
    pub layout: SheetLayout,
    clips: HashMap<String, Vec<FrameRect>>,
    order: Vec<String>,
}

impl AnimationTable {
    pub fn build(sheet_id: &str, layout: SheetLayout, specs: &[ClipSpec]) -> Self {
        let mut clips = HashMap::new();
        let mut order = Vec::with_capacity(specs.len());
        for spec in specs {
            let frames = (0..spec.frames)
                .map(|j| FrameRect {
                    x: (j % layout.columns) * layout.cell_width,
                    y: (spec.row + j / layout.columns) * layout.cell_height,
                    width: layout.cell_width,
                    height: layout.cell_height,
                })
                .collect();
            if clips.insert(spec.name.clone(), frames).is_none() {
                order.push(spec.name.clone());
            }
        }
        Self {
            sheet_id: sheet_id.to_string(),
            layout,
            clips,
            order,
        }
    }

    pub fn clip(&self, name: &str) -> Option<&[FrameRect]> {
        self.clips.get(name).map(Vec::as_slice)
    }

    /// Clip names in declaration order.
    pub fn clip_names(&self) -> &[String] {
        &self.order
    }
}

/// `floor(tick / stagger) mod frame_count`. A zero stagger is treated as one.
pub fn frame_phase(tick: u64, stagger: u32, frame_count: usize) -> Option<usize> {
    if frame_count == 0 {
        return None;
    }
    let stagger = u64::from(stagger.max(1));
    Some(((tick / stagger) % frame_count as u64) as usize)
}

#[derive(Debug, Deserialize)]
struct SheetFileJson {
    version: String,
    sheet_id: String,
    layout: SheetLayout,
    clips: Vec<ClipSpec>,
}

/// Load a sheet definition file and build its table.
pub fn load_sheet_file(path: &Path) -> Result<AnimationTable, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sheet file {}: {e}", path.display()))?;
    parse_sheet(&raw).map_err(|e| format!("{} ({})", e, path.display()))
}

pub fn parse_sheet(raw: &str) -> Result<AnimationTable, String> {
    let json: SheetFileJson =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse sheet JSON: {e}"))?;
    validate_sheet_json(&json)?;
    Ok(AnimationTable::build(&json.sheet_id, json.layout, &json.clips))
}

fn validate_sheet_json(json: &SheetFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Sheet validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.sheet_id.is_empty() {
        return Err("Sheet validation failed: sheet_id is empty".to_string());
    }
    let layout = json.layout;
    if layout.columns == 0 || layout.cell_width == 0 || layout.cell_height == 0 {
        return Err("Sheet validation failed: columns and cell size must be > 0".to_string());
    }
    let mut names = HashSet::new();
    for clip in &json.clips {
        if !names.insert(clip.name.as_str()) {
            return Err(format!(
                "Sheet validation failed: duplicate clip '{}'",
                clip.name
            ));
        }
        if clip.frames == 0 {
            return Err(format!(
                "Sheet validation failed: clip '{}' has no frames",
                clip.name
            ));
        }
    }
    if json.clips.is_empty() {
        log::warn!("Sheet '{}' declares no clips", json.sheet_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ck_sheet_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn knight_layout() -> SheetLayout {
        SheetLayout {
            columns: 8,
            cell_width: 32,
            cell_height: 32,
        }
    }

    #[test]
    fn build_places_frames_on_grid() {
        let table = AnimationTable::build(
            "knight",
            knight_layout(),
            &[ClipSpec::new("idle", 4, 0), ClipSpec::new("roll", 8, 5)],
        );
        let idle = table.clip("idle").expect("idle exists");
        assert_eq!(idle.len(), 4);
        assert_eq!(idle[3], FrameRect { x: 96, y: 0, width: 32, height: 32 });

        let roll = table.clip("roll").expect("roll exists");
        assert_eq!(roll[0].y, 160);
        assert_eq!(roll[7].x, 224);
    }

    #[test]
    fn long_clip_wraps_to_next_row() {
        let table =
            AnimationTable::build("knight", knight_layout(), &[ClipSpec::new("run", 16, 2)]);
        let run = table.clip("run").expect("run exists");
        assert_eq!(run[7], FrameRect { x: 224, y: 64, width: 32, height: 32 });
        assert_eq!(run[8], FrameRect { x: 0, y: 96, width: 32, height: 32 });
    }

    #[test]
    fn frame_phase_holds_each_frame_for_stagger_ticks() {
        assert_eq!(frame_phase(0, 10, 4), Some(0));
        assert_eq!(frame_phase(9, 10, 4), Some(0));
        assert_eq!(frame_phase(10, 10, 4), Some(1));
        assert_eq!(frame_phase(39, 10, 4), Some(3));
        assert_eq!(frame_phase(40, 10, 4), Some(0));
        assert_eq!(frame_phase(5, 10, 0), None);
    }

    #[test]
    fn unknown_clip_is_none() {
        let table =
            AnimationTable::build("knight", knight_layout(), &[ClipSpec::new("idle", 4, 0)]);
        assert!(table.clip("jump").is_none());
        assert_eq!(table.clip("idle").map(<[FrameRect]>::len), Some(4));
    }

    #[test]
    fn clip_names_keep_declaration_order() {
        let table = AnimationTable::build(
            "ending",
            knight_layout(),
            &[
                ClipSpec::new("idle", 2, 0),
                ClipSpec::new("blink", 2, 1),
                ClipSpec::new("walk", 4, 2),
            ],
        );
        assert_eq!(table.clip_names(), ["idle", "blink", "walk"]);
    }

    #[test]
    fn load_sheet_file_parses_valid_json() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#"{
              "version": "0.1",
              "sheet_id": "knight",
              "layout": { "columns": 8, "cell_width": 32, "cell_height": 32 },
              "clips": [
                { "name": "idle", "frames": 4, "row": 0 },
                { "name": "death", "frames": 4, "row": 7 }
              ]
            }"#,
        )
        .expect("write temp file");

        let table = load_sheet_file(&path).expect("valid sheet should load");
        assert_eq!(table.sheet_id, "knight");
        assert_eq!(table.clip("death").map(|c| c[0].y), Some(224));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn parse_sheet_rejects_duplicate_clip() {
        let err = parse_sheet(
            r#"{
              "version": "0.1",
              "sheet_id": "knight",
              "layout": { "columns": 8, "cell_width": 32, "cell_height": 32 },
              "clips": [
                { "name": "idle", "frames": 4, "row": 0 },
                { "name": "idle", "frames": 2, "row": 1 }
              ]
            }"#,
        )
        .expect_err("duplicate clip should fail");
        assert!(err.contains("duplicate clip"));
    }

    #[test]
    fn parse_sheet_rejects_zero_columns() {
        let err = parse_sheet(
            r#"{
              "version": "0.1",
              "sheet_id": "knight",
              "layout": { "columns": 0, "cell_width": 32, "cell_height": 32 },
              "clips": []
            }"#,
        )
        .expect_err("zero columns should fail");
        assert!(err.contains("must be > 0"));
    }
}
