//! Level data: background layers, platforms and decor tiles per level.
//!
//! Levels load from a single JSON file and are turned into the runtime
//! [`PlatformSet`] when the sequencer activates them. A file watcher lets the
//! running game pick up edits at tick boundaries.

use ck_core::geometry::Rect;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::platform::{Platform, PlatformSet};

const LEVELS_VERSION: &str = "0.1";
const INVISIBLE_VARIANT: &str = "invisible";

#[derive(Debug, Deserialize, Clone)]
pub struct LevelsFile {
    pub version: String,
    pub levels: Vec<LevelDef>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LevelDef {
    pub level_id: String,
    #[serde(default)]
    pub background: Background,
    #[serde(default, deserialize_with = "lenient_platforms")]
    pub platforms: Vec<PlatformDef>,
    #[serde(default)]
    pub decor: Vec<DecorDef>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Background {
    #[serde(default)]
    pub layers: Vec<BackgroundLayer>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BackgroundLayer {
    pub asset: String,
    #[serde(default)]
    pub parallax: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DecorDef {
    pub x: f32,
    pub y: f32,
    pub tile: String,
}

impl PlatformDef {
    pub fn to_platform(&self) -> Platform {
        let rect = Rect::new(self.x, self.y, self.width, self.height);
        match self.variant.as_deref() {
            None | Some(INVISIBLE_VARIANT) => Platform::invisible(rect),
            Some(variant) => Platform::visible(rect, variant),
        }
    }
}

impl LevelDef {
    pub fn to_platform_set(&self) -> PlatformSet {
        PlatformSet::new(self.platforms.iter().map(PlatformDef::to_platform).collect())
    }
}

/// A `platforms` value that is not an array degrades to no platforms.
fn lenient_platforms<'de, D>(deserializer: D) -> Result<Vec<PlatformDef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_array() {
        return serde_json::from_value(value).map_err(serde::de::Error::custom);
    }
    if !value.is_null() {
        log::warn!(
            "Level platforms is not a list ({}), treating as no platforms",
            json_kind(&value)
        );
    }
    Ok(Vec::new())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

pub fn load_levels_from_path(path: &Path) -> Result<LevelsFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read levels file {}: {e}", path.display()))?;
    let levels: LevelsFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse levels JSON {}: {e}", path.display()))?;
    validate_levels(&levels)?;
    Ok(levels)
}

/// Levels from `path`, or the built-in set when the file does not exist.
pub fn load_levels_or_default(path: &Path) -> Result<Vec<LevelDef>, String> {
    if !path.exists() {
        log::warn!(
            "Levels file '{}' not found, using built-in levels",
            path.display()
        );
        return Ok(default_levels());
    }
    Ok(load_levels_from_path(path)?.levels)
}

fn validate_levels(file: &LevelsFile) -> Result<(), String> {
    if file.version != LEVELS_VERSION {
        return Err(format!(
            "Levels validation failed: unsupported version '{}'",
            file.version
        ));
    }
    if file.levels.is_empty() {
        return Err("Levels validation failed: levels array is empty".to_string());
    }

    let mut ids = HashSet::new();
    for level in &file.levels {
        if level.level_id.is_empty() {
            return Err("Levels validation failed: level_id is empty".to_string());
        }
        if !ids.insert(level.level_id.as_str()) {
            return Err(format!(
                "Levels validation failed: duplicate level_id '{}'",
                level.level_id
            ));
        }
        for (i, platform) in level.platforms.iter().enumerate() {
            if platform.width <= 0.0 || platform.height <= 0.0 {
                return Err(format!(
                    "Levels validation failed: level '{}' platform {} has non-positive size",
                    level.level_id, i
                ));
            }
        }
        if level.background.layers.len() < 2 {
            log::warn!(
                "Level '{}' has {} background layer(s), expected at least two",
                level.level_id,
                level.background.layers.len()
            );
        }
    }
    Ok(())
}

fn platform(x: f32, y: f32, width: f32, height: f32, variant: &str) -> PlatformDef {
    PlatformDef {
        x,
        y,
        width,
        height,
        variant: Some(variant.to_string()),
    }
}

fn layers(names: &[(&str, f32)]) -> Background {
    Background {
        layers: names
            .iter()
            .map(|(asset, parallax)| BackgroundLayer {
                asset: asset.to_string(),
                parallax: *parallax,
            })
            .collect(),
    }
}

fn decor(x: f32, y: f32, tile: &str) -> DecorDef {
    DecorDef {
        x,
        y,
        tile: tile.to_string(),
    }
}

/// Three chained levels, each starting with ground under `x = 0` so the
/// character lands after crossing in from the previous level.
pub fn default_levels() -> Vec<LevelDef> {
    vec![
        LevelDef {
            level_id: "meadow".to_string(),
            background: layers(&[("sky", 0.0), ("hills", 0.2), ("trees", 0.5)]),
            platforms: vec![
                platform(0.0, 300.0, 260.0, 24.0, "grass"),
                platform(300.0, 300.0, 276.0, 24.0, "grass"),
                platform(180.0, 236.0, 64.0, 16.0, "wood"),
                platform(380.0, 210.0, 96.0, 16.0, "wood"),
                platform(490.0, 260.0, 40.0, 8.0, INVISIBLE_VARIANT),
            ],
            decor: vec![
                decor(40.0, 284.0, "bush"),
                decor(150.0, 284.0, "flower"),
                decor(420.0, 284.0, "rock"),
            ],
        },
        LevelDef {
            level_id: "cavern".to_string(),
            background: layers(&[("cave_back", 0.0), ("cave_mid", 0.3)]),
            platforms: vec![
                platform(0.0, 300.0, 140.0, 24.0, "stone"),
                platform(190.0, 270.0, 80.0, 16.0, "stone"),
                platform(310.0, 240.0, 80.0, 16.0, "stone"),
                platform(430.0, 300.0, 146.0, 24.0, "stone"),
                platform(250.0, 300.0, 60.0, 8.0, INVISIBLE_VARIANT),
            ],
            decor: vec![decor(60.0, 284.0, "crystal"), decor(470.0, 284.0, "skull")],
        },
        LevelDef {
            level_id: "ruins".to_string(),
            background: layers(&[("dusk", 0.0), ("ruins_far", 0.25), ("ruins_near", 0.6)]),
            platforms: vec![
                platform(0.0, 300.0, 120.0, 24.0, "brick"),
                platform(160.0, 260.0, 64.0, 16.0, "brick"),
                platform(260.0, 220.0, 64.0, 16.0, "brick"),
                platform(360.0, 260.0, 64.0, 16.0, "brick"),
                platform(460.0, 300.0, 116.0, 24.0, "brick"),
            ],
            decor: vec![decor(20.0, 284.0, "pillar"), decor(500.0, 284.0, "banner")],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformKind;
    use std::time::UNIX_EPOCH;

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ck_level_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_levels_file(path: &Path, body: &str) {
        fs::write(path, body).expect("failed to write temp levels file");
    }

    #[test]
    fn parses_valid_file_and_maps_variants() {
        let path = temp_file_path("valid");
        write_levels_file(
            &path,
            r#"
            {
              "version": "0.1",
              "levels": [
                {
                  "level_id": "one",
                  "background": { "layers": [
                    { "asset": "sky", "parallax": 0.0 },
                    { "asset": "hills", "parallax": 0.4 }
                  ] },
                  "platforms": [
                    { "x": 0, "y": 300, "width": 100, "height": 16, "variant": "grass" },
                    { "x": 120, "y": 260, "width": 40, "height": 8 },
                    { "x": 200, "y": 260, "width": 40, "height": 8, "variant": "invisible" }
                  ],
                  "decor": [ { "x": 10, "y": 280, "tile": "bush" } ]
                }
              ]
            }
            "#,
        );

        let file = load_levels_from_path(&path).expect("valid levels should load");
        assert_eq!(file.levels.len(), 1);
        let set = file.levels[0].to_platform_set();
        assert_eq!(set.len(), 3);
        assert_eq!(set.all()[0].kind, PlatformKind::Visible("grass".to_string()));
        assert_eq!(set.all()[1].kind, PlatformKind::Invisible);
        assert_eq!(set.all()[2].kind, PlatformKind::Invisible);
        assert_eq!(file.levels[0].decor[0].tile, "bush");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn non_list_platforms_become_empty() {
        let path = temp_file_path("non_list");
        write_levels_file(
            &path,
            r#"{ "version": "0.1", "levels": [ { "level_id": "broken", "platforms": { "x": 1 } } ] }"#,
        );

        let file = load_levels_from_path(&path).expect("malformed platforms degrade");
        assert!(file.levels[0].platforms.is_empty());
        assert!(file.levels[0].to_platform_set().is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_duplicate_level_ids() {
        let path = temp_file_path("dup");
        write_levels_file(
            &path,
            r#"{ "version": "0.1", "levels": [ { "level_id": "a" }, { "level_id": "a" } ] }"#,
        );
        let err = load_levels_from_path(&path).expect_err("duplicate ids should fail");
        assert!(err.contains("duplicate level_id 'a'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unsupported_version_and_empty_list() {
        let path = temp_file_path("version");
        write_levels_file(&path, r#"{ "version": "2.0", "levels": [ { "level_id": "a" } ] }"#);
        let err = load_levels_from_path(&path).expect_err("version should fail");
        assert!(err.contains("unsupported version"));

        write_levels_file(&path, r#"{ "version": "0.1", "levels": [] }"#);
        let err = load_levels_from_path(&path).expect_err("empty should fail");
        assert!(err.contains("levels array is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_zero_sized_platform() {
        let path = temp_file_path("zero");
        write_levels_file(
            &path,
            r#"{ "version": "0.1", "levels": [ { "level_id": "a",
                "platforms": [ { "x": 0, "y": 0, "width": 0, "height": 4 } ] } ] }"#,
        );
        let err = load_levels_from_path(&path).expect_err("zero width should fail");
        assert!(err.contains("non-positive size"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_uses_builtin_levels() {
        let path = temp_file_path("missing");
        let _ = fs::remove_file(&path);
        let levels = load_levels_or_default(&path).expect("defaults");
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn builtin_levels_start_with_ground_at_origin() {
        for level in default_levels() {
            let set = level.to_platform_set();
            assert!(
                set.all().iter().any(|p| p.rect.x <= 0.0 && p.rect.y == 300.0),
                "level '{}' has no ground at x = 0",
                level.level_id
            );
        }
    }

    #[test]
    fn watcher_reports_new_file_once() {
        let path = temp_file_path("watch");
        let _ = fs::remove_file(&path);
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());

        write_levels_file(&path, "{}");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }
}
