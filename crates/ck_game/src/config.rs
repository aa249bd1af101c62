//! Game configuration read from `assets/config/game.json`.
//!
//! Every field has a default so a partial file only overrides what it names,
//! and a missing file falls back to the built-in tuning.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::bindings::KeyBindings;
use crate::controller::ControllerConfig;
use crate::ending::EndingConfig;

/// Visible game area in pixels. Also the level width the sequencer checks.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 576.0,
            height: 324.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self { x: 32.0, y: 0.0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    pub pixel_scale: u32,
    pub playfield: Playfield,
    pub controller: ControllerConfig,
    pub spawn: SpawnPoint,
    pub start_level: usize,
    /// Ticks each animation frame is held.
    pub stagger_ticks: u32,
    pub levels_path: String,
    pub player_sheet_path: String,
    pub ending_sheet_path: String,
    pub bindings: KeyBindings,
    pub ending: EndingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Canvas Knight".to_string(),
            pixel_scale: 2,
            playfield: Playfield::default(),
            controller: ControllerConfig::default(),
            spawn: SpawnPoint::default(),
            start_level: 0,
            stagger_ticks: 10,
            levels_path: "assets/levels/levels.json".to_string(),
            player_sheet_path: "assets/sheets/player.json".to_string(),
            ending_sheet_path: "assets/sheets/ending.json".to_string(),
            bindings: KeyBindings::default(),
            ending: EndingConfig::default(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the config file, falling back to defaults when it does not exist.
/// A file that exists but is invalid is still an error.
pub fn load_config_or_default(path: &Path) -> Result<GameConfig, String> {
    if !path.exists() {
        log::warn!(
            "Config '{}' not found, using built-in defaults",
            path.display()
        );
        return Ok(GameConfig::default());
    }
    load_config_from_path(path)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.playfield.width <= 0.0 || config.playfield.height <= 0.0 {
        return Err("Config validation failed: playfield size must be > 0".to_string());
    }
    let c = &config.controller;
    if c.width <= 0.0 || c.height <= 0.0 || c.render_scale <= 0.0 {
        return Err("Config validation failed: character size and scale must be > 0".to_string());
    }
    if c.collision_inset * 2.0 >= c.draw_width() {
        return Err(
            "Config validation failed: collision_inset leaves no collision width".to_string(),
        );
    }
    if c.roll_frame_count.checked_mul(c.roll_stagger_ticks).is_none() {
        return Err(format!(
            "Config validation failed: roll duration {} x {} overflows",
            c.roll_frame_count, c.roll_stagger_ticks
        ));
    }
    if c.roll_duration() == 0 {
        return Err("Config validation failed: roll duration must be > 0".to_string());
    }
    if c.roll_timer_prime >= c.roll_duration() {
        log::warn!(
            "roll_timer_prime {} >= roll duration {}: rolls end after a single tick",
            c.roll_timer_prime,
            c.roll_duration()
        );
    }
    if config.stagger_ticks == 0 {
        return Err("Config validation failed: stagger_ticks must be > 0".to_string());
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
            "ck_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{ "start_level": 2, "controller": { "speed": 4.5 } }"#,
        )
        .expect("write temp file");

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.start_level, 2);
        assert_eq!(config.controller.speed, 4.5);
        assert_eq!(config.controller.gravity, 1.0);
        assert_eq!(config.playfield, Playfield::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        let _ = fs::remove_file(&path);
        let config = load_config_or_default(&path).expect("defaults");
        assert_eq!(config.stagger_ticks, 10);
        assert_eq!(config.spawn, SpawnPoint { x: 32.0, y: 0.0 });
    }

    #[test]
    fn rejects_inset_wider_than_sprite() {
        let path = temp_file_path("inset");
        fs::write(&path, r#"{ "controller": { "collision_inset": 40.0 } }"#)
            .expect("write temp file");
        let err = load_config_from_path(&path).expect_err("inset should fail");
        assert!(err.contains("collision_inset"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_zero_stagger() {
        let path = temp_file_path("stagger");
        fs::write(&path, r#"{ "stagger_ticks": 0 }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("zero stagger should fail");
        assert!(err.contains("stagger_ticks"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_roll_duration_overflow() {
        let path = temp_file_path("roll_overflow");
        fs::write(
            &path,
            r#"{ "controller": { "roll_frame_count": 4000000000, "roll_stagger_ticks": 5 } }"#,
        )
        .expect("write temp file");
        let err = load_config_from_path(&path).expect_err("overflowing roll should fail");
        assert!(err.contains("overflows"));
        let _ = fs::remove_file(path);
    }
}
