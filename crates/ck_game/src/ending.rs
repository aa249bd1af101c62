//! Screen shown after the last level: a banded backdrop, the character cycling
//! through every clip of the ending sheet, and two lines of text.

use ck_core::animation::frame_phase;
use ck_core::geometry::Rect;
use serde::Deserialize;

use crate::config::Playfield;
use crate::render::{DrawCommand, Renderer};
use crate::sprites::{AnimationRegistry, ENDING_SHEET};

/// Top-to-bottom backdrop colors.
const BANDS: [[f32; 4]; 4] = [
    [0.059, 0.0, 0.078, 1.0],
    [0.459, 0.008, 0.008, 1.0],
    [0.259, 0.188, 0.286, 1.0],
    [0.278, 0.243, 0.243, 1.0],
];

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EndingConfig {
    pub lines: Vec<String>,
    /// Wall-clock time each clip stays on screen.
    pub interval_ms: f64,
    pub character_x: f32,
    pub character_y: f32,
    pub facing_left: bool,
    pub render_scale: f32,
    pub stagger_ticks: u32,
}

impl Default for EndingConfig {
    fn default() -> Self {
        Self {
            lines: vec![
                "You completed the game".to_string(),
                "Thanks for playing".to_string(),
            ],
            interval_ms: 10_000.0,
            character_x: 256.0,
            character_y: 194.0,
            facing_left: true,
            render_scale: 2.0,
            stagger_ticks: 10,
        }
    }
}

pub struct EndScreen {
    config: EndingConfig,
    clip_index: usize,
    timer_ms: f64,
    frame_counter: u64,
}

impl EndScreen {
    pub fn new(config: EndingConfig) -> Self {
        log::info!("End screen started");
        Self {
            config,
            clip_index: 0,
            timer_ms: 0.0,
            frame_counter: 0,
        }
    }

    /// Accumulate frame time and move to the next clip once the interval is
    /// reached, wrapping over `clip_count`.
    pub fn update(&mut self, dt_ms: f64, clip_count: usize) {
        self.timer_ms += dt_ms;
        if self.timer_ms >= self.config.interval_ms {
            self.timer_ms = 0.0;
            if clip_count > 0 {
                self.clip_index = (self.clip_index + 1) % clip_count;
            }
        }
    }

    pub fn frame(
        &mut self,
        renderer: &mut dyn Renderer,
        sprites: &mut AnimationRegistry,
        playfield: &Playfield,
        dt_ms: f64,
    ) {
        renderer.submit(DrawCommand::Clear { color: BANDS[0] });
        let band_height = playfield.height / BANDS.len() as f32;
        for (i, color) in BANDS.iter().enumerate() {
            renderer.submit(DrawCommand::Band {
                rect: Rect::new(0.0, i as f32 * band_height, playfield.width, band_height),
                color: *color,
            });
        }

        let clip_names: Vec<String> = sprites
            .table(ENDING_SHEET)
            .map(|table| table.clip_names().to_vec())
            .unwrap_or_default();
        let clip = clip_names
            .get(self.clip_index)
            .map(String::as_str)
            .unwrap_or("idle");
        let frame = sprites.clip(ENDING_SHEET, clip).and_then(|frames| {
            let phase = frame_phase(self.frame_counter, self.config.stagger_ticks, frames.len())?;
            frames.get(phase).copied()
        });
        if let Some(frame) = frame {
            renderer.submit(DrawCommand::Sprite {
                frame,
                dest: Rect::new(
                    self.config.character_x,
                    self.config.character_y,
                    frame.width as f32 * self.config.render_scale,
                    frame.height as f32 * self.config.render_scale,
                ),
                flip_x: self.config.facing_left,
                action: None,
            });
        }

        for (i, line) in self.config.lines.iter().enumerate() {
            renderer.submit(DrawCommand::Text {
                text: line.clone(),
                x: playfield.width / 2.0,
                y: 100.0 + 32.0 * i as f32,
            });
        }

        self.update(dt_ms, clip_names.len());
        self.frame_counter += 1;
    }
}
