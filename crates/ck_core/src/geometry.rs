//! Screen-space geometry shared by the controller, level data and renderer.
//!
//! Coordinates follow the canvas convention: origin at the top-left corner,
//! `x` grows to the right and `y` grows downward, in pixels.

use serde::Deserialize;

pub use glam::Vec2;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the open horizontal spans `[x, right)` of both rects intersect.
    pub fn overlaps_x(&self, left: f32, right: f32) -> bool {
        left < self.right() && right > self.x
    }

    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.y && y <= self.bottom()
    }
}
