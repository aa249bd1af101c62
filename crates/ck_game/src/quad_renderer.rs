//! `Renderer` backend that turns draw commands into a colored-quad mesh.
//!
//! The mesh is rebuilt on the CPU every frame and streamed to the GPU by the
//! binary. Text commands cannot be expressed as quads and are collected as
//! labels for the egui foreground layer instead.

use ck_core::geometry::Rect;
use ck_render::vertex::push_quad;
use ck_render::QuadVertex;

use crate::config::Playfield;
use crate::controller::CharacterAction;
use crate::render::{DrawCommand, Renderer, CLEAR_COLOR};

const DEBUG_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 0.9];
const GAME_OVER_SHADE: [f32; 4] = [0.0, 0.0, 0.0, 0.55];
const PILLAR_SPACING: f32 = 96.0;
const DECOR_SIZE: f32 = 16.0;

const PALETTE: [[f32; 4]; 8] = [
    [0.36, 0.55, 0.80, 1.0],
    [0.25, 0.42, 0.30, 1.0],
    [0.55, 0.45, 0.65, 1.0],
    [0.70, 0.52, 0.32, 1.0],
    [0.30, 0.30, 0.38, 1.0],
    [0.80, 0.70, 0.40, 1.0],
    [0.45, 0.28, 0.25, 1.0],
    [0.40, 0.60, 0.60, 1.0],
];

/// Text queued for the overlay, in playfield pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

pub struct QuadRenderer {
    pub playfield: Playfield,
    pub clear_color: [f32; 4],
    pub vertices: Vec<QuadVertex>,
    pub indices: Vec<u32>,
    pub texts: Vec<QueuedText>,
}

impl QuadRenderer {
    pub fn new(playfield: Playfield) -> Self {
        Self {
            playfield,
            clear_color: CLEAR_COLOR,
            vertices: Vec::new(),
            indices: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    fn fill(&mut self, rect: Rect, color: [f32; 4]) {
        push_quad(
            &mut self.vertices,
            &mut self.indices,
            [rect.x, rect.y, rect.width, rect.height],
            color,
        );
    }

    fn outline(&mut self, rect: Rect, color: [f32; 4]) {
        let t = 1.0;
        self.fill(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.fill(Rect::new(rect.x, rect.bottom() - t, rect.width, t), color);
        self.fill(Rect::new(rect.x, rect.y, t, rect.height), color);
        self.fill(Rect::new(rect.right() - t, rect.y, t, rect.height), color);
    }

    /// Layer 0 fills the sky; later layers draw scrolling pillars that get
    /// taller and darker towards the front.
    fn background_layer(&mut self, index: usize, asset: &str, scroll: f32) {
        let color = palette_color(asset);
        let (width, height) = (self.playfield.width, self.playfield.height);
        if index == 0 {
            self.fill(Rect::new(0.0, 0.0, width, height), color);
            return;
        }
        let depth = index as f32;
        let shade = 1.0 / (1.0 + 0.3 * depth);
        let color = [color[0] * shade, color[1] * shade, color[2] * shade, 1.0];
        let pillar_height = height * (0.2 + 0.15 * depth).min(0.8);
        let offset = scroll.rem_euclid(PILLAR_SPACING);
        let mut x = -offset;
        while x < width {
            self.fill(
                Rect::new(x, height - pillar_height, PILLAR_SPACING * 0.5, pillar_height),
                color,
            );
            x += PILLAR_SPACING;
        }
    }

    fn sprite(&mut self, dest: Rect, flip_x: bool, action: Option<CharacterAction>, frame_column: u32) {
        let base = match action {
            Some(CharacterAction::Idle) | None => [0.85, 0.85, 0.90, 1.0],
            Some(CharacterAction::Run) => [0.35, 0.75, 0.95, 1.0],
            Some(CharacterAction::Jump) => [0.95, 0.80, 0.30, 1.0],
            Some(CharacterAction::Roll) => [0.60, 0.45, 0.95, 1.0],
            Some(CharacterAction::Death) => [0.85, 0.20, 0.20, 1.0],
        };
        // Frame column pulses the body brightness so animation is visible.
        let pulse = 0.85 + 0.05 * (frame_column % 4) as f32;
        let body = [base[0] * pulse, base[1] * pulse, base[2] * pulse, 1.0];
        let inset = dest.width * 0.25;
        self.fill(
            Rect::new(dest.x + inset, dest.y + dest.height * 0.25, dest.width - 2.0 * inset, dest.height * 0.75),
            body,
        );
        let eye_size = dest.width * 0.1;
        let eye_x = if flip_x {
            dest.x + inset + eye_size
        } else {
            dest.right() - inset - 2.0 * eye_size
        };
        self.fill(
            Rect::new(eye_x, dest.y + dest.height * 0.35, eye_size, eye_size),
            [0.05, 0.05, 0.05, 1.0],
        );
    }

    fn game_over(&mut self) {
        let (width, height) = (self.playfield.width, self.playfield.height);
        self.fill(Rect::new(0.0, 0.0, width, height), GAME_OVER_SHADE);
        self.texts.push(QueuedText {
            text: "GAME OVER".to_string(),
            x: width / 2.0,
            y: height / 2.0 - 16.0,
            size: 32.0,
        });
        self.texts.push(QueuedText {
            text: "Press R to try again".to_string(),
            x: width / 2.0,
            y: height / 2.0 + 20.0,
            size: 16.0,
        });
    }
}

impl Renderer for QuadRenderer {
    fn submit(&mut self, command: DrawCommand) {
        match command {
            DrawCommand::Clear { color } => {
                self.clear_color = color;
                self.vertices.clear();
                self.indices.clear();
                self.texts.clear();
            }
            DrawCommand::BackgroundLayer {
                index,
                asset,
                scroll,
            } => self.background_layer(index, &asset, scroll),
            DrawCommand::Band { rect, color } => self.fill(rect, color),
            DrawCommand::Platform { rect, variant } => self.fill(rect, variant_color(&variant)),
            DrawCommand::DebugBox { rect } => self.outline(rect, DEBUG_COLOR),
            DrawCommand::Decor { x, y, tile } => self.fill(
                Rect::new(x, y, DECOR_SIZE, DECOR_SIZE),
                palette_color(&tile),
            ),
            DrawCommand::Sprite {
                frame,
                dest,
                flip_x,
                action,
                ..
            } => {
                let column = if frame.width > 0 { frame.x / frame.width } else { 0 };
                self.sprite(dest, flip_x, action, column);
            }
            DrawCommand::GameOver => self.game_over(),
            DrawCommand::Text { text, x, y } => self.texts.push(QueuedText {
                text,
                x,
                y,
                size: 20.0,
            }),
        }
    }
}

fn variant_color(variant: &str) -> [f32; 4] {
    match variant {
        "grass" => [0.30, 0.62, 0.25, 1.0],
        "wood" => [0.55, 0.36, 0.20, 1.0],
        "stone" => [0.48, 0.48, 0.52, 1.0],
        "brick" => [0.62, 0.30, 0.22, 1.0],
        other => palette_color(other),
    }
}

/// Stable color for an arbitrary asset or tile name (FNV-1a into the palette).
fn palette_color(name: &str) -> [f32; 4] {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    PALETTE[(hash as usize) % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ck_core::animation::FrameRect;

    #[test]
    fn clear_resets_the_mesh() {
        let mut renderer = QuadRenderer::new(Playfield::default());
        renderer.submit(DrawCommand::Band {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            color: [1.0; 4],
        });
        assert_eq!(renderer.quad_count(), 1);
        renderer.submit(DrawCommand::Clear { color: [0.0; 4] });
        assert_eq!(renderer.quad_count(), 0);
        assert_eq!(renderer.clear_color, [0.0; 4]);
    }

    #[test]
    fn debug_box_is_four_edges() {
        let mut renderer = QuadRenderer::new(Playfield::default());
        renderer.submit(DrawCommand::DebugBox {
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
        });
        assert_eq!(renderer.quad_count(), 4);
    }

    #[test]
    fn sprite_draws_body_and_eye() {
        let mut renderer = QuadRenderer::new(Playfield::default());
        renderer.submit(DrawCommand::Sprite {
            frame: FrameRect {
                x: 64,
                y: 0,
                width: 32,
                height: 32,
            },
            dest: Rect::new(10.0, 10.0, 64.0, 64.0),
            flip_x: true,
            action: Some(CharacterAction::Run),
        });
        assert_eq!(renderer.quad_count(), 2);
    }

    #[test]
    fn text_and_game_over_become_labels() {
        let mut renderer = QuadRenderer::new(Playfield::default());
        renderer.submit(DrawCommand::Text {
            text: "hello".to_string(),
            x: 288.0,
            y: 100.0,
        });
        renderer.submit(DrawCommand::GameOver);
        assert_eq!(renderer.texts.len(), 3);
        assert_eq!(renderer.texts[0].text, "hello");
        assert_eq!(renderer.quad_count(), 1);
    }

    #[test]
    fn parallax_layer_covers_the_width() {
        let mut renderer = QuadRenderer::new(Playfield::default());
        renderer.submit(DrawCommand::BackgroundLayer {
            index: 1,
            asset: "hills".to_string(),
            scroll: 50.0,
        });
        // 576 / 96 = 6 pillars, plus one partially scrolled in.
        assert_eq!(renderer.quad_count(), 7);
    }

    #[test]
    fn palette_color_is_stable() {
        assert_eq!(palette_color("sky"), palette_color("sky"));
    }
}
