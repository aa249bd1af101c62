//! Per-frame draw driver and the draw-call contract it speaks.
//!
//! `RenderLoop` knows what to draw but not how: every visual is emitted as a
//! [`DrawCommand`] through the [`Renderer`] trait, implemented by the quad
//! mesh backend and by a recording double in tests.

use ck_core::animation::FrameRect;
use ck_core::geometry::Rect;

use crate::controller::CharacterAction;
use crate::platform::PlatformKind;
use crate::session::{GameEvent, GameSession, Phase};
use crate::sprites::{AnimationRegistry, PLAYER_SHEET};

pub const CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.08, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: [f32; 4],
    },
    /// Full-playfield background layer, shifted by `scroll` pixels.
    BackgroundLayer {
        index: usize,
        asset: String,
        scroll: f32,
    },
    /// Solid horizontal band, used by screens without level backgrounds.
    Band {
        rect: Rect,
        color: [f32; 4],
    },
    Platform {
        rect: Rect,
        variant: String,
    },
    /// Outline of a collision box, only emitted in platform debug mode.
    DebugBox {
        rect: Rect,
    },
    Decor {
        x: f32,
        y: f32,
        tile: String,
    },
    Sprite {
        frame: FrameRect,
        dest: Rect,
        flip_x: bool,
        action: Option<CharacterAction>,
    },
    GameOver,
    /// Text centered horizontally on `x`, baseline near `y`.
    Text {
        text: String,
        x: f32,
        y: f32,
    },
}

pub trait Renderer {
    fn submit(&mut self, command: DrawCommand);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Finished,
}

pub struct RenderLoop {
    pub sprites: AnimationRegistry,
    /// Also draw invisible platforms and the character collision box.
    pub show_platform_debug: bool,
}

impl RenderLoop {
    pub fn new(sprites: AnimationRegistry) -> Self {
        Self {
            sprites,
            show_platform_debug: false,
        }
    }

    /// Clear, draw the current state, then run `steps` ticks.
    pub fn frame(
        &mut self,
        session: &mut GameSession,
        renderer: &mut dyn Renderer,
        steps: u32,
    ) -> FrameOutcome {
        if session.phase() == Phase::Complete {
            return FrameOutcome::Finished;
        }

        renderer.submit(DrawCommand::Clear { color: CLEAR_COLOR });
        self.draw_level(session, renderer);
        self.draw_character(session, renderer);
        if session.controller.is_dead() {
            renderer.submit(DrawCommand::GameOver);
        }

        for _ in 0..steps {
            let events = session.tick();
            if events.contains(&GameEvent::Finished) {
                return FrameOutcome::Finished;
            }
        }
        FrameOutcome::Continue
    }

    fn draw_level(&self, session: &GameSession, renderer: &mut dyn Renderer) {
        let camera_x = session.controller.position.x;
        if let Some(level) = session.sequencer.current_level() {
            for (index, layer) in level.background.layers.iter().enumerate() {
                renderer.submit(DrawCommand::BackgroundLayer {
                    index,
                    asset: layer.asset.clone(),
                    scroll: camera_x * layer.parallax,
                });
            }
        }

        for platform in session.sequencer.platforms().all() {
            match &platform.kind {
                PlatformKind::Visible(variant) => renderer.submit(DrawCommand::Platform {
                    rect: platform.rect,
                    variant: variant.clone(),
                }),
                PlatformKind::Invisible if self.show_platform_debug => {
                    renderer.submit(DrawCommand::DebugBox {
                        rect: platform.rect,
                    })
                }
                PlatformKind::Invisible => {}
            }
        }

        if let Some(level) = session.sequencer.current_level() {
            for decor in &level.decor {
                renderer.submit(DrawCommand::Decor {
                    x: decor.x,
                    y: decor.y,
                    tile: decor.tile.clone(),
                });
            }
        }
    }

    fn draw_character(&mut self, session: &GameSession, renderer: &mut dyn Renderer) {
        let view = session.character_view();
        let config = &session.controller.config;
        let Some(frames) = self.sprites.clip(PLAYER_SHEET, view.action.clip_name()) else {
            return;
        };
        let Some(frame) = view
            .frame_phase(frames.len())
            .and_then(|phase| frames.get(phase).copied())
        else {
            return;
        };

        renderer.submit(DrawCommand::Sprite {
            frame,
            dest: Rect::new(
                view.position.x,
                view.position.y,
                config.draw_width(),
                config.height * config.render_scale,
            ),
            flip_x: view.facing_left,
            action: Some(view.action),
        });

        if self.show_platform_debug {
            let (left, right) = session.controller.collision_span();
            let bottom = session.controller.collision_bottom();
            renderer.submit(DrawCommand::DebugBox {
                rect: Rect::new(left, view.position.y, right - left, bottom - view.position.y),
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::level::{default_levels, Background, LevelDef, PlatformDef};
    use ck_core::input::Action;

    #[derive(Default)]
    pub(crate) struct RecordingRenderer {
        pub commands: Vec<DrawCommand>,
    }

    impl Renderer for RecordingRenderer {
        fn submit(&mut self, command: DrawCommand) {
            self.commands.push(command);
        }
    }

    fn session() -> GameSession {
        GameSession::new(&GameConfig::default(), default_levels())
    }

    #[test]
    fn frame_clears_first_then_draws_then_ticks() {
        let mut session = session();
        let mut render_loop = RenderLoop::new(AnimationRegistry::with_defaults());
        let mut renderer = RecordingRenderer::default();

        let outcome = render_loop.frame(&mut session, &mut renderer, 1);
        assert_eq!(outcome, FrameOutcome::Continue);
        assert_eq!(renderer.commands[0], DrawCommand::Clear { color: CLEAR_COLOR });
        assert_eq!(session.global_tick, 1);

        let layers = renderer
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::BackgroundLayer { .. }))
            .count();
        assert_eq!(layers, 3);
        // The character was drawn at its pre-tick position.
        assert!(renderer.commands.iter().any(|c| matches!(
            c,
            DrawCommand::Sprite { dest, .. } if dest.y == 0.0 && dest.width == 64.0
        )));
    }

    #[test]
    fn invisible_platforms_only_drawn_in_debug_mode() {
        let mut session = session();
        let mut render_loop = RenderLoop::new(AnimationRegistry::with_defaults());

        let mut renderer = RecordingRenderer::default();
        render_loop.frame(&mut session, &mut renderer, 0);
        let visible = renderer
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Platform { .. }))
            .count();
        assert_eq!(visible, 4);
        assert!(!renderer
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::DebugBox { .. })));

        render_loop.show_platform_debug = true;
        let mut renderer = RecordingRenderer::default();
        render_loop.frame(&mut session, &mut renderer, 0);
        let debug_boxes = renderer
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DebugBox { .. }))
            .count();
        // One invisible platform plus the character box.
        assert_eq!(debug_boxes, 2);
    }

    #[test]
    fn missing_clip_skips_character_draw() {
        let mut session = session();
        let mut render_loop = RenderLoop::new(AnimationRegistry::new());
        let mut renderer = RecordingRenderer::default();

        let outcome = render_loop.frame(&mut session, &mut renderer, 2);
        assert_eq!(outcome, FrameOutcome::Continue);
        assert!(!renderer
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Sprite { .. })));
        assert_eq!(session.global_tick, 2);
    }

    #[test]
    fn finishing_the_last_level_reports_finished() {
        let level = LevelDef {
            level_id: "last".to_string(),
            background: Background::default(),
            platforms: vec![PlatformDef {
                x: 0.0,
                y: 300.0,
                width: 640.0,
                height: 24.0,
                variant: None,
            }],
            decor: Vec::new(),
        };
        let mut session = GameSession::new(&GameConfig::default(), vec![level]);
        session.controller.position.x = 575.0;
        session.input.press(Action::MoveRight);

        let mut render_loop = RenderLoop::new(AnimationRegistry::with_defaults());
        let mut renderer = RecordingRenderer::default();
        assert_eq!(
            render_loop.frame(&mut session, &mut renderer, 1),
            FrameOutcome::Finished
        );

        let mut renderer = RecordingRenderer::default();
        assert_eq!(
            render_loop.frame(&mut session, &mut renderer, 1),
            FrameOutcome::Finished
        );
        assert!(renderer.commands.is_empty());
    }

    #[test]
    fn dead_character_gets_game_over_overlay() {
        let mut session = session();
        session.controller.action = CharacterAction::Death;
        let mut render_loop = RenderLoop::new(AnimationRegistry::with_defaults());
        let mut renderer = RecordingRenderer::default();
        render_loop.frame(&mut session, &mut renderer, 0);
        assert_eq!(renderer.commands.last(), Some(&DrawCommand::GameOver));
    }
}
