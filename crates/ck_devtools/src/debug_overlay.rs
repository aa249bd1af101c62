//! egui debug window drawn over the playfield.
//!
//! egui needs its own render pass with a `'static` lifetime, so a frame goes
//! through `prepare()` (UI logic), `upload()` (buffers and textures, borrows
//! the encoder), `paint()` into a pass created with `forget_lifetime()`, and
//! finally `cleanup()`.
//!
//! The debug window only runs while visible (F3), but events are always
//! forwarded so the overlay can claim clicks when it is shown. Screen labels
//! (game text such as the end-screen lines) are painted every frame.

use ck_core::time::TimeState;
use winit::window::Window;

/// Controller and session state mirrored into the overlay each frame.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub level_label: String,
    pub global_tick: u64,
    pub action_label: String,
    pub position: (f32, f32),
    pub velocity_y: f32,
    pub facing_left: bool,
    pub on_ground: bool,
    pub jump_cooldown: u32,
    pub roll_cooldown: u32,
    pub quad_count: u32,
    pub paused: bool,
    pub show_platform_debug: bool,
}

/// Centered text in egui points, drawn on the foreground layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance one tick while paused.
    pub single_step: bool,
    pub toggle_platform_debug: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: &OverlayStats,
        labels: &[ScreenLabel],
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !labels.is_empty() {
                let painter = ctx.layer_painter(egui::LayerId::new(
                    egui::Order::Foreground,
                    egui::Id::new("screen_labels"),
                ));
                for label in labels {
                    painter.text(
                        egui::pos2(label.x, label.y),
                        egui::Align2::CENTER_CENTER,
                        &label.text,
                        egui::FontId::proportional(label.size),
                        egui::Color32::WHITE,
                    );
                }
            }
            if self.visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                        ui.label(format!(
                            "Steps this frame: {} (total {})",
                            time.steps_this_frame, time.total_ticks
                        ));
                        ui.label(format!("Quads: {}", stats.quad_count));

                        ui.separator();
                        ui.label(format!("Level: {}", stats.level_label));
                        ui.label(format!("Tick: {}", stats.global_tick));
                        ui.label(format!(
                            "Action: {} ({})",
                            stats.action_label,
                            if stats.facing_left { "left" } else { "right" }
                        ));
                        ui.label(format!(
                            "Position: ({:.1}, {:.1})",
                            stats.position.0, stats.position.1
                        ));
                        ui.label(format!("Velocity Y: {:.2}", stats.velocity_y));
                        ui.label(format!("On ground: {}", stats.on_ground));
                        ui.label(format!(
                            "Cooldowns: jump {} / roll {}",
                            stats.jump_cooldown, stats.roll_cooldown
                        ));

                        ui.separator();
                        ui.horizontal(|ui| {
                            let pause_label = if stats.paused { "Resume" } else { "Pause" };
                            if ui.button(pause_label).clicked() {
                                actions.toggle_pause = true;
                            }
                            if stats.paused && ui.button("Step").clicked() {
                                actions.single_step = true;
                            }
                        });
                        let platforms_label = if stats.show_platform_debug {
                            "Hide platform boxes"
                        } else {
                            "Show platform boxes"
                        };
                        if ui.button(platforms_label).clicked() {
                            actions.toggle_platform_debug = true;
                        }
                        if stats.paused {
                            ui.label("\u{23f8} PAUSED");
                        }
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
