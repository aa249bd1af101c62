//! Canvas Knight -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`:
//!
//!   1. `begin_frame()` + `drain_steps()` -- how many fixed 60 Hz ticks are due
//!   2. hot-reload the levels file at the frame boundary
//!   3. `RenderLoop::frame()` -- draw the current state into the quad mesh, then tick
//!   4. upload the mesh, draw it, composite the egui overlay and screen text
//!
//! Once the last level is cleared the end screen takes over the frame.
//!
//! `ck_game --replay <file>` runs a replay headless, without opening a window.

mod bindings;
mod config;
mod controller;
mod ending;
mod level;
mod platform;
mod quad_renderer;
mod render;
mod replay;
mod sequencer;
mod session;
mod sprites;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use ck_core::time::TimeState;
use ck_devtools::{DebugOverlay, OverlayStats, ScreenLabel};
use ck_platform::window::PlatformConfig;
use ck_render::{Camera2D, GpuContext, QuadPipeline, QuadVertex, Viewport};

use config::{load_config_or_default, GameConfig};
use ending::EndScreen;
use level::{default_levels, load_levels_from_path, load_levels_or_default, FileWatcher, LevelDef};
use quad_renderer::QuadRenderer;
use render::{FrameOutcome, RenderLoop};
use replay::{load_replay_from_path, run_replay};
use session::GameSession;
use sprites::AnimationRegistry;

const CONFIG_PATH: &str = "assets/config/game.json";

struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    quad_pipeline: QuadPipeline,
    debug_overlay: DebugOverlay,

    config: GameConfig,
    session: GameSession,
    render_loop: RenderLoop,
    renderer: QuadRenderer,
    end_screen: Option<EndScreen>,
    levels_watcher: FileWatcher,
    paused: bool,
    single_step_requested: bool,

    // The quad mesh is rebuilt on the CPU each frame and streamed into these
    // buffers. Buffers grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, config: GameConfig) -> Self {
        let gpu = GpuContext::new(window.clone());
        let quad_pipeline = QuadPipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let levels_path = PathBuf::from(&config.levels_path);
        let levels_watcher = FileWatcher::new(levels_path.clone());
        let levels = load_levels_with_fallback(&levels_path);
        let session = GameSession::new(&config, levels);

        let render_loop = RenderLoop::new(load_sprites(&config));
        let renderer = QuadRenderer::new(config.playfield);

        let camera = Camera2D::new(config.playfield.width, config.playfield.height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            quad_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        log::info!(
            "Session ready: {} level(s), starting at level {}",
            session.sequencer.level_count(),
            session.sequencer.current_index()
        );

        Self {
            window,
            gpu,
            time: TimeState::new(),
            quad_pipeline,
            debug_overlay,
            config,
            session,
            render_loop,
            renderer,
            end_screen: None,
            levels_watcher,
            paused: false,
            single_step_requested: false,
            vertex_buffer,
            index_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        }
    }

    fn reload_levels(&mut self, reason: &str) {
        match load_levels_from_path(self.levels_watcher.path()) {
            Ok(file) => {
                log::info!(
                    "Reloaded levels from '{}' ({})",
                    self.levels_watcher.path().display(),
                    reason
                );
                self.session.reload_levels(file.levels);
            }
            Err(err) => {
                log::error!("Levels reload failed ({}), keeping previous: {}", reason, err);
            }
        }
    }

    fn handle_key(&mut self, key_code: KeyCode, pressed: bool, event_loop: &ActiveEventLoop) {
        if pressed {
            match key_code {
                KeyCode::Escape => {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }
                KeyCode::F3 => {
                    self.debug_overlay.toggle();
                    return;
                }
                KeyCode::F4 => {
                    self.toggle_platform_debug();
                    return;
                }
                KeyCode::KeyP => {
                    self.toggle_pause();
                    return;
                }
                _ => {}
            }
        }

        let key_name = format!("{:?}", key_code);
        if let Some(action) = self.config.bindings.action_for(&key_name) {
            if pressed {
                self.session.input.press(action);
            } else {
                self.session.input.release(action);
            }
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        log::info!("Simulation {}", if self.paused { "PAUSED" } else { "RESUMED" });
    }

    fn toggle_platform_debug(&mut self) {
        self.render_loop.show_platform_debug = !self.render_loop.show_platform_debug;
        log::info!(
            "Platform debug: {}",
            if self.render_loop.show_platform_debug { "ON" } else { "OFF" }
        );
    }

    /// Ticks to run this frame after pause and single-step are applied.
    fn effective_steps(&mut self, due: u32) -> u32 {
        if !self.paused {
            return due;
        }
        if self.single_step_requested {
            self.single_step_requested = false;
            return 1;
        }
        0
    }

    fn overlay_stats(&self) -> OverlayStats {
        let controller = &self.session.controller;
        let level_label = match self.session.sequencer.current_level() {
            Some(level) => format!(
                "{} / {} ({}, {} platforms)",
                self.session.sequencer.current_index() + 1,
                self.session.sequencer.level_count(),
                level.level_id,
                self.session.sequencer.platforms().len()
            ),
            None => "none".to_string(),
        };
        OverlayStats {
            level_label,
            global_tick: self.session.global_tick,
            action_label: controller.action.to_string(),
            position: (controller.position.x, controller.position.y),
            velocity_y: controller.velocity_y,
            facing_left: controller.facing_left,
            on_ground: controller.on_ground,
            jump_cooldown: controller.jump_cooldown,
            roll_cooldown: controller.roll_cooldown,
            quad_count: self.renderer.quad_count() as u32,
            paused: self.paused,
            show_platform_debug: self.render_loop.show_platform_debug,
        }
    }

    fn viewport(&self) -> Viewport {
        self.gpu
            .playfield_viewport(self.config.playfield.width, self.config.playfield.height)
    }

    /// Queued text mapped from playfield pixels into the letterboxed viewport, in egui points.
    fn screen_labels(&self, viewport: &Viewport) -> Vec<ScreenLabel> {
        let points_per_pixel = 1.0 / self.window.scale_factor() as f32;
        self.renderer
            .texts
            .iter()
            .map(|text| ScreenLabel {
                text: text.text.clone(),
                x: (viewport.x + text.x * viewport.scale) * points_per_pixel,
                y: (viewport.y + text.y * viewport.scale) * points_per_pixel,
                size: text.size * viewport.scale * points_per_pixel,
            })
            .collect()
    }

    fn upload_mesh(&mut self) {
        let vertex_count = self.renderer.vertices.len();
        let index_count = self.renderer.indices.len();
        self.ensure_mesh_capacity(vertex_count, index_count);
        if vertex_count > 0 {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.renderer.vertices),
            );
        }
        if index_count > 0 {
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(&self.renderer.indices),
            );
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn redraw(&mut self) {
        if self.gpu.is_minimized() {
            return;
        }

        self.time.begin_frame();
        let due = self.time.drain_steps();

        if self.levels_watcher.should_reload() {
            self.reload_levels("file watcher");
        }

        let steps = self.effective_steps(due);
        if let Some(end_screen) = self.end_screen.as_mut() {
            end_screen.frame(
                &mut self.renderer,
                &mut self.render_loop.sprites,
                &self.config.playfield,
                self.time.real_dt_ms(),
            );
        } else {
            let outcome = self
                .render_loop
                .frame(&mut self.session, &mut self.renderer, steps);
            if outcome == FrameOutcome::Finished {
                self.end_screen = Some(EndScreen::new(self.config.ending.clone()));
            }
        }

        self.upload_mesh();

        let Some(frame) = self.gpu.acquire_frame() else {
            return;
        };
        let viewport = self.viewport();

        let stats = self.overlay_stats();
        let labels = self.screen_labels(&viewport);
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.time, &stats, &labels);

        if overlay_actions.toggle_pause {
            self.toggle_pause();
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }
        if overlay_actions.toggle_platform_debug {
            self.toggle_platform_debug();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, a] = self.renderer.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Playfield Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(r),
                            g: f64::from(g),
                            b: f64::from(b),
                            a: f64::from(a),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            let index_count = self.renderer.indices.len() as u32;
            if index_count > 0 {
                render_pass.set_viewport(
                    viewport.x,
                    viewport.y,
                    viewport.width,
                    viewport.height,
                    0.0,
                    1.0,
                );
                render_pass.set_pipeline(&self.quad_pipeline.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

struct App {
    config: GameConfig,
    platform: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        let platform = PlatformConfig::for_playfield(
            &config.title,
            config.playfield.width as u32,
            config.playfield.height as u32,
            config.pixel_scale,
        );
        Self {
            config,
            platform,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = ck_platform::window::create_window(event_loop, &self.platform);
        let (width, height) = self.platform.window_size();
        log::info!("Window created: {}x{}", width, height);
        self.state = Some(EngineState::new(window, self.config.clone()));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                state.gpu.resize(physical_size.width, physical_size.height);
                if !state.gpu.is_minimized() {
                    let viewport = state.viewport();
                    log::info!(
                        "Resized to {}x{}, playfield scale {:.2}",
                        physical_size.width,
                        physical_size.height,
                        viewport.scale
                    );
                }
            }

            WindowEvent::Focused(false) => {
                state.session.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if event.repeat {
                    return;
                }
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    state.handle_key(key_code, pressed, event_loop);
                }
            }

            WindowEvent::RedrawRequested => state.redraw(),

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<QuadVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn load_config() -> GameConfig {
    load_config_or_default(Path::new(CONFIG_PATH)).unwrap_or_else(|err| {
        log::error!("{}; using built-in defaults", err);
        GameConfig::default()
    })
}

fn load_levels_with_fallback(path: &Path) -> Vec<LevelDef> {
    load_levels_or_default(path).unwrap_or_else(|err| {
        log::error!("{}; using built-in levels", err);
        default_levels()
    })
}

fn load_sprites(config: &GameConfig) -> AnimationRegistry {
    let mut sprites = AnimationRegistry::with_defaults();
    for path in [&config.player_sheet_path, &config.ending_sheet_path] {
        if let Err(err) = sprites.load_file_or_keep(Path::new(path)) {
            log::error!("{}; keeping built-in table", err);
        }
    }
    sprites
}

fn replay_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--replay" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

fn run_headless(config: &GameConfig, replay_path: &Path) -> Result<(), String> {
    let replay = load_replay_from_path(replay_path)?;
    let levels = load_levels_with_fallback(Path::new(&config.levels_path));
    let mut session = GameSession::new(config, levels);
    let summary = run_replay(&mut session, &replay)?;

    for (tick, event) in &summary.events {
        log::info!("tick {:>5}: {:?}", tick, event);
    }
    let controller = &session.controller;
    log::info!(
        "Replay finished after {} ticks: level {}, action {}, position ({:.1}, {:.1}), vy {:.1}",
        summary.ticks,
        session.sequencer.current_index(),
        controller.action,
        controller.position.x,
        controller.position.y,
        controller.velocity_y
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Canvas Knight starting...");
    let config = load_config();

    if let Some(replay_path) = replay_path_from_args() {
        if let Err(err) = run_headless(&config, &replay_path) {
            log::error!("{}", err);
            std::process::exit(1);
        }
        return;
    }

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
