use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Integer upscale applied to the logical playfield size.
    pub pixel_scale: u32,
}

impl PlatformConfig {
    /// Window sized to show a `width` x `height` playfield at `pixel_scale`.
    pub fn for_playfield(title: &str, width: u32, height: u32, pixel_scale: u32) -> Self {
        Self {
            title: title.to_string(),
            width,
            height,
            pixel_scale: pixel_scale.max(1),
        }
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.width * self.pixel_scale, self.height * self.pixel_scale)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::for_playfield("Canvas Knight", 576, 324, 2)
    }
}

pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let (width, height) = config.window_size();
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(width, height))
        .with_min_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = event_loop
        .create_window(attrs)
        .expect("Failed to create window");
    log::debug!("Window attributes applied: {}x{}", width, height);
    Arc::new(window)
}
