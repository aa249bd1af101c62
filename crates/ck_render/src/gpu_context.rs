//! Surface, device and queue for the game window, plus the letterbox
//! viewport that keeps the playfield at an integer pixel scale.

use std::sync::Arc;
use winit::window::Window;

/// Region of the surface the playfield is drawn into, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Physical pixels per playfield pixel.
    pub scale: f32,
}

/// Largest scale at which `playfield` fits inside `surface`, centered.
///
/// Whole-number scales are preferred so pixel art stays crisp; a surface
/// smaller than the playfield falls back to a fractional shrink.
pub fn letterbox_viewport(surface: (u32, u32), playfield: (f32, f32)) -> Viewport {
    let (sw, sh) = (surface.0 as f32, surface.1 as f32);
    let (pw, ph) = (playfield.0.max(1.0), playfield.1.max(1.0));
    let fit = (sw / pw).min(sh / ph);
    let scale = if fit >= 1.0 { fit.floor() } else { fit };
    let width = pw * scale;
    let height = ph * scale;
    Viewport {
        x: ((sw - width) / 2.0).floor(),
        y: ((sh - height) / 2.0).floor(),
        width,
        height,
        scale,
    }
}

/// Acquired swapchain image for one frame.
pub struct SurfaceFrame {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl SurfaceFrame {
    pub fn present(self) {
        self.output.present();
    }
}

pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    pub size: (u32, u32),
}

impl GpuContext {
    /// Startup cannot continue without a surface and device, so failures here panic.
    pub fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .expect("Failed to create window surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("No GPU adapter can present to the game window");
        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Canvas Knight Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            },
            None,
        ))
        .expect("Failed to create GPU device");

        let caps = surface.get_capabilities(&adapter);
        let surface_format = preferred_format(&caps.formats);
        // Fifo paces presentation to the display refresh, which drives the tick.
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("Surface configured: {:?} {}x{}", surface_format, config.width, config.height);

        Self {
            surface,
            device,
            queue,
            config,
            surface_format,
            size: (size.width, size.height),
        }
    }

    pub fn is_minimized(&self) -> bool {
        self.size.0 == 0 || self.size.1 == 0
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            self.size = (0, 0);
            return;
        }
        self.size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn playfield_viewport(&self, playfield_width: f32, playfield_height: f32) -> Viewport {
        letterbox_viewport(self.size, (playfield_width, playfield_height))
    }

    /// `None` skips this frame; a lost or outdated surface is reconfigured first.
    pub fn acquire_frame(&self) -> Option<SurfaceFrame> {
        let output = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return None;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, dropping frame");
                return None;
            }
            Err(err) => {
                log::warn!("Surface error: {:?}", err);
                return None;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Some(SurfaceFrame { output, view })
    }
}

fn preferred_format(formats: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
    formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_fills_the_surface() {
        let vp = letterbox_viewport((1152, 648), (576.0, 324.0));
        assert_eq!(vp.scale, 2.0);
        assert_eq!((vp.x, vp.y, vp.width, vp.height), (0.0, 0.0, 1152.0, 648.0));
    }

    #[test]
    fn wide_surface_is_pillarboxed_at_integer_scale() {
        let vp = letterbox_viewport((1920, 1080), (576.0, 324.0));
        assert_eq!(vp.scale, 3.0);
        assert_eq!(vp.width, 1728.0);
        assert_eq!(vp.x, 96.0);
        assert_eq!(vp.y, 54.0);
    }

    #[test]
    fn small_surface_shrinks_fractionally() {
        let vp = letterbox_viewport((288, 400), (576.0, 324.0));
        assert_eq!(vp.scale, 0.5);
        assert_eq!(vp.height, 162.0);
        assert_eq!(vp.y, 119.0);
    }

    #[test]
    fn srgb_format_is_preferred() {
        let formats = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        assert_eq!(preferred_format(&formats), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(preferred_format(&[]), wgpu::TextureFormat::Bgra8UnormSrgb);
    }
}
