pub mod camera;
pub mod gpu_context;
pub mod quad_pipeline;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::{letterbox_viewport, GpuContext, SurfaceFrame, Viewport};
pub use quad_pipeline::QuadPipeline;
pub use vertex::QuadVertex;
