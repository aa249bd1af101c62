use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera over a fixed-size playfield in canvas coordinates
/// (origin top-left, y down). `position` is the top-left corner in world space.
pub struct Camera2D {
    pub position: Vec2,
    pub playfield: (f32, f32),
}

impl Camera2D {
    pub fn new(playfield_width: f32, playfield_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            playfield: (playfield_width, playfield_height),
        }
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let left = self.position.x;
        let top = self.position.y;
        // Swapping bottom/top flips y so larger y maps lower on screen.
        let proj = Mat4::orthographic_rh(
            left,
            left + self.playfield.0,
            top + self.playfield.1,
            top,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}
