#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl QuadVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(QuadVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(QuadVertex, color) as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Append an axis-aligned quad (two triangles) to a CPU-side mesh.
pub fn push_quad(
    vertices: &mut Vec<QuadVertex>,
    indices: &mut Vec<u32>,
    rect: [f32; 4],
    color: [f32; 4],
) {
    let [x, y, w, h] = rect;
    let base = vertices.len() as u32;
    for position in [[x, y], [x + w, y], [x + w, y + h], [x, y + h]] {
        vertices.push(QuadVertex { position, color });
    }
    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_quad_emits_four_vertices_six_indices() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        push_quad(&mut vertices, &mut indices, [0.0, 0.0, 10.0, 5.0], [1.0; 4]);
        push_quad(&mut vertices, &mut indices, [1.0, 1.0, 1.0, 1.0], [1.0; 4]);
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 12);
        assert_eq!(&indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(vertices[2].position, [10.0, 5.0]);
    }
}
