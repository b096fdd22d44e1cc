//! Data types for extraction from the host engine into the render world.
//! The host fills these each frame; the backend uploads and draws them.

use std::collections::HashMap;

/// One vertex in the shared vertex pool. Layout matches the storage-buffer
/// struct the shaders pull from: three 16-byte vectors, 48 bytes total.
/// `pos.w` must be 1 for points; `uv` uses xy only.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 4],
    pub normal: [f32; 4],
    pub uv: [f32; 4],
}

/// Raw RGBA8 texture payload for a mesh albedo.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Per-mesh instance data extracted from the main world.
#[derive(Clone, Debug)]
pub struct ExtractedMesh {
    /// Host-defined entity or instance id.
    pub entity_id: u64,
    /// Shared vertex pool for this mesh, pulled by index in the shader.
    pub vertices: Vec<MeshVertex>,
    /// Index stream; every entry must be < vertices.len(). The backend
    /// rejects the mesh otherwise (an out-of-range pull is UB on the GPU).
    pub indices: Vec<u32>,
    /// World transform: column-major 4x4 matrix (WGSL/wgpu convention).
    /// Index [col*4+row]; e.g. m[0..4] is the first column.
    pub transform: [f32; 16],
    /// Albedo texture; backend substitutes 1x1 white when None.
    pub albedo: Option<TextureData>,
    /// Whether this instance is visible.
    pub visible: bool,
}

/// All extracted meshes for the current frame.
#[derive(Default, Debug)]
pub struct ExtractedMeshes {
    pub meshes: HashMap<u64, ExtractedMesh>,
}

/// View/camera data for the current frame. `pos`/`look_dir` are carried as
/// 4-component vectors (w unused) so the payload maps 1:1 onto the
/// push-constant block the shader stages consume.
#[derive(Clone, Debug)]
pub struct ExtractedView {
    pub camera_pos: [f32; 4],
    pub camera_dir: [f32; 4],
    /// World -> clip, column-major.
    pub view_proj: [f32; 16],
    pub viewport_size: (u32, u32),
}

impl Default for ExtractedView {
    fn default() -> Self {
        Self {
            camera_pos: [0.0, 0.0, 0.0, 1.0],
            camera_dir: [0.0, 0.0, -1.0, 0.0],
            view_proj: [
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
            viewport_size: (800, 600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_48_bytes() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 48);
    }

    #[test]
    fn default_view_is_identity() {
        let view = ExtractedView::default();
        for col in 0..4 {
            for row in 0..4 {
                let expect = if col == row { 1.0 } else { 0.0 };
                assert_eq!(view.view_proj[col * 4 + row], expect);
            }
        }
    }
}
