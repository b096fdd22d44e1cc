//! Camera: per-draw push-constant payload and a position/direction helper.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};
use render_api::ExtractedView;

/// Per-draw camera payload, delivered as a 96-byte push constant to every
/// pipeline (vertex and fragment stages). Never buffer-bound: it changes
/// every draw and must not pay descriptor-update overhead.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraState {
    /// Camera position in world space (w = 1).
    pub pos: Vec4,
    /// Unit look direction (w = 0).
    pub look_dir: Vec4,
    /// World -> clip.
    pub view_proj: Mat4,
}

impl CameraState {
    pub const SIZE: u32 = std::mem::size_of::<CameraState>() as u32;
}

impl From<&ExtractedView> for CameraState {
    fn from(view: &ExtractedView) -> Self {
        Self {
            pos: Vec4::from_array(view.camera_pos),
            look_dir: Vec4::from_array(view.camera_dir),
            view_proj: Mat4::from_cols_array(&view.view_proj),
        }
    }
}

/// Positionable perspective camera, +Y up, near 1.0, far 1000.0.
#[derive(Clone, Copy, Debug)]
pub struct Camera3D {
    pub pos: Vec4,
    pub look_dir: Vec4,
    pub view_proj: Mat4,
}

impl Camera3D {
    pub fn new(pos: Vec4, look_dir: Vec4, fov: f32) -> Self {
        let mut cam = Self { pos, look_dir, view_proj: Mat4::IDENTITY };
        cam.refresh_view_proj(fov, 1.0);
        cam
    }

    pub fn refresh_view_proj(&mut self, fov: f32, aspect_ratio: f32) {
        self.view_proj = Mat4::perspective_rh(fov, aspect_ratio, 1.0, 1000.0)
            * Mat4::look_at_rh(
                self.pos.xyz(),
                self.pos.xyz() + self.look_dir.xyz(),
                Vec3::Y,
            );
    }

    pub fn to_view(&self, viewport_size: (u32, u32)) -> ExtractedView {
        ExtractedView {
            camera_pos: self.pos.to_array(),
            camera_dir: self.look_dir.to_array(),
            view_proj: self.view_proj.to_cols_array(),
            viewport_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constant_payload_is_96_bytes() {
        assert_eq!(CameraState::SIZE, 96);
    }

    #[test]
    fn view_round_trips_through_extracted_view() {
        let cam = Camera3D::new(
            glam::vec4(1.0, 2.0, 3.0, 1.0),
            glam::vec4(0.0, 0.0, -1.0, 0.0),
            std::f32::consts::FRAC_PI_2,
        );
        let state = CameraState::from(&cam.to_view((640, 480)));
        assert_eq!(state.pos, cam.pos);
        assert_eq!(state.view_proj, cam.view_proj);
    }
}
