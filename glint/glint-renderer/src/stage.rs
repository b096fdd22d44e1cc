//! CPU reference of the shader stage logic.
//!
//! Each function here mirrors one stage of the WGSL in `shaders/`, formula
//! by formula (same operand order), so the strict `<` comparison between
//! the prepass and the forward pass can be reasoned about and tested on the
//! CPU. The bridge also uses [`indices_in_bounds`] to reject meshes before
//! a draw is ever issued — an out-of-range pull on the GPU is undefined.

use glam::{Mat4, Vec4};
use render_api::MeshVertex;

/// Vertex pulling: resolve the slot `i` of the current draw's index stream
/// into the vertex it references. Pure lookup; callers must have validated
/// the index stream (see [`indices_in_bounds`]).
pub fn pull_vertex(vertices: &[MeshVertex], indices: &[u32], slot: usize) -> MeshVertex {
    vertices[indices[slot] as usize]
}

/// True if every index references a vertex inside the pool.
pub fn indices_in_bounds(indices: &[u32], vertex_count: usize) -> bool {
    indices.iter().all(|&i| (i as usize) < vertex_count)
}

/// Object/camera transform: world position and pre-adapter clip position.
pub fn transform_vertex(transform: Mat4, view_proj: Mat4, pos: Vec4) -> (Vec4, Vec4) {
    let global_pos = transform * pos;
    let clip_pre = view_proj * global_pos;
    (global_pos, clip_pre)
}

/// Coordinate convention adapter: world +Y up vs clip +Y down. Applied
/// exactly once per vertex emission path, immediately before emission.
pub fn flip_clip_y(clip_pre: Vec4) -> Vec4 {
    Vec4::new(clip_pre.x, -clip_pre.y, clip_pre.z, clip_pre.w)
}

/// Euclidean camera distance in world units, the metric both fragment
/// stages share. Matches WGSL `distance(global_pos.xyz, camera.pos.xyz)`.
pub fn linear_depth(global_pos: Vec4, camera_pos: Vec4) -> f32 {
    global_pos.truncate().distance(camera_pos.truncate())
}

/// Manual depth test: accept only strictly nearer fragments. A tie is the
/// surface that produced the reference value; redrawing it must not pass.
pub fn manual_depth_accepts(d_self: f32, d_ref: f32) -> bool {
    d_self < d_ref
}

/// Prepass resolve for one pixel under the nearest-wins policy (hardware
/// depth test enabled on the prepass target): the smallest distance among
/// all fragments covering the pixel.
pub fn resolve_nearest(fragment_depths: &[f32], clear_distance: f32) -> f32 {
    fragment_depths
        .iter()
        .fold(clear_distance, |acc, &d| if d < acc { d } else { acc })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec4;

    fn vert(x: f32, y: f32, z: f32) -> MeshVertex {
        MeshVertex {
            pos: [x, y, z, 1.0],
            normal: [0.0, 0.0, 1.0, 0.0],
            uv: [0.0; 4],
        }
    }

    #[test]
    fn pulling_resolves_through_index_stream() {
        let vertices = [vert(0.0, 0.0, 0.0), vert(1.0, 0.0, 0.0), vert(0.0, 1.0, 0.0)];
        let indices = [2u32, 0, 1];
        assert_eq!(pull_vertex(&vertices, &indices, 0), vertices[2]);
        assert_eq!(pull_vertex(&vertices, &indices, 1), vertices[0]);
        assert_eq!(pull_vertex(&vertices, &indices, 2), vertices[1]);
    }

    #[test]
    fn bounds_check_catches_out_of_range_index() {
        assert!(indices_in_bounds(&[0, 1, 2], 3));
        assert!(!indices_in_bounds(&[0, 3, 2], 3));
        assert!(indices_in_bounds(&[], 0));
    }

    #[test]
    fn flip_is_involutive() {
        let v = vec4(0.3, -1.7, 4.2, 1.0);
        assert_eq!(flip_clip_y(flip_clip_y(v)), v);
        assert_eq!(flip_clip_y(v).y, 1.7);
        assert_eq!(flip_clip_y(v).x, v.x);
        assert_eq!(flip_clip_y(v).z, v.z);
        assert_eq!(flip_clip_y(v).w, v.w);
    }

    #[test]
    fn identity_transforms_pass_world_position_through() {
        let pos = vec4(0.0, 0.0, 5.0, 1.0);
        let (global, clip_pre) = transform_vertex(Mat4::IDENTITY, Mat4::IDENTITY, pos);
        assert_eq!(global, pos);
        assert_eq!(clip_pre, pos);
        let clip = flip_clip_y(clip_pre);
        assert_eq!(clip.y, -clip_pre.y);
        assert_eq!((clip.x, clip.z, clip.w), (clip_pre.x, clip_pre.z, clip_pre.w));
    }

    #[test]
    fn object_then_camera_transform_order() {
        let translate = Mat4::from_translation(glam::vec3(1.0, 0.0, 0.0));
        let scale = Mat4::from_scale(glam::vec3(2.0, 2.0, 2.0));
        let (global, clip_pre) =
            transform_vertex(translate, scale, vec4(0.0, 0.0, 0.0, 1.0));
        // Object transform first, then view-proj.
        assert_eq!(global, vec4(1.0, 0.0, 0.0, 1.0));
        assert_eq!(clip_pre, vec4(2.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn distance_is_reproducible_across_stages() {
        // Prepass and forward pass must agree bit-for-bit on the same
        // inputs; both call this exact function on the GPU side too.
        let global = vec4(1.25, -3.5, 9.75, 1.0);
        let cam = vec4(0.5, 0.25, -1.5, 1.0);
        assert_eq!(
            linear_depth(global, cam).to_bits(),
            linear_depth(global, cam).to_bits()
        );
    }

    #[test]
    fn manual_test_is_strict_less_than() {
        assert!(manual_depth_accepts(9.999, 10.0));
        assert!(!manual_depth_accepts(10.0, 10.0));
        assert!(!manual_depth_accepts(10.001, 10.0));
    }

    #[test]
    fn nearest_wins_resolve_then_manual_test() {
        // Two overlapping surfaces at distances 3 and 7: the prepass under
        // NearestWins stores 3. Anything strictly nearer than the stored
        // value passes; the far surface never does, and an exact tie (the
        // surface that wrote the reference) is rejected by the tie rule.
        let stored = resolve_nearest(&[7.0, 3.0], f32::MAX);
        assert_eq!(stored, 3.0);
        assert!(manual_depth_accepts(2.999, stored));
        assert!(!manual_depth_accepts(3.0, stored));
        assert!(!manual_depth_accepts(7.0, stored));
    }

    #[test]
    fn clear_distance_accepts_first_surface() {
        let cleared = resolve_nearest(&[], f32::MAX);
        assert!(manual_depth_accepts(999.0, cleared));
    }
}
