//! Shared render backend API for Glint.
//! Defines Extract types and the RenderBackend traits so the host drives the
//! renderer with the same code path (prepare + render_frame) on or off screen.

mod backend;
mod extract;

pub use backend::{RenderBackend, RenderBackendWindow};
pub use extract::{ExtractedMesh, ExtractedMeshes, ExtractedView, MeshVertex, TextureData};
pub use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
