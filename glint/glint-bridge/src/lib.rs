//! Glint bridge: implements render_api::RenderBackend using glint-renderer.

mod plugin;
mod window_backend;

pub use plugin::GlintPlugin;
pub use window_backend::GlintWindowBackend;
