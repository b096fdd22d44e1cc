//! Backend-agnostic depth-layer demo: three overlapping quads at different
//! camera distances; only the nearest surface survives the manual depth test.
//! Run: cargo run -p debug --bin depth_layers_window

use std::collections::HashMap;

use glint_renderer::glam::vec4;
use glint_renderer::Camera3D;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use render_api::{ExtractedMesh, ExtractedMeshes, MeshVertex, RenderBackendWindow};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// Axis-aligned quad at world depth `z`, offset in x, with a flat rgba tint.
fn quad(z: f32, x_offset: f32, tint: [u8; 4]) -> ExtractedMesh {
    let v = |x: f32, y: f32, u: f32, t: f32| MeshVertex {
        pos: [x + x_offset, y, z, 1.0],
        normal: [0.0, 0.0, 1.0, 0.0],
        uv: [u, t, 0.0, 0.0],
    };
    ExtractedMesh {
        entity_id: 0,
        vertices: vec![
            v(-1.5, -1.5, 0.0, 1.0),
            v(1.5, -1.5, 1.0, 1.0),
            v(1.5, 1.5, 1.0, 0.0),
            v(-1.5, 1.5, 0.0, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        transform: IDENTITY,
        albedo: Some(render_api::TextureData {
            data: tint.to_vec(),
            width: 1,
            height: 1,
        }),
        visible: true,
    }
}

struct App {
    window: Option<winit::window::Window>,
    backend: Option<Box<dyn RenderBackendWindow>>,
    size: (u32, u32),
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            backend: None,
            size: (800, 600),
        }
    }

    fn build_scene(&self) -> ExtractedMeshes {
        let mut meshes = HashMap::new();
        // Inserted nearest-first so draw order alone cannot produce the
        // correct image; the depth test has to.
        for (id, mesh) in [
            quad(-4.0, -1.0, [230, 60, 60, 255]),
            quad(-8.0, 0.0, [60, 200, 80, 255]),
            quad(-12.0, 1.0, [70, 90, 230, 255]),
        ]
        .into_iter()
        .enumerate()
        {
            let id = id as u64 + 1;
            meshes.insert(id, ExtractedMesh { entity_id: id, ..mesh });
        }
        ExtractedMeshes { meshes }
    }

    fn build_camera(&self) -> Camera3D {
        let (w, h) = self.size;
        let aspect = if h > 0 { w as f32 / h as f32 } else { 1.0 };
        let mut cam = Camera3D::new(
            vec4(0.0, 0.0, 0.0, 1.0),
            vec4(0.0, 0.0, -1.0, 0.0),
            std::f32::consts::FRAC_PI_4,
        );
        cam.refresh_view_proj(std::f32::consts::FRAC_PI_4, aspect);
        cam
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = winit::window::WindowAttributes::default()
            .with_title("Glint depth layers")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600));
        let window = event_loop.create_window(attrs).expect("create window");
        let phys = window.inner_size();
        self.size = (phys.width, phys.height);
        self.window = Some(window);
        if let Some(ref w) = self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical) => {
                self.size = (physical.width.max(1), physical.height.max(1));
                if let Some(ref w) = self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let window = match &self.window {
                    Some(w) => w,
                    None => return,
                };
                self.size = {
                    let phys = window.inner_size();
                    (phys.width.max(1), phys.height.max(1))
                };
                if self.backend.is_none() {
                    match glint_bridge::GlintWindowBackend::from_window(window) {
                        Ok(backend) => self.backend = Some(backend),
                        Err(e) => {
                            eprintln!("GlintWindowBackend::from_window failed: {e}");
                            return;
                        }
                    }
                }
                let (raw_window, raw_display) =
                    match (window.window_handle(), window.display_handle()) {
                        (Ok(wh), Ok(dh)) => (wh.as_raw(), dh.as_raw()),
                        _ => return,
                    };
                let extracted = self.build_scene();
                let view = self.build_camera().to_view(self.size);
                let backend = match &mut self.backend {
                    Some(b) => b,
                    None => return,
                };
                backend.prepare(&extracted);
                let _ = backend.render_frame_to_window(&view, raw_window, raw_display);
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let event_loop = winit::event_loop::EventLoop::new().map_err(|e| e.to_string())?;
    let mut app = App::new();
    event_loop.run_app(&mut app).map_err(|e| e.to_string())?;
    Ok(())
}
