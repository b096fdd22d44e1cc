//! Textured mesh viewer: load an OBJ and an albedo image, render with Glint
//! (prepare + render_frame_to_window).
//! Run: cargo run -p debug --bin textured_mesh -- model.obj [albedo.png]

use std::collections::HashMap;
use std::path::Path;

use glint_renderer::glam::vec4;
use glint_renderer::Camera3D;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use render_api::{ExtractedMesh, ExtractedMeshes, MeshVertex, RenderBackendWindow, TextureData};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

fn load_image_rgba(path: &Path) -> Result<TextureData, String> {
    let img = image::open(path).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    Ok(TextureData {
        data: rgba.into_raw(),
        width: w,
        height: h,
    })
}

fn load_obj_mesh(obj_path: &Path) -> Result<(Vec<MeshVertex>, Vec<u32>), String> {
    let (models, _) = tobj::load_obj(obj_path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| format!("load_obj: {e:?}"))?;
    let mesh = models.into_iter().next().ok_or("No mesh in OBJ")?.mesh;
    let n = mesh.positions.len() / 3;
    let mut vertices = Vec::with_capacity(n);
    for i in 0..n {
        let pos = [
            mesh.positions[i * 3],
            mesh.positions[i * 3 + 1],
            mesh.positions[i * 3 + 2],
            1.0,
        ];
        let normal = if mesh.normals.len() >= (i + 1) * 3 {
            [
                mesh.normals[i * 3],
                mesh.normals[i * 3 + 1],
                mesh.normals[i * 3 + 2],
                0.0,
            ]
        } else {
            [0.0, 0.0, 1.0, 0.0]
        };
        let uv = if mesh.texcoords.len() >= (i + 1) * 2 {
            // OBJ uv origin is bottom-left; textures are sampled top-left.
            [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1], 0.0, 0.0]
        } else {
            [0.0, 0.0, 0.0, 0.0]
        };
        vertices.push(MeshVertex { pos, normal, uv });
    }
    Ok((vertices, mesh.indices))
}

struct App {
    window: Option<winit::window::Window>,
    backend: Option<Box<dyn RenderBackendWindow>>,
    size: (u32, u32),
    mesh: ExtractedMesh,
    angle: f32,
}

impl App {
    fn new(mesh: ExtractedMesh) -> Self {
        Self {
            window: None,
            backend: None,
            size: (900, 700),
            mesh,
            angle: 0.0,
        }
    }

    fn build_camera(&self) -> Camera3D {
        let (w, h) = self.size;
        let aspect = if h > 0 { w as f32 / h as f32 } else { 1.0 };
        // Orbit the model at a fixed radius.
        let radius = 6.0;
        let pos = vec4(radius * self.angle.cos(), 2.0, radius * self.angle.sin(), 1.0);
        let look = vec4(-pos.x, -pos.y, -pos.z, 0.0);
        let mut cam = Camera3D::new(pos, look, std::f32::consts::FRAC_PI_4);
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
            .with_title("Glint textured mesh")
            .with_inner_size(winit::dpi::LogicalSize::new(900, 700));
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
            }
            WindowEvent::RedrawRequested => {
                let window = match &self.window {
                    Some(w) => w,
                    None => return,
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
                self.angle += 0.01;
                let mut meshes = HashMap::new();
                meshes.insert(1u64, self.mesh.clone());
                let extracted = ExtractedMeshes { meshes };
                let view = self.build_camera().to_view(self.size);
                let backend = match &mut self.backend {
                    Some(b) => b,
                    None => return,
                };
                backend.prepare(&extracted);
                let _ = backend.render_frame_to_window(&view, raw_window, raw_display);
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let obj_path = args.next().ok_or("usage: textured_mesh model.obj [albedo.png]")?;
    let (vertices, indices) = load_obj_mesh(Path::new(&obj_path))?;
    let albedo = match args.next() {
        Some(p) => Some(load_image_rgba(Path::new(&p))?),
        None => None,
    };
    let mesh = ExtractedMesh {
        entity_id: 1,
        vertices,
        indices,
        transform: [
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ],
        albedo,
        visible: true,
    };
    let event_loop = winit::event_loop::EventLoop::new().map_err(|e| e.to_string())?;
    let mut app = App::new(mesh);
    event_loop.run_app(&mut app).map_err(|e| e.to_string())?;
    Ok(())
}
