//! Headless smoke loop: prepare + render_frame through the plugin, no window.
//! Run: cargo run -p debug --bin headless_loop

use std::collections::HashMap;

use glint_renderer::glam::vec4;
use glint_renderer::{Camera3D, CameraState};
use render_api::{ExtractedMesh, ExtractedMeshes, MeshVertex, RenderBackend};

fn triangle() -> (Vec<MeshVertex>, Vec<u32>) {
    let v = |x: f32, y: f32, z: f32, u: f32, t: f32| MeshVertex {
        pos: [x, y, z, 1.0],
        normal: [0.0, 0.0, 1.0, 0.0],
        uv: [u, t, 0.0, 0.0],
    };
    (
        vec![
            v(0.0, 0.5, -5.0, 0.5, 0.0),
            v(-0.5, -0.5, -5.0, 0.0, 1.0),
            v(0.5, -0.5, -5.0, 1.0, 1.0),
        ],
        vec![0, 1, 2],
    )
}

async fn run() -> Result<(), String> {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .ok_or("No adapter")?;
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("headless_loop"),
                required_features: wgpu::Features::PUSH_CONSTANTS,
                required_limits: wgpu::Limits {
                    max_push_constant_size: CameraState::SIZE,
                    ..wgpu::Limits::default()
                },
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await
        .map_err(|e| e.to_string())?;

    let mut plugin = glint_bridge::GlintPlugin::new(device, queue)?;

    let (vertices, indices) = triangle();
    let mut meshes = HashMap::new();
    meshes.insert(
        1u64,
        ExtractedMesh {
            entity_id: 1,
            vertices,
            indices,
            transform: identity(),
            albedo: None,
            visible: true,
        },
    );
    let extracted = ExtractedMeshes { meshes };

    let camera = Camera3D::new(
        vec4(0.0, 0.0, 0.0, 1.0),
        vec4(0.0, 0.0, -1.0, 0.0),
        std::f32::consts::FRAC_PI_2,
    );
    for frame in 0..3 {
        plugin.prepare(&extracted);
        plugin.render_frame(&camera.to_view((640, 480)))?;
        println!("frame {frame} submitted");
    }
    Ok(())
}

fn identity() -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ]
}

fn main() -> Result<(), String> {
    env_logger::init();
    pollster::block_on(run())
}
