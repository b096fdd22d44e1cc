//! Glint plugin: implements RenderBackend for the host.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glint_renderer::{stage, CameraState, GlintConfig, MeshDraw, Renderer};
use render_api::{ExtractedMeshes, ExtractedView, RenderBackend, TextureData};

/// Cached GPU buffers and albedo for one mesh.
struct CachedMesh {
    vertex_buf: Arc<wgpu::Buffer>,
    index_buf: Arc<wgpu::Buffer>,
    index_count: u32,
    vertex_len: usize,
    index_len: usize,
    object_buf: Arc<wgpu::Buffer>,
    /// Uploaded albedo texture, or None when using the white fallback.
    albedo_tex: Option<wgpu::Texture>,
    albedo_view: Arc<wgpu::TextureView>,
    /// Size of the uploaded albedo, to detect texture changes.
    albedo_size: (u32, u32),
}

/// Glint plugin: owns the wgpu device/queue and renderer; implements RenderBackend.
pub struct GlintPlugin {
    renderer: Renderer,
    /// Cache by entity_id. Updated in prepare() from ExtractedMeshes.
    mesh_cache: HashMap<u64, CachedMesh>,
    /// 1x1 white fallback for meshes without an albedo texture.
    white_view: Arc<wgpu::TextureView>,
}

impl GlintPlugin {
    /// Create with wgpu device and queue (default config).
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, GlintConfig::default())
    }

    /// Create with config (pipeline kind, prepass policy, swapchain format).
    pub fn new_with_config(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: GlintConfig,
    ) -> Result<Self, String> {
        let (_white_tex, white_view) = upload_rgba_texture(
            &device,
            &queue,
            &[255u8, 255, 255, 255],
            1,
            1,
            Some("glint_white_albedo"),
        )?;
        let white_view = Arc::new(white_view);
        let renderer = Renderer::new_with_config(device, queue, config)?;
        Ok(Self {
            renderer,
            mesh_cache: HashMap::new(),
            white_view,
        })
    }

    /// Access device/queue if the host needs them (e.g. for swapchain).
    pub fn device(&self) -> &wgpu::Device {
        self.renderer.device()
    }
    pub fn queue(&self) -> &wgpu::Queue {
        self.renderer.queue()
    }
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

impl RenderBackend for GlintPlugin {
    fn prepare(&mut self, extracted: &ExtractedMeshes) {
        let device = self.renderer.device();
        let queue = self.renderer.queue();
        let current_entities: HashSet<u64> = extracted.meshes.keys().copied().collect();
        self.mesh_cache.retain(|k, _| current_entities.contains(k));
        for (&entity_id, mesh) in &extracted.meshes {
            if !mesh.visible || mesh.vertices.is_empty() || mesh.indices.is_empty() {
                continue;
            }
            // An out-of-range index would make the vertex shader pull past
            // the end of the vertex buffer; reject the mesh before it ever
            // reaches a draw call.
            if !stage::indices_in_bounds(&mesh.indices, mesh.vertices.len()) {
                log::warn!(
                    "mesh {entity_id}: index out of range ({} vertices), skipping",
                    mesh.vertices.len()
                );
                continue;
            }
            let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
            let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);
            let vertex_len = vertex_bytes.len();
            let index_len = index_bytes.len();
            let index_count = mesh.indices.len() as u32;
            if let Some(cached) = self.mesh_cache.get_mut(&entity_id) {
                let albedo_size = mesh
                    .albedo
                    .as_ref()
                    .map(|t| (t.width, t.height))
                    .unwrap_or((0, 0));
                if cached.vertex_len == vertex_len
                    && cached.index_len == index_len
                    && cached.albedo_size == albedo_size
                {
                    queue.write_buffer(&cached.vertex_buf, 0, vertex_bytes);
                    queue.write_buffer(&cached.index_buf, 0, index_bytes);
                    queue.write_buffer(&cached.object_buf, 0, bytemuck::cast_slice(&mesh.transform));
                    if let (Some(texture), Some(tex)) = (&cached.albedo_tex, &mesh.albedo) {
                        write_rgba_texture(queue, texture, tex);
                    }
                    continue;
                }
            }
            let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("glint_mesh_vertex"),
                size: vertex_len as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&vertex_buf, 0, vertex_bytes);
            let index_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("glint_mesh_index"),
                size: index_len as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&index_buf, 0, index_bytes);
            let object_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("glint_mesh_object"),
                size: 64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&object_buf, 0, bytemuck::cast_slice(&mesh.transform));
            let (albedo_tex, albedo_view, albedo_size) = match mesh.albedo {
                Some(ref tex) => {
                    match upload_rgba_texture(
                        device,
                        queue,
                        &tex.data,
                        tex.width,
                        tex.height,
                        Some("glint_mesh_albedo"),
                    ) {
                        Ok((texture, view)) => {
                            (Some(texture), Arc::new(view), (tex.width, tex.height))
                        }
                        Err(e) => {
                            log::warn!("mesh {entity_id}: albedo upload failed ({e}), using white");
                            (None, Arc::clone(&self.white_view), (0, 0))
                        }
                    }
                }
                None => (None, Arc::clone(&self.white_view), (0, 0)),
            };
            self.mesh_cache.insert(
                entity_id,
                CachedMesh {
                    vertex_buf: Arc::new(vertex_buf),
                    index_buf: Arc::new(index_buf),
                    index_count,
                    vertex_len,
                    index_len,
                    object_buf: Arc::new(object_buf),
                    albedo_tex,
                    albedo_view,
                    albedo_size,
                },
            );
        }
    }

    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String> {
        self.render_frame_impl(view, None)
    }
}

impl GlintPlugin {
    /// Render one frame and present to swapchain (blit from the offscreen
    /// color target). Use this when displaying in a window.
    pub fn render_frame_to_swapchain(
        &mut self,
        view: &ExtractedView,
        swapchain_view: &wgpu::TextureView,
    ) -> Result<(), String> {
        self.render_frame_impl(view, Some(swapchain_view))
    }

    fn render_frame_impl(
        &mut self,
        view: &ExtractedView,
        swapchain_view: Option<&wgpu::TextureView>,
    ) -> Result<(), String> {
        let draws: Vec<MeshDraw> = self
            .mesh_cache
            .values()
            .map(|c| MeshDraw {
                vertex_buf: Arc::clone(&c.vertex_buf),
                index_buf: Arc::clone(&c.index_buf),
                index_count: c.index_count,
                object_buf: Arc::clone(&c.object_buf),
                albedo_view: Arc::clone(&c.albedo_view),
            })
            .collect();
        let (width, height) = view.viewport_size;
        let camera = CameraState::from(view);
        let frame_cmd = self.renderer.render_frame(width, height, camera, &draws)?;
        match swapchain_view {
            Some(sv) => {
                let device = self.renderer.device();
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("glint_present"),
                });
                self.renderer.encode_present_to(&mut encoder, sv)?;
                let present_cmd = encoder.finish();
                self.renderer.submit([frame_cmd, present_cmd]);
            }
            None => self.renderer.submit([frame_cmd]),
        }
        Ok(())
    }
}

fn upload_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &[u8],
    width: u32,
    height: u32,
    label: Option<&str>,
) -> Result<(wgpu::Texture, wgpu::TextureView), String> {
    if width == 0 || height == 0 {
        return Err("texture must be at least 1x1".to_string());
    }
    let expected = (width as usize) * (height as usize) * 4;
    if data.len() != expected {
        return Err(format!(
            "texture data is {} bytes, expected {expected} for {width}x{height} rgba8",
            data.len()
        ));
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label,
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Ok((texture, view))
}

fn write_rgba_texture(queue: &wgpu::Queue, texture: &wgpu::Texture, tex: &TextureData) {
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &tex.data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * tex.width),
            rows_per_image: Some(tex.height),
        },
        wgpu::Extent3d {
            width: tex.width,
            height: tex.height,
            depth_or_array_layers: 1,
        },
    );
}
