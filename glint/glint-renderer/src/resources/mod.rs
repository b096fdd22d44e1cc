//! Frame resources: linear-depth target, hardware depth buffer, color target.

use wgpu::TextureView;

/// Formats are fixed by the pass contracts: the linear-depth target is a
/// single-channel float color attachment the forward pass reads back, the
/// hardware depth buffer backs the NearestWins policy and the plain
/// pipeline, and the color target is the offscreen scene output the present
/// pass blits from.
pub const LINEAR_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
pub const HW_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct FrameResources {
    pub linear_depth: wgpu::Texture,
    pub hw_depth: wgpu::Texture,
    pub color: wgpu::Texture,
    width: u32,
    height: u32,
}

impl FrameResources {
    /// Reuse `existing` when the size matches, otherwise allocate fresh
    /// textures. Per-frame contents are reset by each pass's load ops.
    pub fn ensure_size(
        device: &wgpu::Device,
        existing: Option<Self>,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err("FrameResources: width and height must be > 0".to_string());
        }
        if let Some(r) = existing {
            if r.width == width && r.height == height {
                return Ok(r);
            }
        }
        log::debug!("allocating frame resources {}x{}", width, height);
        let make = |label: &str, format: wgpu::TextureFormat| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let linear_depth = make("linear_depth", LINEAR_DEPTH_FORMAT);
        let color = make("forward_color", COLOR_FORMAT);
        let hw_depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("hw_depth"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HW_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Ok(Self { linear_depth, hw_depth, color, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn linear_depth_view(&self) -> TextureView {
        self.linear_depth.create_view(&Default::default())
    }
    pub fn hw_depth_view(&self) -> TextureView {
        self.hw_depth.create_view(&Default::default())
    }
    pub fn color_view(&self) -> TextureView {
        self.color.create_view(&Default::default())
    }
}
