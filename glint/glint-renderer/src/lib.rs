//! Glint Renderer: wgpu-based linear-depth prepass + forward pass + present.
//!
//! The manual-depth pipeline renders each frame twice: a prepass writes the
//! Euclidean camera distance of the nearest surface into an R32Float target,
//! then the forward pass re-computes that distance per fragment, loads the
//! stored value at the same texel, and discards anything not strictly nearer.

use std::sync::Arc;

pub mod binding;
pub mod camera;
pub mod config;
pub mod forward;
pub mod graph;
pub mod prepass;
pub mod present;
pub mod resources;
pub mod stage;

pub use camera::{Camera3D, CameraState};
pub use config::{GlintConfig, PipelineKind, PrepassDepthPolicy};
pub use forward::ForwardPass;
pub use graph::{FrameContext, NodeId, RenderGraph, RenderGraphNode, ResourceId, ResourceUsage};
pub use prepass::DepthPrepass;
pub use present::PresentPass;
pub use resources::FrameResources;

pub use glam;

/// One mesh's GPU-resident state, as the bridge hands it over per frame.
pub struct MeshDraw {
    pub vertex_buf: Arc<wgpu::Buffer>,
    pub index_buf: Arc<wgpu::Buffer>,
    pub index_count: u32,
    /// Per-object uniform (column-major 4x4 world transform).
    pub object_buf: Arc<wgpu::Buffer>,
    /// Albedo texture (always set; bridge substitutes white when absent).
    pub albedo_view: Arc<wgpu::TextureView>,
}

struct PrepassNode(Arc<DepthPrepass>);

impl RenderGraphNode for PrepassNode {
    fn label(&self) -> &str {
        "linear_depth_prepass"
    }
    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &FrameContext<'_>,
    ) -> Result<(), String> {
        self.0.encode(encoder, ctx)
    }
}

struct ForwardNode(Arc<ForwardPass>);

impl RenderGraphNode for ForwardNode {
    fn label(&self) -> &str {
        "forward_pass"
    }
    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &FrameContext<'_>,
    ) -> Result<(), String> {
        self.0.encode(encoder, ctx)
    }
}

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: GlintConfig,
    graph: RenderGraph,
    present_pass: PresentPass,
    frame_resources: Option<FrameResources>,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, GlintConfig::default())
    }

    pub fn new_with_config(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: GlintConfig,
    ) -> Result<Self, String> {
        let forward = Arc::new(ForwardPass::new(&device, config.pipeline_kind)?);
        let present_pass = PresentPass::new(&device, config.swapchain_format)?;

        // The prepass writes the linear-depth target the forward pass reads;
        // the graph derives the ordering edge from those declarations. The
        // plain pipeline has no prepass and no dependency to order.
        let mut graph = RenderGraph::new();
        match config.pipeline_kind {
            PipelineKind::ManualDepth => {
                let prepass = Arc::new(DepthPrepass::new(
                    &device,
                    config.prepass_policy,
                    config.clear_distance,
                )?);
                let linear_depth = graph.declare_resource();
                graph.add_node(
                    Box::new(ForwardNode(forward)),
                    vec![(linear_depth, ResourceUsage::Read)],
                );
                graph.add_node(
                    Box::new(PrepassNode(prepass)),
                    vec![(linear_depth, ResourceUsage::Write)],
                );
            }
            PipelineKind::Plain => {
                graph.add_node(Box::new(ForwardNode(forward)), vec![]);
            }
        }

        Ok(Self {
            device,
            queue,
            config,
            graph,
            present_pass,
            frame_resources: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
    pub fn config(&self) -> &GlintConfig {
        &self.config
    }

    pub fn ensure_frame_resources(&mut self, width: u32, height: u32) -> Result<(), String> {
        let existing = self.frame_resources.take();
        let new_res = FrameResources::ensure_size(&self.device, existing, width, height)?;
        self.frame_resources = Some(new_res);
        Ok(())
    }

    pub fn current_color_target(&self) -> Option<&wgpu::Texture> {
        self.frame_resources.as_ref().map(|f| &f.color)
    }

    /// Encode the frame graph (prepass + forward, in dependency order) into
    /// one command buffer. Resizes frame targets first if needed.
    pub fn render_frame(
        &mut self,
        width: u32,
        height: u32,
        camera: CameraState,
        draws: &[MeshDraw],
    ) -> Result<wgpu::CommandBuffer, String> {
        self.ensure_frame_resources(width, height)?;
        let frame = self
            .frame_resources
            .as_ref()
            .ok_or("render_frame: frame resources missing after ensure")?;
        let ctx = FrameContext {
            device: &self.device,
            queue: &self.queue,
            frame,
            camera,
            draws,
        };
        self.graph.execute(&self.device, &ctx)
    }

    /// Encode present pass: offscreen color -> output view (e.g. swapchain).
    /// Requires render_frame to have been called this frame.
    pub fn encode_present_to(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
    ) -> Result<(), String> {
        let frame = self
            .frame_resources
            .as_ref()
            .ok_or("encode_present_to: no frame (call render_frame first)")?;
        self.present_pass
            .encode(encoder, &self.device, &frame.color_view(), output_view)
    }

    pub fn submit(&self, command_buffers: impl IntoIterator<Item = wgpu::CommandBuffer>) {
        self.queue.submit(command_buffers);
    }
}
