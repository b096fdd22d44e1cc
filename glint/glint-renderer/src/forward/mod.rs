//! Forward color pass. Two pipeline variants with incompatible layouts:
//! ManualDepth consumes the linear-depth prepass target and discards
//! fragments that are not strictly nearer; Plain relies on the
//! fixed-function depth test. The variant is fixed at construction.

use wgpu::CommandEncoder;

use crate::binding;
use crate::config::PipelineKind;
use crate::graph::FrameContext;
use crate::resources::{COLOR_FORMAT, HW_DEPTH_FORMAT};

const FORWARD_MANUAL_SHADER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/forward_manual.wgsl"));
const FORWARD_PLAIN_SHADER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/forward_plain.wgsl"));

pub struct ForwardPass {
    pipeline: wgpu::RenderPipeline,
    mesh_bind_group_layout: wgpu::BindGroupLayout,
    material_bind_group_layout: wgpu::BindGroupLayout,
    /// Present only for the ManualDepth variant.
    depth_bind_group_layout: Option<wgpu::BindGroupLayout>,
    kind: PipelineKind,
    sampler: wgpu::Sampler,
}

impl ForwardPass {
    pub fn new(device: &wgpu::Device, kind: PipelineKind) -> Result<Self, String> {
        let (shader_src, label) = match kind {
            PipelineKind::ManualDepth => (FORWARD_MANUAL_SHADER, "forward_manual_shader"),
            PipelineKind::Plain => (FORWARD_PLAIN_SHADER, "forward_plain_shader"),
        };
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let mesh_bind_group_layout = binding::mesh_bind_group_layout(device);
        let material_bind_group_layout = binding::material_bind_group_layout(device);
        let depth_bind_group_layout = match kind {
            PipelineKind::ManualDepth => Some(binding::linear_depth_bind_group_layout(device)),
            PipelineKind::Plain => None,
        };

        let mut group_layouts = vec![&mesh_bind_group_layout, &material_bind_group_layout];
        if let Some(ref depth_layout) = depth_bind_group_layout {
            group_layouts.push(depth_layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("forward_pipeline_layout"),
            bind_group_layouts: &group_layouts,
            push_constant_ranges: &[binding::camera_push_constant_range()],
        });

        // Plain gets the hardware depth test; ManualDepth resolves
        // visibility itself and rasterizes without a depth attachment.
        let depth_stencil = match kind {
            PipelineKind::ManualDepth => None,
            PipelineKind::Plain => Some(wgpu::DepthStencilState {
                format: HW_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("forward_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("albedo_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            pipeline,
            mesh_bind_group_layout,
            material_bind_group_layout,
            depth_bind_group_layout,
            kind,
            sampler,
        })
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn encode(&self, encoder: &mut CommandEncoder, ctx: &FrameContext<'_>) -> Result<(), String> {
        let color = ctx.frame.color_view();
        let hw_depth = ctx.frame.hw_depth_view();
        let linear_depth = ctx.frame.linear_depth_view();

        // ManualDepth must only see the linear target after the prepass has
        // completed; the render graph orders the passes, the bind group
        // below is how the dependency is actually consumed.
        let depth_bind_group = self.depth_bind_group_layout.as_ref().map(|layout| {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("forward_depth_bind_group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&linear_depth),
                }],
            })
        });

        let depth_stencil_attachment = match self.kind {
            PipelineKind::ManualDepth => None,
            PipelineKind::Plain => Some(wgpu::RenderPassDepthStencilAttachment {
                view: &hw_depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
        };

        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("forward_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.1,
                        g: 0.1,
                        b: 0.1,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rp.set_pipeline(&self.pipeline);
        rp.set_push_constants(
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            0,
            bytemuck::bytes_of(&ctx.camera),
        );
        if let Some(ref depth_bind_group) = depth_bind_group {
            rp.set_bind_group(2, depth_bind_group, &[]);
        }
        for draw in ctx.draws {
            let mesh_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("forward_mesh_bind_group"),
                layout: &self.mesh_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: draw.vertex_buf.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: draw.index_buf.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: draw.object_buf.as_entire_binding(),
                    },
                ],
            });
            let material_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("forward_material_bind_group"),
                layout: &self.material_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&draw.albedo_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            rp.set_bind_group(0, &mesh_bind_group, &[]);
            rp.set_bind_group(1, &material_bind_group, &[]);
            rp.draw(0..draw.index_count, 0..1);
        }
        drop(rp);
        Ok(())
    }
}
