//! Linear-depth prepass: writes world-space camera distance to an R32Float
//! target. Producer side of the manual depth test.

use wgpu::CommandEncoder;

use crate::binding;
use crate::config::PrepassDepthPolicy;
use crate::graph::FrameContext;
use crate::resources::{HW_DEPTH_FORMAT, LINEAR_DEPTH_FORMAT};

const PREPASS_SHADER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/prepass.wgsl"));

pub struct DepthPrepass {
    pipeline: wgpu::RenderPipeline,
    mesh_bind_group_layout: wgpu::BindGroupLayout,
    policy: PrepassDepthPolicy,
    clear_distance: f32,
}

impl DepthPrepass {
    pub fn new(
        device: &wgpu::Device,
        policy: PrepassDepthPolicy,
        clear_distance: f32,
    ) -> Result<Self, String> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prepass_shader"),
            source: wgpu::ShaderSource::Wgsl(PREPASS_SHADER.into()),
        });

        let mesh_bind_group_layout = binding::mesh_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prepass_pipeline_layout"),
            bind_group_layouts: &[&mesh_bind_group_layout],
            push_constant_ranges: &[binding::camera_push_constant_range()],
        });

        // NearestWins attaches a hardware depth buffer so overlapping
        // fragments resolve to the closest surface; LastWriteWins leaves
        // the outcome to rasterization order.
        let depth_stencil = match policy {
            PrepassDepthPolicy::NearestWins => Some(wgpu::DepthStencilState {
                format: HW_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            PrepassDepthPolicy::LastWriteWins => None,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prepass_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                // Vertex pulling: no fixed-function vertex input.
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: LINEAR_DEPTH_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::RED,
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

        Ok(Self { pipeline, mesh_bind_group_layout, policy, clear_distance })
    }

    pub fn policy(&self) -> PrepassDepthPolicy {
        self.policy
    }

    pub fn encode(&self, encoder: &mut CommandEncoder, ctx: &FrameContext<'_>) -> Result<(), String> {
        let target = ctx.frame.linear_depth_view();
        let hw_depth = ctx.frame.hw_depth_view();
        let depth_stencil_attachment = match self.policy {
            PrepassDepthPolicy::NearestWins => Some(wgpu::RenderPassDepthStencilAttachment {
                view: &hw_depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            PrepassDepthPolicy::LastWriteWins => None,
        };
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("linear_depth_prepass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
                resolve_target: None,
                ops: wgpu::Operations {
                    // Clear-then-write each frame; stale distances from a
                    // previous camera are meaningless.
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: self.clear_distance as f64,
                        g: 0.0,
                        b: 0.0,
                        a: 0.0,
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
        for draw in ctx.draws {
            let mesh_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("prepass_mesh_bind_group"),
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
            rp.set_bind_group(0, &mesh_bind_group, &[]);
            rp.draw(0..draw.index_count, 0..1);
        }
        drop(rp);
        Ok(())
    }
}
