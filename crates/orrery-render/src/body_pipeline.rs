//! Textured sphere pipeline and the renderer that draws every body with it.
//!
//! Group 0 holds per-frame data (camera and the star's point light). Group 1
//! is one bind group per body: its texture, the shared sampler and a
//! [`BodyUniform`] with the model matrix and material flags.

use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use orrery_orbit::Material;

use crate::camera::{Camera, CameraUniform};
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::mesh::{SphereMesh, SphereVertex};
use crate::texture::{GpuTexture, TextureLoader};

pub const BODY_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct LightUniform {
    // xyz: star position in world space
    position: vec4<f32>,
    // x: star intensity, y: ambient intensity
    params: vec4<f32>,
};

struct BodyUniform {
    model: mat4x4<f32>,
    // x: 1.0 when lit
    flags: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> light: LightUniform;

@group(1) @binding(0) var t_body: texture_2d<f32>;
@group(1) @binding(1) var s_body: sampler;
@group(1) @binding(2) var<uniform> body: BodyUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_body(in: VertexInput) -> VertexOutput {
    let world = body.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (body.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_body(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(t_body, s_body, in.uv);
    if (body.flags.x < 0.5) {
        return base;
    }
    let n = normalize(in.normal);
    let l = normalize(light.position.xyz - in.world_pos);
    let diffuse = max(dot(n, l), 0.0) * light.params.x;
    return vec4<f32>(base.rgb * (light.params.y + diffuse), base.a);
}
"#;

/// Per-body uniform (group 1, binding 2).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyUniform {
    pub model: [[f32; 4]; 4],
    pub flags: [f32; 4],
}

impl BodyUniform {
    pub fn new(model: Mat4, material: Material) -> Self {
        let lit = match material {
            Material::Basic => 0.0,
            Material::Standard => 1.0,
        };
        Self {
            model: model.to_cols_array_2d(),
            flags: [lit, 0.0, 0.0, 0.0],
        }
    }
}

/// Point light at the star plus ambient fill (group 0, binding 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub sun_position: Vec3,
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
}

impl Lighting {
    pub fn to_uniform(self) -> LightUniform {
        LightUniform {
            position: self.sun_position.extend(1.0).to_array(),
            params: [self.sun_intensity, self.ambient_intensity, 0.0, 0.0],
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            sun_position: Vec3::ZERO,
            sun_intensity: 1.0,
            ambient_intensity: 0.15,
        }
    }
}

pub struct BodyPipeline {
    pub pipeline: wgpu::RenderPipeline,
    /// Group 0: camera + light.
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    /// Group 1: texture + sampler + body uniform.
    pub body_bind_group_layout: wgpu::BindGroupLayout,
}

impl BodyPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("body-shader"),
            source: wgpu::ShaderSource::Wgsl(BODY_SHADER_SOURCE.into()),
        });

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-frame-bgl"),
                entries: &[
                    uniform_entry(
                        0,
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                        std::mem::size_of::<CameraUniform>(),
                    ),
                    uniform_entry(
                        1,
                        wgpu::ShaderStages::FRAGMENT,
                        std::mem::size_of::<LightUniform>(),
                    ),
                ],
            });

        let body_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    uniform_entry(
                        2,
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                        std::mem::size_of::<BodyUniform>(),
                    ),
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("body-pipeline-layout"),
            bind_group_layouts: &[&frame_bind_group_layout, &body_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("body-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_body"),
                buffers: &[SphereVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::stencil_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_body"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_bind_group_layout,
            body_bind_group_layout,
        }
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

/// What the renderer needs to know about a body up front.
#[derive(Debug, Clone, Copy)]
pub struct BodyDraw<'a> {
    pub name: &'a str,
    pub texture: Option<&'a str>,
    pub material: Material,
}

struct BodyGpu {
    material: Material,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _texture: Arc<GpuTexture>,
}

/// Draws one textured sphere per body, in body order.
pub struct BodyRenderer {
    pipeline: BodyPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    bodies: Vec<BodyGpu>,
}

impl BodyRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        mesh: &SphereMesh,
        textures: &mut TextureLoader,
        bodies: &[BodyDraw<'_>],
    ) -> Self {
        use wgpu::util::DeviceExt;

        let pipeline = BodyPipeline::new(device, surface_format);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere-vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere-indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-uniform"),
            contents: bytemuck::cast_slice(&[Camera::default().to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light-uniform"),
            contents: bytemuck::cast_slice(&[Lighting::default().to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("body-frame-bg"),
            layout: &pipeline.frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let bodies = bodies
            .iter()
            .map(|draw| {
                let texture = textures.load(device, queue, draw.texture);
                let uniform_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{}-uniform", draw.name)),
                        contents: bytemuck::cast_slice(&[BodyUniform::new(
                            Mat4::IDENTITY,
                            draw.material,
                        )]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{}-bg", draw.name)),
                    layout: &pipeline.body_bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(textures.sampler()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: uniform_buffer.as_entire_binding(),
                        },
                    ],
                });
                BodyGpu {
                    material: draw.material,
                    uniform_buffer,
                    bind_group,
                    _texture: texture,
                }
            })
            .collect::<Vec<_>>();

        log::info!(
            "Body renderer ready: {} bodies, {} triangles per sphere",
            bodies.len(),
            mesh.triangle_count()
        );

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            camera_buffer,
            light_buffer,
            frame_bind_group,
            bodies,
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Upload this frame's camera, light and model matrices.
    ///
    /// `models` is indexed like the bodies passed to [`BodyRenderer::new`];
    /// extra entries are ignored and missing ones keep last frame's matrix.
    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera, lighting: Lighting, models: &[Mat4]) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.to_uniform()]),
        );
        queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[lighting.to_uniform()]),
        );
        for (body, model) in self.bodies.iter().zip(models) {
            queue.write_buffer(
                &body.uniform_buffer,
                0,
                bytemuck::cast_slice(&[BodyUniform::new(*model, body.material)]),
            );
        }
    }

    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for body in &self.bodies {
            render_pass.set_bind_group(1, &body.bind_group, &[]);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }

    /// Acquire the next surface texture, clear it, draw every body and present.
    pub fn draw_frame(
        &self,
        ctx: &RenderContext,
        depth: &DepthBuffer,
        clear_color: wgpu::Color,
    ) -> Result<(), SurfaceError> {
        let frame = ctx.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("body-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.render(&mut pass);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
