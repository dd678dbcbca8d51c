use crate::batch::{Batch, GpuPaint, PaintVertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use nexus_common::{PhysicalSize, Rgba};
use wgpu::util::DeviceExt;

/// Format of the persistent frame buffer.
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const MIN_VERTICES: u64 = 4096;
const MIN_PAINTS: u64 = 64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

/// Pixel-space projection: origin top-left, y down.
fn projection(size: PhysicalSize) -> Mat4 {
    Mat4::orthographic_rh(
        0.0,
        size.width.max(1) as f32,
        size.height.max(1) as f32,
        0.0,
        -1.0,
        1.0,
    )
}

/// Clear color for the swapchain. Always opaque.
fn backdrop_color(c: Rgba) -> wgpu::Color {
    wgpu::Color {
        r: c.r as f64,
        g: c.g as f64,
        b: c.b as f64,
        a: 1.0,
    }
}

/// The offscreen buffer frames accumulate in.
struct FrameTarget {
    view: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
    size: PhysicalSize,
    /// False until the first pass after allocation has cleared it.
    initialized: bool,
}

/// Draws [`Batch`]es into a persistent frame buffer and copies that buffer
/// to the swapchain.
pub struct Renderer2d {
    paint_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    paint_layout: wgpu::BindGroupLayout,
    paint_bind_group: wgpu::BindGroup,
    paint_buffer: wgpu::Buffer,
    paint_capacity: u64,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    blit_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    target: FrameTarget,
    backdrop: wgpu::Color,
}

impl Renderer2d {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        size: PhysicalSize,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: projection(size).to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let paint_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("paint_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit_bind_group_layout"),
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
            ],
        });

        // Paint pipeline
        let paint_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("paint_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PAINT_SHADER.into()),
        });
        let paint_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("paint_pipeline_layout"),
                bind_group_layouts: &[&paint_layout],
                push_constant_ranges: &[],
            });
        let paint_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("paint_pipeline"),
            layout: Some(&paint_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &paint_shader,
                entry_point: Some("vs_paint"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PaintVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Uint32,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &paint_shader,
                entry_point: Some("fs_paint"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: FRAME_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Blit pipeline. Straight-alpha blending into a transparent buffer
        // leaves it premultiplied, so it composites over the backdrop as such.
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLIT_SHADER.into()),
        });
        let blit_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("blit_pipeline_layout"),
                bind_group_layouts: &[&blit_layout],
                push_constant_ranges: &[],
            });
        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_blit"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_blit"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Physical pixels map 1:1 onto the swapchain.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frame_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = Self::create_vertex_buffer(device, MIN_VERTICES);
        let paint_buffer = Self::create_paint_buffer(device, MIN_PAINTS);
        let paint_bind_group =
            Self::create_paint_bind_group(device, &paint_layout, &uniform_buffer, &paint_buffer);
        let target = Self::create_target(device, &blit_layout, &sampler, size);

        Self {
            paint_pipeline,
            blit_pipeline,
            uniform_buffer,
            paint_layout,
            paint_bind_group,
            paint_buffer,
            paint_capacity: MIN_PAINTS,
            vertex_buffer,
            vertex_capacity: MIN_VERTICES,
            blit_layout,
            sampler,
            target,
            backdrop: backdrop_color(Rgba::from_rgba8(15, 23, 42, 1.0)),
        }
    }

    /// Opaque color the frame buffer is composited over when presented.
    pub fn set_backdrop(&mut self, color: Rgba) {
        self.backdrop = backdrop_color(color);
    }

    /// Reallocate the frame buffer. Its contents are lost; the next draw
    /// starts from transparent.
    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize) {
        if size == self.target.size {
            return;
        }
        tracing::debug!(width = size.width, height = size.height, "frame buffer resized");
        self.target = Self::create_target(device, &self.blit_layout, &self.sampler, size);
    }

    /// Draw `batch` over whatever the frame buffer already holds.
    pub fn draw(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batch: &Batch) {
        if batch.is_empty() && self.target.initialized {
            return;
        }
        let vertex_count = batch.vertices().len() as u64;
        self.ensure_capacity(device, vertex_count, batch.paints().len() as u64);

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: projection(self.target.size).to_cols_array_2d(),
            }),
        );
        if !batch.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(batch.vertices()));
            queue.write_buffer(&self.paint_buffer, 0, bytemuck::cast_slice(batch.paints()));
        }

        let load = if self.target.initialized {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("paint_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("paint_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if vertex_count > 0 {
                let bytes = vertex_count * std::mem::size_of::<PaintVertex>() as u64;
                pass.set_pipeline(&self.paint_pipeline);
                pass.set_bind_group(0, &self.paint_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..bytes));
                pass.draw(0..vertex_count as u32, 0..1);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        self.target.initialized = true;
    }

    /// Composite the frame buffer over the backdrop into `view`.
    pub fn blit(&self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("blit_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.backdrop),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &self.target.blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, vertices: u64, paints: u64) {
        if vertices > self.vertex_capacity {
            self.vertex_capacity = vertices.next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(device, self.vertex_capacity);
        }
        if paints > self.paint_capacity {
            self.paint_capacity = paints.next_power_of_two();
            self.paint_buffer = Self::create_paint_buffer(device, self.paint_capacity);
            self.paint_bind_group = Self::create_paint_bind_group(
                device,
                &self.paint_layout,
                &self.uniform_buffer,
                &self.paint_buffer,
            );
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("paint_vertex_buffer"),
            size: capacity * std::mem::size_of::<PaintVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_paint_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("paint_buffer"),
            size: capacity * std::mem::size_of::<GpuPaint>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_paint_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        paints: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("paint_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: paints.as_entire_binding(),
                },
            ],
        })
    }

    fn create_target(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: PhysicalSize,
    ) -> FrameTarget {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame_texture"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        FrameTarget {
            view,
            blit_bind_group,
            size,
            initialized: false,
        }
    }
}
