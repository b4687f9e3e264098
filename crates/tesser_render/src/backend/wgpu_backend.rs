//! WebGPU-style backend on `wgpu`
//!
//! A program is a render pipeline plus its own 256-byte uniform buffer and the
//! bind group exposing it at `@group(0) @binding(0)`; the three live and die
//! together as one tracked handle. Uniform updates are a single
//! `write_buffer` of [`PackedUniforms`](crate::PackedUniforms).
//!
//! Draws between `begin_frame` and `end_frame` record one render pass each
//! into a shared encoder. Only the first pass clears.

use std::borrow::Cow;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::{BackendKind, DeviceCapabilities, GpuBackend, MeshDraw};
use crate::buffers::{IndexFormat, MeshFormat, Topology};
use crate::context::RenderContext;
use crate::resources::{ResourceBackend, ResourceDesc, ResourceKind};
use crate::uniforms::PACKED_UNIFORM_SIZE;
use crate::{PackedUniforms, RenderError, ResourceError, ShaderSource, ShaderUniforms};

/// Pipeline, uniform buffer and bind group of one program
#[derive(Debug)]
pub struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// A wgpu object owned by a resource manager
///
/// WebGPU has no framebuffer or vertex array objects; renderbuffers are
/// plain render-attachment textures.
#[derive(Debug)]
pub enum WgpuHandle {
    Texture(wgpu::Texture),
    Buffer(wgpu::Buffer),
    Program(WgpuProgram),
}

impl WgpuHandle {
    fn program(&self) -> Result<&WgpuProgram, RenderError> {
        match self {
            WgpuHandle::Program(p) => Ok(p),
            other => Err(RenderError::Other(format!("expected a WebGPU program, got {:?}", other))),
        }
    }

    fn buffer(&self) -> Result<&wgpu::Buffer, RenderError> {
        match self {
            WgpuHandle::Buffer(b) => Ok(b),
            other => Err(RenderError::Other(format!("expected a WebGPU buffer, got {:?}", other))),
        }
    }
}

/// Run `f` inside a validation error scope, returning the captured message
fn scoped<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(value),
    }
}

fn map_surface_error(err: wgpu::SurfaceError) -> RenderError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
        wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
        e => RenderError::Other(format!("{:?}", e)),
    }
}

fn mesh_vertex_attributes(format: &MeshFormat) -> Result<[wgpu::VertexAttribute; 2], String> {
    let color = format
        .layout
        .color_offset
        .ok_or_else(|| "mesh programs need a color attribute".to_string())?;
    Ok([
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: color as u64 * 4,
            shader_location: 1,
        },
    ])
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    /// Consumed by the first pass of the frame
    clear: Option<wgpu::Color>,
}

impl Frame {
    fn begin_pass(&mut self, label: &str) -> wgpu::RenderPass<'_> {
        let load = match self.clear.take() {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

/// WebGPU-style backend drawing into a window surface
pub struct WgpuBackend {
    context: RenderContext,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    frame: Option<Frame>,
}

impl WgpuBackend {
    pub fn new(context: RenderContext) -> Self {
        let device = &context.device;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(PACKED_UNIFORM_SIZE as u64),
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        log::info!(
            "WebGPU backend ready (max texture {}, max buffer {} bytes)",
            context.capabilities().max_texture_size,
            context.capabilities().max_buffer_size
        );

        Self {
            context,
            bind_group_layout,
            pipeline_layout,
            frame: None,
        }
    }

    fn build_program(
        &self,
        label: &str,
        source: &ShaderSource,
        mesh: Option<&MeshFormat>,
    ) -> Result<WgpuProgram, String> {
        let device = &self.context.device;
        let attributes = mesh.map(mesh_vertex_attributes).transpose()?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&source.wgsl)),
        });

        let vertex_buffers: Vec<wgpu::VertexBufferLayout<'_>> = match (mesh, attributes.as_ref()) {
            (Some(format), Some(attributes)) => vec![wgpu::VertexBufferLayout {
                array_stride: format.layout.stride_bytes() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            }],
            _ => Vec::new(),
        };
        let (topology, blend) = match mesh.map(|m| m.topology) {
            None => (wgpu::PrimitiveTopology::TriangleList, wgpu::BlendState::REPLACE),
            Some(Topology::Triangles) => (wgpu::PrimitiveTopology::TriangleList, wgpu::BlendState::ALPHA_BLENDING),
            Some(Topology::Lines) => (wgpu::PrimitiveTopology::LineList, wgpu::BlendState::ALPHA_BLENDING),
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.context.format(),
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Program Uniform Buffer"),
            contents: bytemuck::bytes_of(&PackedUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Program Uniform Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(WgpuProgram { pipeline, uniform_buffer, bind_group })
    }

    fn texture(&self, label: &str, width: u32, height: u32, usage: wgpu::TextureUsages) -> wgpu::Texture {
        self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage,
            view_formats: &[],
        })
    }

    fn frame(&mut self) -> Result<&mut Frame, RenderError> {
        self.frame
            .as_mut()
            .ok_or_else(|| RenderError::Other("draw outside begin_frame/end_frame".to_string()))
    }
}

impl ResourceBackend for WgpuBackend {
    type Handle = WgpuHandle;

    fn kind(&self) -> BackendKind {
        BackendKind::WebGpu
    }

    fn create(&mut self, label: &str, desc: &ResourceDesc<'_>) -> Result<WgpuHandle, ResourceError> {
        let kind = desc.kind();
        if let ResourceDesc::Texture { width, height } | ResourceDesc::Renderbuffer { width, height } = *desc {
            let max = self.context.capabilities().max_texture_size;
            if width > max || height > max {
                return Err(ResourceError::Allocation {
                    kind,
                    message: format!("{}x{} exceeds max texture size {}", width, height, max),
                });
            }
        }
        if let ResourceDesc::Buffer { size } = *desc {
            let max = self.context.capabilities().max_buffer_size;
            if size > max {
                return Err(ResourceError::Allocation {
                    kind,
                    message: format!("{} bytes exceeds max buffer size {}", size, max),
                });
            }
        }

        let device = Arc::clone(&self.context.device);
        let result = match *desc {
            ResourceDesc::Texture { width, height } => scoped(&device, || {
                WgpuHandle::Texture(self.texture(
                    label,
                    width,
                    height,
                    wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_DST
                        | wgpu::TextureUsages::RENDER_ATTACHMENT,
                ))
            }),
            ResourceDesc::Renderbuffer { width, height } => scoped(&device, || {
                WgpuHandle::Texture(self.texture(label, width, height, wgpu::TextureUsages::RENDER_ATTACHMENT))
            }),
            ResourceDesc::Buffer { size } => scoped(&device, || {
                WgpuHandle::Buffer(device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size: size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
                    usage: wgpu::BufferUsages::VERTEX
                        | wgpu::BufferUsages::INDEX
                        | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }))
            }),
            ResourceDesc::Program { source, mesh } => {
                return match scoped(&device, || self.build_program(label, source, mesh.as_ref())) {
                    Ok(Ok(program)) => Ok(WgpuHandle::Program(program)),
                    Ok(Err(log)) | Err(log) => Err(ResourceError::Compile { log }),
                };
            }
            ResourceDesc::Framebuffer | ResourceDesc::VertexArray => {
                return Err(ResourceError::Unsupported {
                    kind,
                    backend: BackendKind::WebGpu,
                });
            }
        };
        result.map_err(|message| ResourceError::Allocation { kind, message })
    }

    fn destroy(&mut self, _kind: ResourceKind, handle: WgpuHandle) {
        match handle {
            WgpuHandle::Texture(texture) => texture.destroy(),
            WgpuHandle::Buffer(buffer) => buffer.destroy(),
            // Pipeline and bind group are freed when the last reference drops
            WgpuHandle::Program(program) => program.uniform_buffer.destroy(),
        }
    }

    fn estimated_bytes(&self, desc: &ResourceDesc<'_>) -> u64 {
        match *desc {
            ResourceDesc::Buffer { size } => size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
            ResourceDesc::Program { .. } => desc.estimated_bytes() + PACKED_UNIFORM_SIZE as u64,
            _ => desc.estimated_bytes(),
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn capabilities(&self) -> &DeviceCapabilities {
        self.context.capabilities()
    }

    fn write_buffer(&mut self, buffer: &WgpuHandle, bytes: &[u8]) -> Result<(), RenderError> {
        let buffer = buffer.buffer()?;
        if bytes.is_empty() {
            return Ok(());
        }
        // Queue writes must cover whole 4-byte words
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        if bytes.len() % align == 0 {
            self.context.queue.write_buffer(buffer, 0, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(bytes.len().next_multiple_of(align), 0);
            self.context.queue.write_buffer(buffer, 0, &padded);
        }
        Ok(())
    }

    fn apply_uniforms(&mut self, program: &WgpuHandle, uniforms: &ShaderUniforms) -> Result<(), RenderError> {
        let program = program.program()?;
        let packed = uniforms.pack();
        self.context
            .queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::bytes_of(&packed));
        Ok(())
    }

    fn begin_frame(&mut self, clear: Option<[f32; 4]>) -> Result<(), RenderError> {
        // An unfinished frame from a failed draw is dropped unpresented
        self.frame = None;
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                let err = map_surface_error(e);
                if err == RenderError::SurfaceLost {
                    self.context.reconfigure();
                }
                return Err(err);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.frame = Some(Frame {
            output,
            view,
            encoder,
            clear: clear.map(|[r, g, b, a]| wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
        });
        Ok(())
    }

    fn draw_fullscreen(&mut self, program: &WgpuHandle, _vertex_array: Option<&WgpuHandle>) -> Result<(), RenderError> {
        let program = program.program()?;
        let frame = self.frame()?;
        let mut pass = frame.begin_pass("Fullscreen Pass");
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &program.bind_group, &[]);
        pass.draw(0..6, 0..1);
        Ok(())
    }

    fn draw_mesh(
        &mut self,
        program: &WgpuHandle,
        _vertex_array: Option<&WgpuHandle>,
        mesh: &MeshDraw<'_, WgpuHandle>,
    ) -> Result<(), RenderError> {
        let program = program.program()?;
        let vertices = mesh.vertices.buffer()?;
        let indices = mesh.indices.buffer()?;
        let index_format = match mesh.index_format {
            IndexFormat::U16 => wgpu::IndexFormat::Uint16,
            IndexFormat::U32 => wgpu::IndexFormat::Uint32,
        };

        let frame = self.frame()?;
        let mut pass = frame.begin_pass("Mesh Pass");
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &program.bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.set_index_buffer(indices.slice(..), index_format);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let mut frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::Other("end_frame without begin_frame".to_string()))?;
        if frame.clear.is_some() {
            // Nothing was drawn; still honor the clear
            drop(frame.begin_pass("Clear Pass"));
        }
        self.context.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context
            .resize(winit::dpi::PhysicalSize::new(width, height));
    }
}
