//! OpenGL / WebGL-style backend on `glow`
//!
//! Programs, buffers and vertex arrays are created through
//! [`ResourceBackend`] and belong to the bridge's resource manager. Uniforms
//! are set one call per name, with locations cached per program until the
//! program is destroyed. The fullscreen quad needs no vertex data: the
//! vertex shader picks corners by `gl_VertexID`.

use std::collections::HashMap;
use std::sync::Arc;

use glow::HasContext;

use super::{BackendKind, DeviceCapabilities, GpuBackend, MeshDraw};
use crate::buffers::{IndexFormat, Topology};
use crate::resources::{ResourceBackend, ResourceDesc, ResourceKind};
use crate::shader::GlslDialect;
use crate::{RenderError, ResourceError, ShaderUniforms, UniformValue};

/// `GL_NVX_gpu_memory_info` total dedicated memory, in KiB
const GPU_MEMORY_INFO_DEDICATED_VIDMEM_NVX: u32 = 0x9047;

/// Presents the default framebuffer of a GL window
///
/// The windowing layer that created the context owns the swap chain.
pub trait GlPresenter {
    fn present(&self) -> Result<(), String>;

    fn resize(&self, width: u32, height: u32);
}

/// Compile and link a GLSL program, cleaning up on failure
///
/// # Safety
/// `gl` must be current on this thread.
unsafe fn link_program(gl: &glow::Context, vertex: &str, fragment: &str) -> Result<glow::Program, String> {
    let program = gl.create_program()?;

    let mut shaders = Vec::with_capacity(2);
    for (stage, source, label) in [
        (glow::VERTEX_SHADER, vertex, "Vertex shader"),
        (glow::FRAGMENT_SHADER, fragment, "Fragment shader"),
    ] {
        let shader = match gl.create_shader(stage) {
            Ok(shader) => shader,
            Err(e) => {
                cleanup(gl, program, &shaders);
                return Err(e);
            }
        };
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        shaders.push(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            cleanup(gl, program, &shaders);
            return Err(format!("{}: {}", label, log));
        }
        gl.attach_shader(program, shader);
    }

    gl.link_program(program);
    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        cleanup(gl, program, &shaders);
        return Err(format!("Program link: {}", log));
    }

    for &shader in &shaders {
        gl.detach_shader(program, shader);
        gl.delete_shader(shader);
    }
    Ok(program)
}

unsafe fn cleanup(gl: &glow::Context, program: glow::Program, shaders: &[glow::Shader]) {
    for &shader in shaders {
        gl.delete_shader(shader);
    }
    gl.delete_program(program);
}

/// A GL object owned by a resource manager
#[derive(Clone, Copy, Debug)]
pub enum GlHandle {
    Texture(glow::Texture),
    Buffer(glow::Buffer),
    Program(glow::Program),
    Framebuffer(glow::Framebuffer),
    Renderbuffer(glow::Renderbuffer),
    VertexArray(glow::VertexArray),
}

impl GlHandle {
    fn program(&self) -> Result<glow::Program, RenderError> {
        match *self {
            GlHandle::Program(p) => Ok(p),
            other => Err(RenderError::Other(format!("expected a GL program, got {:?}", other))),
        }
    }

    fn buffer(&self) -> Result<glow::Buffer, RenderError> {
        match *self {
            GlHandle::Buffer(b) => Ok(b),
            other => Err(RenderError::Other(format!("expected a GL buffer, got {:?}", other))),
        }
    }

    fn vertex_array(&self) -> Result<glow::VertexArray, RenderError> {
        match *self {
            GlHandle::VertexArray(v) => Ok(v),
            other => Err(RenderError::Other(format!("expected a GL vertex array, got {:?}", other))),
        }
    }
}

type LocationCache = HashMap<&'static str, Option<glow::UniformLocation>>;

/// WebGL-style backend
pub struct GlBackend {
    gl: Arc<glow::Context>,
    dialect: GlslDialect,
    capabilities: DeviceCapabilities,
    locations: HashMap<glow::Program, LocationCache>,
    presenter: Option<Box<dyn GlPresenter>>,
    viewport: (i32, i32),
}

impl GlBackend {
    /// Wrap a GL context that is already current
    ///
    /// The caller owns context creation (window toolkit, canvas, ...).
    pub fn new(gl: Arc<glow::Context>, width: u32, height: u32) -> Result<Self, RenderError> {
        let version = gl.version();
        if version.major < 3 {
            return Err(RenderError::BackendInit {
                backend: BackendKind::WebGl,
                message: format!("GL {}.{} is too old, 3.0 or later is required", version.major, version.minor),
            });
        }
        let dialect = if version.is_embedded {
            GlslDialect::Es
        } else {
            GlslDialect::Desktop
        };

        let mut capabilities = unsafe {
            let max_texture = gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE).max(0) as u32;
            DeviceCapabilities::new(BackendKind::WebGl, max_texture, i32::MAX as u64)
        };
        if gl.supported_extensions().contains("GL_NVX_gpu_memory_info") {
            let kib = unsafe { gl.get_parameter_i32(GPU_MEMORY_INFO_DEDICATED_VIDMEM_NVX) };
            if kib > 0 {
                capabilities = capabilities.with_estimated_memory(kib as u64 * 1024);
            }
        }

        log::info!(
            "WebGL backend ready ({:?} GLSL, max texture {}x{})",
            dialect,
            capabilities.max_texture_size,
            capabilities.max_texture_size
        );

        Ok(Self {
            gl,
            dialect,
            capabilities,
            locations: HashMap::new(),
            presenter: None,
            viewport: (width as i32, height as i32),
        })
    }

    /// Present through `presenter` at the end of every frame
    pub fn with_presenter(mut self, presenter: Box<dyn GlPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn dialect(&self) -> GlslDialect {
        self.dialect
    }
}

impl ResourceBackend for GlBackend {
    type Handle = GlHandle;

    fn kind(&self) -> BackendKind {
        BackendKind::WebGl
    }

    fn create(&mut self, _label: &str, desc: &ResourceDesc<'_>) -> Result<GlHandle, ResourceError> {
        let kind = desc.kind();
        let alloc_err = |message: String| ResourceError::Allocation { kind, message };
        let gl = &self.gl;
        unsafe {
            match *desc {
                ResourceDesc::Texture { width, height } => {
                    let texture = gl.create_texture().map_err(alloc_err)?;
                    gl.bind_texture(glow::TEXTURE_2D, Some(texture));
                    gl.tex_storage_2d(glow::TEXTURE_2D, 1, glow::RGBA8, width as i32, height as i32);
                    gl.bind_texture(glow::TEXTURE_2D, None);
                    Ok(GlHandle::Texture(texture))
                }
                ResourceDesc::Buffer { size } => {
                    let buffer = gl.create_buffer().map_err(alloc_err)?;
                    // The copy target leaves the current vertex array's bindings alone
                    gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
                    gl.buffer_data_size(glow::COPY_WRITE_BUFFER, size as i32, glow::DYNAMIC_DRAW);
                    gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
                    Ok(GlHandle::Buffer(buffer))
                }
                ResourceDesc::Program { source, .. } => {
                    let vertex = self.dialect.complete(&source.glsl_vertex);
                    let fragment = self.dialect.complete(&source.glsl_fragment);
                    link_program(gl, &vertex, &fragment)
                        .map(GlHandle::Program)
                        .map_err(|log| ResourceError::Compile { log })
                }
                ResourceDesc::Framebuffer => {
                    gl.create_framebuffer().map(GlHandle::Framebuffer).map_err(alloc_err)
                }
                ResourceDesc::Renderbuffer { width, height } => {
                    let rb = gl.create_renderbuffer().map_err(alloc_err)?;
                    gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb));
                    gl.renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA8, width as i32, height as i32);
                    gl.bind_renderbuffer(glow::RENDERBUFFER, None);
                    Ok(GlHandle::Renderbuffer(rb))
                }
                ResourceDesc::VertexArray => {
                    gl.create_vertex_array().map(GlHandle::VertexArray).map_err(alloc_err)
                }
            }
        }
    }

    fn destroy(&mut self, _kind: ResourceKind, handle: GlHandle) {
        let gl = &self.gl;
        unsafe {
            match handle {
                GlHandle::Texture(t) => gl.delete_texture(t),
                GlHandle::Buffer(b) => gl.delete_buffer(b),
                GlHandle::Program(p) => {
                    self.locations.remove(&p);
                    gl.delete_program(p);
                }
                GlHandle::Framebuffer(f) => gl.delete_framebuffer(f),
                GlHandle::Renderbuffer(r) => gl.delete_renderbuffer(r),
                GlHandle::VertexArray(v) => gl.delete_vertex_array(v),
            }
        }
    }
}

impl GpuBackend for GlBackend {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn write_buffer(&mut self, buffer: &GlHandle, bytes: &[u8]) -> Result<(), RenderError> {
        let buffer = buffer.buffer()?;
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, bytes);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(())
    }

    fn apply_uniforms(&mut self, program: &GlHandle, uniforms: &ShaderUniforms) -> Result<(), RenderError> {
        let program = program.program()?;
        let gl = &self.gl;
        let cache = self.locations.entry(program).or_default();
        unsafe {
            gl.use_program(Some(program));
            for (name, value) in uniforms.gl_values() {
                let location = cache
                    .entry(name)
                    .or_insert_with(|| gl.get_uniform_location(program, name));
                // Uniforms the compiler optimized out have no location
                let Some(loc) = location.as_ref() else { continue };
                match value {
                    UniformValue::F32(v) => gl.uniform_1_f32(Some(loc), v),
                    UniformValue::Vec2([x, y]) => gl.uniform_2_f32(Some(loc), x, y),
                    UniformValue::I32(v) => gl.uniform_1_i32(Some(loc), v),
                }
            }
        }
        Ok(())
    }

    fn begin_frame(&mut self, clear: Option<[f32; 4]>) -> Result<(), RenderError> {
        let gl = &self.gl;
        unsafe {
            gl.viewport(0, 0, self.viewport.0, self.viewport.1);
            if let Some([r, g, b, a]) = clear {
                gl.clear_color(r, g, b, a);
                gl.clear(glow::COLOR_BUFFER_BIT);
            }
        }
        Ok(())
    }

    fn draw_fullscreen(&mut self, program: &GlHandle, vertex_array: Option<&GlHandle>) -> Result<(), RenderError> {
        let program = program.program()?;
        let vao = vertex_array.map(GlHandle::vertex_array).transpose()?;
        let gl = &self.gl;
        unsafe {
            gl.disable(glow::BLEND);
            gl.use_program(Some(program));
            gl.bind_vertex_array(vao);
            gl.draw_arrays(glow::TRIANGLES, 0, 6);
            gl.bind_vertex_array(None);
        }
        Ok(())
    }

    fn draw_mesh(
        &mut self,
        program: &GlHandle,
        vertex_array: Option<&GlHandle>,
        mesh: &MeshDraw<'_, GlHandle>,
    ) -> Result<(), RenderError> {
        let program = program.program()?;
        let vao = vertex_array.map(GlHandle::vertex_array).transpose()?;
        let vertices = mesh.vertices.buffer()?;
        let indices = mesh.indices.buffer()?;
        let layout = mesh.format.layout;
        let stride = layout.stride_bytes() as i32;
        let mode = match mesh.format.topology {
            Topology::Lines => glow::LINES,
            Topology::Triangles => glow::TRIANGLES,
        };
        let index_type = match mesh.index_format {
            IndexFormat::U16 => glow::UNSIGNED_SHORT,
            IndexFormat::U32 => glow::UNSIGNED_INT,
        };

        let gl = &self.gl;
        unsafe {
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.use_program(Some(program));
            gl.bind_vertex_array(vao);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertices));
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            match layout.color_offset {
                Some(offset) => {
                    gl.enable_vertex_attrib_array(1);
                    gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, offset as i32 * 4);
                }
                None => {
                    gl.disable_vertex_attrib_array(1);
                    gl.vertex_attrib_4_f32(1, 1.0, 1.0, 1.0, 1.0);
                }
            }
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices));
            gl.draw_elements(mode, mesh.index_count as i32, index_type, 0);

            gl.disable_vertex_attrib_array(0);
            gl.disable_vertex_attrib_array(1);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.disable(glow::BLEND);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        match &self.presenter {
            Some(presenter) => presenter.present().map_err(RenderError::Other),
            None => {
                unsafe { self.gl.flush() };
                Ok(())
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width as i32, height as i32);
        if let Some(presenter) = &self.presenter {
            presenter.resize(width, height);
        }
    }
}
