//! GPU backends
//!
//! Two backends implement [`GpuBackend`]:
//!
//! - [`WgpuBackend`] - WebGPU-style, uploads [`PackedUniforms`](crate::PackedUniforms)
//!   into one uniform buffer per program
//! - [`GlBackend`] - WebGL-style, sets each uniform by name through `glow`
//!
//! Every backend is also the [`ResourceBackend`] its bridge's
//! [`ResourceManager`](crate::ResourceManager) allocates through, so programs
//! and buffers only ever exist as manager-owned handles. [`Backend`] is the
//! closed choice between the two, decided once when a
//! [`RenderBridge`](crate::RenderBridge) is created.

mod gl_backend;
mod wgpu_backend;

pub use gl_backend::{GlBackend, GlHandle, GlPresenter};
pub use wgpu_backend::{WgpuBackend, WgpuHandle, WgpuProgram};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffers::{IndexFormat, MeshFormat};
use crate::resources::{ResourceBackend, ResourceDesc, ResourceKind};
use crate::{RenderError, ResourceError, ShaderUniforms};

/// Which GPU API family a backend speaks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    WebGpu,
    WebGl,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::WebGpu => "WebGPU",
            BackendKind::WebGl => "WebGL",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device limits handed to constructors instead of queried globally
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub backend: BackendKind,
    /// Largest 2D texture edge in texels
    pub max_texture_size: u32,
    /// Largest single buffer in bytes
    pub max_buffer_size: u64,
    /// Estimated device memory, if the driver or adapter type gives a hint
    pub estimated_memory_bytes: Option<u64>,
}

impl DeviceCapabilities {
    pub fn new(backend: BackendKind, max_texture_size: u32, max_buffer_size: u64) -> Self {
        Self {
            backend,
            max_texture_size,
            max_buffer_size,
            estimated_memory_bytes: None,
        }
    }

    pub fn with_estimated_memory(mut self, bytes: u64) -> Self {
        self.estimated_memory_bytes = Some(bytes);
        self
    }
}

/// Buffers of one mesh resolved to backend handles
pub struct MeshDraw<'a, H> {
    pub vertices: &'a H,
    pub indices: &'a H,
    pub index_format: IndexFormat,
    pub index_count: u32,
    pub format: MeshFormat,
}

/// Operations the render bridge needs from a GPU API
///
/// Handles passed in are always ones this backend created through
/// [`ResourceBackend::create`].
pub trait GpuBackend: ResourceBackend {
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Replace the start of `buffer` with `bytes`
    fn write_buffer(&mut self, buffer: &Self::Handle, bytes: &[u8]) -> Result<(), RenderError>;

    /// Make `uniforms` the values seen by the next draw of `program`
    fn apply_uniforms(&mut self, program: &Self::Handle, uniforms: &ShaderUniforms) -> Result<(), RenderError>;

    /// Acquire the next target, clearing it if `clear` is set
    fn begin_frame(&mut self, clear: Option<[f32; 4]>) -> Result<(), RenderError>;

    /// Draw a quad covering the whole target
    fn draw_fullscreen(
        &mut self,
        program: &Self::Handle,
        vertex_array: Option<&Self::Handle>,
    ) -> Result<(), RenderError>;

    /// Draw indexed geometry with a mesh program
    fn draw_mesh(
        &mut self,
        program: &Self::Handle,
        vertex_array: Option<&Self::Handle>,
        mesh: &MeshDraw<'_, Self::Handle>,
    ) -> Result<(), RenderError>;

    /// Submit and present everything drawn since `begin_frame`
    fn end_frame(&mut self) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);
}

/// The backend chosen for a bridge
pub enum Backend<W, G> {
    WebGpu(W),
    WebGl(G),
}

/// A handle created by one side of a [`Backend`]
#[derive(Debug)]
pub enum BackendHandle<W, G> {
    WebGpu(W),
    WebGl(G),
}

fn foreign_handle() -> RenderError {
    RenderError::Other("handle belongs to the other backend".to_string())
}

impl<W, G> BackendHandle<W, G> {
    pub fn as_web_gpu(&self) -> Result<&W, RenderError> {
        match self {
            BackendHandle::WebGpu(h) => Ok(h),
            BackendHandle::WebGl(_) => Err(foreign_handle()),
        }
    }

    pub fn as_web_gl(&self) -> Result<&G, RenderError> {
        match self {
            BackendHandle::WebGl(h) => Ok(h),
            BackendHandle::WebGpu(_) => Err(foreign_handle()),
        }
    }
}

impl<W: ResourceBackend, G: ResourceBackend> ResourceBackend for Backend<W, G> {
    type Handle = BackendHandle<W::Handle, G::Handle>;

    fn kind(&self) -> BackendKind {
        match self {
            Backend::WebGpu(b) => b.kind(),
            Backend::WebGl(b) => b.kind(),
        }
    }

    fn create(&mut self, label: &str, desc: &ResourceDesc<'_>) -> Result<Self::Handle, ResourceError> {
        match self {
            Backend::WebGpu(b) => b.create(label, desc).map(BackendHandle::WebGpu),
            Backend::WebGl(b) => b.create(label, desc).map(BackendHandle::WebGl),
        }
    }

    fn destroy(&mut self, kind: ResourceKind, handle: Self::Handle) {
        match (self, handle) {
            (Backend::WebGpu(b), BackendHandle::WebGpu(h)) => b.destroy(kind, h),
            (Backend::WebGl(b), BackendHandle::WebGl(h)) => b.destroy(kind, h),
            _ => log::warn!("Dropping a {} handle from the other backend", kind.name()),
        }
    }

    fn estimated_bytes(&self, desc: &ResourceDesc<'_>) -> u64 {
        match self {
            Backend::WebGpu(b) => b.estimated_bytes(desc),
            Backend::WebGl(b) => b.estimated_bytes(desc),
        }
    }
}

impl<W: GpuBackend, G: GpuBackend> GpuBackend for Backend<W, G> {
    fn capabilities(&self) -> &DeviceCapabilities {
        match self {
            Backend::WebGpu(b) => b.capabilities(),
            Backend::WebGl(b) => b.capabilities(),
        }
    }

    fn write_buffer(&mut self, buffer: &Self::Handle, bytes: &[u8]) -> Result<(), RenderError> {
        match self {
            Backend::WebGpu(b) => b.write_buffer(buffer.as_web_gpu()?, bytes),
            Backend::WebGl(b) => b.write_buffer(buffer.as_web_gl()?, bytes),
        }
    }

    fn apply_uniforms(&mut self, program: &Self::Handle, uniforms: &ShaderUniforms) -> Result<(), RenderError> {
        match self {
            Backend::WebGpu(b) => b.apply_uniforms(program.as_web_gpu()?, uniforms),
            Backend::WebGl(b) => b.apply_uniforms(program.as_web_gl()?, uniforms),
        }
    }

    fn begin_frame(&mut self, clear: Option<[f32; 4]>) -> Result<(), RenderError> {
        match self {
            Backend::WebGpu(b) => b.begin_frame(clear),
            Backend::WebGl(b) => b.begin_frame(clear),
        }
    }

    fn draw_fullscreen(
        &mut self,
        program: &Self::Handle,
        vertex_array: Option<&Self::Handle>,
    ) -> Result<(), RenderError> {
        match self {
            Backend::WebGpu(b) => b.draw_fullscreen(
                program.as_web_gpu()?,
                vertex_array.map(BackendHandle::as_web_gpu).transpose()?,
            ),
            Backend::WebGl(b) => b.draw_fullscreen(
                program.as_web_gl()?,
                vertex_array.map(BackendHandle::as_web_gl).transpose()?,
            ),
        }
    }

    fn draw_mesh(
        &mut self,
        program: &Self::Handle,
        vertex_array: Option<&Self::Handle>,
        mesh: &MeshDraw<'_, Self::Handle>,
    ) -> Result<(), RenderError> {
        match self {
            Backend::WebGpu(b) => {
                let draw = MeshDraw {
                    vertices: mesh.vertices.as_web_gpu()?,
                    indices: mesh.indices.as_web_gpu()?,
                    index_format: mesh.index_format,
                    index_count: mesh.index_count,
                    format: mesh.format,
                };
                b.draw_mesh(
                    program.as_web_gpu()?,
                    vertex_array.map(BackendHandle::as_web_gpu).transpose()?,
                    &draw,
                )
            }
            Backend::WebGl(b) => {
                let draw = MeshDraw {
                    vertices: mesh.vertices.as_web_gl()?,
                    indices: mesh.indices.as_web_gl()?,
                    index_format: mesh.index_format,
                    index_count: mesh.index_count,
                    format: mesh.format,
                };
                b.draw_mesh(
                    program.as_web_gl()?,
                    vertex_array.map(BackendHandle::as_web_gl).transpose()?,
                    &draw,
                )
            }
        }
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        match self {
            Backend::WebGpu(b) => b.end_frame(),
            Backend::WebGl(b) => b.end_frame(),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        match self {
            Backend::WebGpu(b) => b.resize(width, height),
            Backend::WebGl(b) => b.resize(width, height),
        }
    }
}
