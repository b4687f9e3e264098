//! 4D Rendering Library
//!
//! Turns tesser geometry and uniform state into GPU work over either of two
//! backends.
//!
//! ## Key Components
//!
//! - [`buffers`] - flattens a `Geometry4D` into interleaved vertex and index arrays
//! - [`ShaderUniforms`] / [`PackedUniforms`] - the uniform contract and its packed form
//! - [`ShaderSource`] - GLSL and WGSL dialects of one program
//! - [`RenderBridge`] - compiles programs, uploads meshes and draws frames
//!   through a backend chosen once
//! - [`ResourceManager`] - owns every GPU handle and evicts under a memory budget
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//!
//! ## Backends
//!
//! [`WgpuBackend`] uploads a packed uniform buffer per program;
//! [`GlBackend`] sets uniforms one by one through `glow` and compiles GLSL as
//! desktop 330 core or ES 300, whichever the context reports. Both implement
//! [`GpuBackend`] and allocate through [`ResourceBackend`], and [`Backend`]
//! wraps whichever one negotiation picked.

pub mod backend;
pub mod bridge;
pub mod buffers;
pub mod context;
mod error;
pub mod resources;
mod shader;
pub mod uniforms;

pub use backend::{
    Backend, BackendHandle, BackendKind, DeviceCapabilities, GlBackend, GlHandle, GlPresenter,
    GpuBackend, MeshDraw, WgpuBackend, WgpuHandle, WgpuProgram,
};
pub use bridge::{BridgeState, DrawItem, RenderBridge};
pub use buffers::{
    build_buffers, build_buffers_with, BufferLayout, ColorPolicy, Components, GeometryBuffers,
    IndexBuffer, IndexFormat, MeshFormat, Topology, VertexAttributes, VertexLayout,
    VertexOverrides,
};
pub use error::{RenderError, ResourceError};
pub use resources::{
    BudgetConfig, Handles, KindUsage, PressureAction, ResourceBackend, ResourceDesc, ResourceKey,
    ResourceKind, ResourceManager, UsageSnapshot,
};
pub use shader::{GlslDialect, ShaderSource};
pub use uniforms::{
    hue_fraction, PackedUniforms, ShaderUniforms, UniformValue, PACKED_UNIFORM_SIZE,
    UNIFORM_LAYOUT,
};
