//! Render and resource error types

use std::fmt;

use tesser_geometry::GeometryError;

use crate::backend::BackendKind;
use crate::resources::ResourceKind;

/// Error type for backend setup, shader compilation and drawing
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A single backend could not be initialized
    BackendInit { backend: BackendKind, message: String },
    /// Neither the primary nor the fallback backend could be initialized
    NoBackend { primary: String, fallback: String },
    /// Shader compile or link failure with the backend's diagnostic text
    ShaderCompile { name: String, backend: BackendKind, log: String },
    /// Render requested for a name that was never compiled
    UnknownProgram(String),
    /// Draw requested for a mesh that was never uploaded or has been evicted
    UnknownMesh(String),
    /// Mesh and program disagree on vertex layout or topology
    MeshMismatch { mesh: String, program: String },
    /// A tracked GPU resource could not be allocated
    Resource(ResourceError),
    /// Uniform set failed validation
    InvalidUniforms(GeometryError),
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// Other backend error
    Other(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::BackendInit { backend, message } => {
                write!(f, "{} initialization failed: {}", backend, message)
            }
            RenderError::NoBackend { primary, fallback } => {
                write!(f, "No usable GPU backend (primary: {}; fallback: {})", primary, fallback)
            }
            RenderError::ShaderCompile { name, backend, log } => {
                write!(f, "Shader '{}' failed to compile on {}: {}", name, backend, log)
            }
            RenderError::UnknownProgram(name) => write!(f, "Unknown shader program: '{}'", name),
            RenderError::UnknownMesh(name) => write!(f, "Unknown mesh: '{}'", name),
            RenderError::MeshMismatch { mesh, program } => {
                write!(f, "Mesh '{}' does not match the vertex format of program '{}'", mesh, program)
            }
            RenderError::Resource(err) => write!(f, "{}", err),
            RenderError::InvalidUniforms(err) => write!(f, "Invalid uniforms: {}", err),
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::InvalidUniforms(err) => Some(err),
            RenderError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeometryError> for RenderError {
    fn from(err: GeometryError) -> Self {
        RenderError::InvalidUniforms(err)
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

/// Error type for GPU resource allocation
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The backend refused to allocate the handle
    Allocation { kind: ResourceKind, message: String },
    /// The backend has no equivalent of this resource kind
    Unsupported { kind: ResourceKind, backend: BackendKind },
    /// Program source was rejected; `log` is the compiler or validator output
    Compile { log: String },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Allocation { kind, message } => {
                write!(f, "Failed to allocate {}: {}", kind.name(), message)
            }
            ResourceError::Unsupported { kind, backend } => {
                write!(f, "{} does not support {} resources", backend, kind.name())
            }
            ResourceError::Compile { log } => write!(f, "Program compilation failed: {}", log),
        }
    }
}

impl std::error::Error for ResourceError {}
