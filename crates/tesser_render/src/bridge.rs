//! Backend-agnostic shader compilation and draw submission
//!
//! A [`RenderBridge`] picks its backend exactly once, in
//! [`RenderBridge::negotiate`]: the WebGPU-style initializer is tried first and
//! the WebGL-style one only if it fails. Callers then work with shader and
//! mesh names and [`ShaderUniforms`] and never see which backend is
//! underneath.
//!
//! Every program, mesh buffer and vertex array the bridge uses is created
//! through its [`ResourceManager`], so it is counted against the memory budget
//! and released by [`ResourceManager::dispose_all`].
//!
//! ## Uniform staging
//!
//! [`RenderBridge::set_uniforms`] stages a complete uniform set for the next
//! [`RenderBridge::render_frame`] call, which consumes it. A frame with nothing
//! staged draws with [`ShaderUniforms::default`].

use std::collections::HashMap;

use crate::backend::{Backend, BackendKind, DeviceCapabilities, GpuBackend, MeshDraw};
use crate::buffers::{GeometryBuffers, IndexFormat, MeshFormat, Topology};
use crate::resources::{BudgetConfig, ResourceBackend, ResourceKey, ResourceManager};
use crate::{RenderError, ResourceError, ShaderSource, ShaderUniforms};

/// Lifecycle of a bridge after negotiation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    /// Drawing through the given backend
    Ready(BackendKind),
    /// Every resource has been released; further renders fail
    Disposed,
}

/// One draw in a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawItem<'a> {
    /// A fullscreen program over the whole target
    Fullscreen { program: &'a str },
    /// An uploaded mesh drawn with a mesh program
    Mesh { program: &'a str, mesh: &'a str },
}

struct ProgramEntry {
    key: ResourceKey,
    mesh: Option<MeshFormat>,
}

#[derive(Clone, Copy)]
struct Mesh {
    vertices: ResourceKey,
    indices: ResourceKey,
    vertex_capacity: u64,
    index_capacity: u64,
    index_count: u32,
    index_format: IndexFormat,
    format: MeshFormat,
}

struct ResolvedDraw {
    program: ResourceKey,
    mesh: Option<Mesh>,
}

/// Buffer size for `len` bytes: whole words, never empty
fn padded_size(len: usize) -> u64 {
    (len as u64).next_multiple_of(4).max(4)
}

pub struct RenderBridge<W: GpuBackend, G: GpuBackend> {
    resources: ResourceManager<Backend<W, G>>,
    programs: HashMap<String, ProgramEntry>,
    meshes: HashMap<String, Mesh>,
    vertex_array: Option<ResourceKey>,
    staged: Option<ShaderUniforms>,
    fallback_reason: Option<String>,
    disposed: bool,
}

impl<W: GpuBackend, G: GpuBackend> RenderBridge<W, G> {
    /// Try `primary`, then `fallback`
    ///
    /// Each initializer runs at most once. When both fail the error carries
    /// both messages.
    pub fn negotiate<P, F>(primary: P, fallback: F) -> Result<Self, RenderError>
    where
        P: FnOnce() -> Result<W, RenderError>,
        F: FnOnce() -> Result<G, RenderError>,
    {
        Self::negotiate_with_budget(primary, fallback, BudgetConfig::default())
    }

    /// [`negotiate`](Self::negotiate) with an explicit resource budget
    pub fn negotiate_with_budget<P, F>(primary: P, fallback: F, budget: BudgetConfig) -> Result<Self, RenderError>
    where
        P: FnOnce() -> Result<W, RenderError>,
        F: FnOnce() -> Result<G, RenderError>,
    {
        let primary_err = match primary() {
            Ok(backend) => {
                log::info!("Render bridge using {}", backend.kind());
                return Ok(Self::with_backend(Backend::WebGpu(backend), None, budget));
            }
            Err(e) => e,
        };

        log::warn!("Primary backend unavailable ({}), falling back", primary_err);
        match fallback() {
            Ok(backend) => {
                log::info!("Render bridge using {} (fallback)", backend.kind());
                Ok(Self::with_backend(
                    Backend::WebGl(backend),
                    Some(primary_err.to_string()),
                    budget,
                ))
            }
            Err(fallback_err) => Err(RenderError::NoBackend {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }

    /// Wrap an already-chosen backend
    pub fn from_backend(backend: Backend<W, G>) -> Self {
        Self::with_backend(backend, None, BudgetConfig::default())
    }

    fn with_backend(backend: Backend<W, G>, fallback_reason: Option<String>, budget: BudgetConfig) -> Self {
        let capabilities = backend.capabilities().clone();
        Self {
            resources: ResourceManager::with_budget(backend, &capabilities, budget),
            programs: HashMap::new(),
            meshes: HashMap::new(),
            vertex_array: None,
            staged: None,
            fallback_reason,
            disposed: false,
        }
    }

    pub fn state(&self) -> BridgeState {
        if self.disposed {
            BridgeState::Disposed
        } else {
            BridgeState::Ready(self.backend_kind())
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.resources.backend().kind()
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        self.resources.backend().capabilities()
    }

    /// Why the primary backend was rejected, if the fallback is in use
    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    pub fn backend(&self) -> &Backend<W, G> {
        self.resources.backend()
    }

    /// The manager owning every GPU handle this bridge uses
    pub fn resources(&self) -> &ResourceManager<Backend<W, G>> {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager<Backend<W, G>> {
        &mut self.resources
    }

    /// Compile a fullscreen program and register it as `name`
    ///
    /// A successful compile replaces any program already registered under
    /// `name`. A failed compile leaves `name` unregistered.
    pub fn compile_shader(&mut self, name: &str, source: &ShaderSource) -> Result<(), RenderError> {
        self.compile(name, source, None)
    }

    /// Compile a program that draws meshes uploaded in `format`
    ///
    /// The vertex layout must carry a color attribute.
    pub fn compile_mesh_shader(
        &mut self,
        name: &str,
        source: &ShaderSource,
        format: MeshFormat,
    ) -> Result<(), RenderError> {
        self.compile(name, source, Some(format))
    }

    fn compile(&mut self, name: &str, source: &ShaderSource, mesh: Option<MeshFormat>) -> Result<(), RenderError> {
        self.ensure_live()?;
        if let Some(old) = self.programs.remove(name) {
            self.resources.delete(old.key);
        }

        let created = match mesh {
            Some(format) if format.layout.color_offset.is_none() => Err(ResourceError::Compile {
                log: "mesh programs need a color attribute".to_string(),
            }),
            Some(format) => self.resources.create_mesh_program(name, source, format),
            None => self.resources.create_program(name, source),
        };
        let key = created.map_err(|err| match err {
            ResourceError::Compile { log } => RenderError::ShaderCompile {
                name: name.to_string(),
                backend: self.backend_kind(),
                log,
            },
            other => RenderError::Resource(other),
        })?;

        self.programs.insert(name.to_string(), ProgramEntry { key, mesh });
        log::info!("Compiled shader '{}' on {}", name, self.backend_kind());
        Ok(())
    }

    /// Unregister `name` and delete its program
    pub fn remove_shader(&mut self, name: &str) -> bool {
        match self.programs.remove(name) {
            Some(entry) => {
                self.resources.delete(entry.key);
                true
            }
            None => false,
        }
    }

    pub fn has_shader(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn shader_names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    /// Upload `buffers` as mesh `name`, drawn with `topology`
    ///
    /// Existing buffers under `name` are rewritten in place while they are
    /// large enough and reallocated otherwise.
    pub fn upload_mesh(
        &mut self,
        name: &str,
        buffers: &GeometryBuffers,
        topology: Topology,
    ) -> Result<(), RenderError> {
        self.ensure_live()?;
        let indices = buffers.indices(topology);
        let vertex_bytes = buffers.vertex_bytes();
        let index_bytes = indices.as_bytes();
        let index_count = u32::try_from(indices.len())
            .map_err(|_| RenderError::Other(format!("mesh '{}' has too many indices", name)))?;

        let reusable = self.meshes.remove(name).and_then(|mesh| {
            let fits = mesh.vertex_capacity >= vertex_bytes.len() as u64
                && mesh.index_capacity >= index_bytes.len() as u64
                && self.resources.contains(mesh.vertices)
                && self.resources.contains(mesh.indices);
            if fits {
                Some(mesh)
            } else {
                self.resources.delete(mesh.vertices);
                self.resources.delete(mesh.indices);
                None
            }
        });

        let mut mesh = match reusable {
            Some(mesh) => mesh,
            None => {
                let vertex_capacity = padded_size(vertex_bytes.len());
                let index_capacity = padded_size(index_bytes.len());
                let vertices = self
                    .resources
                    .create_buffer(&format!("{} vertices", name), vertex_capacity)?;
                let indices = match self
                    .resources
                    .create_buffer(&format!("{} indices", name), index_capacity)
                {
                    Ok(key) => key,
                    Err(err) => {
                        self.resources.delete(vertices);
                        return Err(err.into());
                    }
                };
                Mesh {
                    vertices,
                    indices,
                    vertex_capacity,
                    index_capacity,
                    index_count: 0,
                    index_format: IndexFormat::U16,
                    format: MeshFormat { layout: buffers.vertex_layout(), topology },
                }
            }
        };
        mesh.index_count = index_count;
        mesh.index_format = indices.format();
        mesh.format = MeshFormat { layout: buffers.vertex_layout(), topology };

        if let Err(err) = self.write_mesh(name, &mesh, vertex_bytes, index_bytes) {
            self.resources.delete(mesh.vertices);
            self.resources.delete(mesh.indices);
            return Err(err);
        }
        self.meshes.insert(name.to_string(), mesh);
        Ok(())
    }

    fn write_mesh(&mut self, name: &str, mesh: &Mesh, vertex_bytes: &[u8], index_bytes: &[u8]) -> Result<(), RenderError> {
        let (backend, handles) = self.resources.split_mut();
        let missing = || RenderError::UnknownMesh(name.to_string());
        backend.write_buffer(handles.get(mesh.vertices).ok_or_else(missing)?, vertex_bytes)?;
        backend.write_buffer(handles.get(mesh.indices).ok_or_else(missing)?, index_bytes)?;
        Ok(())
    }

    /// Delete the buffers of mesh `name`
    pub fn remove_mesh(&mut self, name: &str) -> bool {
        match self.meshes.remove(name) {
            Some(mesh) => {
                self.resources.delete(mesh.vertices);
                self.resources.delete(mesh.indices);
                true
            }
            None => false,
        }
    }

    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    /// Stage uniforms for the next frame
    pub fn set_uniforms(&mut self, uniforms: ShaderUniforms) {
        self.staged = Some(uniforms);
    }

    pub fn staged_uniforms(&self) -> Option<&ShaderUniforms> {
        self.staged.as_ref()
    }

    /// Draw the fullscreen quad with program `name`
    pub fn render(&mut self, name: &str, clear: Option<[f32; 4]>) -> Result<(), RenderError> {
        self.render_frame(clear, &[DrawItem::Fullscreen { program: name }])
    }

    /// Draw `items` in order into one frame
    ///
    /// Every name is resolved and the uniforms validated before anything is
    /// drawn. Consumes the staged uniforms even when the call fails.
    pub fn render_frame(&mut self, clear: Option<[f32; 4]>, items: &[DrawItem<'_>]) -> Result<(), RenderError> {
        let uniforms = self.staged.take().unwrap_or_default();
        self.ensure_live()?;

        let vertex_array = if items.is_empty() { None } else { self.vertex_array()? };
        let resolved = items
            .iter()
            .map(|item| self.resolve(item))
            .collect::<Result<Vec<_>, _>>()?;
        uniforms.validate()?;

        for draw in &resolved {
            self.resources.touch(draw.program);
            if let Some(mesh) = &draw.mesh {
                self.resources.touch(mesh.vertices);
                self.resources.touch(mesh.indices);
            }
        }
        if let Some(key) = vertex_array {
            self.resources.touch(key);
        }

        let (backend, handles) = self.resources.split_mut();
        let evicted = || RenderError::Other("resource evicted during frame setup".to_string());
        let vertex_array = vertex_array.and_then(|key| handles.get(key));

        backend.begin_frame(clear)?;
        for draw in &resolved {
            let program = handles.get(draw.program).ok_or_else(evicted)?;
            backend.apply_uniforms(program, &uniforms)?;
            match &draw.mesh {
                None => backend.draw_fullscreen(program, vertex_array)?,
                Some(mesh) if mesh.index_count == 0 => {}
                Some(mesh) => {
                    let draw = MeshDraw {
                        vertices: handles.get(mesh.vertices).ok_or_else(evicted)?,
                        indices: handles.get(mesh.indices).ok_or_else(evicted)?,
                        index_format: mesh.index_format,
                        index_count: mesh.index_count,
                        format: mesh.format,
                    };
                    backend.draw_mesh(program, vertex_array, &draw)?;
                }
            }
        }
        backend.end_frame()
    }

    fn resolve(&self, item: &DrawItem<'_>) -> Result<ResolvedDraw, RenderError> {
        let (program_name, mesh_name) = match *item {
            DrawItem::Fullscreen { program } => (program, None),
            DrawItem::Mesh { program, mesh } => (program, Some(mesh)),
        };
        let entry = self
            .programs
            .get(program_name)
            .filter(|entry| self.resources.contains(entry.key))
            .ok_or_else(|| RenderError::UnknownProgram(program_name.to_string()))?;

        let Some(mesh_name) = mesh_name else {
            if entry.mesh.is_some() {
                return Err(RenderError::Other(format!(
                    "program '{}' draws meshes, not the fullscreen quad",
                    program_name
                )));
            }
            return Ok(ResolvedDraw { program: entry.key, mesh: None });
        };

        let mesh = self
            .meshes
            .get(mesh_name)
            .filter(|mesh| self.resources.contains(mesh.vertices) && self.resources.contains(mesh.indices))
            .ok_or_else(|| RenderError::UnknownMesh(mesh_name.to_string()))?;
        if entry.mesh != Some(mesh.format) {
            return Err(RenderError::MeshMismatch {
                mesh: mesh_name.to_string(),
                program: program_name.to_string(),
            });
        }
        Ok(ResolvedDraw { program: entry.key, mesh: Some(*mesh) })
    }

    /// The shared vertex array, recreated after eviction
    ///
    /// `None` on backends without vertex array objects.
    fn vertex_array(&mut self) -> Result<Option<ResourceKey>, RenderError> {
        if let Some(key) = self.vertex_array.filter(|&key| self.resources.contains(key)) {
            return Ok(Some(key));
        }
        match self.resources.create_vertex_array("Draw Vertex Array") {
            Ok(key) => {
                self.vertex_array = Some(key);
                Ok(Some(key))
            }
            Err(ResourceError::Unsupported { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.resources.backend_mut().resize(width, height);
        }
    }

    /// Release every resource; the bridge cannot render afterwards
    pub fn dispose(&mut self) {
        self.programs.clear();
        self.meshes.clear();
        self.vertex_array = None;
        self.resources.dispose_all();
        self.staged = None;
        self.disposed = true;
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Other("render bridge has been disposed".to_string()));
        }
        Ok(())
    }
}
