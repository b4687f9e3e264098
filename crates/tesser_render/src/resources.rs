//! GPU resource tracking under a memory budget
//!
//! [`ResourceManager`] is the single owner of every handle it creates. It
//! allocates through a [`ResourceBackend`], records each handle with an
//! approximate byte size, and keeps a running usage total against a budget
//! derived from [`DeviceCapabilities`].
//!
//! ## Memory pressure
//!
//! After each allocation the usage ratio is compared against the pressure
//! threshold. When it is crossed, the registered pressure callback sees a
//! [`UsageSnapshot`] and answers with a [`PressureAction`]. The resource that
//! triggered the check is never evicted by that same check.
//!
//! ## Disposal
//!
//! Deleting an unknown or already-deleted key is a no-op, so
//! [`ResourceManager::dispose_all`] can be called any number of times.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::backend::{BackendKind, DeviceCapabilities};
use crate::buffers::MeshFormat;
use crate::{ResourceError, ShaderSource};

/// Budget used when the device does not report its memory size
pub const MIN_BUDGET_BYTES: u64 = 64 * 1024 * 1024;

/// Bytes per texel for the RGBA8 textures and renderbuffers the backends create
const BYTES_PER_TEXEL: u64 = 4;

/// Category of a tracked GPU handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Texture,
    Buffer,
    Program,
    Framebuffer,
    Renderbuffer,
    VertexArray,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Texture,
        ResourceKind::Buffer,
        ResourceKind::Program,
        ResourceKind::Framebuffer,
        ResourceKind::Renderbuffer,
        ResourceKind::VertexArray,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Program => "program",
            ResourceKind::Framebuffer => "framebuffer",
            ResourceKind::Renderbuffer => "renderbuffer",
            ResourceKind::VertexArray => "vertex array",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// What to allocate
#[derive(Clone, Copy, Debug)]
pub enum ResourceDesc<'a> {
    /// RGBA8 2D texture
    Texture { width: u32, height: u32 },
    /// Vertex/index data buffer of `size` bytes
    Buffer { size: u64 },
    /// Fullscreen program when `mesh` is `None`, otherwise a program that
    /// reads vertices in the given format
    Program { source: &'a ShaderSource, mesh: Option<MeshFormat> },
    Framebuffer,
    /// RGBA8 render target storage
    Renderbuffer { width: u32, height: u32 },
    VertexArray,
}

impl ResourceDesc<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDesc::Texture { .. } => ResourceKind::Texture,
            ResourceDesc::Buffer { .. } => ResourceKind::Buffer,
            ResourceDesc::Program { .. } => ResourceKind::Program,
            ResourceDesc::Framebuffer => ResourceKind::Framebuffer,
            ResourceDesc::Renderbuffer { .. } => ResourceKind::Renderbuffer,
            ResourceDesc::VertexArray => ResourceKind::VertexArray,
        }
    }

    /// Approximate device memory taken by the allocation
    ///
    /// Framebuffers and vertex arrays only reference other objects and count
    /// as zero.
    pub fn estimated_bytes(&self) -> u64 {
        match *self {
            ResourceDesc::Texture { width, height } | ResourceDesc::Renderbuffer { width, height } => {
                width as u64 * height as u64 * BYTES_PER_TEXEL
            }
            ResourceDesc::Buffer { size } => size,
            ResourceDesc::Program { source, .. } => source.byte_len() as u64,
            ResourceDesc::Framebuffer | ResourceDesc::VertexArray => 0,
        }
    }
}

/// Allocation and destruction of raw handles for one GPU API
pub trait ResourceBackend {
    type Handle;

    fn kind(&self) -> BackendKind;

    fn create(&mut self, label: &str, desc: &ResourceDesc<'_>) -> Result<Self::Handle, ResourceError>;

    fn destroy(&mut self, kind: ResourceKind, handle: Self::Handle);

    /// Bytes charged against the budget for `desc`
    ///
    /// Backends override this when an allocation carries more than the
    /// descriptor shows, such as a program's own uniform buffer.
    fn estimated_bytes(&self, desc: &ResourceDesc<'_>) -> u64 {
        desc.estimated_bytes()
    }
}

new_key_type! {
    /// Stable key for a tracked resource
    pub struct ResourceKey;
}

struct ResourceRecord<H> {
    kind: ResourceKind,
    handle: H,
    bytes: u64,
    label: String,
    last_used: u64,
    disposable: bool,
}

/// How the budget is derived from device capabilities
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Share of estimated device memory the manager may use
    pub budget_fraction: f64,
    /// Usage ratio at which the pressure callback fires
    pub pressure_threshold: f64,
    /// Budget when the device memory size is unknown
    pub fallback_budget_bytes: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            budget_fraction: 0.5,
            pressure_threshold: 0.9,
            fallback_budget_bytes: MIN_BUDGET_BYTES,
        }
    }
}

impl BudgetConfig {
    pub fn budget_for(&self, capabilities: &DeviceCapabilities) -> u64 {
        let budget = match capabilities.estimated_memory_bytes {
            Some(memory) => (memory as f64 * self.budget_fraction.clamp(0.0, 1.0)) as u64,
            None => self.fallback_budget_bytes,
        };
        budget.max(1)
    }
}

/// Owner's answer to memory pressure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressureAction {
    /// Keep everything
    Ignore,
    /// Delete least-recently-used resources until usage is at most `target_bytes`
    EvictLru { target_bytes: u64 },
    /// Delete every resource marked disposable
    EvictDisposable,
}

/// Count and bytes for one resource kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindUsage {
    pub count: usize,
    pub bytes: u64,
}

/// Read-only view of manager state for diagnostics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub backend: BackendKind,
    pub usage_bytes: u64,
    pub budget_bytes: u64,
    pub per_kind: BTreeMap<ResourceKind, KindUsage>,
}

impl UsageSnapshot {
    /// Usage as a fraction of budget
    pub fn pressure(&self) -> f64 {
        self.usage_bytes as f64 / self.budget_bytes.max(1) as f64
    }

    pub fn total_count(&self) -> usize {
        self.per_kind.values().map(|u| u.count).sum()
    }
}

/// Read access to tracked handles while the backend is borrowed mutably
pub struct Handles<'a, H> {
    records: &'a SlotMap<ResourceKey, ResourceRecord<H>>,
}

impl<'a, H> Handles<'a, H> {
    pub fn get(&self, key: ResourceKey) -> Option<&'a H> {
        self.records.get(key).map(|r| &r.handle)
    }
}

pub type PressureCallback = Box<dyn FnMut(&UsageSnapshot) -> PressureAction>;

/// Tracks every GPU handle allocated through one backend
pub struct ResourceManager<B: ResourceBackend> {
    backend: B,
    records: SlotMap<ResourceKey, ResourceRecord<B::Handle>>,
    by_kind: [HashSet<ResourceKey>; 6],
    usage_bytes: u64,
    budget_bytes: u64,
    pressure_threshold: f64,
    tick: u64,
    on_pressure: Option<PressureCallback>,
}

impl<B: ResourceBackend> ResourceManager<B> {
    pub fn new(backend: B, capabilities: &DeviceCapabilities) -> Self {
        Self::with_budget(backend, capabilities, BudgetConfig::default())
    }

    pub fn with_budget(backend: B, capabilities: &DeviceCapabilities, config: BudgetConfig) -> Self {
        let budget_bytes = config.budget_for(capabilities);
        log::info!(
            "{} resource budget: {} MiB",
            backend.kind(),
            budget_bytes / (1024 * 1024)
        );
        Self {
            backend,
            records: SlotMap::with_key(),
            by_kind: std::array::from_fn(|_| HashSet::new()),
            usage_bytes: 0,
            budget_bytes,
            pressure_threshold: config.pressure_threshold,
            tick: 0,
            on_pressure: None,
        }
    }

    pub fn set_pressure_callback(&mut self, callback: impl FnMut(&UsageSnapshot) -> PressureAction + 'static) {
        self.on_pressure = Some(Box::new(callback));
    }

    pub fn create_texture(&mut self, label: &str, width: u32, height: u32) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::Texture { width, height })
    }

    pub fn create_buffer(&mut self, label: &str, size: u64) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::Buffer { size })
    }

    pub fn create_program(&mut self, label: &str, source: &ShaderSource) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::Program { source, mesh: None })
    }

    pub fn create_mesh_program(
        &mut self,
        label: &str,
        source: &ShaderSource,
        format: MeshFormat,
    ) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::Program { source, mesh: Some(format) })
    }

    pub fn create_framebuffer(&mut self, label: &str) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::Framebuffer)
    }

    pub fn create_renderbuffer(&mut self, label: &str, width: u32, height: u32) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::Renderbuffer { width, height })
    }

    pub fn create_vertex_array(&mut self, label: &str) -> Result<ResourceKey, ResourceError> {
        self.create(label, ResourceDesc::VertexArray)
    }

    /// Allocate through the backend and start tracking the handle
    ///
    /// Nothing is registered when the backend fails.
    pub fn create(&mut self, label: &str, desc: ResourceDesc<'_>) -> Result<ResourceKey, ResourceError> {
        let kind = desc.kind();
        let handle = self.backend.create(label, &desc)?;
        let bytes = self.backend.estimated_bytes(&desc);

        self.tick += 1;
        let key = self.records.insert(ResourceRecord {
            kind,
            handle,
            bytes,
            label: label.to_string(),
            last_used: self.tick,
            disposable: false,
        });
        self.by_kind[kind.slot()].insert(key);
        self.usage_bytes += bytes;
        log::debug!("Created {} '{}' ({} bytes)", kind.name(), label, bytes);

        self.check_pressure(key);
        Ok(key)
    }

    /// Destroy and stop tracking a resource
    ///
    /// Returns false (and does nothing) for unknown keys.
    pub fn delete(&mut self, key: ResourceKey) -> bool {
        let Some(record) = self.records.remove(key) else {
            return false;
        };
        self.by_kind[record.kind.slot()].remove(&key);
        self.usage_bytes = self.usage_bytes.saturating_sub(record.bytes);
        log::debug!("Deleted {} '{}'", record.kind.name(), record.label);
        self.backend.destroy(record.kind, record.handle);
        true
    }

    /// Mark a resource as used this tick
    pub fn touch(&mut self, key: ResourceKey) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                self.tick += 1;
                record.last_used = self.tick;
                true
            }
            None => false,
        }
    }

    /// Allow the resource to be dropped by [`PressureAction::EvictDisposable`]
    pub fn mark_disposable(&mut self, key: ResourceKey) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                record.disposable = true;
                true
            }
            None => false,
        }
    }

    /// Delete least-recently-used resources until usage is at most `target_bytes`
    pub fn evict_lru(&mut self, target_bytes: u64) -> usize {
        self.evict_lru_except(target_bytes, None)
    }

    /// Delete every resource marked disposable
    pub fn evict_disposable(&mut self) -> usize {
        self.evict_disposable_except(None)
    }

    /// Destroy every tracked handle
    pub fn dispose_all(&mut self) {
        let count = self.records.len();
        for (_, record) in self.records.drain() {
            self.backend.destroy(record.kind, record.handle);
        }
        for set in &mut self.by_kind {
            set.clear();
        }
        self.usage_bytes = 0;
        if count > 0 {
            log::debug!("Disposed {} resources", count);
        }
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn handle(&self, key: ResourceKey) -> Option<&B::Handle> {
        self.records.get(key).map(|r| &r.handle)
    }

    pub fn label(&self, key: ResourceKey) -> Option<&str> {
        self.records.get(key).map(|r| r.label.as_str())
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.by_kind[kind.slot()].len()
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn usage_bytes(&self) -> u64 {
        self.usage_bytes
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The backend and a view of every tracked handle, borrowed together
    pub fn split_mut(&mut self) -> (&mut B, Handles<'_, B::Handle>) {
        (&mut self.backend, Handles { records: &self.records })
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let mut per_kind: BTreeMap<ResourceKind, KindUsage> =
            ResourceKind::ALL.iter().map(|&k| (k, KindUsage::default())).collect();
        for record in self.records.values() {
            let usage = per_kind.entry(record.kind).or_default();
            usage.count += 1;
            usage.bytes += record.bytes;
        }
        UsageSnapshot {
            backend: self.backend.kind(),
            usage_bytes: self.usage_bytes,
            budget_bytes: self.budget_bytes,
            per_kind,
        }
    }

    fn check_pressure(&mut self, protect: ResourceKey) {
        let limit = self.budget_bytes as f64 * self.pressure_threshold;
        if (self.usage_bytes as f64) < limit {
            return;
        }

        let snapshot = self.snapshot();
        log::warn!(
            "GPU memory pressure: {} of {} bytes ({:.0}%)",
            snapshot.usage_bytes,
            snapshot.budget_bytes,
            snapshot.pressure() * 100.0
        );

        let Some(mut callback) = self.on_pressure.take() else {
            return;
        };
        let action = callback(&snapshot);
        self.on_pressure = Some(callback);

        let evicted = match action {
            PressureAction::Ignore => 0,
            PressureAction::EvictLru { target_bytes } => self.evict_lru_except(target_bytes, Some(protect)),
            PressureAction::EvictDisposable => self.evict_disposable_except(Some(protect)),
        };
        if evicted > 0 {
            log::info!("Evicted {} resources, usage now {} bytes", evicted, self.usage_bytes);
        }
    }

    fn evict_lru_except(&mut self, target_bytes: u64, protect: Option<ResourceKey>) -> usize {
        let mut candidates: Vec<(u64, ResourceKey)> = self
            .records
            .iter()
            .filter(|(key, _)| Some(*key) != protect)
            .map(|(key, record)| (record.last_used, key))
            .collect();
        candidates.sort_unstable();

        let mut evicted = 0;
        for (_, key) in candidates {
            if self.usage_bytes <= target_bytes {
                break;
            }
            if self.delete(key) {
                evicted += 1;
            }
        }
        evicted
    }

    fn evict_disposable_except(&mut self, protect: Option<ResourceKey>) -> usize {
        let keys: Vec<ResourceKey> = self
            .records
            .iter()
            .filter(|(key, record)| record.disposable && Some(*key) != protect)
            .map(|(key, _)| key)
            .collect();
        keys.into_iter().filter(|&key| self.delete(key)).count()
    }
}

impl<B: ResourceBackend> Drop for ResourceManager<B> {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MIB: u64 = 1024 * 1024;

    /// Hands out integer handles and records which are alive
    struct MockBackend {
        next: u32,
        live: Rc<RefCell<HashSet<u32>>>,
        destroyed: Rc<RefCell<Vec<u32>>>,
        refuse: Option<ResourceKind>,
        program_overhead: u64,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                next: 0,
                live: Rc::default(),
                destroyed: Rc::default(),
                refuse: None,
                program_overhead: 0,
            }
        }
    }

    impl ResourceBackend for MockBackend {
        type Handle = u32;

        fn kind(&self) -> BackendKind {
            BackendKind::WebGl
        }

        fn create(&mut self, _label: &str, desc: &ResourceDesc<'_>) -> Result<u32, ResourceError> {
            if self.refuse == Some(desc.kind()) {
                return Err(ResourceError::Allocation {
                    kind: desc.kind(),
                    message: "refused".to_string(),
                });
            }
            self.next += 1;
            self.live.borrow_mut().insert(self.next);
            Ok(self.next)
        }

        fn destroy(&mut self, _kind: ResourceKind, handle: u32) {
            self.live.borrow_mut().remove(&handle);
            self.destroyed.borrow_mut().push(handle);
        }

        fn estimated_bytes(&self, desc: &ResourceDesc<'_>) -> u64 {
            match desc {
                ResourceDesc::Program { .. } => desc.estimated_bytes() + self.program_overhead,
                _ => desc.estimated_bytes(),
            }
        }
    }

    fn caps(memory: Option<u64>) -> DeviceCapabilities {
        let caps = DeviceCapabilities::new(BackendKind::WebGl, 4096, 1 << 30);
        match memory {
            Some(bytes) => caps.with_estimated_memory(bytes),
            None => caps,
        }
    }

    fn manager(memory: Option<u64>) -> ResourceManager<MockBackend> {
        ResourceManager::new(MockBackend::new(), &caps(memory))
    }

    #[test]
    fn test_budget_from_capabilities() {
        assert_eq!(manager(Some(1024 * MIB)).budget_bytes(), 512 * MIB);
        assert_eq!(manager(None).budget_bytes(), MIN_BUDGET_BYTES);
    }

    #[test]
    fn test_create_registers_per_kind() {
        let mut mgr = manager(None);
        mgr.create_texture("albedo", 16, 16).unwrap();
        mgr.create_buffer("verts", 1000).unwrap();
        mgr.create_program("vis", &ShaderSource::new("a", "b", "c")).unwrap();
        mgr.create_framebuffer("fb").unwrap();
        mgr.create_renderbuffer("rb", 2, 2).unwrap();
        mgr.create_vertex_array("vao").unwrap();

        for kind in ResourceKind::ALL {
            assert_eq!(mgr.count(kind), 1, "Expected one {}", kind.name());
        }
        assert_eq!(mgr.total_count(), 6);
        assert_eq!(mgr.usage_bytes(), 16 * 16 * 4 + 1000 + 3 + 2 * 2 * 4);
    }

    #[test]
    fn test_failed_allocation_registers_nothing() {
        let mut backend = MockBackend::new();
        backend.refuse = Some(ResourceKind::VertexArray);
        let mut mgr = ResourceManager::new(backend, &caps(None));

        let err = mgr.create_vertex_array("vao").unwrap_err();
        assert!(matches!(err, ResourceError::Allocation { .. }));
        assert_eq!(mgr.total_count(), 0);
        assert_eq!(mgr.usage_bytes(), 0);
    }

    #[test]
    fn test_delete_destroys_and_deregisters() {
        let mut mgr = manager(None);
        let key = mgr.create_buffer("verts", 64).unwrap();
        let live = Rc::clone(&mgr.backend().live);
        assert_eq!(live.borrow().len(), 1);

        assert!(mgr.delete(key));
        assert_eq!(mgr.count(ResourceKind::Buffer), 0);
        assert_eq!(mgr.usage_bytes(), 0);
        assert!(live.borrow().is_empty());
    }

    #[test]
    fn test_double_delete_is_noop() {
        let mut mgr = manager(None);
        let key = mgr.create_texture("t", 4, 4).unwrap();
        assert!(mgr.delete(key));
        assert!(!mgr.delete(key));
        assert_eq!(mgr.backend().destroyed.borrow().len(), 1);
    }

    #[test]
    fn test_dispose_all_is_idempotent() {
        let mut mgr = manager(None);
        mgr.create_texture("t", 8, 8).unwrap();
        let key = mgr.create_buffer("b", 32).unwrap();
        mgr.create_vertex_array("v").unwrap();
        mgr.delete(key);

        mgr.dispose_all();
        mgr.dispose_all();

        assert_eq!(mgr.total_count(), 0);
        assert_eq!(mgr.usage_bytes(), 0);
        for kind in ResourceKind::ALL {
            assert_eq!(mgr.count(kind), 0);
        }
        assert!(mgr.backend().live.borrow().is_empty());
        assert_eq!(mgr.backend().destroyed.borrow().len(), 3);
    }

    #[test]
    fn test_drop_disposes() {
        let mgr = {
            let mut mgr = manager(None);
            mgr.create_texture("t", 8, 8).unwrap();
            mgr.create_buffer("b", 8).unwrap();
            mgr
        };
        let live = Rc::clone(&mgr.backend().live);
        drop(mgr);
        assert!(live.borrow().is_empty());
    }

    #[test]
    fn test_pressure_evicts_lru_but_not_newest() {
        // 64 MiB budget, threshold at 57.6 MiB
        let mut mgr = manager(None);
        let old = mgr.create_buffer("old", 20 * MIB).unwrap();
        let recent = mgr.create_buffer("recent", 20 * MIB).unwrap();
        mgr.touch(old);

        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        mgr.set_pressure_callback(move |snapshot| {
            *seen.borrow_mut() += 1;
            assert!(snapshot.pressure() >= 0.9);
            PressureAction::EvictLru { target_bytes: 40 * MIB }
        });

        let newest = mgr.create_buffer("newest", 20 * MIB).unwrap();
        assert_eq!(*calls.borrow(), 1);
        // "recent" was least recently used after touching "old"
        assert!(!mgr.contains(recent));
        assert!(mgr.contains(old));
        assert!(mgr.contains(newest));
        assert_eq!(mgr.usage_bytes(), 40 * MIB);
    }

    #[test]
    fn test_pressure_evicts_disposable() {
        let mut mgr = manager(None);
        let scratch = mgr.create_buffer("scratch", 30 * MIB).unwrap();
        let keep = mgr.create_buffer("keep", 10 * MIB).unwrap();
        mgr.mark_disposable(scratch);
        mgr.set_pressure_callback(|_| PressureAction::EvictDisposable);

        let big = mgr.create_buffer("big", 20 * MIB).unwrap();
        assert!(!mgr.contains(scratch));
        assert!(mgr.contains(keep));
        assert!(mgr.contains(big));
    }

    #[test]
    fn test_no_callback_below_threshold() {
        let mut mgr = manager(None);
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        mgr.set_pressure_callback(move |_| {
            *seen.borrow_mut() += 1;
            PressureAction::Ignore
        });
        mgr.create_buffer("small", MIB).unwrap();
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_touch_and_mark_unknown_key() {
        let mut mgr = manager(None);
        let key = mgr.create_framebuffer("fb").unwrap();
        mgr.delete(key);
        assert!(!mgr.touch(key));
        assert!(!mgr.mark_disposable(key));
        assert_eq!(mgr.label(key), None);
    }

    #[test]
    fn test_split_exposes_handles_with_backend() {
        let mut mgr = manager(None);
        let key = mgr.create_buffer("verts", 16).unwrap();
        let gone = mgr.create_buffer("gone", 16).unwrap();
        mgr.delete(gone);

        let (backend, handles) = mgr.split_mut();
        let handle = *handles.get(key).unwrap();
        assert!(backend.live.borrow().contains(&handle));
        assert!(handles.get(gone).is_none());
    }

    #[test]
    fn test_backend_byte_estimate_is_charged() {
        let mut backend = MockBackend::new();
        backend.program_overhead = 256;
        let mut mgr = ResourceManager::new(backend, &caps(None));
        mgr.create_program("vis", &ShaderSource::new("a", "b", "c")).unwrap();
        assert_eq!(mgr.usage_bytes(), 3 + 256);
        assert_eq!(mgr.snapshot().per_kind[&ResourceKind::Program].bytes, 259);
    }

    #[test]
    fn test_snapshot_counts() {
        let mut mgr = manager(Some(256 * MIB));
        mgr.create_texture("a", 2, 2).unwrap();
        mgr.create_texture("b", 2, 2).unwrap();
        mgr.create_buffer("c", 100).unwrap();

        let snapshot = mgr.snapshot();
        assert_eq!(snapshot.backend, BackendKind::WebGl);
        assert_eq!(snapshot.budget_bytes, 128 * MIB);
        assert_eq!(snapshot.per_kind[&ResourceKind::Texture], KindUsage { count: 2, bytes: 32 });
        assert_eq!(snapshot.per_kind[&ResourceKind::Buffer].count, 1);
        assert_eq!(snapshot.per_kind[&ResourceKind::Program].count, 0);
        assert_eq!(snapshot.total_count(), 3);
    }
}
