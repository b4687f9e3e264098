//! Geometry index encoding
//!
//! A single integer selects both the base shape and the core warp applied to it:
//!
//! ```text
//! index = core * BASE_GEOMETRY_COUNT + base
//! ```
//!
//! giving 24 combinations in `0..=23`. Adding a base shape or core type
//! re-partitions every encoded value, so persisted indices carry
//! [`INDEX_FORMAT_VERSION`] through [`VersionedGeometryIndex`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Number of base shapes in the catalog
pub const BASE_GEOMETRY_COUNT: u32 = 8;

/// Number of core warps
pub const CORE_TYPE_COUNT: u32 = 3;

/// Largest valid combined index
pub const MAX_GEOMETRY_INDEX: u32 = BASE_GEOMETRY_COUNT * CORE_TYPE_COUNT - 1;

/// Version of the `core * 8 + base` encoding
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// One of the eight base shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseGeometry {
    Tetrahedron = 0,
    Hypercube = 1,
    Sphere = 2,
    Torus = 3,
    KleinBottle = 4,
    Fractal = 5,
    Wave = 6,
    Crystal = 7,
}

impl BaseGeometry {
    /// All base shapes in encoding order
    pub const ALL: [BaseGeometry; 8] = [
        BaseGeometry::Tetrahedron,
        BaseGeometry::Hypercube,
        BaseGeometry::Sphere,
        BaseGeometry::Torus,
        BaseGeometry::KleinBottle,
        BaseGeometry::Fractal,
        BaseGeometry::Wave,
        BaseGeometry::Crystal,
    ];

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Display name, e.g. "Klein Bottle"
    pub fn name(self) -> &'static str {
        match self {
            BaseGeometry::Tetrahedron => "Tetrahedron",
            BaseGeometry::Hypercube => "Hypercube",
            BaseGeometry::Sphere => "Sphere",
            BaseGeometry::Torus => "Torus",
            BaseGeometry::KleinBottle => "Klein Bottle",
            BaseGeometry::Fractal => "Fractal",
            BaseGeometry::Wave => "Wave",
            BaseGeometry::Crystal => "Crystal",
        }
    }

    /// Identifier form, e.g. "klein_bottle"
    pub fn snake_name(self) -> &'static str {
        match self {
            BaseGeometry::Tetrahedron => "tetrahedron",
            BaseGeometry::Hypercube => "hypercube",
            BaseGeometry::Sphere => "sphere",
            BaseGeometry::Torus => "torus",
            BaseGeometry::KleinBottle => "klein_bottle",
            BaseGeometry::Fractal => "fractal",
            BaseGeometry::Wave => "wave",
            BaseGeometry::Crystal => "crystal",
        }
    }
}

/// Post-generation warp selecting the topological target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreType {
    /// Vertices left where the generator put them
    Base = 0,
    /// Vertices pushed onto the unit 3-sphere
    Hypersphere = 1,
    /// Vertices pulled toward the pentatope corners
    Hypertetrahedron = 2,
}

impl CoreType {
    pub const ALL: [CoreType; 3] = [CoreType::Base, CoreType::Hypersphere, CoreType::Hypertetrahedron];

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            CoreType::Base => "Base",
            CoreType::Hypersphere => "Hypersphere",
            CoreType::Hypertetrahedron => "Hypertetrahedron",
        }
    }

    pub fn snake_name(self) -> &'static str {
        match self {
            CoreType::Base => "base",
            CoreType::Hypersphere => "hypersphere",
            CoreType::Hypertetrahedron => "hypertetrahedron",
        }
    }
}

/// A validated combined geometry index in `0..=MAX_GEOMETRY_INDEX`
///
/// Serializes as the bare integer. Deserializing an out-of-range value
/// fails instead of clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GeometryIndex(u32);

impl GeometryIndex {
    pub fn new(index: u32) -> Result<Self, GeometryError> {
        if index > MAX_GEOMETRY_INDEX {
            return Err(GeometryError::InvalidIndex(i64::from(index)));
        }
        Ok(Self(index))
    }

    /// Combine a base shape and a core warp
    pub fn encode(base: BaseGeometry, core: CoreType) -> Self {
        Self(core.index() * BASE_GEOMETRY_COUNT + base.index())
    }

    /// Combine raw component values, rejecting out-of-range parts
    pub fn encode_raw(base: u32, core: u32) -> Result<Self, GeometryError> {
        let base = BaseGeometry::from_index(base).ok_or(GeometryError::InvalidBase(base))?;
        let core = CoreType::from_index(core).ok_or(GeometryError::InvalidCore(core))?;
        Ok(Self::encode(base, core))
    }

    /// Split a raw index into its components
    pub fn decode(index: u32) -> Result<(BaseGeometry, CoreType), GeometryError> {
        Self::new(index).map(|i| (i.base(), i.core()))
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn base(self) -> BaseGeometry {
        // Range was checked on construction, so both lookups succeed
        BaseGeometry::ALL[(self.0 % BASE_GEOMETRY_COUNT) as usize]
    }

    pub fn core(self) -> CoreType {
        CoreType::ALL[(self.0 / BASE_GEOMETRY_COUNT) as usize]
    }

    /// "Torus", "Hypersphere Torus", ...
    pub fn name(self) -> String {
        match self.core() {
            CoreType::Base => self.base().name().to_string(),
            core => format!("{} {}", core.name(), self.base().name()),
        }
    }

    /// "torus", "torus_hypersphere", ...
    pub fn snake_name(self) -> String {
        match self.core() {
            CoreType::Base => self.base().snake_name().to_string(),
            core => format!("{}_{}", self.base().snake_name(), core.snake_name()),
        }
    }

    /// Every valid index in ascending order
    pub fn all() -> impl Iterator<Item = GeometryIndex> {
        (0..=MAX_GEOMETRY_INDEX).map(GeometryIndex)
    }
}

impl Default for GeometryIndex {
    fn default() -> Self {
        Self::encode(BaseGeometry::Hypercube, CoreType::Base)
    }
}

impl TryFrom<u32> for GeometryIndex {
    type Error = GeometryError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl TryFrom<i32> for GeometryIndex {
    type Error = GeometryError;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        u32::try_from(index)
            .map_err(|_| GeometryError::InvalidIndex(i64::from(index)))
            .and_then(Self::new)
    }
}

impl From<GeometryIndex> for u32 {
    fn from(index: GeometryIndex) -> Self {
        index.0
    }
}

impl fmt::Display for GeometryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

/// A geometry index tagged with the encoding version that produced it
///
/// This is the form to persist in presets and config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedGeometryIndex {
    pub version: u32,
    pub index: u32,
}

impl VersionedGeometryIndex {
    /// Tag an index with the current encoding version
    pub fn current(index: GeometryIndex) -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            index: index.value(),
        }
    }

    /// Validate the version and the index
    pub fn resolve(&self) -> Result<GeometryIndex, GeometryError> {
        if self.version != INDEX_FORMAT_VERSION {
            return Err(GeometryError::UnsupportedVersion {
                found: self.version,
                expected: INDEX_FORMAT_VERSION,
            });
        }
        GeometryIndex::new(self.index)
    }
}

impl Default for VersionedGeometryIndex {
    fn default() -> Self {
        Self::current(GeometryIndex::default())
    }
}

impl From<GeometryIndex> for VersionedGeometryIndex {
    fn from(index: GeometryIndex) -> Self {
        Self::current(index)
    }
}
