//! Geometry error types

use std::fmt;

/// Error type for geometry index handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Combined index outside `0..=MAX_GEOMETRY_INDEX`
    InvalidIndex(i64),
    /// Base geometry component outside `0..BASE_GEOMETRY_COUNT`
    InvalidBase(u32),
    /// Core type component outside `0..CORE_TYPE_COUNT`
    InvalidCore(u32),
    /// Persisted index written with a different encoding version
    UnsupportedVersion { found: u32, expected: u32 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidIndex(index) => {
                write!(f, "Invalid geometry index: {} (expected 0-{})", index, crate::MAX_GEOMETRY_INDEX)
            }
            GeometryError::InvalidBase(base) => {
                write!(f, "Invalid base geometry: {} (expected 0-{})", base, crate::BASE_GEOMETRY_COUNT - 1)
            }
            GeometryError::InvalidCore(core) => {
                write!(f, "Invalid core type: {} (expected 0-{})", core, crate::CORE_TYPE_COUNT - 1)
            }
            GeometryError::UnsupportedVersion { found, expected } => {
                write!(f, "Unsupported geometry index version {} (this build reads version {})", found, expected)
            }
        }
    }
}

impl std::error::Error for GeometryError {}
