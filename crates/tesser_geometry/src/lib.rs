//! 4D Geometry Library
//!
//! Generates the base shape catalog, applies core warps, and encodes the
//! `(base, core)` pair as a single geometry index.
//!
//! ## Pipeline
//!
//! ```text
//! GeometryIndex ──► generate_base ──► apply_core ──► scale ──► Geometry4D
//! ```
//!
//! The resulting [`Geometry4D`] is consumed by projection and the buffer
//! builder in `tesser_render`.

mod error;
mod geometry;
pub mod generators;
pub mod index;
pub mod warp;

pub use error::GeometryError;
pub use geometry::{GenerationParams, Geometry4D, MAX_RESOLUTION, MIN_RESOLUTION};
pub use generators::{generate, generate_base, generate_indexed};
pub use index::{
    BaseGeometry, CoreType, GeometryIndex, VersionedGeometryIndex, BASE_GEOMETRY_COUNT,
    CORE_TYPE_COUNT, INDEX_FORMAT_VERSION, MAX_GEOMETRY_INDEX,
};
pub use warp::{
    apply_core, hopf_project, inverse_stereographic, warp_hypersphere, warp_hypertetra,
    warp_to_edges, HopfPoint, HYPERSPHERE_RADIUS, PENTATOPE_EDGES, PENTATOPE_VERTICES,
};
