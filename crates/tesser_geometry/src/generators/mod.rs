//! Base shape generators and the combined generation entry point
//!
//! ## Catalog
//!
//! | Base | Shape | Topology |
//! |------|-------|----------|
//! | 0 | Tetrahedron | 4 corners, 6 edges, 4 triangles |
//! | 1 | Hypercube | 16 corners, 32 edges, 24 squares |
//! | 2 | Sphere | Hopf-coordinate lattice on the 3-sphere |
//! | 3 | Torus | Clifford torus grid |
//! | 4 | Klein Bottle | Twisted grid |
//! | 5 | Fractal | Chaos-game point cloud |
//! | 6 | Wave | Interference height field |
//! | 7 | Crystal | 16-cell, 8 corners, 24 edges, 32 triangles |
//!
//! Generation is deterministic for a given [`GenerationParams`].

mod fractal;
mod polytope;
mod surface;

pub use fractal::fractal;
pub use polytope::{crystal, hypercube, tetrahedron};
pub use surface::{klein_bottle, sphere, torus, wave, MIN_GRID_RESOLUTION, WAVE_EXTENT};

use crate::{apply_core, BaseGeometry, Geometry4D, GeometryError, GeometryIndex, GenerationParams};

/// Generate a base shape with no core warp and no scaling
pub fn generate_base(base: BaseGeometry, params: &GenerationParams) -> Geometry4D {
    let res = params.clamped_resolution();
    match base {
        BaseGeometry::Tetrahedron => tetrahedron(res),
        BaseGeometry::Hypercube => hypercube(res),
        BaseGeometry::Sphere => sphere(res),
        BaseGeometry::Torus => torus(res),
        BaseGeometry::KleinBottle => klein_bottle(res),
        BaseGeometry::Fractal => fractal(res),
        BaseGeometry::Wave => wave(res, params.time),
        BaseGeometry::Crystal => crystal(res),
    }
}

/// Generate, warp and scale the shape selected by a validated index
pub fn generate_indexed(index: GeometryIndex, params: &GenerationParams) -> Geometry4D {
    let base = generate_base(index.base(), params);
    let mut geometry = apply_core(&base, index.core());
    if params.size != 1.0 {
        geometry = geometry.scaled(params.size);
    }
    geometry.name = index.name();
    log::debug!(
        "Generated {}: {} vertices, {} edges, {} faces",
        geometry.name,
        geometry.vertex_count(),
        geometry.edge_count(),
        geometry.face_count()
    );
    geometry
}

/// Generate the shape for a raw combined index
///
/// Indices outside `0..=23` are rejected rather than clamped.
pub fn generate(index: u32, params: &GenerationParams) -> Result<Geometry4D, GeometryError> {
    let index = GeometryIndex::new(index)?;
    Ok(generate_indexed(index, params))
}
