//! 4D to 3D projections
//!
//! Four pure projection policies map a [`Vec4`] to an `[x, y, z]` triple:
//!
//! - **Perspective**: `xyz * d / (d - w)`, as if viewed from `w = d`
//! - **Stereographic**: `xyz / (1 - w)`, conformal from the unit 3-sphere
//! - **Orthographic**: drops `w`
//! - **Oblique**: shears `xyz` by `w`
//!
//! plus a [`Slice`] operator that keeps only points inside a thin slab around
//! a fixed `w`.
//!
//! ## Singularities
//!
//! Perspective and stereographic projection divide by a term that vanishes at
//! their pole. Within [`POLE_EPSILON`] of the pole the division is replaced by
//! a signed [`SINGULARITY_MAGNITUDE`], so results stay finite and keep a
//! stable direction. The magnitude is a tunable clamp, nothing downstream
//! depends on its exact value.
//!
//! ## Batches
//!
//! Every policy has a batch form that returns one output per input, in input
//! order. Batches run on the rayon thread pool since each point is independent.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Vec4;

/// Magnitude substituted for a division by (almost) zero at a projection pole
pub const SINGULARITY_MAGNITUDE: f32 = 1e6;

/// Distance from a pole below which the singular fallback is used
pub const POLE_EPSILON: f32 = 1e-6;

/// Default viewer distance for perspective projection
pub const DEFAULT_PERSPECTIVE_DISTANCE: f32 = 2.0;

/// Perspective projection from a viewer at `w = distance`
#[inline]
pub fn perspective(v: Vec4, distance: f32) -> [f32; 3] {
    let denom = distance - v.w;
    if denom.abs() < POLE_EPSILON {
        let sign = if denom >= 0.0 { 1.0 } else { -1.0 };
        let k = sign * SINGULARITY_MAGNITUDE;
        return [v.x * k, v.y * k, v.z * k];
    }
    let factor = distance / denom;
    [v.x * factor, v.y * factor, v.z * factor]
}

/// Stereographic projection from the north pole `w = 1`
#[inline]
pub fn stereographic(v: Vec4) -> [f32; 3] {
    let denom = 1.0 - v.w;
    if denom.abs() < POLE_EPSILON {
        // direction at infinity
        let sign = if v.x + v.y + v.z >= 0.0 { 1.0 } else { -1.0 };
        return [sign * SINGULARITY_MAGNITUDE; 3];
    }
    let factor = 1.0 / denom;
    [v.x * factor, v.y * factor, v.z * factor]
}

#[inline]
pub fn orthographic(v: Vec4) -> [f32; 3] {
    v.xyz()
}

/// Oblique (cavalier) projection: each of x, y, z is sheared by `w`
#[inline]
pub fn oblique(v: Vec4, shear: [f32; 3]) -> [f32; 3] {
    [v.x + shear[0] * v.w, v.y + shear[1] * v.w, v.z + shear[2] * v.w]
}

pub fn perspective_batch(points: &[Vec4], distance: f32) -> Vec<[f32; 3]> {
    points.par_iter().map(|&v| perspective(v, distance)).collect()
}

pub fn stereographic_batch(points: &[Vec4]) -> Vec<[f32; 3]> {
    points.par_iter().map(|&v| stereographic(v)).collect()
}

pub fn orthographic_batch(points: &[Vec4]) -> Vec<[f32; 3]> {
    points.par_iter().map(|&v| orthographic(v)).collect()
}

pub fn oblique_batch(points: &[Vec4], shear: [f32; 3]) -> Vec<[f32; 3]> {
    points.par_iter().map(|&v| oblique(v, shear)).collect()
}

/// A projection policy chosen at runtime
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    Perspective { distance: f32 },
    Stereographic,
    Orthographic,
    Oblique { shear: [f32; 3] },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective { distance: DEFAULT_PERSPECTIVE_DISTANCE }
    }
}

impl Projection {
    /// Oblique projection with the usual cavalier shear
    pub const OBLIQUE_DEFAULT: Projection = Projection::Oblique { shear: [0.5, 0.5, 0.0] };

    /// Numeric projection code used by shaders and presets
    /// (0 perspective, 1 stereographic, 2 orthographic, 3 oblique)
    pub fn code(&self) -> u32 {
        match self {
            Projection::Perspective { .. } => 0,
            Projection::Stereographic => 1,
            Projection::Orthographic => 2,
            Projection::Oblique { .. } => 3,
        }
    }

    /// Build from a projection code and its single parameter (distance for
    /// perspective, shear on x and y for oblique). Unknown codes give `None`.
    pub fn from_code(code: u32, param: f32) -> Option<Self> {
        match code {
            0 => Some(Projection::Perspective { distance: param }),
            1 => Some(Projection::Stereographic),
            2 => Some(Projection::Orthographic),
            3 => Some(Projection::Oblique { shear: [param, param, 0.0] }),
            _ => None,
        }
    }

    #[inline]
    pub fn project(&self, v: Vec4) -> [f32; 3] {
        match *self {
            Projection::Perspective { distance } => perspective(v, distance),
            Projection::Stereographic => stereographic(v),
            Projection::Orthographic => orthographic(v),
            Projection::Oblique { shear } => oblique(v, shear),
        }
    }

    pub fn project_batch(&self, points: &[Vec4]) -> Vec<[f32; 3]> {
        points.par_iter().map(|&v| self.project(v)).collect()
    }

    /// Single-threaded batch for inputs too small to be worth splitting
    pub fn project_batch_sequential(&self, points: &[Vec4]) -> Vec<[f32; 3]> {
        points.iter().map(|&v| self.project(v)).collect()
    }

    /// Project and flatten to `[x0, y0, z0, x1, y1, z1, ...]` for GPU upload
    pub fn project_to_flat(&self, points: &[Vec4]) -> Vec<f32> {
        let projected = self.project_batch(points);
        bytemuck::cast_slice(&projected).to_vec()
    }
}

/// A point that survived a [`Slice`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlicedPoint {
    pub point: [f32; 3],
    /// 1.0 at the slice centre, falling to 0.0 at the slab boundary when fading
    pub alpha: f32,
}

/// Cross-section of 4D space: the slab `|w - slice_w| <= thickness`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slice {
    pub slice_w: f32,
    /// Half-width of the slab
    pub thickness: f32,
    /// Fade alpha linearly towards the slab boundary
    pub fade: bool,
}

impl Default for Slice {
    fn default() -> Self {
        Self { slice_w: 0.0, thickness: 0.1, fade: true }
    }
}

impl Slice {
    pub fn new(slice_w: f32, thickness: f32, fade: bool) -> Self {
        Self { slice_w, thickness, fade }
    }

    /// `None` when `v` lies outside the slab
    pub fn apply(&self, v: Vec4) -> Option<SlicedPoint> {
        let dist = (v.w - self.slice_w).abs();
        if dist > self.thickness {
            return None;
        }
        let alpha = if self.fade && self.thickness > 0.0 {
            (1.0 - dist / self.thickness).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Some(SlicedPoint { point: v.xyz(), alpha })
    }

    /// One entry per input point, `None` for points outside the slab
    pub fn apply_batch(&self, points: &[Vec4]) -> Vec<Option<SlicedPoint>> {
        points.par_iter().map(|&v| self.apply(v)).collect()
    }
}
