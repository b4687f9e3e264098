//! Core warps
//!
//! Post-generation transforms that move a shape's vertices onto another
//! topological target while leaving its edges and faces untouched.
//!
//! ## Warps
//!
//! - [`warp_hypersphere`] - radial projection onto a 3-sphere
//! - [`warp_hypertetra`] - attraction toward the nearest pentatope corner
//! - [`warp_to_edges`] - projection onto the nearest pentatope edge
//! - [`inverse_stereographic`] - 3D point onto the unit 3-sphere
//! - [`hopf_project`] - 3-sphere point to a 2-sphere base point and fiber angle
//!
//! Every warp is a pure per-point function; the `_batch` forms evaluate in
//! parallel and keep input order.

use rayon::prelude::*;
use tesser_math::Vec4;

use crate::{CoreType, Geometry4D};

/// Below this length a point is treated as the origin
pub const ORIGIN_EPSILON: f32 = 1e-8;

/// Radius used by the hypersphere core
pub const HYPERSPHERE_RADIUS: f32 = 1.0;

const EDGE_EPSILON: f32 = 1e-10;

/// Component magnitude of the four lower pentatope corners, `sqrt(5) / 4`
const PENTATOPE_A: f32 = 0.559_017;

/// Corners of a regular 5-cell with unit circumradius, centered on the origin
pub const PENTATOPE_VERTICES: [Vec4; 5] = [
    Vec4::new(PENTATOPE_A, PENTATOPE_A, PENTATOPE_A, -0.25),
    Vec4::new(PENTATOPE_A, -PENTATOPE_A, -PENTATOPE_A, -0.25),
    Vec4::new(-PENTATOPE_A, PENTATOPE_A, -PENTATOPE_A, -0.25),
    Vec4::new(-PENTATOPE_A, -PENTATOPE_A, PENTATOPE_A, -0.25),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
];

/// All ten corner pairs of the 5-cell
pub const PENTATOPE_EDGES: [[usize; 2]; 10] = [
    [0, 1], [0, 2], [0, 3], [0, 4],
    [1, 2], [1, 3], [1, 4],
    [2, 3], [2, 4],
    [3, 4],
];

/// Point on the 2-sphere plus the angle along its Hopf fiber
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HopfPoint {
    pub base: [f32; 3],
    pub fiber: f32,
}

/// Scale a point onto the 3-sphere of the given radius
///
/// The origin has no direction and maps to `(radius, 0, 0, 0)`.
pub fn warp_hypersphere(v: Vec4, radius: f32) -> Vec4 {
    let len = v.length();
    if len < ORIGIN_EPSILON {
        return Vec4::new(radius, 0.0, 0.0, 0.0);
    }
    v * (radius / len)
}

pub fn warp_hypersphere_batch(points: &[Vec4], radius: f32) -> Vec<Vec4> {
    points.par_iter().map(|&v| warp_hypersphere(v, radius)).collect()
}

/// Inverse stereographic projection from the north pole `w = 1`
///
/// The input `w` is ignored. The result always has unit length.
pub fn inverse_stereographic(v: Vec4) -> Vec4 {
    let r2 = v.x * v.x + v.y * v.y + v.z * v.z;
    let inv = 1.0 / (1.0 + r2);
    Vec4::new(2.0 * v.x * inv, 2.0 * v.y * inv, 2.0 * v.z * inv, (r2 - 1.0) * inv)
}

pub fn inverse_stereographic_batch(points: &[Vec4]) -> Vec<Vec4> {
    points.par_iter().map(|&v| inverse_stereographic(v)).collect()
}

/// Hopf map of a 3-sphere point
///
/// The input is normalized first. The origin maps to the north pole of the
/// base sphere with a zero fiber angle.
pub fn hopf_project(v: Vec4) -> HopfPoint {
    if v.length() < ORIGIN_EPSILON {
        return HopfPoint { base: [0.0, 0.0, 1.0], fiber: 0.0 };
    }
    let n = v.normalized();
    let (x, y, z, w) = (n.x, n.y, n.z, n.w);
    HopfPoint {
        base: [
            2.0 * (x * z + y * w),
            2.0 * (y * z - x * w),
            x * x + y * y - z * z - w * w,
        ],
        fiber: y.atan2(x) - w.atan2(z),
    }
}

pub fn hopf_project_batch(points: &[Vec4]) -> Vec<HopfPoint> {
    points.par_iter().map(|&v| hopf_project(v)).collect()
}

/// Index of the pentatope corner nearest to `v`
///
/// Ties go to the lower index.
pub fn nearest_pentatope_vertex(v: Vec4) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &corner) in PENTATOPE_VERTICES.iter().enumerate() {
        let d = v.distance_squared(corner);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Pull a point toward its nearest pentatope corner
///
/// The interpolation strength is `1 / (1 + 2 * distance)`, so nearby points
/// are pulled harder and clusters form around the corners.
pub fn warp_hypertetra(v: Vec4) -> Vec4 {
    let nearest = PENTATOPE_VERTICES[nearest_pentatope_vertex(v)];
    let strength = 1.0 / (1.0 + 2.0 * v.distance(nearest));
    v.lerp(nearest, strength)
}

pub fn warp_hypertetra_batch(points: &[Vec4]) -> Vec<Vec4> {
    points.par_iter().map(|&v| warp_hypertetra(v)).collect()
}

/// Project a point onto the closest of the pentatope's ten edges
pub fn warp_to_edges(v: Vec4) -> Vec4 {
    let mut best = v;
    let mut best_dist = f32::INFINITY;
    for &[a, b] in &PENTATOPE_EDGES {
        let start = PENTATOPE_VERTICES[a];
        let dir = PENTATOPE_VERTICES[b] - start;
        let len_sq = dir.length_squared();
        if len_sq < EDGE_EPSILON {
            continue;
        }
        let t = ((v - start).dot(dir) / len_sq).clamp(0.0, 1.0);
        let projected = start + dir * t;
        let d = v.distance_squared(projected);
        if d < best_dist {
            best_dist = d;
            best = projected;
        }
    }
    best
}

pub fn warp_to_edges_batch(points: &[Vec4]) -> Vec<Vec4> {
    points.par_iter().map(|&v| warp_to_edges(v)).collect()
}

/// Apply a core warp to every vertex
pub fn apply_core(geometry: &Geometry4D, core: CoreType) -> Geometry4D {
    let vertices = match core {
        CoreType::Base => return geometry.clone(),
        CoreType::Hypersphere => warp_hypersphere_batch(&geometry.vertices, HYPERSPHERE_RADIUS),
        CoreType::Hypertetrahedron => warp_hypertetra_batch(&geometry.vertices),
    };
    Geometry4D {
        name: geometry.name.clone(),
        vertices,
        edges: geometry.edges.clone(),
        faces: geometry.faces.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec4, b: Vec4) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z) && approx_eq(a.w, b.w)
    }

    fn sample_points() -> Vec<Vec4> {
        let mut seed: u32 = 0x1234_5678;
        (0..200)
            .map(|_| {
                let mut next = || {
                    seed ^= seed << 13;
                    seed ^= seed >> 17;
                    seed ^= seed << 5;
                    (seed as f32 / u32::MAX as f32) * 4.0 - 2.0
                };
                Vec4::new(next(), next(), next(), next())
            })
            .collect()
    }

    #[test]
    fn test_pentatope_is_regular() {
        for v in PENTATOPE_VERTICES {
            assert!(approx_eq(v.length(), 1.0), "Corner {:?} not on unit sphere", v);
        }
        let edge = PENTATOPE_VERTICES[0].distance(PENTATOPE_VERTICES[1]);
        for [a, b] in PENTATOPE_EDGES {
            let d = PENTATOPE_VERTICES[a].distance(PENTATOPE_VERTICES[b]);
            assert!((d - edge).abs() < 1e-3, "Edge {}-{} has length {}, expected {}", a, b, d, edge);
        }
        let sum = PENTATOPE_VERTICES.iter().fold(Vec4::ZERO, |acc, &v| acc + v);
        assert!(vec_approx_eq(sum, Vec4::ZERO), "Expected centered 5-cell, got sum {:?}", sum);
    }

    #[test]
    fn test_hypersphere_radius() {
        for p in sample_points() {
            let w = warp_hypersphere(p, 2.5);
            assert!(approx_eq(w.length(), 2.5), "Expected radius 2.5, got {}", w.length());
        }
    }

    #[test]
    fn test_hypersphere_origin() {
        let w = warp_hypersphere(Vec4::ZERO, 1.5);
        assert_eq!(w, Vec4::new(1.5, 0.0, 0.0, 0.0));
        assert!(w.is_finite());
    }

    #[test]
    fn test_inverse_stereographic_on_sphere() {
        for p in sample_points() {
            let s = inverse_stereographic(p);
            assert!(approx_eq(s.length(), 1.0), "Expected unit length, got {}", s.length());
        }
        // Origin maps to the south pole
        assert!(vec_approx_eq(inverse_stereographic(Vec4::ZERO), Vec4::new(0.0, 0.0, 0.0, -1.0)));
        // Unit sphere maps to the equator
        assert!(vec_approx_eq(inverse_stereographic(Vec4::X), Vec4::X));
    }

    #[test]
    fn test_hopf_base_on_unit_sphere() {
        for p in sample_points() {
            let h = hopf_project(p);
            let len = (h.base[0] * h.base[0] + h.base[1] * h.base[1] + h.base[2] * h.base[2]).sqrt();
            assert!(approx_eq(len, 1.0), "Expected base on S2, got length {}", len);
            assert!(h.fiber.is_finite());
        }
    }

    #[test]
    fn test_hopf_fiber_collapses() {
        // Points on one fiber share a base point
        let angle: f32 = 0.7;
        let p = Vec4::new(0.6, 0.0, 0.8, 0.0);
        let (c, s) = (angle.cos(), angle.sin());
        let q = Vec4::new(p.x * c, p.x * s, p.z * c, p.z * s);
        let hp = hopf_project(p);
        let hq = hopf_project(q);
        for i in 0..3 {
            assert!(approx_eq(hp.base[i], hq.base[i]), "Base mismatch {:?} vs {:?}", hp.base, hq.base);
        }
    }

    #[test]
    fn test_hopf_origin() {
        let h = hopf_project(Vec4::ZERO);
        assert_eq!(h.base, [0.0, 0.0, 1.0]);
        assert_eq!(h.fiber, 0.0);
    }

    #[test]
    fn test_hypertetra_attracts() {
        for p in sample_points() {
            let nearest = PENTATOPE_VERTICES[nearest_pentatope_vertex(p)];
            let before = p.distance(nearest);
            let after = warp_hypertetra(p).distance(nearest);
            assert!(after < before, "Expected attraction: {} -> {}", before, after);
        }
    }

    #[test]
    fn test_hypertetra_fixes_corners() {
        for v in PENTATOPE_VERTICES {
            assert!(vec_approx_eq(warp_hypertetra(v), v));
        }
    }

    #[test]
    fn test_nearest_vertex_tie_prefers_lower_index() {
        // Midpoint of corners 0 and 1 is equidistant from both
        let mid = PENTATOPE_VERTICES[0].lerp(PENTATOPE_VERTICES[1], 0.5);
        assert_eq!(nearest_pentatope_vertex(mid), 0);
        assert_eq!(nearest_pentatope_vertex(PENTATOPE_VERTICES[2] * 2.0), 2);
        assert_eq!(nearest_pentatope_vertex(Vec4::new(0.0, 0.0, 0.0, 3.0)), 4);
    }

    #[test]
    fn test_warp_to_edges_lands_on_edge() {
        for p in sample_points() {
            let e = warp_to_edges(p);
            let on_edge = PENTATOPE_EDGES.iter().any(|&[a, b]| {
                let va = PENTATOPE_VERTICES[a];
                let vb = PENTATOPE_VERTICES[b];
                (e.distance(va) + e.distance(vb) - va.distance(vb)).abs() < 1e-3
            });
            assert!(on_edge, "Point {:?} is not on any pentatope edge", e);
        }
    }

    #[test]
    fn test_warp_to_edges_clamps_to_corner() {
        let far = PENTATOPE_VERTICES[4] * 5.0;
        assert!(vec_approx_eq(warp_to_edges(far), PENTATOPE_VERTICES[4]));
    }

    #[test]
    fn test_batches_match_scalar() {
        let points = sample_points();
        let batch = warp_hypertetra_batch(&points);
        assert_eq!(batch.len(), points.len());
        for (p, b) in points.iter().zip(&batch) {
            assert_eq!(warp_hypertetra(*p), *b);
        }
        let spheres = warp_hypersphere_batch(&points, 1.0);
        assert_eq!(spheres[17], warp_hypersphere(points[17], 1.0));
        let edges = warp_to_edges_batch(&points);
        assert_eq!(edges[3], warp_to_edges(points[3]));
        assert_eq!(inverse_stereographic_batch(&points)[9], inverse_stereographic(points[9]));
        assert_eq!(hopf_project_batch(&points)[5], hopf_project(points[5]));
    }

    #[test]
    fn test_apply_core_preserves_topology() {
        let g = Geometry4D {
            name: "pair".to_string(),
            vertices: vec![Vec4::new(2.0, 0.0, 0.0, 0.0), Vec4::new(0.0, 0.5, 0.0, 0.0)],
            edges: vec![[0, 1]],
            faces: vec![],
        };
        let base = apply_core(&g, CoreType::Base);
        assert_eq!(base, g);

        let sphere = apply_core(&g, CoreType::Hypersphere);
        assert_eq!(sphere.edges, g.edges);
        for v in &sphere.vertices {
            assert!(approx_eq(v.length(), HYPERSPHERE_RADIUS));
        }

        let tetra = apply_core(&g, CoreType::Hypertetrahedron);
        assert_eq!(tetra.vertex_count(), 2);
        assert_eq!(tetra.edges, g.edges);
    }
}
