//! Regular polytopes sampled along their edges
//!
//! Each polytope starts from its corner vertices. At resolution `n` every
//! edge is split into `n - 1` segments, so resolution 2 gives the bare
//! polytope. Corners always occupy the first indices and faces refer to
//! corners only.

use tesser_math::Vec4;

use crate::Geometry4D;

/// Corners followed by interior edge samples, with edges chained through the samples
fn edge_lattice(
    name: &str,
    corners: &[Vec4],
    corner_edges: &[[u32; 2]],
    faces: Vec<Vec<u32>>,
    resolution: u32,
) -> Geometry4D {
    let segments = resolution.max(2) - 1;
    let interior = (segments - 1) as usize;

    let mut vertices = Vec::with_capacity(corners.len() + corner_edges.len() * interior);
    vertices.extend_from_slice(corners);
    let mut edges = Vec::with_capacity(corner_edges.len() * segments as usize);

    for &[a, b] in corner_edges {
        let start = corners[a as usize];
        let end = corners[b as usize];
        let mut prev = a;
        for i in 1..segments {
            let t = i as f32 / segments as f32;
            let next = vertices.len() as u32;
            vertices.push(start.lerp(end, t));
            edges.push([prev, next]);
            prev = next;
        }
        edges.push([prev, b]);
    }

    Geometry4D {
        name: name.to_string(),
        vertices,
        edges,
        faces,
    }
}

/// Regular tetrahedron with unit edges in the `w = 0` hyperplane, centered on the origin
pub fn tetrahedron(resolution: u32) -> Geometry4D {
    let h = (2.0f32 / 3.0).sqrt();
    let r = 1.0 / 3.0f32.sqrt();
    let base_y = -h / 4.0;
    let half_width = r * 3.0f32.sqrt() / 2.0;

    let corners = [
        Vec4::new(0.0, 3.0 * h / 4.0, 0.0, 0.0),
        Vec4::new(0.0, base_y, r, 0.0),
        Vec4::new(-half_width, base_y, -r / 2.0, 0.0),
        Vec4::new(half_width, base_y, -r / 2.0, 0.0),
    ];
    let edges = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];
    let faces = vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 1], vec![1, 3, 2]];

    edge_lattice("Tetrahedron", &corners, &edges, faces, resolution)
}

/// Tesseract with corners at `(±1, ±1, ±1, ±1)`
///
/// Corner `i` takes `+1` on axis `k` when bit `k` of `i` is set, so two
/// corners share an edge exactly when their indices differ in one bit.
pub fn hypercube(resolution: u32) -> Geometry4D {
    let bit = |i: u32, k: u32| if i & (1 << k) != 0 { 1.0 } else { -1.0 };
    let corners: Vec<Vec4> = (0..16u32)
        .map(|i| Vec4::new(bit(i, 0), bit(i, 1), bit(i, 2), bit(i, 3)))
        .collect();

    let mut edges = Vec::with_capacity(32);
    for i in 0..16u32 {
        for k in 0..4 {
            let j = i ^ (1 << k);
            if j > i {
                edges.push([i, j]);
            }
        }
    }

    // One square per axis pair and fixed setting of the other two axes
    let mut faces = Vec::with_capacity(24);
    for a in 0..4 {
        for b in (a + 1)..4 {
            let (da, db) = (1u32 << a, 1u32 << b);
            for v in (0..16u32).filter(|v| v & (da | db) == 0) {
                faces.push(vec![v, v | da, v | da | db, v | db]);
            }
        }
    }

    edge_lattice("Hypercube", &corners, &edges, faces, resolution)
}

/// 16-cell (cross-polytope) with corners on the coordinate axes
///
/// Corner `2k` is `+e_k` and corner `2k + 1` is `-e_k`. Every pair of
/// corners that is not antipodal forms an edge.
pub fn crystal(resolution: u32) -> Geometry4D {
    let corners: Vec<Vec4> = (0..8)
        .map(|i| {
            let mut v = Vec4::ZERO;
            v[i / 2] = if i % 2 == 0 { 1.0 } else { -1.0 };
            v
        })
        .collect();

    let mut edges = Vec::with_capacity(24);
    for i in 0..8u32 {
        for j in (i + 1)..8 {
            if i / 2 != j / 2 {
                edges.push([i, j]);
            }
        }
    }

    // Three distinct axes with any choice of sign make a triangle
    let mut faces = Vec::with_capacity(32);
    for a in 0..4u32 {
        for b in (a + 1)..4 {
            for c in (b + 1)..4 {
                for signs in 0..8u32 {
                    faces.push(vec![
                        2 * a + (signs & 1),
                        2 * b + ((signs >> 1) & 1),
                        2 * c + ((signs >> 2) & 1),
                    ]);
                }
            }
        }
    }

    edge_lattice("Crystal", &corners, &edges, faces, resolution)
}
