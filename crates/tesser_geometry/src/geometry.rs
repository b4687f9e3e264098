//! Generated 4D geometry and generation parameters

use serde::{Deserialize, Serialize};
use tesser_math::Vec4;

/// Smallest accepted generation resolution
pub const MIN_RESOLUTION: u32 = 2;
/// Largest accepted generation resolution
pub const MAX_RESOLUTION: u32 = 256;

/// A named shape: vertices plus edge pairs and face loops indexing them
///
/// Faces are vertex loops in winding order; quads and triangles both occur.
/// Generated fresh per configuration and never edited in place; the
/// transforming methods return new values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry4D {
    pub name: String,
    pub vertices: Vec<Vec4>,
    pub edges: Vec<[u32; 2]>,
    pub faces: Vec<Vec<u32>>,
}

impl Geometry4D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Replace every vertex, keeping edges and faces
    pub fn map_vertices(&self, f: impl Fn(Vec4) -> Vec4) -> Self {
        Self {
            name: self.name.clone(),
            vertices: self.vertices.iter().map(|&v| f(v)).collect(),
            edges: self.edges.clone(),
            faces: self.faces.clone(),
        }
    }

    /// Same topology with new vertex positions
    ///
    /// Returns `None` if the vertex count differs.
    pub fn with_vertices(&self, vertices: Vec<Vec4>) -> Option<Self> {
        if vertices.len() != self.vertices.len() {
            return None;
        }
        Some(Self {
            name: self.name.clone(),
            vertices,
            edges: self.edges.clone(),
            faces: self.faces.clone(),
        })
    }

    /// Uniform scale about the origin
    pub fn scaled(&self, factor: f32) -> Self {
        self.map_vertices(|v| v * factor)
    }

    /// Mean of all vertices, or the origin for empty geometry
    pub fn centroid(&self) -> Vec4 {
        if self.vertices.is_empty() {
            return Vec4::ZERO;
        }
        let sum = self.vertices.iter().fold(Vec4::ZERO, |acc, &v| acc + v);
        sum / self.vertices.len() as f32
    }

    /// Axis-aligned bounds as `(min, max)`
    pub fn bounds(&self) -> Option<(Vec4, Vec4)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Largest distance of any vertex from the origin
    pub fn max_radius(&self) -> f32 {
        self.vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    /// Check that every edge and face index refers to an existing vertex
    pub fn indices_in_range(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.edges.iter().all(|e| e[0] < n && e[1] < n)
            && self.faces.iter().all(|f| f.iter().all(|&i| i < n))
    }
}

/// Caller-supplied generation parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Sampling density, clamped to `MIN_RESOLUTION..=MAX_RESOLUTION`
    pub resolution: u32,
    /// Uniform scale applied after generation and warping
    pub size: f32,
    /// Phase offset for animated shapes
    pub time: f32,
}

impl GenerationParams {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    /// Resolution after clamping
    pub fn clamped_resolution(&self) -> u32 {
        self.resolution.clamp(MIN_RESOLUTION, MAX_RESOLUTION)
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            resolution: 16,
            size: 1.0,
            time: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn square() -> Geometry4D {
        Geometry4D {
            name: "square".to_string(),
            vertices: vec![
                Vec4::new(0.0, 0.0, 0.0, 0.0),
                Vec4::new(2.0, 0.0, 0.0, 0.0),
                Vec4::new(2.0, 2.0, 0.0, 0.0),
                Vec4::new(0.0, 2.0, 0.0, 0.0),
            ],
            edges: vec![[0, 1], [1, 2], [2, 3], [3, 0]],
            faces: vec![vec![0, 1, 2, 3]],
        }
    }

    #[test]
    fn test_counts() {
        let g = square();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.face_count(), 1);
        assert!(!g.is_empty());
        assert!(Geometry4D::new("empty").is_empty());
    }

    #[test]
    fn test_map_vertices_keeps_topology() {
        let g = square();
        let moved = g.map_vertices(|v| v + Vec4::W);
        assert_eq!(moved.edges, g.edges);
        assert_eq!(moved.faces, g.faces);
        assert_eq!(moved.name, g.name);
        assert!((moved.vertices[2].w - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_with_vertices_length_check() {
        let g = square();
        assert!(g.with_vertices(vec![Vec4::ZERO; 3]).is_none());
        let replaced = g.with_vertices(vec![Vec4::ONE; 4]).unwrap();
        assert_eq!(replaced.vertices[0], Vec4::ONE);
    }

    #[test]
    fn test_centroid_and_bounds() {
        let g = square();
        let c = g.centroid();
        assert!((c.x - 1.0).abs() < EPSILON && (c.y - 1.0).abs() < EPSILON);
        let (lo, hi) = g.bounds().unwrap();
        assert_eq!(lo, Vec4::ZERO);
        assert_eq!(hi, Vec4::new(2.0, 2.0, 0.0, 0.0));
        assert!(Geometry4D::new("empty").bounds().is_none());
        assert_eq!(Geometry4D::new("empty").centroid(), Vec4::ZERO);
    }

    #[test]
    fn test_scaled_and_radius() {
        let g = square().scaled(0.5);
        assert!((g.max_radius() - 2.0f32.sqrt()).abs() < EPSILON);
    }

    #[test]
    fn test_indices_in_range() {
        let mut g = square();
        assert!(g.indices_in_range());
        g.edges.push([0, 4]);
        assert!(!g.indices_in_range());
    }

    #[test]
    fn test_params_clamp() {
        assert_eq!(GenerationParams::new(0).clamped_resolution(), MIN_RESOLUTION);
        assert_eq!(GenerationParams::new(10_000).clamped_resolution(), MAX_RESOLUTION);
        assert_eq!(GenerationParams::new(32).clamped_resolution(), 32);
    }

    #[test]
    fn test_params_builder() {
        let p = GenerationParams::new(8).with_size(2.0).with_time(0.5);
        assert_eq!(p.resolution, 8);
        assert_eq!(p.size, 2.0);
        assert_eq!(p.time, 0.5);
    }
}
