//! Flattening 4D geometry into GPU-ready arrays
//!
//! Vertices are interleaved as `position | normal | color`, with the position
//! either projected to 3 floats or kept as raw 4D coordinates. Edges become a
//! line list and faces a triangle list (fan triangulation).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use tesser_geometry::Geometry4D;
use tesser_math::{Projection, Vec4};

/// Largest vertex count addressable with 16-bit indices
pub const MAX_U16_VERTICES: usize = u16::MAX as usize;

bitflags! {
    /// Attributes present in an interleaved vertex
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct VertexAttributes: u8 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const COLOR = 1 << 2;
    }
}

/// Floats per position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Components {
    /// Projected to 3D
    #[default]
    Xyz,
    /// Raw 4D coordinates, projected in the shader
    Xyzw,
}

impl Components {
    pub fn count(self) -> usize {
        match self {
            Components::Xyz => 3,
            Components::Xyzw => 4,
        }
    }
}

/// How per-vertex color is produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ColorPolicy {
    #[default]
    None,
    Uniform { rgba: [f32; 4] },
    /// Hue sweeps once around the wheel across the vertex list
    Rainbow { saturation: f32, lightness: f32 },
    /// `-w_range` maps to `near`, `0` to `mid`, `+w_range` to `far`
    WDepth {
        near: [f32; 4],
        mid: [f32; 4],
        far: [f32; 4],
        w_range: f32,
    },
}

impl ColorPolicy {
    pub fn is_none(&self) -> bool {
        matches!(self, ColorPolicy::None)
    }

    /// Color for vertex `index` of `count` at position `v`
    pub fn color_for(&self, index: usize, count: usize, v: Vec4) -> [f32; 4] {
        match *self {
            ColorPolicy::None => [1.0; 4],
            ColorPolicy::Uniform { rgba } => rgba,
            ColorPolicy::Rainbow { saturation, lightness } => {
                let hue = index as f32 / count.max(1) as f32;
                let [r, g, b] = hsl_to_rgb(hue, saturation, lightness);
                [r, g, b, 1.0]
            }
            ColorPolicy::WDepth { near, mid, far, w_range } => {
                if w_range <= 0.0 {
                    return mid;
                }
                let t = (v.w / w_range).clamp(-1.0, 1.0);
                if t < 0.0 {
                    mix(mid, near, -t)
                } else {
                    mix(mid, far, t)
                }
            }
        }
    }
}

fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// HSL to RGB with all inputs in `[0, 1]`
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}

/// Shape of the vertex buffer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferLayout {
    pub components: Components,
    pub include_normals: bool,
    pub color: ColorPolicy,
    /// Used for [`Components::Xyz`]; `None` drops `w`
    pub projection: Option<Projection>,
}

impl Default for BufferLayout {
    fn default() -> Self {
        Self {
            components: Components::Xyz,
            include_normals: false,
            color: ColorPolicy::None,
            projection: Some(Projection::default()),
        }
    }
}

impl BufferLayout {
    pub fn attributes(&self) -> VertexAttributes {
        let mut attrs = VertexAttributes::POSITION;
        if self.include_normals {
            attrs |= VertexAttributes::NORMAL;
        }
        if !self.color.is_none() {
            attrs |= VertexAttributes::COLOR;
        }
        attrs
    }

    /// Floats per interleaved vertex
    pub fn stride_floats(&self) -> usize {
        let mut stride = self.components.count();
        if self.include_normals {
            stride += 3;
        }
        if !self.color.is_none() {
            stride += 4;
        }
        stride
    }

    /// Attribute offsets of the vertices this layout builds
    pub fn vertex_layout(&self) -> VertexLayout {
        VertexLayout::from_attributes(self.attributes(), self.components.count())
    }
}

/// Float offsets of each attribute inside one interleaved vertex
///
/// Position always starts at offset 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub position_components: u32,
    pub normal_offset: Option<u32>,
    pub color_offset: Option<u32>,
    pub stride_floats: u32,
}

impl VertexLayout {
    pub fn from_attributes(attributes: VertexAttributes, position_components: usize) -> Self {
        let mut offset = position_components as u32;
        let normal_offset = attributes.contains(VertexAttributes::NORMAL).then(|| {
            let at = offset;
            offset += 3;
            at
        });
        let color_offset = attributes.contains(VertexAttributes::COLOR).then(|| {
            let at = offset;
            offset += 4;
            at
        });
        Self {
            position_components: position_components as u32,
            normal_offset,
            color_offset,
            stride_floats: offset,
        }
    }

    pub fn stride_bytes(&self) -> u32 {
        self.stride_floats * std::mem::size_of::<f32>() as u32
    }
}

/// Primitive type a mesh is drawn with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Edges as a line list
    #[default]
    Lines,
    /// Faces as a triangle list
    Triangles,
}

/// Vertex layout and topology a mesh program is built for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshFormat {
    pub layout: VertexLayout,
    pub topology: Topology,
}

/// Width of one index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// Index data, 16-bit while the vertex count allows it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    pub fn from_indices(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count > MAX_U16_VERTICES {
            IndexBuffer::U32(indices)
        } else {
            IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_u32(&self) -> bool {
        matches!(self, IndexBuffer::U32(_))
    }

    pub fn format(&self) -> IndexFormat {
        if self.is_u32() { IndexFormat::U32 } else { IndexFormat::U16 }
    }

    pub fn index_size(&self) -> usize {
        self.format().size()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexBuffer::U16(v) => bytemuck::cast_slice(v),
            IndexBuffer::U32(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexBuffer::U16(v) => v.get(i).map(|&x| x as u32),
            IndexBuffer::U32(v) => v.get(i).copied(),
        }
    }
}

/// Caller-supplied per-vertex data that replaces the generated values
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexOverrides<'a> {
    pub colors: Option<&'a [[f32; 4]]>,
    pub normals: Option<&'a [[f32; 3]]>,
}

/// Interleaved vertices plus edge and face indices
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryBuffers {
    pub vertices: Vec<f32>,
    pub attributes: VertexAttributes,
    pub position_components: usize,
    pub vertex_count: usize,
    /// Line list, two indices per edge
    pub edge_indices: IndexBuffer,
    /// Triangle list
    pub face_indices: IndexBuffer,
}

impl GeometryBuffers {
    pub fn stride_floats(&self) -> usize {
        if self.vertex_count == 0 {
            return 0;
        }
        self.vertices.len() / self.vertex_count
    }

    pub fn stride_bytes(&self) -> usize {
        self.stride_floats() * std::mem::size_of::<f32>()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_layout(&self) -> VertexLayout {
        VertexLayout::from_attributes(self.attributes, self.position_components)
    }

    /// Indices for drawing with `topology`
    pub fn indices(&self, topology: Topology) -> &IndexBuffer {
        match topology {
            Topology::Lines => &self.edge_indices,
            Topology::Triangles => &self.face_indices,
        }
    }

    /// The interleaved floats of vertex `i`
    pub fn vertex(&self, i: usize) -> Option<&[f32]> {
        let stride = self.stride_floats();
        self.vertices.get(i * stride..(i + 1) * stride)
    }
}

/// Build buffers from generated data only
pub fn build_buffers(geometry: &Geometry4D, layout: &BufferLayout) -> GeometryBuffers {
    build_buffers_with(geometry, layout, VertexOverrides::default())
}

/// Build buffers, taking colors or normals from `overrides` where given
///
/// Override slices whose length differs from the vertex count are ignored.
pub fn build_buffers_with(
    geometry: &Geometry4D,
    layout: &BufferLayout,
    overrides: VertexOverrides<'_>,
) -> GeometryBuffers {
    let count = geometry.vertex_count();
    let colors = overrides.colors.filter(|c| usable_override(c.len(), count, "colors"));
    let normals = overrides.normals.filter(|n| usable_override(n.len(), count, "normals"));

    let mut attributes = layout.attributes();
    if colors.is_some() {
        attributes |= VertexAttributes::COLOR;
    }
    let stride = layout.stride_floats()
        + if colors.is_some() && layout.color.is_none() { 4 } else { 0 };

    let positions: Vec<[f32; 4]> = match (layout.components, layout.projection) {
        (Components::Xyzw, _) => geometry.vertices.iter().map(|v| v.to_array()).collect(),
        (Components::Xyz, Some(projection)) => projection
            .project_batch(&geometry.vertices)
            .into_iter()
            .map(|[x, y, z]| [x, y, z, 0.0])
            .collect(),
        (Components::Xyz, None) => geometry
            .vertices
            .iter()
            .map(|v| [v.x, v.y, v.z, 0.0])
            .collect(),
    };
    let centroid = geometry.centroid();

    let mut vertices = Vec::with_capacity(count * stride);
    for (i, v) in geometry.vertices.iter().enumerate() {
        vertices.extend_from_slice(&positions[i][..layout.components.count()]);
        if layout.include_normals {
            let normal = match normals {
                Some(n) => n[i],
                None => centroid_normal(*v, centroid),
            };
            vertices.extend_from_slice(&normal);
        }
        if attributes.contains(VertexAttributes::COLOR) {
            let color = match colors {
                Some(c) => c[i],
                None => layout.color.color_for(i, count, *v),
            };
            vertices.extend_from_slice(&color);
        }
    }

    let edges: Vec<u32> = geometry.edges.iter().flat_map(|e| e.iter().copied()).collect();
    let faces = triangulate_faces(&geometry.faces);

    log::debug!(
        "Built buffers for '{}': {} vertices, {} edge and {} face indices",
        geometry.name,
        count,
        edges.len(),
        faces.len()
    );

    GeometryBuffers {
        vertices,
        attributes,
        position_components: layout.components.count(),
        vertex_count: count,
        edge_indices: IndexBuffer::from_indices(edges, count),
        face_indices: IndexBuffer::from_indices(faces, count),
    }
}

fn usable_override(len: usize, count: usize, what: &str) -> bool {
    if len != count {
        log::warn!("Ignoring {} override: {} entries for {} vertices", what, len, count);
        return false;
    }
    true
}

/// Unit xyz direction from the centroid; straight up at the centroid itself
fn centroid_normal(v: Vec4, centroid: Vec4) -> [f32; 3] {
    let d = v - centroid;
    Vec4::new(d.x, d.y, d.z, 0.0)
        .try_normalized()
        .unwrap_or(Vec4::Y)
        .xyz()
}

/// Fan-triangulate polygons; faces with fewer than 3 indices are skipped
pub fn triangulate_faces(faces: &[Vec<u32>]) -> Vec<u32> {
    let mut out = Vec::new();
    for face in faces {
        if face.len() < 3 {
            continue;
        }
        let first = face[0];
        for pair in face[1..].windows(2) {
            out.extend_from_slice(&[first, pair[0], pair[1]]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn square() -> Geometry4D {
        let mut g = Geometry4D::new("square");
        g.vertices = vec![
            Vec4::new(-1.0, -1.0, 0.0, -1.0),
            Vec4::new(1.0, -1.0, 0.0, 0.0),
            Vec4::new(1.0, 1.0, 0.0, 1.0),
            Vec4::new(-1.0, 1.0, 0.0, 0.0),
        ];
        g.edges = vec![[0, 1], [1, 2], [2, 3], [3, 0]];
        g.faces = vec![vec![0, 1, 2, 3]];
        g
    }

    #[test]
    fn test_position_only_stride() {
        let layout = BufferLayout { projection: None, ..Default::default() };
        let buffers = build_buffers(&square(), &layout);
        assert_eq!(buffers.stride_floats(), 3);
        assert_eq!(buffers.stride_bytes(), 12);
        assert_eq!(buffers.attributes, VertexAttributes::POSITION);
        assert_eq!(buffers.vertex(2), Some(&[1.0, 1.0, 0.0][..]));
    }

    #[test]
    fn test_full_layout_stride() {
        let layout = BufferLayout {
            components: Components::Xyzw,
            include_normals: true,
            color: ColorPolicy::Uniform { rgba: [0.1, 0.2, 0.3, 1.0] },
            projection: None,
        };
        let buffers = build_buffers(&square(), &layout);
        assert_eq!(buffers.stride_floats(), 4 + 3 + 4);
        assert!(buffers.attributes.contains(VertexAttributes::NORMAL | VertexAttributes::COLOR));
        let v0 = buffers.vertex(0).unwrap();
        assert_eq!(&v0[..4], &[-1.0, -1.0, 0.0, -1.0]);
        assert_eq!(&v0[7..], &[0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn test_projection_applied_to_xyz() {
        let layout = BufferLayout {
            projection: Some(Projection::Perspective { distance: 2.0 }),
            ..Default::default()
        };
        let buffers = build_buffers(&square(), &layout);
        // w = 1 at distance 2 doubles the coordinates
        let v2 = buffers.vertex(2).unwrap();
        assert!(approx_eq(v2[0], 2.0), "Expected 2.0, got {}", v2[0]);
        assert!(approx_eq(v2[1], 2.0), "Expected 2.0, got {}", v2[1]);
    }

    #[test]
    fn test_edges_as_line_list() {
        let buffers = build_buffers(&square(), &BufferLayout::default());
        assert_eq!(buffers.edge_indices, IndexBuffer::U16(vec![0, 1, 1, 2, 2, 3, 3, 0]));
    }

    #[test]
    fn test_fan_triangulation() {
        let tris = triangulate_faces(&[vec![0, 1, 2, 3, 4], vec![5, 6], vec![7, 8, 9]]);
        assert_eq!(tris, vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 7, 8, 9]);
    }

    #[test]
    fn test_wide_indices_above_u16_range() {
        let mut g = Geometry4D::new("cloud");
        g.vertices = vec![Vec4::ZERO; MAX_U16_VERTICES + 1];
        g.edges = vec![[0, MAX_U16_VERTICES as u32]];
        let buffers = build_buffers(&g, &BufferLayout::default());
        assert!(buffers.edge_indices.is_u32());
        assert_eq!(buffers.edge_indices.get(1), Some(MAX_U16_VERTICES as u32));
        assert_eq!(buffers.edge_indices.as_bytes().len(), 8);

        g.vertices.truncate(MAX_U16_VERTICES);
        g.edges = vec![[0, 1]];
        let buffers = build_buffers(&g, &BufferLayout::default());
        assert!(!buffers.edge_indices.is_u32());
        assert_eq!(buffers.edge_indices.index_size(), 2);
    }

    #[test]
    fn test_w_depth_colors() {
        let near = [1.0, 0.0, 0.0, 1.0];
        let mid = [0.0, 1.0, 0.0, 1.0];
        let far = [0.0, 0.0, 1.0, 1.0];
        let policy = ColorPolicy::WDepth { near, mid, far, w_range: 2.0 };

        assert_eq!(policy.color_for(0, 1, Vec4::new(0.0, 0.0, 0.0, -2.0)), near);
        assert_eq!(policy.color_for(0, 1, Vec4::ZERO), mid);
        assert_eq!(policy.color_for(0, 1, Vec4::new(0.0, 0.0, 0.0, 5.0)), far);

        let half = policy.color_for(0, 1, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(approx_eq(half[1], 0.5) && approx_eq(half[2], 0.5));
    }

    #[test]
    fn test_rainbow_starts_red() {
        let policy = ColorPolicy::Rainbow { saturation: 1.0, lightness: 0.5 };
        let c = policy.color_for(0, 6, Vec4::ZERO);
        assert!(approx_eq(c[0], 1.0) && approx_eq(c[1], 0.0) && approx_eq(c[2], 0.0));
        // One third of the way round is green
        let c = policy.color_for(2, 6, Vec4::ZERO);
        assert!(approx_eq(c[1], 1.0) && approx_eq(c[0], 0.0), "Expected green, got {:?}", c);
    }

    #[test]
    fn test_normals_are_unit_from_centroid() {
        let layout = BufferLayout { include_normals: true, projection: None, ..Default::default() };
        let buffers = build_buffers(&square(), &layout);
        let v0 = buffers.vertex(0).unwrap();
        let n = &v0[3..6];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!(approx_eq(len, 1.0), "Expected unit normal, got length {}", len);
        assert!(n[0] < 0.0 && n[1] < 0.0);
    }

    #[test]
    fn test_color_override() {
        let colors = vec![[0.5, 0.5, 0.5, 1.0]; 4];
        let buffers = build_buffers_with(
            &square(),
            &BufferLayout { projection: None, ..Default::default() },
            VertexOverrides { colors: Some(&colors), normals: None },
        );
        assert_eq!(buffers.stride_floats(), 7);
        assert_eq!(&buffers.vertex(3).unwrap()[3..], &[0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_mismatched_override_ignored() {
        let colors = vec![[0.5; 4]; 3];
        let buffers = build_buffers_with(
            &square(),
            &BufferLayout::default(),
            VertexOverrides { colors: Some(&colors), normals: None },
        );
        assert_eq!(buffers.stride_floats(), 3);
    }

    #[test]
    fn test_vertex_layout_offsets() {
        let layout = BufferLayout {
            components: Components::Xyzw,
            include_normals: true,
            color: ColorPolicy::Uniform { rgba: [1.0; 4] },
            projection: None,
        };
        let vertex = layout.vertex_layout();
        assert_eq!(vertex.position_components, 4);
        assert_eq!(vertex.normal_offset, Some(4));
        assert_eq!(vertex.color_offset, Some(7));
        assert_eq!(vertex.stride_floats as usize, layout.stride_floats());
        assert_eq!(vertex.stride_bytes(), 44);
    }

    #[test]
    fn test_override_colors_show_in_built_layout() {
        let colors = vec![[0.5; 4]; 4];
        let layout = BufferLayout { projection: None, ..Default::default() };
        let buffers = build_buffers_with(
            &square(),
            &layout,
            VertexOverrides { colors: Some(&colors), normals: None },
        );
        assert_eq!(layout.vertex_layout().color_offset, None);
        assert_eq!(buffers.vertex_layout().color_offset, Some(3));
        assert_eq!(buffers.vertex_layout().stride_floats as usize, buffers.stride_floats());
    }

    #[test]
    fn test_indices_by_topology() {
        let buffers = build_buffers(&square(), &BufferLayout::default());
        assert_eq!(buffers.indices(Topology::Lines).len(), 8);
        assert_eq!(buffers.indices(Topology::Triangles).len(), 6);
        assert_eq!(buffers.indices(Topology::Lines).format(), IndexFormat::U16);
    }
}
