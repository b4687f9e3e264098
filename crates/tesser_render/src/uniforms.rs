//! Shader uniform set and its two backend encodings
//!
//! [`ShaderUniforms`] is the one record callers fill in. Backends consume it
//! in one of two shapes:
//!
//! - WebGL-style backends set each uniform by name from [`ShaderUniforms::gl_values`]
//! - WebGPU-style backends upload [`PackedUniforms`], a 256-byte block whose
//!   offsets are listed in [`UNIFORM_LAYOUT`]
//!
//! Hue is given in degrees and converted to a unit fraction in both paths.
//!
//! ## Packed layout
//!
//! Fields are only ever appended (taking space from `_reserved`), never
//! inserted or reordered, so shaders compiled against an older layout keep
//! reading the same offsets.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tesser_geometry::GeometryIndex;
use tesser_math::RotationAngles;

use crate::RenderError;

/// Size of the packed uniform block in bytes
pub const PACKED_UNIFORM_SIZE: usize = 256;

/// Uniform name and byte offset inside [`PackedUniforms`], in field order
pub const UNIFORM_LAYOUT: [(&str, usize); 22] = [
    ("u_time", 0),
    ("u_resolution", 8),
    ("u_geometry", 16),
    ("u_rot4dXY", 20),
    ("u_rot4dXZ", 24),
    ("u_rot4dYZ", 28),
    ("u_rot4dXW", 32),
    ("u_rot4dYW", 36),
    ("u_rot4dZW", 40),
    ("u_dimension", 44),
    ("u_gridDensity", 48),
    ("u_morphFactor", 52),
    ("u_chaos", 56),
    ("u_speed", 60),
    ("u_hue", 64),
    ("u_intensity", 68),
    ("u_saturation", 72),
    ("u_mouseIntensity", 76),
    ("u_clickIntensity", 80),
    ("u_bass", 84),
    ("u_mid", 88),
    ("u_high", 92),
];

/// Convert hue in degrees to `[0, 1)`, wrapping out-of-range values
pub fn hue_fraction(degrees: f32) -> f32 {
    let f = degrees.rem_euclid(360.0) / 360.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if f >= 1.0 { 0.0 } else { f }
}

/// One value for a per-name uniform call
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec2([f32; 2]),
    I32(i32),
}

/// Every uniform the visualizer shaders read
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderUniforms {
    /// Seconds since start
    pub time: f32,
    /// Drawable size in pixels
    pub resolution: [f32; 2],
    /// Combined geometry index, must be in 0-23
    pub geometry: i32,
    /// One angle per rotation plane, in radians
    pub rotation: RotationAngles,
    /// 4D perspective distance used by the shader's projection
    pub dimension: f32,
    pub grid_density: f32,
    pub morph_factor: f32,
    pub chaos: f32,
    pub speed: f32,
    /// Hue in degrees
    pub hue: f32,
    pub intensity: f32,
    pub saturation: f32,
    pub mouse_intensity: f32,
    pub click_intensity: f32,
    /// Audio band levels in 0-1
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

impl Default for ShaderUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            resolution: [1280.0, 720.0],
            geometry: GeometryIndex::default().value() as i32,
            rotation: RotationAngles::default(),
            dimension: 3.5,
            grid_density: 15.0,
            morph_factor: 1.0,
            chaos: 0.2,
            speed: 1.0,
            hue: 200.0,
            intensity: 0.5,
            saturation: 0.8,
            mouse_intensity: 0.0,
            click_intensity: 0.0,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
        }
    }
}

impl ShaderUniforms {
    /// Check the geometry index, returning it in validated form
    pub fn validate(&self) -> Result<GeometryIndex, RenderError> {
        Ok(GeometryIndex::try_from(self.geometry)?)
    }

    /// Build the 256-byte block for buffer-based backends
    pub fn pack(&self) -> PackedUniforms {
        let r = &self.rotation;
        PackedUniforms {
            time: self.time,
            _pad0: 0.0,
            resolution: self.resolution,
            geometry: self.geometry as f32,
            rot4d_xy: r.xy,
            rot4d_xz: r.xz,
            rot4d_yz: r.yz,
            rot4d_xw: r.xw,
            rot4d_yw: r.yw,
            rot4d_zw: r.zw,
            dimension: self.dimension,
            grid_density: self.grid_density,
            morph_factor: self.morph_factor,
            chaos: self.chaos,
            speed: self.speed,
            hue: hue_fraction(self.hue),
            intensity: self.intensity,
            saturation: self.saturation,
            mouse_intensity: self.mouse_intensity,
            click_intensity: self.click_intensity,
            bass: self.bass,
            mid: self.mid,
            high: self.high,
            _reserved: [[0.0; 4]; 10],
        }
    }

    /// Name/value pairs for per-uniform backends, in [`UNIFORM_LAYOUT`] order
    pub fn gl_values(&self) -> Vec<(&'static str, UniformValue)> {
        use UniformValue::{F32, I32, Vec2};
        let r = &self.rotation;
        vec![
            ("u_time", F32(self.time)),
            ("u_resolution", Vec2(self.resolution)),
            ("u_geometry", I32(self.geometry)),
            ("u_rot4dXY", F32(r.xy)),
            ("u_rot4dXZ", F32(r.xz)),
            ("u_rot4dYZ", F32(r.yz)),
            ("u_rot4dXW", F32(r.xw)),
            ("u_rot4dYW", F32(r.yw)),
            ("u_rot4dZW", F32(r.zw)),
            ("u_dimension", F32(self.dimension)),
            ("u_gridDensity", F32(self.grid_density)),
            ("u_morphFactor", F32(self.morph_factor)),
            ("u_chaos", F32(self.chaos)),
            ("u_speed", F32(self.speed)),
            ("u_hue", F32(hue_fraction(self.hue))),
            ("u_intensity", F32(self.intensity)),
            ("u_saturation", F32(self.saturation)),
            ("u_mouseIntensity", F32(self.mouse_intensity)),
            ("u_clickIntensity", F32(self.click_intensity)),
            ("u_bass", F32(self.bass)),
            ("u_mid", F32(self.mid)),
            ("u_high", F32(self.high)),
        ]
    }
}

/// Uniform block for buffer-based backends
/// Layout: 256 bytes total (must match visualizer.wgsl Uniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedUniforms {
    pub time: f32,
    /// Aligns `resolution` to 8 bytes
    pub _pad0: f32,
    pub resolution: [f32; 2],
    pub geometry: f32,
    pub rot4d_xy: f32,
    pub rot4d_xz: f32,
    pub rot4d_yz: f32,
    pub rot4d_xw: f32,
    pub rot4d_yw: f32,
    pub rot4d_zw: f32,
    pub dimension: f32,
    pub grid_density: f32,
    pub morph_factor: f32,
    pub chaos: f32,
    pub speed: f32,
    /// Unit fraction, not degrees
    pub hue: f32,
    pub intensity: f32,
    pub saturation: f32,
    pub mouse_intensity: f32,
    pub click_intensity: f32,
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    /// Space for appended fields
    pub _reserved: [[f32; 4]; 10],
}

impl Default for PackedUniforms {
    fn default() -> Self {
        ShaderUniforms::default().pack()
    }
}

impl PackedUniforms {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    const EPSILON: f32 = 0.0001;

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn test_packed_size() {
        assert_eq!(size_of::<PackedUniforms>(), PACKED_UNIFORM_SIZE);
    }

    #[test]
    fn test_layout_matches_struct_offsets() {
        let offsets = [
            offset_of!(PackedUniforms, time),
            offset_of!(PackedUniforms, resolution),
            offset_of!(PackedUniforms, geometry),
            offset_of!(PackedUniforms, rot4d_xy),
            offset_of!(PackedUniforms, rot4d_xz),
            offset_of!(PackedUniforms, rot4d_yz),
            offset_of!(PackedUniforms, rot4d_xw),
            offset_of!(PackedUniforms, rot4d_yw),
            offset_of!(PackedUniforms, rot4d_zw),
            offset_of!(PackedUniforms, dimension),
            offset_of!(PackedUniforms, grid_density),
            offset_of!(PackedUniforms, morph_factor),
            offset_of!(PackedUniforms, chaos),
            offset_of!(PackedUniforms, speed),
            offset_of!(PackedUniforms, hue),
            offset_of!(PackedUniforms, intensity),
            offset_of!(PackedUniforms, saturation),
            offset_of!(PackedUniforms, mouse_intensity),
            offset_of!(PackedUniforms, click_intensity),
            offset_of!(PackedUniforms, bass),
            offset_of!(PackedUniforms, mid),
            offset_of!(PackedUniforms, high),
        ];
        for ((name, expected), actual) in UNIFORM_LAYOUT.iter().zip(offsets) {
            assert_eq!(*expected, actual, "Offset mismatch for {}", name);
        }
        assert_eq!(offset_of!(PackedUniforms, _reserved), 96);
    }

    #[test]
    fn test_layout_and_gl_values_share_order() {
        let values = ShaderUniforms::default().gl_values();
        assert_eq!(values.len(), UNIFORM_LAYOUT.len());
        for ((gl_name, _), (layout_name, _)) in values.iter().zip(UNIFORM_LAYOUT.iter()) {
            assert_eq!(gl_name, layout_name);
        }
    }

    #[test]
    fn test_hue_fraction() {
        assert!((hue_fraction(180.0) - 0.5).abs() < EPSILON);
        assert!((hue_fraction(0.0)).abs() < EPSILON);
        assert!((hue_fraction(360.0)).abs() < EPSILON);
        assert!((hue_fraction(450.0) - 0.25).abs() < EPSILON);
        assert!((hue_fraction(-90.0) - 0.75).abs() < EPSILON);
        assert!(hue_fraction(-1e-7) < 1.0);
    }

    #[test]
    fn test_pack_converts_hue_and_geometry() {
        let uniforms = ShaderUniforms {
            hue: 90.0,
            geometry: 11,
            time: 2.5,
            resolution: [800.0, 600.0],
            ..Default::default()
        };
        let packed = uniforms.pack();
        assert!((packed.hue - 0.25).abs() < EPSILON);
        assert_eq!(packed.geometry, 11.0);

        let bytes = packed.as_bytes();
        assert_eq!(bytes.len(), 256);
        assert_eq!(read_f32(bytes, 0), 2.5);
        assert_eq!(read_f32(bytes, 8), 800.0);
        assert_eq!(read_f32(bytes, 12), 600.0);
        assert_eq!(read_f32(bytes, 16), 11.0);
        assert!((read_f32(bytes, 64) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_pack_rotation_order() {
        let uniforms = ShaderUniforms {
            rotation: RotationAngles::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0),
            ..Default::default()
        };
        let packed = uniforms.pack();
        let bytes = packed.as_bytes();
        for (i, expected) in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0].iter().enumerate() {
            assert_eq!(read_f32(bytes, 20 + i * 4), *expected);
        }
    }

    #[test]
    fn test_gl_values_convert_hue() {
        let uniforms = ShaderUniforms { hue: 270.0, geometry: 5, ..Default::default() };
        let values = uniforms.gl_values();
        let hue = values.iter().find(|(n, _)| *n == "u_hue").map(|(_, v)| *v);
        assert_eq!(hue, Some(UniformValue::F32(0.75)));
        let geometry = values.iter().find(|(n, _)| *n == "u_geometry").map(|(_, v)| *v);
        assert_eq!(geometry, Some(UniformValue::I32(5)));
    }

    #[test]
    fn test_validate_geometry_range() {
        let mut uniforms = ShaderUniforms::default();
        assert!(uniforms.validate().is_ok());
        uniforms.geometry = 23;
        assert_eq!(uniforms.validate().unwrap().value(), 23);
        uniforms.geometry = 24;
        assert!(matches!(uniforms.validate(), Err(RenderError::InvalidUniforms(_))));
        uniforms.geometry = -1;
        assert!(uniforms.validate().is_err());
    }

    #[test]
    fn test_reserved_is_zeroed() {
        let packed = ShaderUniforms::default().pack();
        assert!(packed._reserved.iter().flatten().all(|&v| v == 0.0));
    }
}
