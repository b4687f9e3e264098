//! 4D rotors for representing rotations in 4D space
//!
//! In 4D, rotations happen in planes rather than around axes. There are six
//! coordinate planes: XY, XZ, YZ, XW, YW, ZW.
//!
//! A rotor is an even-grade multivector with 8 components:
//! - 1 scalar
//! - 6 bivectors (one for each plane)
//! - 1 pseudoscalar (e1234)
//!
//! Vectors are rotated with the sandwich product `v' = R v R†`. Composing
//! rotors is the geometric product, and `a * b` rotates by `b` first, matching
//! the matrix convention in [`Mat4`].
//!
//! ## Plane order
//!
//! Six plane angles always combine as the ordered product
//! `R = R_xy · R_xz · R_yz · R_xw · R_yw · R_zw`. Rotations in planes that
//! share an axis do not commute, so this order is part of the contract.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::{Mat4, Vec4};

/// The 6 rotation planes in 4D space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationPlane {
    XY,
    XZ,
    YZ,
    XW,
    YW,
    ZW,
}

impl RotationPlane {
    /// All planes, in composition order
    pub const ALL: [RotationPlane; 6] = [
        RotationPlane::XY,
        RotationPlane::XZ,
        RotationPlane::YZ,
        RotationPlane::XW,
        RotationPlane::YW,
        RotationPlane::ZW,
    ];

    /// Axis indices spanning the plane. The first axis rotates towards the second.
    pub const fn axes(self) -> (usize, usize) {
        match self {
            RotationPlane::XY => (0, 1),
            RotationPlane::XZ => (0, 2),
            RotationPlane::YZ => (1, 2),
            RotationPlane::XW => (0, 3),
            RotationPlane::YW => (1, 3),
            RotationPlane::ZW => (2, 3),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RotationPlane::XY => "XY",
            RotationPlane::XZ => "XZ",
            RotationPlane::YZ => "YZ",
            RotationPlane::XW => "XW",
            RotationPlane::YW => "YW",
            RotationPlane::ZW => "ZW",
        }
    }
}

/// One angle per rotation plane, in radians
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationAngles {
    pub xy: f32,
    pub xz: f32,
    pub yz: f32,
    pub xw: f32,
    pub yw: f32,
    pub zw: f32,
}

impl RotationAngles {
    pub const fn new(xy: f32, xz: f32, yz: f32, xw: f32, yw: f32, zw: f32) -> Self {
        Self { xy, xz, yz, xw, yw, zw }
    }

    pub fn get(&self, plane: RotationPlane) -> f32 {
        match plane {
            RotationPlane::XY => self.xy,
            RotationPlane::XZ => self.xz,
            RotationPlane::YZ => self.yz,
            RotationPlane::XW => self.xw,
            RotationPlane::YW => self.yw,
            RotationPlane::ZW => self.zw,
        }
    }

    pub fn set(&mut self, plane: RotationPlane, angle: f32) {
        match plane {
            RotationPlane::XY => self.xy = angle,
            RotationPlane::XZ => self.xz = angle,
            RotationPlane::YZ => self.yz = angle,
            RotationPlane::XW => self.xw = angle,
            RotationPlane::YW => self.yw = angle,
            RotationPlane::ZW => self.zw = angle,
        }
    }

    /// Angles in composition order
    pub fn to_array(&self) -> [f32; 6] {
        [self.xy, self.xz, self.yz, self.xw, self.yw, self.zw]
    }

    /// Advance every angle by `rate * dt`, wrapping into `[0, 2π)`
    pub fn advanced(&self, rates: &RotationAngles, dt: f32) -> Self {
        let mut out = *self;
        for plane in RotationPlane::ALL {
            let a = self.get(plane) + rates.get(plane) * dt;
            out.set(plane, a.rem_euclid(std::f32::consts::TAU));
        }
        out
    }
}

/// 4D rotor
///
/// `R = s + b_xy·e12 + b_xz·e13 + b_xw·e14 + b_yz·e23 + b_yw·e24 + b_zw·e34 + p·e1234`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rotor4 {
    /// Scalar component
    pub s: f32,
    /// XY bivector (e12)
    pub b_xy: f32,
    /// XZ bivector (e13)
    pub b_xz: f32,
    /// XW bivector (e14)
    pub b_xw: f32,
    /// YZ bivector (e23)
    pub b_yz: f32,
    /// YW bivector (e24)
    pub b_yw: f32,
    /// ZW bivector (e34)
    pub b_zw: f32,
    /// Pseudoscalar (e1234)
    pub p: f32,
}

impl Default for Rotor4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotor4 {
    /// Identity rotor (no rotation)
    pub const IDENTITY: Self = Self::from_array([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

    /// Components in storage order `[s, xy, xz, xw, yz, yw, zw, p]`
    pub const fn from_array(a: [f32; 8]) -> Self {
        Self {
            s: a[0],
            b_xy: a[1],
            b_xz: a[2],
            b_xw: a[3],
            b_yz: a[4],
            b_yw: a[5],
            b_zw: a[6],
            p: a[7],
        }
    }

    pub const fn to_array(&self) -> [f32; 8] {
        [self.s, self.b_xy, self.b_xz, self.b_xw, self.b_yz, self.b_yw, self.b_zw, self.p]
    }

    /// Rotor for a rotation by `angle` radians in a single plane
    ///
    /// `R = cos(θ/2) - sin(θ/2)·B`, where B is the unit bivector of the plane.
    pub fn from_plane_angle(plane: RotationPlane, angle: f32) -> Self {
        let (sin_h, cos_h) = (angle * 0.5).sin_cos();

        let mut r = Self::IDENTITY;
        r.s = cos_h;
        match plane {
            RotationPlane::XY => r.b_xy = -sin_h,
            RotationPlane::XZ => r.b_xz = -sin_h,
            RotationPlane::XW => r.b_xw = -sin_h,
            RotationPlane::YZ => r.b_yz = -sin_h,
            RotationPlane::YW => r.b_yw = -sin_h,
            RotationPlane::ZW => r.b_zw = -sin_h,
        }
        r
    }

    /// Ordered product of the six elementary rotors (see module docs)
    pub fn from_angles(angles: &RotationAngles) -> Self {
        RotationPlane::ALL
            .iter()
            .filter(|&&plane| angles.get(plane) != 0.0)
            .fold(Self::IDENTITY, |acc, &plane| {
                acc.compose(&Self::from_plane_angle(plane, angles.get(plane)))
            })
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    pub fn is_normalized(&self, epsilon: f32) -> bool {
        (self.magnitude_squared() - 1.0).abs() < epsilon
    }

    fn scaled(&self, k: f32) -> Self {
        let a = self.to_array();
        Self::from_array(a.map(|c| c * k))
    }

    /// Normalize to unit magnitude. A zero rotor normalizes to the identity.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            self.scaled(1.0 / mag)
        } else {
            Self::IDENTITY
        }
    }

    /// Reverse (R†): negates the bivector part, keeps scalar and pseudoscalar
    pub fn reverse(&self) -> Self {
        Self {
            s: self.s,
            b_xy: -self.b_xy,
            b_xz: -self.b_xz,
            b_xw: -self.b_xw,
            b_yz: -self.b_yz,
            b_yw: -self.b_yw,
            b_zw: -self.b_zw,
            p: self.p,
        }
    }

    /// Multiplicative inverse, `R† / |R|²`. The identity for a zero rotor.
    pub fn inverse(&self) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq > 0.0 {
            self.reverse().scaled(1.0 / mag_sq)
        } else {
            Self::IDENTITY
        }
    }

    /// Rotate a vector with the sandwich product `v' = R v R†`
    pub fn rotate(&self, v: Vec4) -> Vec4 {
        let Self { s, b_xy, b_xz, b_xw, b_yz, b_yw, b_zw, p } = *self;
        let Vec4 { x, y, z, w } = v;

        // q = R v has a vector part and a trivector part
        let qx = s * x + b_xy * y + b_xz * z + b_xw * w;
        let qy = s * y - b_xy * x + b_yz * z + b_yw * w;
        let qz = s * z - b_xz * x - b_yz * y + b_zw * w;
        let qw = s * w - b_xw * x - b_yw * y - b_zw * z;
        let t_xyz = b_xy * z - b_xz * y + b_yz * x + p * w;
        let t_xyw = b_xy * w - b_xw * y + b_yw * x - p * z;
        let t_xzw = b_xz * w - b_xw * z + b_zw * x + p * y;
        let t_yzw = b_yz * w - b_yw * z + b_zw * y - p * x;

        // vector part of q R†
        Vec4::new(
            s * qx + b_xy * qy + b_xz * qz + b_xw * qw
                + b_yz * t_xyz + b_yw * t_xyw + b_zw * t_xzw + p * t_yzw,
            s * qy - b_xy * qx + b_yz * qz + b_yw * qw
                - b_xz * t_xyz - b_xw * t_xyw + b_zw * t_yzw - p * t_xzw,
            s * qz - b_xz * qx - b_yz * qy + b_zw * qw
                + b_xy * t_xyz - b_xw * t_xzw - b_yw * t_yzw + p * t_xyw,
            s * qw - b_xw * qx - b_yw * qy - b_zw * qz
                + b_xy * t_xyw + b_xz * t_xzw + b_yz * t_yzw - p * t_xyz,
        )
    }

    /// Geometric product `self * other`. The result applies `other` first.
    pub fn compose(&self, other: &Self) -> Self {
        let a = self;
        let b = other;

        let s = a.s * b.s
            - a.b_xy * b.b_xy
            - a.b_xz * b.b_xz
            - a.b_xw * b.b_xw
            - a.b_yz * b.b_yz
            - a.b_yw * b.b_yw
            - a.b_zw * b.b_zw
            + a.p * b.p;

        let b_xy = a.s * b.b_xy + a.b_xy * b.s
            - a.b_xz * b.b_yz + a.b_yz * b.b_xz
            - a.b_xw * b.b_yw + a.b_yw * b.b_xw
            - a.b_zw * b.p - a.p * b.b_zw;

        let b_xz = a.s * b.b_xz + a.b_xz * b.s
            + a.b_xy * b.b_yz - a.b_yz * b.b_xy
            - a.b_xw * b.b_zw + a.b_zw * b.b_xw
            + a.b_yw * b.p + a.p * b.b_yw;

        let b_xw = a.s * b.b_xw + a.b_xw * b.s
            + a.b_xy * b.b_yw - a.b_yw * b.b_xy
            + a.b_xz * b.b_zw - a.b_zw * b.b_xz
            - a.b_yz * b.p - a.p * b.b_yz;

        let b_yz = a.s * b.b_yz + a.b_yz * b.s
            - a.b_xy * b.b_xz + a.b_xz * b.b_xy
            - a.b_yw * b.b_zw + a.b_zw * b.b_yw
            - a.b_xw * b.p - a.p * b.b_xw;

        let b_yw = a.s * b.b_yw + a.b_yw * b.s
            - a.b_xy * b.b_xw + a.b_xw * b.b_xy
            + a.b_yz * b.b_zw - a.b_zw * b.b_yz
            + a.b_xz * b.p + a.p * b.b_xz;

        let b_zw = a.s * b.b_zw + a.b_zw * b.s
            - a.b_xz * b.b_xw + a.b_xw * b.b_xz
            - a.b_yz * b.b_yw + a.b_yw * b.b_yz
            - a.b_xy * b.p - a.p * b.b_xy;

        let p = a.s * b.p + a.p * b.s
            + a.b_xy * b.b_zw + a.b_zw * b.b_xy
            - a.b_xz * b.b_yw - a.b_yw * b.b_xz
            + a.b_xw * b.b_yz + a.b_yz * b.b_xw;

        Self { s, b_xy, b_xz, b_xw, b_yz, b_yw, b_zw, p }
    }

    /// Normalized linear interpolation
    pub fn nlerp(&self, other: &Self, t: f32) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        Self::from_array(std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)).normalize()
    }

    /// Spherical interpolation along the shorter arc
    pub fn slerp(&self, other: &Self, t: f32) -> Self {
        let mut d = self.dot(other);
        let mut end = *other;
        if d < 0.0 {
            d = -d;
            end = end.scaled(-1.0);
        }

        // nearly parallel, sin(theta) is too small to divide by
        if d > 0.9995 {
            return self.nlerp(&end, t);
        }

        let theta = d.acos();
        let sin_theta = theta.sin();
        let w1 = ((1.0 - t) * theta).sin() / sin_theta;
        let w2 = (t * theta).sin() / sin_theta;

        let a = self.to_array();
        let b = end.to_array();
        Self::from_array(std::array::from_fn(|i| a[i] * w1 + b[i] * w2))
    }

    /// Equivalent rotation matrix; columns are the rotated basis vectors
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_col_vectors(
            self.rotate(Vec4::X),
            self.rotate(Vec4::Y),
            self.rotate(Vec4::Z),
            self.rotate(Vec4::W),
        )
    }
}

impl std::ops::Mul for Rotor4 {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        self.compose(&other)
    }
}

impl std::ops::MulAssign for Rotor4 {
    fn mul_assign(&mut self, other: Self) {
        *self = self.compose(&other);
    }
}
