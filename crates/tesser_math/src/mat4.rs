//! 4x4 matrices for 4D linear transforms
//!
//! Storage is column-major: `cols[c][r]` is row `r` of column `c`, which is
//! also the order the GPU expects for a `mat4x4<f32>` uniform. Matrices act on
//! column vectors, so `a * b * v` applies `b` first.
//!
//! The six `rotation_*` constructors each touch only the 2x2 block of their
//! plane, rotating the first axis of the plane towards the second.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::rotor4::{RotationAngles, RotationPlane};
use crate::Vec4;

/// Determinants smaller than this are treated as singular.
pub const SINGULAR_EPSILON: f32 = 1e-10;

/// 4x4 matrix (column-major)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self::diagonal(1.0);
    pub const ZERO: Self = Self { cols: [[0.0; 4]; 4] };

    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    pub const fn diagonal(d: f32) -> Self {
        Self {
            cols: [
                [d, 0.0, 0.0, 0.0],
                [0.0, d, 0.0, 0.0],
                [0.0, 0.0, d, 0.0],
                [0.0, 0.0, 0.0, d],
            ],
        }
    }

    /// Build from four column vectors
    pub fn from_col_vectors(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self::from_cols([c0.to_array(), c1.to_array(), c2.to_array(), c3.to_array()])
    }

    /// Non-uniform scale along each axis
    pub fn scale(s: Vec4) -> Self {
        let mut m = Self::IDENTITY;
        for i in 0..4 {
            m.cols[i][i] = s[i];
        }
        m
    }

    /// Rotation by `angle` radians in the plane spanned by axes `a` and `b`
    /// (0=X, 1=Y, 2=Z, 3=W). Axis `a` rotates towards axis `b`.
    pub fn plane_rotation(angle: f32, a: usize, b: usize) -> Self {
        let (sn, cs) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[a][a] = cs;
        m.cols[b][b] = cs;
        m.cols[a][b] = sn;
        m.cols[b][a] = -sn;
        m
    }

    /// Elementary rotation in one of the six named planes
    pub fn rotation(plane: RotationPlane, angle: f32) -> Self {
        let (a, b) = plane.axes();
        Self::plane_rotation(angle, a, b)
    }

    pub fn rotation_xy(angle: f32) -> Self {
        Self::rotation(RotationPlane::XY, angle)
    }

    pub fn rotation_xz(angle: f32) -> Self {
        Self::rotation(RotationPlane::XZ, angle)
    }

    pub fn rotation_yz(angle: f32) -> Self {
        Self::rotation(RotationPlane::YZ, angle)
    }

    pub fn rotation_xw(angle: f32) -> Self {
        Self::rotation(RotationPlane::XW, angle)
    }

    pub fn rotation_yw(angle: f32) -> Self {
        Self::rotation(RotationPlane::YW, angle)
    }

    pub fn rotation_zw(angle: f32) -> Self {
        Self::rotation(RotationPlane::ZW, angle)
    }

    /// Ordered product `XY * XZ * YZ * XW * YW * ZW` of the six elementary
    /// rotations. Agrees with [`Rotor4::from_angles`](crate::Rotor4::from_angles).
    pub fn rotation_from_angles(angles: &RotationAngles) -> Self {
        RotationPlane::ALL
            .iter()
            .fold(Self::IDENTITY, |acc, &plane| acc * Self::rotation(plane, angles.get(plane)))
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.cols[col][row] = value;
    }

    pub fn col(&self, c: usize) -> Vec4 {
        Vec4::from_array(self.cols[c])
    }

    pub fn row(&self, r: usize) -> Vec4 {
        Vec4::new(self.cols[0][r], self.cols[1][r], self.cols[2][r], self.cols[3][r])
    }

    /// `self * v`
    pub fn mul_vec4(&self, v: Vec4) -> Vec4 {
        self.col(0) * v.x + self.col(1) * v.y + self.col(2) * v.z + self.col(3) * v.w
    }

    /// `self * other`; applies `other` first when used on vectors
    #[allow(clippy::needless_range_loop)]
    pub fn mul_mat4(&self, other: &Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for c in 0..4 {
            for r in 0..4 {
                for k in 0..4 {
                    out[c][r] += self.cols[k][r] * other.cols[c][k];
                }
            }
        }
        Self::from_cols(out)
    }

    pub fn transpose(&self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for c in 0..4 {
            for r in 0..4 {
                out[r][c] = self.cols[c][r];
            }
        }
        Self::from_cols(out)
    }

    /// 2x2 minors of the top and bottom row pairs, shared by
    /// [`determinant`](Self::determinant) and [`inverse`](Self::inverse)
    fn minors(&self) -> [f32; 12] {
        let a = |r, c| self.get(r, c);
        [
            a(0, 0) * a(1, 1) - a(0, 1) * a(1, 0),
            a(0, 0) * a(1, 2) - a(0, 2) * a(1, 0),
            a(0, 0) * a(1, 3) - a(0, 3) * a(1, 0),
            a(0, 1) * a(1, 2) - a(0, 2) * a(1, 1),
            a(0, 1) * a(1, 3) - a(0, 3) * a(1, 1),
            a(0, 2) * a(1, 3) - a(0, 3) * a(1, 2),
            a(2, 0) * a(3, 1) - a(2, 1) * a(3, 0),
            a(2, 0) * a(3, 2) - a(2, 2) * a(3, 0),
            a(2, 0) * a(3, 3) - a(2, 3) * a(3, 0),
            a(2, 1) * a(3, 2) - a(2, 2) * a(3, 1),
            a(2, 1) * a(3, 3) - a(2, 3) * a(3, 1),
            a(2, 2) * a(3, 3) - a(2, 3) * a(3, 2),
        ]
    }

    /// Determinant by cofactor expansion over 2x2 minors
    pub fn determinant(&self) -> f32 {
        let b = self.minors();
        b[0] * b[11] - b[1] * b[10] + b[2] * b[9] + b[3] * b[8] - b[4] * b[7] + b[5] * b[6]
    }

    /// Inverse via the adjugate.
    ///
    /// Returns `None` when `|det| < SINGULAR_EPSILON` instead of a matrix of
    /// non-finite values.
    pub fn inverse(&self) -> Option<Self> {
        let b = self.minors();
        let det = b[0] * b[11] - b[1] * b[10] + b[2] * b[9] + b[3] * b[8] - b[4] * b[7]
            + b[5] * b[6];
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let a = |r, c| self.get(r, c);

        let mut out = Self::ZERO;
        out.set(0, 0, (a(1, 1) * b[11] - a(1, 2) * b[10] + a(1, 3) * b[9]) * inv);
        out.set(0, 1, (-a(0, 1) * b[11] + a(0, 2) * b[10] - a(0, 3) * b[9]) * inv);
        out.set(0, 2, (a(3, 1) * b[5] - a(3, 2) * b[4] + a(3, 3) * b[3]) * inv);
        out.set(0, 3, (-a(2, 1) * b[5] + a(2, 2) * b[4] - a(2, 3) * b[3]) * inv);
        out.set(1, 0, (-a(1, 0) * b[11] + a(1, 2) * b[8] - a(1, 3) * b[7]) * inv);
        out.set(1, 1, (a(0, 0) * b[11] - a(0, 2) * b[8] + a(0, 3) * b[7]) * inv);
        out.set(1, 2, (-a(3, 0) * b[5] + a(3, 2) * b[2] - a(3, 3) * b[1]) * inv);
        out.set(1, 3, (a(2, 0) * b[5] - a(2, 2) * b[2] + a(2, 3) * b[1]) * inv);
        out.set(2, 0, (a(1, 0) * b[10] - a(1, 1) * b[8] + a(1, 3) * b[6]) * inv);
        out.set(2, 1, (-a(0, 0) * b[10] + a(0, 1) * b[8] - a(0, 3) * b[6]) * inv);
        out.set(2, 2, (a(3, 0) * b[4] - a(3, 1) * b[2] + a(3, 3) * b[0]) * inv);
        out.set(2, 3, (-a(2, 0) * b[4] + a(2, 1) * b[2] - a(2, 3) * b[0]) * inv);
        out.set(3, 0, (-a(1, 0) * b[9] + a(1, 1) * b[7] - a(1, 2) * b[6]) * inv);
        out.set(3, 1, (a(0, 0) * b[9] - a(0, 1) * b[7] + a(0, 2) * b[6]) * inv);
        out.set(3, 2, (-a(3, 0) * b[3] + a(3, 1) * b[1] - a(3, 2) * b[0]) * inv);
        out.set(3, 3, (a(2, 0) * b[3] - a(2, 1) * b[1] + a(2, 2) * b[0]) * inv);
        Some(out)
    }

    /// Element-wise comparison within `epsilon`
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// True when `M * Mᵀ` is the identity within `epsilon`
    pub fn is_orthogonal(&self, epsilon: f32) -> bool {
        (*self * self.transpose()).approx_eq(&Self::IDENTITY, epsilon)
    }

    pub fn is_identity(&self, epsilon: f32) -> bool {
        self.approx_eq(&Self::IDENTITY, epsilon)
    }

    /// The 16 elements in column-major order
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        self.mul_mat4(&other)
    }
}

impl std::ops::MulAssign for Mat4 {
    fn mul_assign(&mut self, other: Self) {
        *self = self.mul_mat4(&other);
    }
}

impl std::ops::Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        self.mul_vec4(v)
    }
}

impl std::ops::Mul<f32> for Mat4 {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        let mut out = self;
        out.cols.iter_mut().flatten().for_each(|e| *e *= s);
        out
    }
}

impl std::ops::Add for Mat4 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        let mut out = self;
        for (e, o) in out.cols.iter_mut().flatten().zip(other.cols.iter().flatten()) {
            *e += o;
        }
        out
    }
}

impl std::ops::Sub for Mat4 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        self + other * -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPSILON: f32 = 0.0001;

    fn vec_approx_eq(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().to_array().iter().all(|d| *d < EPSILON)
    }

    #[test]
    fn test_identity() {
        let v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Mat4::IDENTITY * v, v);
        assert!(Mat4::IDENTITY.is_identity(EPSILON));
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }

    #[test]
    fn test_rotation_xy_entries() {
        let m = Mat4::rotation_xy(0.3);
        let (s, c) = 0.3f32.sin_cos();
        assert_eq!(m.get(0, 0), c);
        assert_eq!(m.get(0, 1), -s);
        assert_eq!(m.get(1, 0), s);
        assert_eq!(m.get(1, 1), c);
        assert_eq!(m.get(2, 2), 1.0);
        assert_eq!(m.get(3, 3), 1.0);
        assert_eq!(m.get(0, 2), 0.0);
    }

    #[test]
    fn test_rotation_xy_45() {
        let v = Mat4::rotation_xy(FRAC_PI_4) * Vec4::X;
        assert!(vec_approx_eq(v, Vec4::new(0.7071, 0.7071, 0.0, 0.0)), "got {:?}", v);
    }

    #[test]
    fn test_each_plane_rotates_first_axis_to_second() {
        let basis = [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W];
        for plane in RotationPlane::ALL {
            let (a, b) = plane.axes();
            let rotated = Mat4::rotation(plane, FRAC_PI_2) * basis[a];
            assert!(vec_approx_eq(rotated, basis[b]),
                "{:?}: expected axis {} -> {}, got {:?}", plane, a, b, rotated);
        }
    }

    #[test]
    fn test_plane_rotation_yz() {
        let m = Mat4::plane_rotation(FRAC_PI_2, 1, 2);
        assert!(vec_approx_eq(m * Vec4::Y, Vec4::Z), "Y should become Z");
        assert!(vec_approx_eq(m * Vec4::Z, -Vec4::Y), "Z should become -Y");
        assert!(vec_approx_eq(m * Vec4::X, Vec4::X), "X should be unchanged");
    }

    #[test]
    fn test_mul_identity() {
        let a = Mat4::rotation_xw(0.5);
        assert!((Mat4::IDENTITY * a).approx_eq(&a, EPSILON));
        assert!((a * Mat4::IDENTITY).approx_eq(&a, EPSILON));
    }

    #[test]
    fn test_mul_applies_right_operand_first() {
        let a = Mat4::rotation_xy(FRAC_PI_2);
        let b = Mat4::rotation_xw(FRAC_PI_2);
        // b: X -> W, then a leaves W alone
        let v = (a * b) * Vec4::X;
        assert!(vec_approx_eq(v, Vec4::W), "got {:?}", v);
        // a: X -> Y, then b leaves Y alone
        let v = (b * a) * Vec4::X;
        assert!(vec_approx_eq(v, Vec4::Y), "got {:?}", v);
    }

    #[test]
    fn test_mul_composition() {
        let r45 = Mat4::rotation_zw(FRAC_PI_4);
        let r90 = Mat4::rotation_zw(FRAC_PI_2);
        assert!((r45 * r45).approx_eq(&r90, EPSILON));
    }

    #[test]
    fn test_transpose() {
        let m = Mat4::from_cols([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);
        let t = m.transpose();
        assert_eq!(t.get(0, 1), m.get(1, 0));
        assert_eq!(t.row(0), m.col(0));
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_determinant() {
        assert!((Mat4::IDENTITY.determinant() - 1.0).abs() < EPSILON);
        let s = Mat4::scale(Vec4::new(2.0, 3.0, 4.0, 5.0));
        assert!((s.determinant() - 120.0).abs() < EPSILON);
        assert!((Mat4::rotation_yw(1.1).determinant() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = Mat4::from_cols([
            [2.0, 0.0, 1.0, 0.0],
            [1.0, 3.0, 0.0, 0.0],
            [0.0, 1.0, 4.0, 1.0],
            [0.0, 0.0, 2.0, 5.0],
        ]);
        let inv = m.inverse().expect("matrix is invertible");
        assert!((m * inv).is_identity(EPSILON), "m * inv = {:?}", m * inv);
        assert!((inv * m).is_identity(EPSILON));
    }

    #[test]
    fn test_inverse_of_rotation_is_transpose() {
        let r = Mat4::rotation_from_angles(&RotationAngles::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6));
        let inv = r.inverse().expect("rotations are invertible");
        assert!(inv.approx_eq(&r.transpose(), EPSILON));
    }

    #[test]
    fn test_inverse_singular_returns_none() {
        assert!(Mat4::ZERO.inverse().is_none());

        let singular = Mat4::from_cols([
            [1.0, 2.0, 3.0, 4.0],
            [2.0, 4.0, 6.0, 8.0],
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 0.0, 1.0, 0.0],
        ]);
        assert!(singular.determinant().abs() < 1e-6);
        assert!(singular.inverse().is_none());
    }

    #[test]
    fn test_rotation_from_angles_order() {
        let angles = RotationAngles::new(0.3, -0.7, 1.2, 0.4, -1.5, 2.2);
        let expected = Mat4::rotation_xy(0.3)
            * Mat4::rotation_xz(-0.7)
            * Mat4::rotation_yz(1.2)
            * Mat4::rotation_xw(0.4)
            * Mat4::rotation_yw(-1.5)
            * Mat4::rotation_zw(2.2);
        let m = Mat4::rotation_from_angles(&angles);
        assert!(m.approx_eq(&expected, EPSILON));
        assert!(m.is_orthogonal(EPSILON));
    }

    #[test]
    fn test_add_sub_scale() {
        let a = Mat4::IDENTITY * 2.0;
        let b = a - Mat4::IDENTITY;
        assert!(b.is_identity(EPSILON));
        assert!((b + b).approx_eq(&a, EPSILON));
    }

    #[test]
    fn test_to_cols_array_is_column_major() {
        let mut m = Mat4::IDENTITY;
        m.set(1, 0, 7.0);
        let flat = m.to_cols_array();
        // column 0, row 1
        assert_eq!(flat[1], 7.0);
        assert_eq!(std::mem::size_of::<Mat4>(), 64);
    }
}
