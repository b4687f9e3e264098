//! 4D vector type
//!
//! `Vec4` is a plain value type. Every operation returns a new vector, and the
//! struct is `#[repr(C)]` so slices of it can be handed straight to a GPU
//! buffer through `bytemuck`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Vectors shorter than this are treated as zero-length and never divided by.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// 4D vector with x, y, z, w components
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0, 0.0);
    pub const W: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Vector with every component set to `v`
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    #[inline]
    pub const fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Extract the xyz components (for 3D rendering)
    #[inline]
    pub fn xyz(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Normalize to unit length.
    ///
    /// Vectors shorter than [`NORMALIZE_EPSILON`] cannot be given a direction
    /// and normalize to [`Vec4::ZERO`].
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < NORMALIZE_EPSILON {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// Like [`normalized`](Self::normalized), but `None` for degenerate input
    #[inline]
    pub fn try_normalized(self) -> Option<Self> {
        let len = self.length();
        (len >= NORMALIZE_EPSILON).then(|| self / len)
    }

    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Component-wise minimum
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
            self.w.min(other.w),
        )
    }

    /// Component-wise maximum
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
            self.w.max(other.w),
        )
    }

    /// Clamp each component between the matching components of `lo` and `hi`
    #[inline]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs(), self.w.abs())
    }

    /// Sign of each component, with zero counted as positive
    #[inline]
    pub fn sign(self) -> Self {
        fn s(v: f32) -> f32 {
            if v >= 0.0 { 1.0 } else { -1.0 }
        }
        Self::new(s(self.x), s(self.y), s(self.z), s(self.w))
    }

    /// Component-wise multiplication (Hadamard product)
    #[inline]
    pub fn component_mul(self, other: Self) -> Self {
        Self::new(
            self.x * other.x,
            self.y * other.y,
            self.z * other.z,
            self.w * other.w,
        )
    }

    /// Projection of `self` onto `other`. Zero when `other` is zero.
    #[inline]
    pub fn project_onto(self, other: Self) -> Self {
        let d = other.length_squared();
        if d > 0.0 {
            other * (self.dot(other) / d)
        } else {
            Self::ZERO
        }
    }

    /// Reflect across the hyperplane with the given (unit) normal
    #[inline]
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }

    #[inline]
    pub fn is_zero(self, epsilon: f32) -> bool {
        self.length_squared() < epsilon * epsilon
    }

    #[inline]
    pub fn is_normalized(self, epsilon: f32) -> bool {
        (self.length_squared() - 1.0).abs() < epsilon
    }

    /// True when every component is finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

impl From<[f32; 4]> for Vec4 {
    fn from(a: [f32; 4]) -> Self {
        Self::from_array(a)
    }
}

impl From<Vec4> for [f32; 4] {
    fn from(v: Vec4) -> Self {
        v.to_array()
    }
}

impl std::ops::Index<usize> for Vec4 {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 index out of range: {}", i),
        }
    }
}

impl std::ops::IndexMut<usize> for Vec4 {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Vec4 index out of range: {}", i),
        }
    }
}

// Operator overloads

impl std::ops::Add for Vec4 {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z, self.w + o.w)
    }
}

impl std::ops::AddAssign for Vec4 {
    #[inline]
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl std::ops::Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z, self.w - o.w)
    }
}

impl std::ops::SubAssign for Vec4 {
    #[inline]
    fn sub_assign(&mut self, o: Self) {
        *self = *self - o;
    }
}

impl std::ops::Mul<f32> for Vec4 {
    type Output = Self;
    #[inline]
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl std::ops::Mul<Vec4> for f32 {
    type Output = Vec4;
    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        v * self
    }
}

impl std::ops::MulAssign<f32> for Vec4 {
    #[inline]
    fn mul_assign(&mut self, s: f32) {
        *self = *self * s;
    }
}

impl std::ops::Div<f32> for Vec4 {
    type Output = Self;
    #[inline]
    fn div(self, s: f32) -> Self {
        Self::new(self.x / s, self.y / s, self.z / s, self.w / s)
    }
}

impl std::ops::DivAssign<f32> for Vec4 {
    #[inline]
    fn div_assign(&mut self, s: f32) {
        *self = *self / s;
    }
}

impl std::ops::Neg for Vec4 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_dot() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4::new(5.0, 6.0, 7.0, 8.0);
        // 5 + 12 + 21 + 32
        assert_eq!(a.dot(b), 70.0);
    }

    #[test]
    fn test_length() {
        assert_eq!(Vec4::X.length(), 1.0);
        assert!(approx_eq(Vec4::ONE.length(), 2.0));
    }

    #[test]
    fn test_normalized() {
        let n = Vec4::new(3.0, 0.0, 4.0, 0.0).normalized();
        assert!(approx_eq(n.x, 0.6));
        assert!(approx_eq(n.z, 0.8));
        assert!(approx_eq(n.length(), 1.0));
    }

    #[test]
    fn test_normalized_zero_vector_is_defined() {
        let n = Vec4::ZERO.normalized();
        assert_eq!(n, Vec4::ZERO);
        assert!(n.is_finite());

        let tiny = Vec4::new(1e-8, 0.0, 0.0, 0.0).normalized();
        assert_eq!(tiny, Vec4::ZERO, "Sub-epsilon vectors should not be normalized");
        assert!(Vec4::new(1e-8, 0.0, 0.0, 0.0).try_normalized().is_none());
    }

    #[test]
    fn test_arithmetic() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4::new(5.0, 6.0, 7.0, 8.0);
        assert_eq!(a + b, Vec4::new(6.0, 8.0, 10.0, 12.0));
        assert_eq!(b - a, Vec4::splat(4.0));
        assert_eq!(a * 2.0, Vec4::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(b / 2.0, Vec4::new(2.5, 3.0, 3.5, 4.0));
        assert_eq!(-a, Vec4::new(-1.0, -2.0, -3.0, -4.0));

        let mut c = a;
        c += b;
        c -= a;
        c *= 0.5;
        c /= 0.5;
        assert_eq!(c, b);
    }

    #[test]
    fn test_lerp() {
        let a = Vec4::ZERO;
        let b = Vec4::splat(10.0);
        assert_eq!(a.lerp(b, 0.5), Vec4::splat(5.0));
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn test_min_max_clamp() {
        let a = Vec4::new(1.0, 5.0, 2.0, 8.0);
        let b = Vec4::new(3.0, 2.0, 4.0, 6.0);
        assert_eq!(a.min(b), Vec4::new(1.0, 2.0, 2.0, 6.0));
        assert_eq!(a.max(b), Vec4::new(3.0, 5.0, 4.0, 8.0));

        let v = Vec4::new(-1.0, 5.0, 2.5, 10.0);
        let clamped = v.clamp(Vec4::ZERO, Vec4::splat(3.0));
        assert_eq!(clamped, Vec4::new(0.0, 3.0, 2.5, 3.0));
    }

    #[test]
    fn test_abs_and_sign() {
        let v = Vec4::new(-1.0, 2.0, 0.0, -0.5);
        assert_eq!(v.abs(), Vec4::new(1.0, 2.0, 0.0, 0.5));
        // 0.0 counts as positive
        assert_eq!(v.sign(), Vec4::new(-1.0, 1.0, 1.0, -1.0));
    }

    #[test]
    fn test_project_onto() {
        let v = Vec4::new(2.0, 3.0, 0.0, 0.0);
        let p = v.project_onto(Vec4::new(5.0, 0.0, 0.0, 0.0));
        assert_eq!(p, Vec4::new(2.0, 0.0, 0.0, 0.0));
        assert_eq!(v.project_onto(Vec4::ZERO), Vec4::ZERO);
    }

    #[test]
    fn test_reflect() {
        let v = Vec4::new(1.0, -1.0, 0.0, 2.0);
        let r = v.reflect(Vec4::Y);
        assert_eq!(r, Vec4::new(1.0, 1.0, 0.0, 2.0));
    }

    #[test]
    fn test_distance() {
        let a = Vec4::new(1.0, 1.0, 1.0, 1.0);
        let b = Vec4::new(2.0, 2.0, 2.0, 2.0);
        assert!(approx_eq(a.distance(b), 2.0));
        assert!(approx_eq(a.distance_squared(b), 4.0));
    }

    #[test]
    fn test_predicates() {
        assert!(Vec4::ZERO.is_zero(1e-6));
        assert!(!Vec4::X.is_zero(1e-6));
        assert!(Vec4::W.is_normalized(1e-6));
        assert!(!Vec4::ONE.is_normalized(1e-6));
    }

    #[test]
    fn test_index_and_array() {
        let mut v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(v[3], 4.0);
        v[0] = 9.0;
        assert_eq!(v.to_array(), [9.0, 2.0, 3.0, 4.0]);
        assert_eq!(Vec4::from([9.0, 2.0, 3.0, 4.0]), v);
        assert_eq!(v.xyz(), [9.0, 2.0, 3.0]);
    }

    #[test]
    fn test_gpu_layout() {
        assert_eq!(std::mem::size_of::<Vec4>(), 16);
        let vs = [Vec4::X, Vec4::W];
        let floats: &[f32] = bytemuck::cast_slice(&vs);
        assert_eq!(floats, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
