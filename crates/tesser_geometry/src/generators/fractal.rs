//! Chaos-game point cloud
//!
//! A point repeatedly jumps halfway toward one of five attractors chosen by
//! a fixed xorshift sequence, tracing a 4D Sierpinski-like set. The seed is
//! constant so the cloud is identical on every run.

use std::f32::consts::FRAC_1_SQRT_2;

use tesser_math::Vec4;

use crate::Geometry4D;

const SEED: u32 = 0xDEAD_BEEF;
const WARM_UP: usize = 64;
const CONTRACTION: f32 = 0.5;

const ATTRACTORS: [Vec4; 5] = [
    Vec4::new(1.0, 1.0, 1.0, -FRAC_1_SQRT_2),
    Vec4::new(1.0, -1.0, -1.0, -FRAC_1_SQRT_2),
    Vec4::new(-1.0, 1.0, -1.0, -FRAC_1_SQRT_2),
    Vec4::new(-1.0, -1.0, 1.0, -FRAC_1_SQRT_2),
    Vec4::new(0.0, 0.0, 0.0, 4.0 * FRAC_1_SQRT_2),
];

struct XorShift32(u32);

impl XorShift32 {
    fn next(&mut self) -> u32 {
        let mut s = self.0;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        self.0 = s;
        s
    }

    fn pick(&mut self) -> Vec4 {
        ATTRACTORS[(self.next() % ATTRACTORS.len() as u32) as usize]
    }
}

/// `resolution^2` chaos-game points with no edges or faces
pub fn fractal(resolution: u32) -> Geometry4D {
    let res = resolution.max(super::MIN_GRID_RESOLUTION) as usize;
    let count = res * res;

    let mut rng = XorShift32(SEED);
    let mut current = Vec4::ZERO;
    for _ in 0..WARM_UP {
        current = current.lerp(rng.pick(), CONTRACTION);
    }

    let mut vertices = Vec::with_capacity(count);
    for _ in 0..count {
        current = current.lerp(rng.pick(), CONTRACTION);
        vertices.push(current);
    }

    Geometry4D {
        name: "Fractal".to_string(),
        vertices,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractal_point_count() {
        assert_eq!(fractal(10).vertex_count(), 100);
        assert_eq!(fractal(1).vertex_count(), 16);
        assert_eq!(fractal(10).edge_count(), 0);
        assert_eq!(fractal(10).face_count(), 0);
    }

    #[test]
    fn test_fractal_deterministic() {
        assert_eq!(fractal(12), fractal(12));
    }

    #[test]
    fn test_fractal_prefix_stable() {
        // A larger cloud continues the same sequence
        let small = fractal(4);
        let large = fractal(8);
        assert_eq!(small.vertices[..], large.vertices[..16]);
    }

    #[test]
    fn test_fractal_stays_in_hull() {
        let g = fractal(32);
        let (lo, hi) = g.bounds().unwrap();
        assert!(lo.x >= -1.0 && hi.x <= 1.0);
        assert!(lo.w >= -FRAC_1_SQRT_2 - 1e-4 && hi.w <= 4.0 * FRAC_1_SQRT_2 + 1e-4);
    }

    #[test]
    fn test_xorshift_sequence() {
        let mut rng = XorShift32(1);
        assert_eq!(rng.next(), 270_369);
    }
}
