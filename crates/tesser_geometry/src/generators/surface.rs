//! Parametric surfaces sampled on regular grids

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use tesser_math::Vec4;

use crate::Geometry4D;

/// Grid surfaces need at least this many samples per direction
pub const MIN_GRID_RESOLUTION: u32 = 4;

/// Half-width of the wave grid along x and z
pub const WAVE_EXTENT: f32 = 2.0;

struct WaveSource {
    freq: f32,
    amp_y: f32,
    amp_w: f32,
    phase_x: f32,
    phase_z: f32,
}

const WAVES: [WaveSource; 3] = [
    WaveSource { freq: 1.0, amp_y: 0.5, amp_w: 0.3, phase_x: 0.0, phase_z: 0.0 },
    WaveSource { freq: 2.3, amp_y: 0.25, amp_w: 0.15, phase_x: PI * 0.5, phase_z: PI * 0.25 },
    WaveSource { freq: 3.7, amp_y: 0.125, amp_w: 0.1, phase_x: PI * 0.75, phase_z: PI * 0.6 },
];

/// Edges and quads for an `nu` x `nv` grid
///
/// `wrap_u` / `wrap_v` close the grid in each direction. `twist_u` closes
/// the `u` direction with `v` reversed, which is how a Klein bottle glues.
struct Grid {
    nu: u32,
    nv: u32,
    wrap_u: bool,
    wrap_v: bool,
    twist_u: bool,
}

impl Grid {
    #[inline]
    fn index(&self, iu: u32, iv: u32) -> u32 {
        iu * self.nv + iv
    }

    /// Neighbor one step along `u`, if any
    fn step_u(&self, iu: u32, iv: u32) -> Option<u32> {
        if iu + 1 < self.nu {
            Some(self.index(iu + 1, iv))
        } else if self.twist_u {
            Some(self.index(0, (self.nv - iv) % self.nv))
        } else if self.wrap_u {
            Some(self.index(0, iv))
        } else {
            None
        }
    }

    fn next_v(&self, iv: u32) -> Option<u32> {
        if iv + 1 < self.nv {
            Some(iv + 1)
        } else if self.wrap_v {
            Some(0)
        } else {
            None
        }
    }

    fn connect(&self, edges: &mut Vec<[u32; 2]>, faces: &mut Vec<Vec<u32>>) {
        for iu in 0..self.nu {
            for iv in 0..self.nv {
                let here = self.index(iu, iv);
                let u_next = self.step_u(iu, iv);
                let v_next = self.next_v(iv);
                if let Some(next) = u_next {
                    edges.push([here, next]);
                }
                if let Some(jv) = v_next {
                    edges.push([here, self.index(iu, jv)]);
                }
                if let (Some(a), Some(jv)) = (u_next, v_next) {
                    if let Some(c) = self.step_u(iu, jv) {
                        faces.push(vec![here, a, c, self.index(iu, jv)]);
                    }
                }
            }
        }
    }
}

/// The 3-sphere in Hopf coordinates
///
/// `psi` runs over `[0, pi/2]` inclusive while `theta` and `phi` cover a full
/// turn. Each `psi` level is a flat torus, connected to its neighbors by
/// `psi` edges.
pub fn sphere(resolution: u32) -> Geometry4D {
    let res = resolution.max(MIN_GRID_RESOLUTION);
    let psi_steps = (res / 2).max(2);

    let mut vertices = Vec::with_capacity((psi_steps * res * res) as usize);
    for ip in 0..psi_steps {
        let psi = FRAC_PI_2 * ip as f32 / (psi_steps - 1) as f32;
        let (sin_psi, cos_psi) = psi.sin_cos();
        for it in 0..res {
            let theta = TAU * it as f32 / res as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for iphi in 0..res {
                let phi = TAU * iphi as f32 / res as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                vertices.push(Vec4::new(
                    cos_psi * cos_t,
                    cos_psi * sin_t,
                    sin_psi * cos_p,
                    sin_psi * sin_p,
                ));
            }
        }
    }

    let ring = Grid { nu: res, nv: res, wrap_u: true, wrap_v: true, twist_u: false };
    let ring_size = res * res;
    let mut edges = Vec::new();
    let mut faces = Vec::new();
    for ip in 0..psi_steps {
        let offset = ip * ring_size;
        let mut ring_edges = Vec::new();
        let mut ring_faces = Vec::new();
        ring.connect(&mut ring_edges, &mut ring_faces);
        edges.extend(ring_edges.into_iter().map(|[a, b]| [a + offset, b + offset]));
        faces.extend(
            ring_faces
                .into_iter()
                .map(|f| f.into_iter().map(|i| i + offset).collect::<Vec<_>>()),
        );
        if ip + 1 < psi_steps {
            edges.extend((0..ring_size).map(|i| [offset + i, offset + ring_size + i]));
        }
    }

    Geometry4D {
        name: "Sphere".to_string(),
        vertices,
        edges,
        faces,
    }
}

/// Clifford torus: the product of two circles of radius `1/sqrt(2)`, lying on the unit 3-sphere
pub fn torus(resolution: u32) -> Geometry4D {
    let res = resolution.max(MIN_GRID_RESOLUTION);
    let r = std::f32::consts::FRAC_1_SQRT_2;

    let mut vertices = Vec::with_capacity((res * res) as usize);
    for iu in 0..res {
        let (sin_u, cos_u) = (TAU * iu as f32 / res as f32).sin_cos();
        for iv in 0..res {
            let (sin_v, cos_v) = (TAU * iv as f32 / res as f32).sin_cos();
            vertices.push(Vec4::new(r * cos_u, r * sin_u, r * cos_v, r * sin_v));
        }
    }

    let grid = Grid { nu: res, nv: res, wrap_u: true, wrap_v: true, twist_u: false };
    let mut g = Geometry4D { name: "Torus".to_string(), vertices, ..Default::default() };
    grid.connect(&mut g.edges, &mut g.faces);
    g
}

/// Klein bottle immersed in 4D without self-intersection
///
/// Major radius 2, minor radius 1. The point at `u = 2pi` coincides with
/// `(0, -v)`, so the last `u` row is glued back with `v` reversed.
pub fn klein_bottle(resolution: u32) -> Geometry4D {
    let res = resolution.max(MIN_GRID_RESOLUTION);
    let (a, b) = (2.0f32, 1.0f32);

    let mut vertices = Vec::with_capacity((res * res) as usize);
    for iu in 0..res {
        let u = TAU * iu as f32 / res as f32;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_half, cos_half) = (u * 0.5).sin_cos();
        for iv in 0..res {
            let (sin_v, cos_v) = (TAU * iv as f32 / res as f32).sin_cos();
            let radial = a + b * cos_v;
            vertices.push(Vec4::new(
                radial * cos_u,
                radial * sin_u,
                b * sin_v * cos_half,
                b * sin_v * sin_half,
            ));
        }
    }

    let grid = Grid { nu: res, nv: res, wrap_u: true, wrap_v: true, twist_u: true };
    let mut g = Geometry4D { name: "Klein Bottle".to_string(), vertices, ..Default::default() };
    grid.connect(&mut g.edges, &mut g.faces);
    g
}

/// Height field over the XZ plane driven by three interfering waves
///
/// Each wave adds to `y` through `sin(px) * cos(pz)` and to `w` through
/// `cos(px + pz)`. `time` shifts every wave's phase.
pub fn wave(resolution: u32, time: f32) -> Geometry4D {
    let res = resolution.max(MIN_GRID_RESOLUTION);
    let step = 2.0 * WAVE_EXTENT / (res - 1) as f32;

    let mut vertices = Vec::with_capacity((res * res) as usize);
    for ix in 0..res {
        let x = -WAVE_EXTENT + ix as f32 * step;
        for iz in 0..res {
            let z = -WAVE_EXTENT + iz as f32 * step;
            let (mut y, mut w) = (0.0f32, 0.0f32);
            for ws in &WAVES {
                let px = ws.freq * x * PI + ws.phase_x + time;
                let pz = ws.freq * z * PI + ws.phase_z + time;
                y += ws.amp_y * px.sin() * pz.cos();
                w += ws.amp_w * (px + pz).cos();
            }
            vertices.push(Vec4::new(x, y, z, w));
        }
    }

    let grid = Grid { nu: res, nv: res, wrap_u: false, wrap_v: false, twist_u: false };
    let mut g = Geometry4D { name: "Wave".to_string(), vertices, ..Default::default() };
    grid.connect(&mut g.edges, &mut g.faces);
    g
}
