//! 4D Mathematics Library
//!
//! Vector, matrix, rotor and projection types for tesser.
//!
//! ## Core Types
//!
//! - [`Vec4`] - 4D vector with x, y, z, w components
//! - [`Mat4`] - column-major 4x4 matrix
//! - [`Rotor4`] - 4D rotation using geometric algebra
//! - [`RotationAngles`] - one angle per rotation plane
//!
//! ## Projection
//!
//! - [`Projection`] - perspective, stereographic, orthographic or oblique
//! - [`Slice`] - thin cross-section at a fixed `w`
//!
//! Rotors and matrices built from the same [`RotationAngles`] describe the same
//! rotation, so callers may use whichever form suits them.

mod vec4;
mod rotor4;
pub mod mat4;
pub mod projection;

pub use vec4::{Vec4, NORMALIZE_EPSILON};
pub use rotor4::{Rotor4, RotationAngles, RotationPlane};
pub use mat4::Mat4;
pub use projection::{Projection, Slice, SlicedPoint};
