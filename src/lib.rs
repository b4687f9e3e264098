//! Tesser - 4D geometry visualizer
//!
//! The binary wires the workspace crates together; this library exposes its
//! configuration so it can be loaded and tested on its own.
//!
//! - [`tesser_math`] - vectors, matrices, rotors and projections
//! - [`tesser_geometry`] - shape generation, core warps and the geometry index
//! - [`tesser_render`] - buffers, uniforms, the render bridge and resource tracking

pub mod config;

pub use config::{AppConfig, ConfigError};

pub use tesser_geometry;
pub use tesser_math;
pub use tesser_render;
