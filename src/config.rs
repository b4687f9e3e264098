//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`TESSER_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use tesser_geometry::{GenerationParams, GeometryError, GeometryIndex, VersionedGeometryIndex};
use tesser_math::{Projection, RotationAngles, Slice, Vec4};
use tesser_render::{BudgetConfig, BufferLayout, ColorPolicy, ShaderUniforms, Topology};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Backend and frame configuration
    #[serde(default)]
    pub render: RenderConfig,
    /// Which geometry to generate and how densely
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// 4D to 3D projection and slicing
    #[serde(default)]
    pub projection: ProjectionConfig,
    /// Rotation angles and per-second spin rates
    #[serde(default)]
    pub rotation: RotationConfig,
    /// Initial shader uniform values
    #[serde(default)]
    pub uniforms: ShaderUniforms,
    /// GPU memory budget
    #[serde(default)]
    pub resources: BudgetConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`TESSER_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // TESSER_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("TESSER_").split("__"));

        let config: Self = figment.extract().map_err(ConfigError::from)?;
        config.geometry.resolve()?;
        Ok(config)
    }

    /// Uniforms for the first frame, with geometry taken from the geometry section
    pub fn initial_uniforms(&self) -> Result<ShaderUniforms, ConfigError> {
        let index = self.geometry.resolve()?;
        Ok(ShaderUniforms {
            geometry: index.value() as i32,
            rotation: self.rotation.angles,
            resolution: [self.window.width as f32, self.window.height as f32],
            ..self.uniforms
        })
    }

    /// Buffer layout with the projection section applied
    ///
    /// The geometry overlay reads a per-vertex color, so a layout without one
    /// gets plain white.
    pub fn buffer_layout(&self) -> BufferLayout {
        let color = match self.geometry.buffers.color {
            ColorPolicy::None => ColorPolicy::Uniform { rgba: [1.0; 4] },
            color => color,
        };
        BufferLayout {
            projection: Some(self.projection.projection),
            color,
            ..self.geometry.buffers
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tesser - 4D Geometry Visualizer".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Background color [r, g, b, a]
    pub background_color: [f32; 4],
    /// Skip the WebGPU-style backend and go straight to the fallback
    pub force_fallback: bool,
    /// Name the built-in visualizer program is registered under
    pub program_name: String,
    /// Draw the rotated, projected geometry over the visualizer
    pub show_geometry: bool,
    /// Primitive type of the geometry overlay
    pub topology: Topology,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_color: [0.0, 0.0, 0.0, 1.0],
            force_fallback: false,
            program_name: "visualizer".to_string(),
            show_geometry: true,
            topology: Topology::Lines,
        }
    }
}

/// Geometry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Versioned so presets written for another base/core catalog are rejected
    pub index: VersionedGeometryIndex,
    pub params: GenerationParams,
    pub buffers: BufferLayout,
}

impl GeometryConfig {
    pub fn resolve(&self) -> Result<GeometryIndex, ConfigError> {
        self.index.resolve().map_err(ConfigError::from)
    }
}

/// Projection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub projection: Projection,
    /// Optional cross-section instead of a full projection
    pub slice: Option<Slice>,
}

impl ProjectionConfig {
    /// Per-vertex colors faded by the slice, `None` when no slice is set.
    ///
    /// Vertices outside the slab keep their color with alpha 0.
    pub fn slice_colors(&self, vertices: &[Vec4], layout: &BufferLayout) -> Option<Vec<[f32; 4]>> {
        let slice = self.slice?;
        let count = vertices.len();
        let colors = slice
            .apply_batch(vertices)
            .into_iter()
            .zip(vertices)
            .enumerate()
            .map(|(i, (hit, &v))| {
                let mut rgba = layout.color.color_for(i, count, v);
                rgba[3] *= hit.map_or(0.0, |p| p.alpha);
                rgba
            })
            .collect();
        Some(colors)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            slice: None,
        }
    }
}

/// Rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Starting angles in radians
    pub angles: RotationAngles,
    /// Angular velocity per plane in radians per second
    pub spin: RotationAngles,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            angles: RotationAngles::default(),
            spin: RotationAngles::new(0.0, 0.0, 0.0, 0.2, 0.15, 0.1),
        }
    }
}

impl RotationConfig {
    /// Angles after `seconds` of spinning from the start angles
    pub fn angles_at(&self, seconds: f32) -> RotationAngles {
        let a = self.angles;
        let s = self.spin;
        RotationAngles::new(
            a.xy + s.xy * seconds,
            a.xz + s.xz * seconds,
            a.yz + s.yz * seconds,
            a.xw + s.xw * seconds,
            a.yw + s.yw * seconds,
            a.zw + s.zw * seconds,
        )
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace), used when RUST_LOG is unset
    pub log_level: String,
    /// Log a resource usage snapshot every this many frames, 0 disables
    pub usage_log_interval: u32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            usage_log_interval: 0,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl From<GeometryError> for ConfigError {
    fn from(e: GeometryError) -> Self {
        ConfigError {
            message: format!("geometry: {}", e),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
