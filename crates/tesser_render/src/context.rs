//! WGPU device, queue and surface management

use std::sync::Arc;

use winit::window::Window;

use crate::backend::{BackendKind, DeviceCapabilities};
use crate::RenderError;

/// Rough device memory by adapter type; wgpu does not report VRAM
const DISCRETE_MEMORY_ESTIMATE: u64 = 2 * 1024 * 1024 * 1024;
const INTEGRATED_MEMORY_ESTIMATE: u64 = 512 * 1024 * 1024;

/// Holds the WGPU resources needed for rendering into a window
pub struct RenderContext {
    pub surface: wgpu::Surface<'static>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    capabilities: DeviceCapabilities,
}

impl RenderContext {
    /// Create a context for `window`
    ///
    /// Fails instead of panicking when no adapter or device is available so
    /// the caller can fall back to another backend.
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderError> {
        let init_err = |message: String| RenderError::BackendInit {
            backend: BackendKind::WebGpu,
            message,
        };

        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| init_err(format!("surface creation failed: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or_else(|| init_err("no compatible adapter".to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Tesser Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| init_err(format!("device request failed: {}", e)))?;

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| init_err("surface is not supported by the adapter".to_string()))?;
        config.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);

        let limits = device.limits();
        let mut capabilities = DeviceCapabilities::new(
            BackendKind::WebGpu,
            limits.max_texture_dimension_2d,
            limits.max_buffer_size,
        );
        match info.device_type {
            wgpu::DeviceType::DiscreteGpu => {
                capabilities = capabilities.with_estimated_memory(DISCRETE_MEMORY_ESTIMATE);
            }
            wgpu::DeviceType::IntegratedGpu => {
                capabilities = capabilities.with_estimated_memory(INTEGRATED_MEMORY_ESTIMATE);
            }
            _ => {}
        }

        Ok(Self {
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            size,
            capabilities,
        })
    }

    /// Reconfigure the surface; zero-sized windows are ignored
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size, used after a lost surface
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}
