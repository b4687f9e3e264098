//! Tesser - 4D geometry visualizer
//!
//! Draws the built-in 4D visualizer program every frame through a render
//! bridge, with the selected geometry rotated in 4D, projected, and drawn on
//! top as a mesh. When no WebGPU adapter is available the bridge falls back to
//! an OpenGL context created on the same window.
//!
//! Controls: Left/Right cycle the base shape, Up/Down cycle the core warp,
//! Space pauses rotation, F11 toggles fullscreen, Escape quits.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    raw_window_handle::HasWindowHandle,
    window::{Fullscreen, Window, WindowId},
};

use tesser::config::AppConfig;
use tesser_geometry::{
    generate_indexed, BaseGeometry, CoreType, Geometry4D, GeometryIndex, BASE_GEOMETRY_COUNT,
    CORE_TYPE_COUNT,
};
use tesser_math::Rotor4;
use tesser_render::{
    build_buffers_with, context::RenderContext, BackendKind, DrawItem, GlBackend, GlPresenter,
    MeshFormat, PressureAction, RenderBridge, RenderError, ShaderSource, ShaderUniforms,
    VertexOverrides, WgpuBackend,
};

type Bridge = RenderBridge<WgpuBackend, GlBackend>;

const MESH_PROGRAM: &str = "geometry_mesh";
const MESH_NAME: &str = "geometry";

/// Swaps the window surface of a glutin context
struct GlutinPresenter {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
}

impl GlPresenter for GlutinPresenter {
    fn present(&self) -> Result<(), String> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| format!("swap failed: {}", e))
    }

    fn resize(&self, width: u32, height: u32) {
        if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, w, h);
        }
    }
}

/// Create a GL 3.3 core context on `window`, or GLES 3.0 when that is all
/// the driver offers
fn create_gl_backend(event_loop: &ActiveEventLoop, window: &Window, vsync: bool) -> Result<GlBackend, RenderError> {
    let init_err = |message: String| RenderError::BackendInit {
        backend: BackendKind::WebGl,
        message,
    };

    let raw_window = window
        .window_handle()
        .map_err(|e| init_err(format!("no window handle: {}", e)))?
        .as_raw();
    let template = ConfigTemplateBuilder::new().compatible_with_native_window(raw_window);
    let (_, config) = DisplayBuilder::new()
        .build(event_loop, template, |configs| {
            configs
                .reduce(|best, c| if c.num_samples() > best.num_samples() { c } else { best })
                .expect("glutin reports an error rather than an empty config list")
        })
        .map_err(|e| init_err(format!("no GL display: {}", e)))?;
    let display = config.display();

    let desktop = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .with_profile(GlProfile::Core)
        .build(Some(raw_window));
    let embedded = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
        .build(Some(raw_window));
    let not_current = unsafe {
        display
            .create_context(&config, &desktop)
            .or_else(|_| display.create_context(&config, &embedded))
    }
    .map_err(|e| init_err(format!("context creation failed: {}", e)))?;

    let surface_attributes = window
        .build_surface_attributes(Default::default())
        .map_err(|e| init_err(format!("no surface attributes: {}", e)))?;
    let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
        .map_err(|e| init_err(format!("surface creation failed: {}", e)))?;
    let context = not_current
        .make_current(&surface)
        .map_err(|e| init_err(format!("make current failed: {}", e)))?;

    let interval = if vsync {
        SwapInterval::Wait(NonZeroU32::MIN)
    } else {
        SwapInterval::DontWait
    };
    if let Err(e) = surface.set_swap_interval(&context, interval) {
        log::warn!("Could not set swap interval: {}", e);
    }

    let gl = unsafe { glow::Context::from_loader_function_cstr(|symbol| display.get_proc_address(symbol)) };
    let size = window.inner_size();
    let backend = GlBackend::new(Arc::new(gl), size.width, size.height)?
        .with_presenter(Box::new(GlutinPresenter { surface, context }));
    log::info!("OpenGL context ready ({:?} GLSL)", backend.dialect());
    Ok(backend)
}

/// Main application state
struct App {
    config: AppConfig,
    base_uniforms: ShaderUniforms,
    window: Option<Arc<Window>>,
    bridge: Option<Bridge>,
    /// Unrotated geometry for the current index
    geometry: Option<Geometry4D>,
    /// Cleared when the mesh program fails to compile
    overlay: bool,
    index: GeometryIndex,
    start: Instant,
    paused_at: Option<f32>,
    frame: u64,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let base_uniforms = config.initial_uniforms().unwrap_or_else(|e| {
            log::warn!("{}. Using default uniforms.", e);
            ShaderUniforms::default()
        });
        let index = config.geometry.resolve().unwrap_or_default();
        let overlay = config.render.show_geometry;

        Self {
            config,
            base_uniforms,
            window: None,
            bridge: None,
            geometry: None,
            overlay,
            index,
            start: Instant::now(),
            paused_at: None,
            frame: 0,
        }
    }

    fn elapsed(&self) -> f32 {
        self.paused_at
            .unwrap_or_else(|| self.start.elapsed().as_secs_f32())
    }

    fn toggle_pause(&mut self) {
        match self.paused_at.take() {
            Some(t) => {
                // Resume from the frozen time
                let frozen = std::time::Duration::from_secs_f32(t);
                self.start = Instant::now().checked_sub(frozen).unwrap_or_else(Instant::now);
            }
            None => self.paused_at = Some(self.elapsed()),
        }
    }

    fn select(&mut self, base: BaseGeometry, core: CoreType) {
        self.index = GeometryIndex::encode(base, core);
        log::info!("Geometry {}", self.index);
        self.regenerate();
    }

    fn step_base(&mut self, delta: u32) {
        let next = (self.index.base().index() + delta) % BASE_GEOMETRY_COUNT;
        let base = BaseGeometry::from_index(next).unwrap_or(self.index.base());
        self.select(base, self.index.core());
    }

    fn step_core(&mut self, delta: u32) {
        let next = (self.index.core().index() + delta) % CORE_TYPE_COUNT;
        let core = CoreType::from_index(next).unwrap_or(self.index.core());
        self.select(self.index.base(), core);
    }

    fn regenerate(&mut self) {
        let geometry = generate_indexed(self.index, &self.config.geometry.params);
        log::info!(
            "Generated {}: {} vertices, {} edges, {} faces",
            geometry.name,
            geometry.vertex_count(),
            geometry.edge_count(),
            geometry.face_count()
        );
        self.geometry = Some(geometry);
    }

    fn create_bridge(&self, event_loop: &ActiveEventLoop, window: &Arc<Window>) -> Result<Bridge, RenderError> {
        let force_fallback = self.config.render.force_fallback;
        let vsync = self.config.window.vsync;
        let surface_window = Arc::clone(window);
        Bridge::negotiate_with_budget(
            move || {
                if force_fallback {
                    return Err(RenderError::BackendInit {
                        backend: BackendKind::WebGpu,
                        message: "disabled by configuration".to_string(),
                    });
                }
                pollster::block_on(RenderContext::new(surface_window, vsync)).map(WgpuBackend::new)
            },
            || create_gl_backend(event_loop, window, vsync),
            self.config.resources,
        )
    }

    fn compile_programs(&mut self, bridge: &mut Bridge) -> Result<(), RenderError> {
        bridge.compile_shader(&self.config.render.program_name, &ShaderSource::builtin_visualizer())?;
        if self.overlay {
            let format = MeshFormat {
                layout: self.config.buffer_layout().vertex_layout(),
                topology: self.config.render.topology,
            };
            if let Err(e) = bridge.compile_mesh_shader(MESH_PROGRAM, &ShaderSource::builtin_mesh(), format) {
                log::warn!("Geometry overlay disabled: {}", e);
                self.overlay = false;
            }
        }
        Ok(())
    }

    /// Rotate, project and upload the current geometry
    fn upload_mesh(&mut self, seconds: f32) -> bool {
        let (Some(bridge), Some(geometry)) = (self.bridge.as_mut(), self.geometry.as_ref()) else {
            return false;
        };
        let rotor = Rotor4::from_angles(&self.config.rotation.angles_at(seconds));
        let rotated = geometry.map_vertices(|v| rotor.rotate(v));

        let layout = self.config.buffer_layout();
        let slice_colors = self.config.projection.slice_colors(&rotated.vertices, &layout);
        let overrides = VertexOverrides { colors: slice_colors.as_deref(), normals: None };
        let buffers = build_buffers_with(&rotated, &layout, overrides);

        match bridge.upload_mesh(MESH_NAME, &buffers, self.config.render.topology) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not upload {}: {}", rotated.name, e);
                false
            }
        }
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let seconds = self.elapsed();
        let resolution = self
            .window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                [size.width as f32, size.height as f32]
            })
            .unwrap_or(self.base_uniforms.resolution);

        let uniforms = ShaderUniforms {
            time: seconds,
            resolution,
            geometry: self.index.value() as i32,
            rotation: self.config.rotation.angles_at(seconds),
            ..self.base_uniforms
        };

        let draw_mesh = self.overlay && self.upload_mesh(seconds);
        let Some(bridge) = self.bridge.as_mut() else {
            return;
        };

        let mut items = vec![DrawItem::Fullscreen { program: &self.config.render.program_name }];
        if draw_mesh {
            items.push(DrawItem::Mesh { program: MESH_PROGRAM, mesh: MESH_NAME });
        }
        bridge.set_uniforms(uniforms);
        match bridge.render_frame(Some(self.config.render.background_color), &items) {
            Ok(()) => {}
            // The backend has reconfigured; the next frame retries
            Err(RenderError::SurfaceLost) => {}
            Err(RenderError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Frame failed: {}", e),
        }

        self.frame += 1;
        let interval = self.config.debug.usage_log_interval as u64;
        if interval > 0 && self.frame % interval == 0 {
            let snapshot = bridge.resources().snapshot();
            log::info!(
                "GPU usage on {}: {} resources, {} of {} bytes",
                snapshot.backend,
                snapshot.total_count(),
                snapshot.usage_bytes,
                snapshot.budget_bytes
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut window_attributes = Window::default_attributes()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        if self.config.window.fullscreen {
            window_attributes = window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut bridge = match self.create_bridge(event_loop, &window) {
            Ok(bridge) => bridge,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };
        if let Some(reason) = bridge.fallback_reason() {
            log::warn!("Drawing with {} because {}", bridge.backend_kind(), reason);
        }

        let target = bridge.resources().budget_bytes() / 10 * 7;
        bridge.resources_mut().set_pressure_callback(move |snapshot| {
            log::warn!("Evicting GPU resources ({} live)", snapshot.total_count());
            PressureAction::EvictLru { target_bytes: target }
        });

        if let Err(e) = self.compile_programs(&mut bridge) {
            log::error!("{}", e);
            event_loop.exit();
            return;
        }

        self.bridge = Some(bridge);
        self.regenerate();
        self.window = Some(window);
        self.start = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(bridge) = &mut self.bridge {
                    bridge.resize(physical_size.width, physical_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let PhysicalKey::Code(key) = event.physical_key {
                    match key {
                        KeyCode::Escape => event_loop.exit(),
                        KeyCode::ArrowRight => self.step_base(1),
                        KeyCode::ArrowLeft => self.step_base(BASE_GEOMETRY_COUNT - 1),
                        KeyCode::ArrowUp => self.step_core(1),
                        KeyCode::ArrowDown => self.step_core(CORE_TYPE_COUNT - 1),
                        KeyCode::Space => self.toggle_pause(),
                        KeyCode::F11 => {
                            if let Some(window) = &self.window {
                                let fullscreen = match window.fullscreen() {
                                    Some(_) => None,
                                    None => Some(Fullscreen::Borderless(None)),
                                };
                                window.set_fullscreen(fullscreen);
                            }
                        }
                        _ => {}
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GPU objects must go before the device or context
        if let Some(mut bridge) = self.bridge.take() {
            bridge.dispose();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting Tesser");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
