//! Windowed host: winit event handling, GPU setup and the per-frame render.

use std::path::PathBuf;
use std::sync::Arc;

use orrery_config::Config;
use orrery_orbit::OrbitModel;
use orrery_render::{
    BodyRenderer, Camera, DepthBuffer, Lighting, RenderContext, SphereMesh, SurfaceError,
    TextureLoader, init_render_context_blocking, surface_size,
};
use tracing::{debug, info, instrument};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::controls::OrbitControls;
use crate::error::AppError;
use crate::frame_driver::{FrameDriver, FrameOutcome};
use crate::input::MouseState;
use crate::scene::{SceneGraph, should_log_positions};

/// Window attributes derived from the window section of the config.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Physical surface size for `window`, honouring the pixel ratio cap.
fn window_surface_size(window: &Window, max_pixel_ratio: f64) -> (u32, u32) {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<f64>(scale);
    surface_size(logical.width, logical.height, scale, max_pixel_ratio)
}

struct GpuState {
    ctx: RenderContext,
    depth: DepthBuffer,
    renderer: BodyRenderer,
}

/// Application state for one orrery window.
pub struct OrreryApp {
    config: Config,
    textures_dir: PathBuf,
    driver: FrameDriver,
    scene: SceneGraph,
    controls: OrbitControls,
    mouse: MouseState,
    camera: Camera,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    failure: Option<AppError>,
}

impl OrreryApp {
    pub fn new(config: Config, model: OrbitModel, textures_dir: PathBuf) -> Self {
        let scene = SceneGraph::from_model(&model);
        let controls = OrbitControls::new(&config.camera);
        let camera = Camera::looking_at(
            controls.position(),
            controls.target,
            config.camera.fov_y_degrees.to_radians(),
            config.camera.near,
            config.camera.far,
        );

        Self {
            config,
            textures_dir,
            driver: FrameDriver::new(model),
            scene,
            controls,
            mouse: MouseState::new(),
            camera,
            window: None,
            gpu: None,
            failure: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let (width, height) = window_surface_size(&window, self.config.render.max_pixel_ratio);
        info!(
            width,
            height,
            scale = window.scale_factor(),
            "window created"
        );

        let ctx = init_render_context_blocking(
            Arc::clone(&window),
            width,
            height,
            self.config.window.vsync,
        )?;
        let depth = DepthBuffer::new(&ctx.device, width, height);
        let segments = self.config.render.sphere_segments;
        let mesh = SphereMesh::uv_sphere(segments, segments);
        let mut textures = TextureLoader::new(&ctx.device, self.textures_dir.clone());
        let renderer = BodyRenderer::new(
            &ctx.device,
            &ctx.queue,
            ctx.surface_format,
            &mesh,
            &mut textures,
            &self.scene.draw_list(),
        );
        self.camera.set_aspect_ratio(width as f32, height as f32);

        self.gpu = Some(GpuState {
            ctx,
            depth,
            renderer,
        });
        self.driver.start(&*window);
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self) {
        let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) else {
            return;
        };
        let (width, height) = window_surface_size(window, self.config.render.max_pixel_ratio);
        gpu.ctx.resize(width, height);
        gpu.depth.resize(&gpu.ctx.device, width, height);
        self.camera.set_aspect_ratio(width as f32, height as f32);
        debug!(width, height, "surface resized");
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let FrameOutcome::Advanced { frame } = self.driver.on_frame(&*window, &mut self.scene)
            && should_log_positions(frame, self.config.debug.position_log_interval)
        {
            self.scene.log_positions(frame);
        }

        self.controls.handle_mouse(&self.mouse);
        self.mouse.clear_transients();
        if self.controls.update() {
            self.camera.look_at(self.controls.position(), self.controls.target);
        }

        let Some(gpu) = &self.gpu else {
            return;
        };
        let lighting = Lighting {
            sun_position: self.scene.light_position(),
            sun_intensity: self.config.render.sun_intensity,
            ambient_intensity: self.config.render.ambient_intensity,
        };
        gpu.renderer.update(
            &gpu.ctx.queue,
            &self.camera,
            lighting,
            &self.scene.model_matrices(),
        );

        let [r, g, b] = self.config.render.clear_color;
        let clear = wgpu::Color { r, g, b, a: 1.0 };
        match gpu.renderer.draw_frame(&gpu.ctx, &gpu.depth, clear) {
            Ok(()) => {}
            Err(SurfaceError::Timeout) => debug!("surface timeout, frame skipped"),
            Err(e) => {
                self.driver.cancel();
                self.failure = Some(e.into());
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_window(event_loop) {
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(frames = self.driver.frame_count(), "close requested, shutting down");
                self.driver.cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                let logical = position.to_logical::<f64>(scale);
                self.mouse.on_cursor_moved(logical.x, logical.y);
            }
            WindowEvent::CursorEntered { .. } => self.mouse.on_cursor_entered(),
            WindowEvent::CursorLeft { .. } => self.mouse.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.mouse.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.mouse.on_scroll(delta),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open the orrery window and run until it is closed.
#[instrument(skip_all)]
pub fn run(config: Config, model: OrbitModel, textures_dir: PathBuf) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = OrreryApp::new(config, model, textures_dir);
    event_loop.run_app(&mut app)?;
    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
