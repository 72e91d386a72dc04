use orrery_render::RenderContextError;

/// Failures that end the windowed run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU initialization failed: {0}")]
    Gpu(#[from] RenderContextError),

    #[error("rendering stopped: {0}")]
    Surface(#[from] orrery_render::SurfaceError),
}
