//! wgpu presentation for the orrery: surface management, a shared sphere
//! mesh, body textures, and a textured pipeline with unlit and lit materials.

pub mod body_pipeline;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod texture;

pub use body_pipeline::{
    BODY_SHADER_SOURCE, BodyDraw, BodyPipeline, BodyRenderer, BodyUniform, LightUniform, Lighting,
};
pub use camera::{Camera, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, init_render_context_blocking, surface_size,
};
pub use mesh::{SphereMesh, SphereVertex};
pub use texture::{GpuTexture, TextureError, TextureImage, TextureLoader};
