//! Body textures: decoding with `image`, upload, and a per-file cache.
//!
//! A missing or undecodable file never aborts rendering. The loader logs a
//! warning and hands out a 1×1 white texture instead, so the body still
//! shows up with its material's shading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("texture file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Single-texel image used in place of a texture that failed to load.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Decode a JPEG or PNG file into RGBA8.
    pub fn open(path: &Path) -> Result<Self, TextureError> {
        if !path.is_file() {
            return Err(TextureError::NotFound(path.to_path_buf()));
        }
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

/// A texture living on the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub dimensions: (u32, u32),
}

impl GpuTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &TextureImage,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            dimensions: (image.width, image.height),
        }
    }
}

/// Loads body textures from one directory and shares them by file name.
pub struct TextureLoader {
    root: PathBuf,
    cache: HashMap<String, Arc<GpuTexture>>,
    fallback: Option<Arc<GpuTexture>>,
    sampler: wgpu::Sampler,
}

impl TextureLoader {
    /// Colour of the stand-in texture.
    pub const FALLBACK_RGBA: [u8; 4] = [255, 255, 255, 255];

    pub fn new(device: &wgpu::Device, root: impl Into<PathBuf>) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("body-texture-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            root: root.into(),
            cache: HashMap::new(),
            fallback: None,
            sampler,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Number of distinct files uploaded so far.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Texture for `file_name`, or the fallback when `None`, missing, or unreadable.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        file_name: Option<&str>,
    ) -> Arc<GpuTexture> {
        let Some(file_name) = file_name else {
            return self.fallback(device, queue);
        };
        if let Some(existing) = self.cache.get(file_name) {
            return Arc::clone(existing);
        }

        let path = self.root.join(file_name);
        match TextureImage::open(&path) {
            Ok(image) => {
                let texture = Arc::new(GpuTexture::upload(device, queue, file_name, &image));
                log::info!(
                    "Loaded texture '{file_name}' ({}x{})",
                    image.width,
                    image.height
                );
                self.cache
                    .insert(file_name.to_string(), Arc::clone(&texture));
                texture
            }
            Err(err) => {
                log::warn!("Using fallback for texture '{file_name}': {err}");
                let fallback = self.fallback(device, queue);
                self.cache
                    .insert(file_name.to_string(), Arc::clone(&fallback));
                fallback
            }
        }
    }

    fn fallback(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Arc<GpuTexture> {
        Arc::clone(self.fallback.get_or_insert_with(|| {
            Arc::new(GpuTexture::upload(
                device,
                queue,
                "fallback-texture",
                &TextureImage::solid(Self::FALLBACK_RGBA),
            ))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::tests::create_test_device;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "2k_mars.png", 4, 2);
        let image = TextureImage::open(&path).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.pixels.len(), 4 * 2 * 4);
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextureImage::open(&dir.path().join("2k_sun.jpg")).unwrap_err();
        assert!(matches!(err, TextureError::NotFound(_)));
    }

    #[test]
    fn test_open_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            TextureImage::open(&path),
            Err(TextureError::Decode(_))
        ));
    }

    #[test]
    fn test_solid_image() {
        let image = TextureImage::solid([1, 2, 3, 4]);
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_loader_caches_and_falls_back() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "2k_moon.png", 2, 2);
        let mut loader = TextureLoader::new(&device, dir.path());

        let moon = loader.load(&device, &queue, Some("2k_moon.png"));
        let again = loader.load(&device, &queue, Some("2k_moon.png"));
        assert!(Arc::ptr_eq(&moon, &again));
        assert_eq!(moon.dimensions, (2, 2));

        let missing = loader.load(&device, &queue, Some("2k_venus.jpg"));
        let none = loader.load(&device, &queue, None);
        assert!(Arc::ptr_eq(&missing, &none));
        assert_eq!(missing.dimensions, (1, 1));
        assert_eq!(loader.cached_count(), 2);
    }
}
