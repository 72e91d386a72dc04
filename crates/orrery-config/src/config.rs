//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "orrery";
const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Camera and pointer control settings.
    pub camera: CameraConfig,
    /// Scene content: body table and textures.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Upper bound on physical pixels per logical pixel.
    pub max_pixel_ratio: f64,
    /// Width and height segments of the shared sphere mesh.
    pub sphere_segments: u32,
    /// Background color (linear RGB).
    pub clear_color: [f64; 3],
    /// Ambient light intensity for lit materials.
    pub ambient_intensity: f32,
    /// Intensity of the point light at the star.
    pub sun_intensity: f32,
}

/// Camera and orbit-control configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Initial camera position; the camera looks at the origin.
    pub position: [f32; 3],
    /// Closest the controls may zoom in.
    pub min_distance: f32,
    /// Farthest the controls may zoom out.
    pub max_distance: f32,
    /// Fraction of remaining motion applied per frame (0 disables damping).
    pub damping: f32,
    /// Radians of rotation per pixel dragged.
    pub rotate_speed: f32,
    /// Fractional distance change per scroll line.
    pub zoom_speed: f32,
}

/// Scene content configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory holding body textures.
    pub textures_dir: PathBuf,
    /// Optional RON body table replacing the built-in system.
    pub system_file: Option<PathBuf>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log body positions every N frames (0 = never).
    pub position_log_interval: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            sphere_segments: 32,
            clear_color: [0.0, 0.0, 0.0],
            ambient_intensity: 0.15,
            sun_intensity: 1.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 35.0,
            near: 0.1,
            far: 400.0,
            position: [0.0, 5.0, 100.0],
            min_distance: 20.0,
            max_distance: 200.0,
            damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            textures_dir: PathBuf::from("textures"),
            system_file: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            position_log_interval: 0,
        }
    }
}

/// Platform configuration directory for the orrery (`<os config dir>/orrery`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Texture directory resolved against `base` when relative.
    pub fn textures_dir(&self, base: &Path) -> PathBuf {
        if self.scene.textures_dir.is_absolute() {
            self.scene.textures_dir.clone()
        } else {
            base.join(&self.scene.textures_dir)
        }
    }
}
