//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`DUO_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use duoframe_math::ProjectionParams;
use duoframe_render::CoordinatorSettings;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Frame clock configuration
    #[serde(default)]
    pub frame: FrameConfig,
    /// Manual pass rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Overlay scene configuration
    #[serde(default)]
    pub overlay: OverlayConfig,
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
    /// 3. Environment variables (`DUO_*`)
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

        // DUO_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("DUO_").split("__"));

        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.camera.to_projection_params().is_valid() {
            return Err(ConfigError::invalid(format!(
                "camera: fov {} / near {} / far {} do not form a frustum",
                self.camera.fov, self.camera.near, self.camera.far
            )));
        }
        if !(self.frame.time_step.is_finite() && self.frame.time_step > 0.0) {
            return Err(ConfigError::invalid(format!(
                "frame: time_step must be positive, got {}",
                self.frame.time_step
            )));
        }
        for (i, panel) in self.overlay.panels.iter().enumerate() {
            if !panel.is_valid() {
                return Err(ConfigError::invalid(format!(
                    "overlay: panel {} extends outside [0, 1]",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Settings for the frame coordinator
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            projection: self.camera.to_projection_params(),
            zoom: self.camera.zoom,
            time_step: self.frame.time_step,
            clear_color: self.rendering.clear_color,
            clear_depth: self.rendering.clear_depth,
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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
            title: "duoframe".to_string(),
            width: 500,
            height: 500,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Camera offset along the forward axis (negative moves away)
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let params = ProjectionParams::default();
        Self {
            fov: params.fov_y_degrees,
            near: params.z_near,
            far: params.z_far,
            zoom: -6.0,
        }
    }
}

impl CameraConfig {
    pub fn to_projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            fov_y_degrees: self.fov,
            z_near: self.near,
            z_far: self.far,
        }
    }
}

/// Frame clock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Clock advance per frame; also the per-frame rotation angle increment
    pub time_step: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { time_step: 0.01 }
    }
}

/// Manual pass rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    /// Clear color [r, g, b, a]
    pub clear_color: [f32; 4],
    /// Clear depth
    pub clear_depth: f32,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.5, 0.5, 0.5, 0.9],
            clear_depth: 1.0,
        }
    }
}

/// Overlay scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Draw the overlay at all
    pub enabled: bool,
    /// Panels in drawing order
    pub panels: Vec<PanelConfig>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            panels: vec![
                PanelConfig {
                    rect: [0.02, 0.02, 0.3, 0.12],
                    color: [0.7, 0.25, 0.2],
                },
                PanelConfig {
                    rect: [0.7, 0.78, 0.28, 0.2],
                    color: [0.2, 0.35, 0.6],
                },
            ],
        }
    }
}

/// A solid panel, positioned as fractions of the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// [x, y, width, height], origin at the lower-left corner
    pub rect: [f32; 4],
    /// [r, g, b]
    pub color: [f32; 3],
}

impl PanelConfig {
    pub fn is_valid(&self) -> bool {
        let [x, y, w, h] = self.rect;
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        in_unit(x) && in_unit(y) && w >= 0.0 && h >= 0.0 && in_unit(x + w) && in_unit(y + h)
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace), used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub enum ConfigError {
    /// A source could not be read or parsed
    Load(figment::Error),
    /// Values parsed but are unusable
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: String) -> Self {
        ConfigError::Invalid(message)
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(e) => write!(f, "Configuration error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Load(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
