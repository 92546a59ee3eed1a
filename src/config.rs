//! Render configuration
//!
//! Loaded from, lowest to highest priority:
//! 1. `config/default.toml`
//! 2. `config/user.toml` (optional, not versioned)
//! 3. Environment variables (`SKETCHBOOK_SECTION__KEY`)
//!
//! Command line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{Result, SketchError, sketch::Settings};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
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
        // SKETCHBOOK_RENDER__SCALE=0.5 -> render.scale = 0.5
        figment = figment.merge(Env::prefixed("SKETCHBOOK_").split("__"));

        let config: AppConfig = figment.extract()?;
        config.validate()?;
        log::debug!("loaded config from {}: {:?}", config_dir.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let scale = self.render.scale;
        if !scale.is_finite() || scale <= 0. {
            return Err(SketchError::Config(format!(
                "render.scale must be positive, got {}",
                scale
            )));
        }
        if self.render.frames == Some(0) {
            return Err(SketchError::Config(
                "render.frames must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Sketch settings with the render overrides applied.
    pub fn apply(&self, settings: &Settings) -> Settings {
        let mut settings = settings.clone();
        let scale = self.render.scale;
        settings.dimensions = settings
            .dimensions
            .map(|d| ((d as f64 * scale).round() as u32).max(1));

        if let Some(seed) = self.render.seed {
            settings.seed = Some(seed);
        }
        if let Some(frames) = self.render.frames {
            if settings.animate {
                settings.total_frames = Some(frames);
            } else {
                log::warn!("frame count override ignored for a still sketch");
            }
        }
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Frames land in `<dir>/<sketch name>/`
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Multiplies the sketch dimensions
    pub scale: f64,
    pub seed: Option<u64>,
    /// Overrides the frame count of animated sketches
    pub frames: Option<u32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1.,
            seed: None,
            frames: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// error, warn, info, debug, trace. `RUST_LOG` wins when set.
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
