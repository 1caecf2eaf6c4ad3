//! Viewer settings, read from a JSON file.
//!
//! Every field has a default, so a settings file only needs the values it changes:
//!
//! ```json
//! { "scene": { "model": "assets/models/backpack/backpack.obj" }, "window": { "vsync": false } }
//! ```

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{abs::TextureOptions, import::ImportOptions};

/// Errors produced while reading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub scene: SceneSettings,
    pub camera: CameraSettings,
    pub assets: AssetSettings,
    pub logging: LogSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    /// Create the window without showing it.
    pub hidden: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "lumen3d".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            hidden: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub model: PathBuf,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub clear_color: [f32; 3],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/models/backpack/backpack.obj"),
            vertex_shader: PathBuf::from("assets/shaders/model.vert"),
            fragment_shader: PathBuf::from("assets/shaders/model.frag"),
            clear_color: [0.05, 0.05, 0.05],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    pub fov: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            speed: 2.5,
            sensitivity: 0.1,
            fov: 45.0,
        }
    }
}

impl CameraSettings {
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub flip_textures: bool,
    pub flip_uvs: bool,
    pub generate_normals: bool,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            flip_textures: TextureOptions::default().flip_vertically,
            flip_uvs: ImportOptions::default().flip_uvs,
            generate_normals: ImportOptions::default().generate_normals,
        }
    }
}

impl AssetSettings {
    pub fn texture_options(&self) -> TextureOptions {
        TextureOptions {
            flip_vertically: self.flip_textures,
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            triangulate: true,
            flip_uvs: self.flip_uvs,
            generate_normals: self.generate_normals,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter in `env_logger` syntax, e.g. `info` or `lumen3d=debug,warn`.
    pub level: String,
    /// Also write the log to this file.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The per-user settings file, `<config dir>/lumen3d/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lumen3d").join("settings.json"))
    }

    /// Loads `explicit` if given. Otherwise loads the per-user file if it exists, or falls back
    /// to the defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}
