//! Configuration system
//!
//! Every section uses `#[serde(default)]`, so a file only needs to name the
//! values it changes:
//!
//! ```toml
//! [render]
//! default_priority = -50
//!
//! [timer]
//! fixed_step_hz = 60
//! ```

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::assets::DEFAULT_GRACE_PERIOD;
use crate::foundation::time::DEFAULT_MAX_FRAME_TIME;
use crate::render::priority::RenderPriority;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Queue behaviour
    pub render: RenderConfig,
    /// Frame timing
    pub timer: TimerConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Asset lifetime
    pub assets: AssetConfig,
}

impl Config for EngineConfig {}

/// Render queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Priority given to newly created nodes
    pub default_priority: RenderPriority,
    /// Leave submeshes with nothing to draw out of the queue
    pub skip_empty_batches: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_priority: RenderPriority::MAIN,
            skip_empty_batches: true,
        }
    }
}

/// Frame timer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Fixed update rate; `None` for variable step
    pub fixed_step_hz: Option<u32>,
    /// Longest frame time fed into the simulation, in seconds
    pub max_frame_time: f32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            fixed_step_hz: None,
            max_frame_time: DEFAULT_MAX_FRAME_TIME,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

/// Asset lifetime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Run garbage collection at the start of every frame
    pub collect_garbage_every_frame: bool,
    /// Seconds a periodic asset nobody has claimed yet survives collection
    pub unclaimed_grace_period: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            collect_garbage_every_frame: true,
            unclaimed_grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.render.default_priority, RenderPriority::MAIN);
        assert!(config.render.skip_empty_batches);
        assert_eq!(config.timer.fixed_step_hz, None);
        assert!((config.timer.max_frame_time - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.logging.filter, "info");
        assert!(config.assets.collect_garbage_every_frame);
        assert!((config.assets.unclaimed_grace_period - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [render]
            default_priority = -50

            [timer]
            fixed_step_hz = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.render.default_priority, RenderPriority::DISTANT);
        assert!(config.render.skip_empty_batches);
        assert_eq!(config.timer.fixed_step_hz, Some(60));
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_out_of_range_priority_rejected() {
        let result = EngineConfig::from_toml_str("[render]\ndefault_priority = 900\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_ron_file_save_and_load() {
        let path = std::env::temp_dir().join(format!("stage_engine_config_{}.ron", std::process::id()));
        let mut config = EngineConfig::default();
        config.logging.filter = "debug".to_owned();
        config.timer.fixed_step_hz = Some(30);

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            EngineConfig::default().save_to_file("engine.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
