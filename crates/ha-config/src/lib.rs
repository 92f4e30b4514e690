//! YAML configuration loading for Home Assistant
//!
//! Loads `configuration.yaml` and resolves two custom tags:
//!
//! - `!include path` - Include another YAML file, relative to the including file
//! - `!env_var VAR [default]` - Environment variable substitution
//!
//! Top-level sections (`vacuum:`, `scene:`) are deserialized on demand with
//! [`section`].
//!
//! # Example
//!
//! ```ignore
//! use ha_config::{load_yaml, section};
//!
//! let config = load_yaml("/config", "configuration.yaml")?;
//! let scenes: Vec<SceneConfig> = section(&config, "scene")?;
//! ```

mod error;
mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, load_yaml_string, section, YamlLoader};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
