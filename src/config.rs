//! Configuration for the JSON mapper
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (jsonmap.toml)
//! - Environment variables (JSONMAP_*)
//!
//! ## Example config file (jsonmap.toml):
//! ```toml
//! [construction]
//! unknown_keys = "retain"
//!
//! [output]
//! format = "compact"
//!
//! [log]
//! filter = "familiar_jsonmap=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::record::{ConstructOptions, UnknownKeys};

/// Main configuration for the mapper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Record construction settings
    #[serde(default)]
    pub construction: ConstructionConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Record construction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructionConfig {
    /// What to do with input keys that no field declares
    #[serde(default)]
    pub unknown_keys: UnknownKeys,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl MapperConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["jsonmap.toml", ".jsonmap.toml", "config/jsonmap.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "jsonmap") {
            let xdg_config = config_dir.config_dir().join("jsonmap.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (JSONMAP_*)
        builder = builder.add_source(
            Environment::with_prefix("JSONMAP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Construction options for [`crate::Record::with_options`]
    pub fn construct_options(&self) -> ConstructOptions {
        ConstructOptions {
            unknown_keys: self.construction.unknown_keys,
        }
    }

    /// Render a JSON value in the configured format
    pub fn render(&self, value: &serde_json::Value) -> serde_json::Result<String> {
        match self.output.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}
