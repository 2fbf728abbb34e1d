//! Configuration management for the relation registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (relations.toml)
//! - Environment variables (RELATIONS__*)
//!
//! ## Example config file (relations.toml):
//! ```toml
//! [registry]
//! path = "./schema/relations.rels"
//!
//! [validation]
//! fail_on_violation = true
//! snapshot = "./schema/snapshot.json"
//!
//! [lint]
//! deny_warnings = false
//! allow = ["SELF_REFERENCE"]
//!
//! [report]
//! output_format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationsConfig {
    /// Where declarations live
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Snapshot validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Lint settings
    #[serde(default)]
    pub lint: LintConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Declaration file, or a directory of `*.rels` files
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Exit non-zero when violations are found
    #[serde(default = "default_true")]
    pub fail_on_violation: bool,

    /// Default snapshot to validate
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

/// Lint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintConfig {
    /// Treat warnings as failures
    #[serde(default)]
    pub deny_warnings: bool,

    /// Lint codes to suppress
    #[serde(default)]
    pub allow: Vec<String>,
}

/// Report configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_registry_path() -> PathBuf {
    PathBuf::from("relations.rels")
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fail_on_violation: true,
            snapshot: None,
        }
    }
}

impl RelationsConfig {
    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "relations.toml",
            ".relations.toml",
            "config/relations.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "relations") {
            let xdg_config = config_dir.config_dir().join("relations.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // RELATIONS__VALIDATION__FAIL_ON_VIOLATION=false
        builder = builder.add_source(
            Environment::with_prefix("RELATIONS")
                .prefix_separator("__")
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

    /// Registry path, resolved against the working directory
    pub fn registry_path(&self) -> PathBuf {
        if self.registry.path.is_absolute() {
            self.registry.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.registry.path)
        }
    }
}
