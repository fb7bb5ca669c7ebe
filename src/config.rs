//! Engine configuration, persisted as TOML.
//!
//! Every field is optional in the file; missing fields take their defaults.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uri::DEFAULT_URI_LENGTH;

/// Errors from loading, saving, or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(onto::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(onto::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(onto::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(onto::config::invalid), help("Fix the named field. {message}"))]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration for an [`Ontology`](crate::ontology::Ontology).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// Namespace hint for generated uris (`http://{namespace}.com/...`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Length of the random uri suffix.
    #[serde(default = "default_uri_length")]
    pub uri_length: usize,
    /// Data directory for the durable store. `None` for memory-only mode.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Require relationship targets to be instances of the property's RANGE class.
    #[serde(default)]
    pub enforce_range: bool,
    /// Delete property nodes declared on classes removed by a cascading delete.
    #[serde(default)]
    pub cleanup_orphans: bool,
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_namespace() -> String {
    "ontology".into()
}
fn default_uri_length() -> usize {
    DEFAULT_URI_LENGTH
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            uri_length: default_uri_length(),
            data_dir: None,
            enforce_range: false,
            cleanup_orphans: false,
            log_level: default_log_level(),
        }
    }
}

impl OntologyConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config as TOML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |e: std::io::Error| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            message: format!("cannot serialize config: {e}"),
        })?;
        std::fs::write(path, content).map_err(write_err)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "namespace must not be empty".into(),
            });
        }
        if self.uri_length == 0 {
            return Err(ConfigError::Invalid {
                message: "uri_length must be > 0".into(),
            });
        }
        Ok(())
    }
}
