//! Configuration system for gpulens.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-local configuration directory.
pub const WORKSPACE_CONFIG_DIR: &str = ".gpulens";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpulensConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// HTTP dashboard server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted CSV upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8501
}
fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Analysis defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Percentile preselected in the dashboard (0-100).
    #[serde(default = "default_percentile")]
    pub default_percentile: u8,
}

fn default_percentile() -> u8 {
    95
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_percentile: default_percentile(),
        }
    }
}

impl GpulensConfig {
    /// Reject values that would make the server or the analysis unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must not be 0".into(),
            });
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_upload_bytes must be positive".into(),
            });
        }
        if self.analysis.default_percentile > 100 {
            return Err(ConfigError::Invalid {
                message: format!(
                    "analysis.default_percentile must be within 0-100, got {}",
                    self.analysis.default_percentile
                ),
            });
        }
        Ok(())
    }
}

/// Path of the user-level config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "gpulens", "gpulens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(WORKSPACE_CONFIG_DIR).join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `GPULENS_`)
/// 3. Workspace-local config (`.gpulens/config.toml`)
/// 4. User config (`~/.config/gpulens/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&GpulensConfig>,
) -> Result<GpulensConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(GpulensConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // GPULENS_SERVER__PORT, GPULENS_ANALYSIS__DEFAULT_PERCENTILE, ...
    figment = figment.merge(Env::prefixed("GPULENS_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: GpulensConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a single explicit file, layered over the defaults.
pub fn load_config_file(path: &Path) -> Result<GpulensConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let config: GpulensConfig = Figment::from(Serialized::defaults(GpulensConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GPULENS_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}
