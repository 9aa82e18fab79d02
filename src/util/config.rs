//! Configuration file support.
//!
//! Two optional locations, both TOML:
//! - Global: `~/.flagcx/config.toml` - user-wide defaults
//! - Project: `<plugin>/.flagcx/config.toml` - overrides for one checkout
//!
//! Project config takes precedence over global config; command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiler settings
    pub toolchain: ToolchainSettings,

    /// Interpreter used for package probes
    pub python: PythonSettings,

    /// Output locations
    pub build: BuildSettings,
}

/// Compiler overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Path to the C++ compiler (e.g., /usr/bin/g++)
    pub cxx: Option<PathBuf>,

    /// Additional C++ compiler flags
    pub cxxflags: Vec<String>,

    /// Additional linker flags
    pub ldflags: Vec<String>,
}

/// Python settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonSettings {
    /// Interpreter that has torch and the vendor plugins installed
    pub interpreter: Option<PathBuf>,
}

/// Build output settings. Relative paths are taken from the plugin directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Directory for object files and fingerprints
    pub build_temp: Option<PathBuf>,

    /// Directory the extension module is written to
    pub build_lib: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.toolchain.cxx.is_some() {
            self.toolchain.cxx = other.toolchain.cxx;
        }
        if !other.toolchain.cxxflags.is_empty() {
            self.toolchain.cxxflags = other.toolchain.cxxflags;
        }
        if !other.toolchain.ldflags.is_empty() {
            self.toolchain.ldflags = other.toolchain.ldflags;
        }

        if other.python.interpreter.is_some() {
            self.python.interpreter = other.python.interpreter;
        }

        if other.build.build_temp.is_some() {
            self.build.build_temp = other.build.build_temp;
        }
        if other.build.build_lib.is_some() {
            self.build.build_lib = other.build.build_lib;
        }
    }
}

/// Get the global config directory (~/.flagcx).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".flagcx"))
}

/// Get the project config path (<plugin>/.flagcx/config.toml).
pub fn project_config_path(plugin_dir: &Path) -> PathBuf {
    plugin_dir.join(".flagcx").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Load configuration for a plugin checkout from the standard locations.
pub fn load_for_plugin(plugin_dir: &Path) -> Config {
    let global = global_config_dir().map(|dir| dir.join("config.toml"));
    load_config(global.as_deref(), &project_config_path(plugin_dir))
}
