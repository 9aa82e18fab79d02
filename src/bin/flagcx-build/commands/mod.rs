//! Command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use flagcx_build::util::config::load_for_plugin;
use flagcx_build::util::process::find_python;
use flagcx_build::util::Config;
use flagcx_build::{Adaptor, Layout, SystemDiscovery};

pub mod adaptors;
pub mod build_ext;
pub mod flags;

/// State shared by every command.
pub struct CommandContext {
    /// Adaptor taken off the command line
    pub adaptor: Adaptor,
    /// Where the plugin sources live
    pub layout: Layout,
    /// Merged global and project configuration
    pub config: Config,
}

impl CommandContext {
    /// Resolve the plugin directory (current directory by default) and load its config.
    pub fn new(adaptor: Adaptor, plugin_dir: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let plugin_dir = match plugin_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd,
        };

        let config = load_for_plugin(&plugin_dir);

        Ok(CommandContext {
            adaptor,
            layout: Layout::new(plugin_dir),
            config,
        })
    }

    /// Discovery against this machine, probing with the configured interpreter.
    pub fn discovery(&self) -> SystemDiscovery {
        let python = self
            .config
            .python
            .interpreter
            .clone()
            .or_else(find_python)
            .unwrap_or_else(|| PathBuf::from("python3"));

        SystemDiscovery::new(python)
    }
}
