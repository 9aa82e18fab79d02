//! C++ compiler abstraction.
//!
//! Generates the compile and link commands for the extension module.
//!
//! Compiler detection priority:
//! 1. `cxx` under `[toolchain]` in the config files
//! 2. The `CXX` environment variable
//! 3. Auto-detection (`c++`, `g++`, `clang++` on PATH)

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::util::config::ToolchainSettings;
use crate::util::diagnostic::suggestions;
use crate::util::process::{find_cxx_compiler, ProcessBuilder};

mod gcc;

pub use gcc::GccToolchain;

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "g++")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Turn the spec into something runnable.
    pub fn to_process(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).args(&self.args)
    }

    /// The command line as a single string.
    pub fn display(&self) -> String {
        self.to_process().display_command()
    }
}

/// Input for a compile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Include directories, in search order
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines (name, optional value)
    pub defines: Vec<(String, Option<String>)>,
    /// Additional compiler flags
    pub cxxflags: Vec<String>,
}

/// Input for a shared-library link step.
#[derive(Debug, Clone)]
pub struct LinkInput {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output shared library
    pub output: PathBuf,
    /// Library search paths, in search order
    pub lib_dirs: Vec<PathBuf>,
    /// Libraries to link (without -l prefix)
    pub libs: Vec<String>,
    /// Additional linker flags
    pub ldflags: Vec<String>,
}

/// Find the C++ compiler to build with.
pub fn detect_toolchain(settings: &ToolchainSettings) -> Result<GccToolchain> {
    if let Some(cxx) = &settings.cxx {
        if cxx.exists() {
            tracing::info!("Using C++ compiler from config: {}", cxx.display());
            return Ok(GccToolchain::new(cxx.clone()));
        }
        tracing::warn!("Configured C++ compiler not found: {}", cxx.display());
    }

    let Some(cxx) = find_cxx_compiler() else {
        bail!("no C++ compiler found\n{}", suggestions::NO_COMPILER);
    };

    tracing::debug!("Using C++ compiler: {}", cxx.display());
    Ok(GccToolchain::new(cxx))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_command_spec_display() {
        let cmd = CommandSpec::new("g++").arg("-shared").args(["-o", "flagcx.so"]);
        assert_eq!(cmd.display(), "g++ -shared -o flagcx.so");
    }

    #[test]
    fn test_detect_prefers_configured_compiler() {
        let tmp = TempDir::new().unwrap();
        let cxx = tmp.path().join("my-g++");
        std::fs::write(&cxx, "").unwrap();

        let settings = ToolchainSettings {
            cxx: Some(cxx.clone()),
            ..Default::default()
        };

        let toolchain = detect_toolchain(&settings).unwrap();
        assert_eq!(toolchain.cxx, cxx);
    }
}
