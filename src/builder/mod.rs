//! Handing the assembled configuration to a build toolchain.
//!
//! [`ExtensionBuilder`] is the boundary: everything before it decides *what*
//! to build, implementations decide *how*. [`NativeBuilder`] drives a
//! GCC-style C++ compiler the way PyTorch's `BuildExtension` would.

pub mod fingerprint;
pub mod native;
pub mod toolchain;

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::ExtensionConfig;

pub use native::{BuildOptions, BuildPlan, NativeBuilder};
pub use toolchain::{detect_toolchain, CommandSpec, GccToolchain};

/// Whether the artifact was produced by this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Compiled and linked now
    Built,
    /// Inputs unchanged since the last build
    UpToDate,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Built => write!(f, "built"),
            Freshness::UpToDate => write!(f, "up-to-date"),
        }
    }
}

/// A loadable extension module on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Module name
    pub name: String,
    /// Path to the shared library
    pub path: PathBuf,
    /// How it came to be there
    pub freshness: Freshness,
}

/// Something that can turn a configuration into a loadable module.
pub trait ExtensionBuilder {
    /// Build the extension. Failures are the toolchain's own.
    fn build_extension(&self, config: &ExtensionConfig) -> Result<Artifact>;
}
