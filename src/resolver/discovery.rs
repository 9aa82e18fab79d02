//! Finding vendor SDKs and Python packages on the host.
//!
//! Resolution never touches the environment directly; it asks a
//! [`Discovery`]. [`SystemDiscovery`] answers from the live process
//! environment and by asking a Python interpreter, [`StaticDiscovery`] answers
//! from a fixed table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolveError;
use crate::util::process::ProcessBuilder;

/// Prints the directory holding a module's `__init__`, i.e. its install location.
const PACKAGE_DIR_PROBE: &str = "\
import importlib, os, sys
module = importlib.import_module(sys.argv[1])
print(os.path.dirname(os.path.abspath(module.__file__)))
";

/// Prints what `torch.utils.cpp_extension` would add to an extension build.
const TORCH_ENV_PROBE: &str = "\
import json, sysconfig
import torch
from torch.utils import cpp_extension
print(json.dumps({
    'include_dirs': cpp_extension.include_paths(),
    'library_dirs': cpp_extension.library_paths(),
    'python_include': sysconfig.get_paths()['include'],
    'ext_suffix': sysconfig.get_config_var('EXT_SUFFIX') or '.so',
    'cxx11_abi': bool(torch._C._GLIBCXX_USE_CXX11_ABI),
    'pybind11_compiler_type': getattr(torch._C, '_PYBIND11_COMPILER_TYPE', None),
    'pybind11_stdlib': getattr(torch._C, '_PYBIND11_STDLIB', None),
    'pybind11_build_abi': getattr(torch._C, '_PYBIND11_BUILD_ABI', None),
}))
";

/// What PyTorch contributes to any C++ extension build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorchEnv {
    /// Torch header directories
    pub include_dirs: Vec<PathBuf>,
    /// Directories holding `libtorch*.so` and `libc10.so`
    pub library_dirs: Vec<PathBuf>,
    /// `Python.h` directory of the interpreter
    pub python_include: PathBuf,
    /// Filename suffix of extension modules, e.g. `.cpython-310-x86_64-linux-gnu.so`
    pub ext_suffix: String,
    /// Whether torch was built with the C++11 ABI
    pub cxx11_abi: bool,
    /// `torch._C._PYBIND11_COMPILER_TYPE`; older torches have none
    #[serde(default)]
    pub pybind11_compiler_type: Option<String>,
    /// `torch._C._PYBIND11_STDLIB`
    #[serde(default)]
    pub pybind11_stdlib: Option<String>,
    /// `torch._C._PYBIND11_BUILD_ABI`
    #[serde(default)]
    pub pybind11_build_abi: Option<String>,
}

impl TorchEnv {
    /// Libraries every torch extension links against.
    pub const LIBRARIES: &'static [&'static str] = &["c10", "torch", "torch_cpu", "torch_python"];
}

/// Source of environment variables and package locations.
pub trait Discovery {
    /// Read an environment variable. Unset and empty are both `None`.
    fn env_var(&self, key: &str) -> Option<String>;

    /// Install directory of an importable Python package.
    fn package_dir(&self, package: &str) -> Result<PathBuf, ResolveError>;

    /// Torch's contribution to extension builds.
    fn torch_env(&self) -> Result<TorchEnv, ResolveError>;
}

/// Discovery against the running system.
#[derive(Debug, Clone)]
pub struct SystemDiscovery {
    python: PathBuf,
}

impl SystemDiscovery {
    /// Probe packages with the given interpreter.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        SystemDiscovery {
            python: python.into(),
        }
    }

    fn run_probe(&self, package: &str, script: &str, args: &[&str]) -> Result<String, ResolveError> {
        let probe = ProcessBuilder::new(&self.python)
            .arg("-c")
            .arg(script)
            .args(args);

        tracing::debug!("probing `{}` with {}", package, self.python.display());

        let output = probe
            .exec()
            .map_err(|e| ResolveError::MissingPackage {
                package: package.to_string(),
                reason: format!("{:#}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::missing_package(package, &stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Discovery for SystemDiscovery {
    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn package_dir(&self, package: &str) -> Result<PathBuf, ResolveError> {
        let stdout = self.run_probe(package, PACKAGE_DIR_PROBE, &[package])?;
        let dir = stdout.lines().last().unwrap_or_default();

        if dir.is_empty() {
            return Err(ResolveError::missing_package(package, ""));
        }

        tracing::debug!("found `{}` at {}", package, dir);
        Ok(PathBuf::from(dir))
    }

    fn torch_env(&self) -> Result<TorchEnv, ResolveError> {
        let stdout = self.run_probe("torch", TORCH_ENV_PROBE, &[])?;
        let json = stdout.lines().last().unwrap_or_default();

        serde_json::from_str(json).map_err(|e| ResolveError::MissingPackage {
            package: "torch".to_string(),
            reason: format!("unexpected probe output: {}", e),
        })
    }
}

/// Discovery from a fixed table.
///
/// Records every lookup so callers can tell whether resolution consulted the
/// environment at all.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    env: HashMap<String, String>,
    packages: HashMap<String, PathBuf>,
    torch: Option<TorchEnv>,
    lookups: RefCell<Vec<String>>,
}

impl StaticDiscovery {
    /// An empty table: no variables, no packages, no torch.
    pub fn new() -> Self {
        StaticDiscovery::default()
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add an installed package.
    pub fn with_package(mut self, package: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.packages.insert(package.into(), dir.into());
        self
    }

    /// Set the torch environment.
    pub fn with_torch(mut self, torch: TorchEnv) -> Self {
        self.torch = Some(torch);
        self
    }

    /// Every key or package asked for so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }

    fn record(&self, what: &str) {
        self.lookups.borrow_mut().push(what.to_string());
    }
}

impl Discovery for StaticDiscovery {
    fn env_var(&self, key: &str) -> Option<String> {
        self.record(key);
        self.env.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn package_dir(&self, package: &str) -> Result<PathBuf, ResolveError> {
        self.record(package);
        self.packages
            .get(package)
            .cloned()
            .ok_or_else(|| ResolveError::MissingPackage {
                package: package.to_string(),
                reason: format!("No module named '{}'", package),
            })
    }

    fn torch_env(&self) -> Result<TorchEnv, ResolveError> {
        self.record("torch");
        self.torch.clone().ok_or_else(|| ResolveError::MissingPackage {
            package: "torch".to_string(),
            reason: "No module named 'torch'".to_string(),
        })
    }
}
