//! The assembled build configuration for the `flagcx` extension module.
//!
//! A configuration is the fixed baseline (plugin headers, FlagCX core headers
//! and build output) followed by the vendor fragment. Baseline entries always
//! come first, so they win search-path lookups when a vendor directory ships a
//! header or library with the same name.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::adaptor::Adaptor;
use crate::resolver::AdaptorFragment;

/// Name of the Python extension module and of the FlagCX core library.
pub const MODULE_NAME: &str = "flagcx";

/// Core library every build links against.
pub const CORE_LIBRARY: &str = "flagcx";

/// Translation units of the extension, relative to the plugin directory.
pub const SOURCES: &[&str] = &["src/backend_flagcx.cpp"];

/// Where the plugin lives relative to the FlagCX checkout.
///
/// The plugin directory is `<checkout>/plugin/torch`; the core library's
/// headers and build output are reached from it through fixed relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    plugin_dir: PathBuf,
}

impl Layout {
    /// Create a layout rooted at the plugin directory.
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Layout {
            plugin_dir: plugin_dir.into(),
        }
    }

    /// The plugin directory itself.
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// The plugin's own `include` directory.
    pub fn local_include_dir(&self) -> PathBuf {
        self.plugin_dir.join("include")
    }

    /// Public headers of the FlagCX core library.
    pub fn core_include_dir(&self) -> PathBuf {
        self.plugin_dir.join("../../flagcx/include")
    }

    /// Build output directory of the FlagCX core library.
    pub fn core_library_dir(&self) -> PathBuf {
        self.plugin_dir.join("../../build/lib")
    }

    /// The vendor-independent part of every configuration.
    pub fn baseline(&self) -> Baseline {
        Baseline {
            sources: SOURCES.iter().map(|s| self.plugin_dir.join(s)).collect(),
            include_dirs: vec![self.local_include_dir(), self.core_include_dir()],
            library_dirs: vec![self.core_library_dir()],
            libraries: vec![CORE_LIBRARY.to_string()],
            link_rpath: self.core_library_dir(),
        }
    }
}

/// Vendor-independent configuration shared by every adaptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub link_rpath: PathBuf,
}

/// Fully resolved configuration handed to the build toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extension module name
    pub name: String,
    /// Selected vendor
    pub adaptor: Adaptor,
    /// Preprocessor symbol identifying the vendor
    pub define: String,
    /// Source files to compile
    pub sources: Vec<PathBuf>,
    /// Header search path, baseline first
    pub include_dirs: Vec<PathBuf>,
    /// Library search path, baseline first
    pub library_dirs: Vec<PathBuf>,
    /// Libraries to link (without `-l`), core library first
    pub libraries: Vec<String>,
    /// Runtime search path embedded in the module
    pub link_rpath: PathBuf,
}

impl ExtensionConfig {
    /// Merge the vendor fragment after the baseline.
    pub fn assemble(baseline: Baseline, fragment: AdaptorFragment) -> Self {
        let Baseline {
            sources,
            mut include_dirs,
            mut library_dirs,
            mut libraries,
            link_rpath,
        } = baseline;

        include_dirs.extend(fragment.include_dirs);
        library_dirs.extend(fragment.library_dirs);
        libraries.extend(fragment.libraries);

        ExtensionConfig {
            name: MODULE_NAME.to_string(),
            adaptor: fragment.adaptor,
            define: fragment.define.to_string(),
            sources,
            include_dirs,
            library_dirs,
            libraries,
            link_rpath,
        }
    }

    /// The define as a compiler flag.
    pub fn define_flag(&self) -> String {
        format!("-D{}", self.define)
    }

    /// Linker flag that embeds the runtime search path.
    pub fn rpath_flag(&self) -> String {
        format!("-Wl,-rpath,{}", self.link_rpath.display())
    }

    /// Whether every list starts with the corresponding baseline entries.
    pub fn has_baseline_precedence(&self, baseline: &Baseline) -> bool {
        self.include_dirs.starts_with(&baseline.include_dirs)
            && self.library_dirs.starts_with(&baseline.library_dirs)
            && self.libraries.starts_with(&baseline.libraries)
    }
}
