//! Native C++ build of the extension module.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::fingerprint::{find_headers, BuildFingerprint};
use crate::builder::toolchain::{CommandSpec, CompileInput, GccToolchain, LinkInput};
use crate::builder::{Artifact, ExtensionBuilder, Freshness};
use crate::core::ExtensionConfig;
use crate::resolver::TorchEnv;

/// Where and how to build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Directory for objects and the fingerprint
    pub build_temp: PathBuf,
    /// Directory the module is written to
    pub build_lib: PathBuf,
    /// Unoptimized build with debug info
    pub debug: bool,
    /// Rebuild even if the fingerprint matches
    pub force: bool,
    /// Extra compiler flags, appended last
    pub cxxflags: Vec<String>,
    /// Extra linker flags, appended last
    pub ldflags: Vec<String>,
    /// Directories whose headers take part in the fingerprint
    pub header_dirs: Vec<PathBuf>,
}

/// The commands a build would run, in order.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// One compile per source
    pub compiles: Vec<CommandSpec>,
    /// The final link
    pub link: CommandSpec,
    /// Path of the module the link produces
    pub output: PathBuf,
}

impl BuildPlan {
    /// All commands, compiles first.
    pub fn commands(&self) -> Vec<CommandSpec> {
        let mut cmds = self.compiles.clone();
        cmds.push(self.link.clone());
        cmds
    }
}

/// Builds the extension with a local C++ compiler against an installed torch.
#[derive(Debug, Clone)]
pub struct NativeBuilder {
    toolchain: GccToolchain,
    torch: TorchEnv,
    opts: BuildOptions,
}

impl NativeBuilder {
    /// Create a builder.
    pub fn new(toolchain: GccToolchain, torch: TorchEnv, opts: BuildOptions) -> Self {
        NativeBuilder {
            toolchain,
            torch,
            opts,
        }
    }

    /// Path of the module for `config`.
    pub fn output_path(&self, config: &ExtensionConfig) -> PathBuf {
        self.opts
            .build_lib
            .join(format!("{}{}", config.name, self.torch.ext_suffix))
    }

    fn fingerprint_path(&self, config: &ExtensionConfig) -> PathBuf {
        self.opts
            .build_temp
            .join(format!("{}.fingerprint.json", config.name))
    }

    fn object_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_string());
        self.opts
            .build_temp
            .join(format!("{}.{}", stem, self.toolchain.object_extension()))
    }

    /// Defines PyTorch adds to every extension, plus the adaptor's own.
    ///
    /// The pybind11 ABI tags are torch's own, so the module shares torch's
    /// pybind11 internals.
    fn torch_defines(&self, config: &ExtensionConfig) -> Vec<(String, Option<String>)> {
        let mut defines = vec![
            (config.define.clone(), None),
            ("TORCH_API_INCLUDE_EXTENSION_H".to_string(), None),
        ];

        let pybind11 = [
            ("PYBIND11_COMPILER_TYPE", &self.torch.pybind11_compiler_type),
            ("PYBIND11_STDLIB", &self.torch.pybind11_stdlib),
            ("PYBIND11_BUILD_ABI", &self.torch.pybind11_build_abi),
        ];
        for (name, value) in pybind11 {
            if let Some(value) = value {
                defines.push((name.to_string(), Some(format!("\"{}\"", value))));
            }
        }

        defines.push(("TORCH_EXTENSION_NAME".to_string(), Some(config.name.clone())));
        defines.push((
            "_GLIBCXX_USE_CXX11_ABI".to_string(),
            Some(if self.torch.cxx11_abi { "1" } else { "0" }.to_string()),
        ));
        defines
    }

    /// Work out the commands without running anything.
    ///
    /// Configuration paths come before torch's on both search paths, and the
    /// configuration's libraries before torch's on the link line.
    pub fn plan(&self, config: &ExtensionConfig) -> BuildPlan {
        let mut include_dirs = config.include_dirs.clone();
        include_dirs.extend(self.torch.include_dirs.iter().cloned());
        include_dirs.push(self.torch.python_include.clone());

        let mut cxxflags = vec!["-std=c++17".to_string()];
        if self.opts.debug {
            cxxflags.extend(["-O0".to_string(), "-g".to_string()]);
        } else {
            cxxflags.push("-O2".to_string());
        }
        cxxflags.extend(self.opts.cxxflags.iter().cloned());

        let defines = self.torch_defines(config);

        let mut objects = Vec::new();
        let compiles: Vec<CommandSpec> = config
            .sources
            .iter()
            .map(|source| {
                let output = self.object_path(source);
                objects.push(output.clone());
                self.toolchain.compile_command(&CompileInput {
                    source: source.clone(),
                    output,
                    include_dirs: include_dirs.clone(),
                    defines: defines.clone(),
                    cxxflags: cxxflags.clone(),
                })
            })
            .collect();

        let mut lib_dirs = config.library_dirs.clone();
        lib_dirs.extend(self.torch.library_dirs.iter().cloned());

        let mut libs = config.libraries.clone();
        libs.extend(TorchEnv::LIBRARIES.iter().map(|l| l.to_string()));

        let mut ldflags = vec![config.rpath_flag()];
        ldflags.extend(self.opts.ldflags.iter().cloned());

        let output = self.output_path(config);
        let link = self.toolchain.link_shared_command(&LinkInput {
            objects,
            output: output.clone(),
            lib_dirs,
            libs,
            ldflags,
        });

        BuildPlan {
            compiles,
            link,
            output,
        }
    }
}

impl ExtensionBuilder for NativeBuilder {
    fn build_extension(&self, config: &ExtensionConfig) -> Result<Artifact> {
        let plan = self.plan(config);
        let commands = plan.commands();

        let headers = find_headers(&self.opts.header_dirs);
        let fingerprint = BuildFingerprint::compute(&commands, &config.sources, &headers)?;
        let fingerprint_path = self.fingerprint_path(config);

        if !self.opts.force
            && plan.output.exists()
            && BuildFingerprint::load(&fingerprint_path).as_ref() == Some(&fingerprint)
        {
            tracing::info!("skipping `{}` extension (up-to-date)", config.name);
            return Ok(Artifact {
                name: config.name.clone(),
                path: plan.output,
                freshness: Freshness::UpToDate,
            });
        }

        for dir in [&self.opts.build_temp, &self.opts.build_lib] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory: {}", dir.display()))?;
        }

        for cmd in &commands {
            tracing::info!("{}", cmd.display());
            cmd.to_process().exec_and_check()?;
        }

        fingerprint.save(&fingerprint_path)?;

        Ok(Artifact {
            name: config.name.clone(),
            path: plan.output,
            freshness: Freshness::Built,
        })
    }
}
