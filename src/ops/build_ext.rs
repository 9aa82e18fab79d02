//! The `build_ext` operation: configure, then compile and link the module.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::{detect_toolchain, Artifact, BuildOptions, BuildPlan, NativeBuilder};
use crate::core::{Adaptor, Layout};
use crate::ops::configure::{configure, dispatch};
use crate::resolver::Discovery;
use crate::util::Config;

/// Options for `build_ext`. Unset paths fall back to config, then defaults.
#[derive(Debug, Clone, Default)]
pub struct BuildExtOptions {
    /// Directory for objects and the fingerprint
    pub build_temp: Option<PathBuf>,
    /// Directory the module is written to
    pub build_lib: Option<PathBuf>,
    /// Put the module in the plugin directory
    pub inplace: bool,
    /// Unoptimized build with debug info
    pub debug: bool,
    /// Rebuild even if nothing changed
    pub force: bool,
    /// Only work out the commands
    pub dry_run: bool,
}

/// What `build_ext` did.
#[derive(Debug)]
pub enum BuildExtOutcome {
    /// Dry run: the commands that would have run
    Planned(BuildPlan),
    /// The module on disk
    Finished(Artifact),
}

fn resolve_dir(plugin_dir: &Path, dir: PathBuf) -> PathBuf {
    if dir.is_absolute() {
        dir
    } else {
        plugin_dir.join(dir)
    }
}

/// Resolve output locations: command line, then config, then `build/temp` and `build/lib`.
pub fn build_options(layout: &Layout, config: &Config, opts: &BuildExtOptions) -> BuildOptions {
    let plugin_dir = layout.plugin_dir();

    let build_temp = opts
        .build_temp
        .clone()
        .or_else(|| config.build.build_temp.clone())
        .unwrap_or_else(|| PathBuf::from("build/temp"));

    let build_lib = if opts.inplace {
        plugin_dir.to_path_buf()
    } else {
        opts.build_lib
            .clone()
            .or_else(|| config.build.build_lib.clone())
            .unwrap_or_else(|| PathBuf::from("build/lib"))
    };

    BuildOptions {
        build_temp: resolve_dir(plugin_dir, build_temp),
        build_lib: resolve_dir(plugin_dir, build_lib),
        debug: opts.debug,
        force: opts.force,
        cxxflags: config.toolchain.cxxflags.clone(),
        ldflags: config.toolchain.ldflags.clone(),
        header_dirs: vec![layout.local_include_dir(), layout.core_include_dir()],
    }
}

/// Configure the extension for `adaptor` and build it.
///
/// Resolution runs first; torch and the compiler are only looked for once
/// the adaptor's configuration is complete.
pub fn build_ext(
    adaptor: Adaptor,
    layout: &Layout,
    discovery: &dyn Discovery,
    config: &Config,
    opts: &BuildExtOptions,
) -> Result<BuildExtOutcome> {
    let ext = configure(adaptor, layout, discovery)?;

    let torch = discovery.torch_env()?;
    tracing::debug!("torch extension suffix: {}", torch.ext_suffix);

    let toolchain = detect_toolchain(&config.toolchain)?;
    let builder = NativeBuilder::new(toolchain, torch, build_options(layout, config, opts));

    if opts.dry_run {
        return Ok(BuildExtOutcome::Planned(builder.plan(&ext)));
    }

    let artifact = dispatch(&ext, &builder)?;
    Ok(BuildExtOutcome::Finished(artifact))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::resolver::{ResolveError, StaticDiscovery, TorchEnv};
    use crate::util::config::ToolchainSettings;

    fn torch() -> TorchEnv {
        TorchEnv {
            include_dirs: vec![PathBuf::from("/site/torch/include")],
            library_dirs: vec![PathBuf::from("/site/torch/lib")],
            python_include: PathBuf::from("/usr/include/python3.10"),
            ext_suffix: ".so".to_string(),
            cxx11_abi: false,
            pybind11_compiler_type: None,
            pybind11_stdlib: None,
            pybind11_build_abi: None,
        }
    }

    fn config_with_fake_compiler(tmp: &TempDir) -> Config {
        let cxx = tmp.path().join("g++");
        std::fs::write(&cxx, "").unwrap();
        Config {
            toolchain: ToolchainSettings {
                cxx: Some(cxx),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_build_options_defaults() {
        let layout = Layout::new("/p");
        let opts = build_options(&layout, &Config::default(), &BuildExtOptions::default());

        assert_eq!(opts.build_temp, PathBuf::from("/p/build/temp"));
        assert_eq!(opts.build_lib, PathBuf::from("/p/build/lib"));
        assert_eq!(
            opts.header_dirs,
            vec![
                PathBuf::from("/p/include"),
                PathBuf::from("/p/../../flagcx/include"),
            ]
        );
    }

    #[test]
    fn test_build_options_precedence() {
        let layout = Layout::new("/p");
        let mut config = Config::default();
        config.build.build_temp = Some(PathBuf::from("/tmp/objs"));
        config.build.build_lib = Some(PathBuf::from("dist"));
        config.toolchain.cxxflags = vec!["-Wall".to_string()];

        let opts = build_options(&layout, &config, &BuildExtOptions::default());
        assert_eq!(opts.build_temp, PathBuf::from("/tmp/objs"));
        assert_eq!(opts.build_lib, PathBuf::from("/p/dist"));
        assert_eq!(opts.cxxflags, vec!["-Wall"]);

        let cli = BuildExtOptions {
            build_lib: Some(PathBuf::from("out")),
            ..Default::default()
        };
        assert_eq!(
            build_options(&layout, &config, &cli).build_lib,
            PathBuf::from("/p/out")
        );

        let inplace = BuildExtOptions {
            inplace: true,
            build_lib: Some(PathBuf::from("out")),
            ..Default::default()
        };
        assert_eq!(
            build_options(&layout, &config, &inplace).build_lib,
            PathBuf::from("/p")
        );
    }

    #[test]
    fn test_dry_run_plans_enflame_build() {
        let tmp = TempDir::new().unwrap();
        let config = config_with_fake_compiler(&tmp);
        let discovery = StaticDiscovery::new()
            .with_package("torch_gcu", "/site/torch_gcu")
            .with_torch(torch());
        let opts = BuildExtOptions {
            dry_run: true,
            ..Default::default()
        };

        let outcome = build_ext(Adaptor::Enflame, &Layout::new("/p"), &discovery, &config, &opts)
            .unwrap();

        let BuildExtOutcome::Planned(plan) = outcome else {
            panic!("expected a plan");
        };
        assert!(plan.compiles[0]
            .args
            .contains(&"-DUSE_ENFLAME_ADAPTOR".to_string()));
        assert!(plan.link.args.contains(&"-ltorch_gcu".to_string()));
        assert_eq!(plan.output, PathBuf::from("/p/build/lib/flagcx.so"));
        assert!(!PathBuf::from("/p/build").exists());
    }

    #[test]
    fn test_resolution_failure_skips_torch_probe() {
        let discovery = StaticDiscovery::new().with_torch(torch());

        let err = build_ext(
            Adaptor::Cambricon,
            &Layout::new("/p"),
            &discovery,
            &Config::default(),
            &BuildExtOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::MissingEnv { var: "NEUWARE_HOME", .. })
        ));
        assert!(!discovery.lookups().contains(&"torch".to_string()));
    }

    #[test]
    fn test_missing_torch_is_fatal() {
        let err = build_ext(
            Adaptor::Nvidia,
            &Layout::new("/p"),
            &StaticDiscovery::new(),
            &Config::default(),
            &BuildExtOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::MissingPackage { package, .. }) if package == "torch"
        ));
    }
}
