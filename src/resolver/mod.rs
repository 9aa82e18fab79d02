//! Adaptor resolution.
//!
//! Turns an [`Adaptor`] into the vendor part of the build configuration: the
//! define that selects the backend in the C++ sources, plus the SDK headers,
//! library directories and libraries it needs.

mod discovery;
mod errors;

use std::path::{Path, PathBuf};

pub use discovery::{Discovery, StaticDiscovery, SystemDiscovery, TorchEnv};
pub use errors::ResolveError;

use crate::core::adaptor::Adaptor;

/// Install root of the CUDA toolkit.
pub const CUDA_HOME: &str = "/usr/local/cuda";

/// Install root of the Iluvatar CoreX SDK.
pub const COREX_HOME: &str = "/usr/local/corex";

/// Install root of the Enflame TopsRider SDK.
pub const TOPS_HOME: &str = "/opt/tops";

/// Vendor-specific part of the build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptorFragment {
    pub adaptor: Adaptor,
    pub define: &'static str,
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
}

impl AdaptorFragment {
    fn new(adaptor: Adaptor) -> Self {
        AdaptorFragment {
            adaptor,
            define: adaptor.define(),
            include_dirs: Vec::new(),
            library_dirs: Vec::new(),
            libraries: Vec::new(),
        }
    }

    fn libs(mut self, libs: &[&str]) -> Self {
        self.libraries = libs.iter().map(|l| l.to_string()).collect();
        self
    }
}

/// Libraries shared by the CUDA-compatible vendors.
const CUDA_LIBRARIES: &[&str] = &["cuda", "cudart", "c10_cuda", "torch_cuda"];

/// Resolve the vendor fragment for `adaptor`.
pub fn resolve_fragment(
    adaptor: Adaptor,
    discovery: &dyn Discovery,
) -> Result<AdaptorFragment, ResolveError> {
    tracing::info!("Using {} adaptor", adaptor);

    let fragment = match adaptor {
        Adaptor::Nvidia => sdk_fragment(adaptor, Path::new(CUDA_HOME), "lib64").libs(CUDA_LIBRARIES),
        Adaptor::IluvatarCorex => {
            sdk_fragment(adaptor, Path::new(COREX_HOME), "lib64").libs(CUDA_LIBRARIES)
        }
        Adaptor::Cambricon => cambricon_fragment(discovery)?,
        Adaptor::Enflame => enflame_fragment(discovery)?,
    };

    tracing::debug!(
        "{} fragment: include={:?} lib={:?} libs={:?}",
        adaptor,
        fragment.include_dirs,
        fragment.library_dirs,
        fragment.libraries
    );

    Ok(fragment)
}

/// `<root>/include` and `<root>/<lib_subdir>`.
fn sdk_fragment(adaptor: Adaptor, root: &Path, lib_subdir: &str) -> AdaptorFragment {
    let mut fragment = AdaptorFragment::new(adaptor);
    fragment.include_dirs.push(root.join("include"));
    fragment.library_dirs.push(root.join(lib_subdir));
    fragment
}

fn required_env(
    discovery: &dyn Discovery,
    var: &'static str,
    adaptor: Adaptor,
) -> Result<String, ResolveError> {
    discovery
        .env_var(var)
        .ok_or(ResolveError::MissingEnv { var, adaptor })
}

/// Cambricon: Neuware SDK from `NEUWARE_HOME`, torch_mlu headers from its
/// source checkout next to `PYTORCH_HOME`, torch_mlu libraries from the
/// installed package.
fn cambricon_fragment(discovery: &dyn Discovery) -> Result<AdaptorFragment, ResolveError> {
    let adaptor = Adaptor::Cambricon;
    let neuware_home = required_env(discovery, "NEUWARE_HOME", adaptor)?;
    let pytorch_home = required_env(discovery, "PYTORCH_HOME", adaptor)?;
    let torch_mlu_dir = discovery.package_dir("torch_mlu")?;

    let torch_mlu_home = torch_mlu_source_home(&pytorch_home);

    let mut fragment = sdk_fragment(adaptor, Path::new(&neuware_home), "lib64");
    fragment.include_dirs.push(torch_mlu_home.join("torch_mlu/csrc"));
    fragment.library_dirs.push(torch_mlu_dir.join("csrc/lib"));
    Ok(fragment.libs(&["cnrt", "cncl", "torch_mlu"]))
}

/// Enflame: TopsRider SDK at its fixed root, torch_gcu headers and libraries
/// from the installed package.
fn enflame_fragment(discovery: &dyn Discovery) -> Result<AdaptorFragment, ResolveError> {
    let adaptor = Adaptor::Enflame;
    let torch_gcu_dir = discovery.package_dir("torch_gcu")?;

    let mut fragment = sdk_fragment(adaptor, Path::new(TOPS_HOME), "lib");
    fragment.include_dirs.push(torch_gcu_dir.join("include"));
    fragment.library_dirs.push(torch_gcu_dir.join("lib"));
    Ok(fragment.libs(&["topsrt", "torch_gcu"]))
}

/// The torch_mlu checkout sits beside the pytorch checkout: everything in
/// `PYTORCH_HOME` before the first `pytorch`, then `torch_mlu`.
fn torch_mlu_source_home(pytorch_home: &str) -> PathBuf {
    let prefix = pytorch_home
        .split_once("pytorch")
        .map_or(pytorch_home, |(prefix, _)| prefix);
    PathBuf::from(format!("{}torch_mlu", prefix))
}
