//! Resolving an adaptor into a complete configuration and dispatching it.

use anyhow::Result;

use crate::builder::{Artifact, ExtensionBuilder};
use crate::core::{Adaptor, ExtensionConfig, Layout};
use crate::resolver::{resolve_fragment, Discovery, ResolveError};

/// Resolve `adaptor` and assemble the configuration for the plugin at `layout`.
pub fn configure(
    adaptor: Adaptor,
    layout: &Layout,
    discovery: &dyn Discovery,
) -> Result<ExtensionConfig, ResolveError> {
    let fragment = resolve_fragment(adaptor, discovery)?;
    let config = ExtensionConfig::assemble(layout.baseline(), fragment);

    tracing::debug!(
        "configured `{}` with {} ({} include dirs, {} library dirs, {} libraries)",
        config.name,
        config.define,
        config.include_dirs.len(),
        config.library_dirs.len(),
        config.libraries.len()
    );

    Ok(config)
}

/// Hand the configuration to the build toolchain.
pub fn dispatch(config: &ExtensionConfig, builder: &dyn ExtensionBuilder) -> Result<Artifact> {
    tracing::info!("Building `{}` extension with {}", config.name, config.define_flag());
    builder.build_extension(config)
}
