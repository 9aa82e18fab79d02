//! Core data structures.
//!
//! - [`Adaptor`]: the closed set of hardware vendors
//! - [`extract_adaptor`]: splitting `--adaptor` off the invocation arguments
//! - [`ExtensionConfig`]: the assembled compile/link configuration

pub mod adaptor;
pub mod args;
pub mod extension;

pub use adaptor::Adaptor;
pub use args::{extract_adaptor, Extraction, ADAPTOR_FLAG};
pub use extension::{Baseline, ExtensionConfig, Layout, CORE_LIBRARY, MODULE_NAME};
