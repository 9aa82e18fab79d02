//! High-level operations.
//!
//! This module contains the implementation of the `flagcx-build` commands.

pub mod build_ext;
pub mod configure;

pub use build_ext::{build_ext, build_options, BuildExtOptions, BuildExtOutcome};
pub use configure::{configure, dispatch};
