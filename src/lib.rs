//! flagcx-build - adaptor-aware build configuration for the FlagCX PyTorch extension
//!
//! This crate turns a single hardware vendor selection (`--adaptor`) into the
//! defines, include directories, library directories and link libraries the
//! `flagcx` extension module needs, and drives a C++ toolchain to build it.
//!
//! The pipeline is: [`extract_adaptor`] → [`resolver::resolve_fragment`] →
//! [`ExtensionConfig::assemble`] → [`builder::ExtensionBuilder`].

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use core::{extract_adaptor, Adaptor, ExtensionConfig, Extraction, Layout};
pub use resolver::{Discovery, ResolveError, StaticDiscovery, SystemDiscovery};
