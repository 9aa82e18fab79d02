//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const ADAPTOR_HELP: &str = "\
Adaptor selection:
  --adaptor <VENDOR>  Hardware vendor to build for, anywhere on the command line
                      [default: nvidia]
                      [possible values: nvidia, iluvatar_corex, cambricon, enflame]

Environment:
  NEUWARE_HOME, PYTORCH_HOME  required by the cambricon adaptor
  CXX                         C++ compiler (overridden by .flagcx/config.toml)";

/// flagcx-build - configure and build the FlagCX PyTorch extension
#[derive(Parser)]
#[command(name = "flagcx-build")]
#[command(author, version, about, long_about = None)]
#[command(after_help = ADAPTOR_HELP)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Plugin directory (the one holding `src/backend_flagcx.cpp`)
    #[arg(long, global = true, value_name = "DIR")]
    pub plugin_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile and link the extension module
    #[command(name = "build_ext", alias = "build-ext")]
    BuildExt(BuildExtArgs),

    /// Show the resolved compile/link configuration
    Flags(FlagsArgs),

    /// List supported adaptors
    Adaptors,
}

#[derive(Args)]
pub struct BuildExtArgs {
    /// Directory for temporary build files [default: build/temp]
    #[arg(short = 't', long)]
    pub build_temp: Option<PathBuf>,

    /// Directory for the compiled module [default: build/lib]
    #[arg(short = 'b', long)]
    pub build_lib: Option<PathBuf>,

    /// Put the compiled module into the plugin directory
    #[arg(short, long)]
    pub inplace: bool,

    /// Compile without optimization and with debug info
    #[arg(short, long)]
    pub debug: bool,

    /// Rebuild even if the module is up to date
    #[arg(short, long)]
    pub force: bool,

    /// Print the commands without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Print the configuration as JSON
    #[arg(long, conflicts_with_all = ["compile", "link"])]
    pub json: bool,

    /// Show compile flags only
    #[arg(long, conflicts_with = "link")]
    pub compile: bool,

    /// Show link flags only
    #[arg(long)]
    pub link: bool,
}
