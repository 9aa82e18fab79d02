//! flagcx-build CLI - configure and build the FlagCX PyTorch extension

use std::ffi::OsString;
use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flagcx_build::util::diagnostic::{self, Diagnostic};
use flagcx_build::{extract_adaptor, ResolveError};

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::CommandContext;

fn main() {
    let mut color = std::io::stderr().is_terminal();
    if let Err(e) = run(&mut color) {
        report(e, color);
        std::process::exit(1);
    }
}

/// Resolution errors carry their own help; anything else is shown with its causes.
fn report(err: anyhow::Error, color: bool) {
    match err.downcast::<ResolveError>() {
        Ok(err) => eprintln!("{:?}", miette::Report::new(err)),
        Err(err) => diagnostic::emit(&Diagnostic::from_error(&err), color),
    }
}

fn run(color: &mut bool) -> Result<()> {
    let mut raw = std::env::args_os();
    let program = raw.next().unwrap_or_else(|| OsString::from("flagcx-build"));

    // `--adaptor` is not a clap argument; take it out before clap sees it.
    let extraction = extract_adaptor(raw)?;
    let cli = Cli::parse_from(std::iter::once(program).chain(extraction.remaining.iter().cloned()));

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("flagcx_build=debug")
    } else {
        EnvFilter::new("flagcx_build=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    *color = *color && !cli.no_color;
    for diag in &extraction.diagnostics {
        diagnostic::emit(diag, *color);
    }

    let ctx = CommandContext::new(extraction.adaptor, cli.plugin_dir)?;

    match cli.command {
        Commands::BuildExt(args) => commands::build_ext::execute(args, &ctx),
        Commands::Flags(args) => commands::flags::execute(args, &ctx),
        Commands::Adaptors => commands::adaptors::execute(&ctx),
    }
}
