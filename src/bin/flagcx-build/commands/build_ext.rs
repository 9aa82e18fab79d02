//! `flagcx-build build_ext` command

use anyhow::Result;

use crate::cli::BuildExtArgs;
use flagcx_build::core::MODULE_NAME;
use flagcx_build::ops::{build_ext, BuildExtOptions, BuildExtOutcome};
use flagcx_build::ResolveError;

use super::CommandContext;

pub fn execute(args: BuildExtArgs, ctx: &CommandContext) -> Result<()> {
    let opts = BuildExtOptions {
        build_temp: args.build_temp,
        build_lib: args.build_lib,
        inplace: args.inplace,
        debug: args.debug,
        force: args.force,
        dry_run: args.dry_run,
    };

    let discovery = ctx.discovery();

    let outcome = match build_ext(ctx.adaptor, &ctx.layout, &discovery, &ctx.config, &opts) {
        Ok(outcome) => outcome,
        // Resolution errors carry their own diagnostic.
        Err(e) if e.is::<ResolveError>() => return Err(e),
        Err(e) => return Err(e.context(format!("failed to build `{}` extension", MODULE_NAME))),
    };

    match outcome {
        BuildExtOutcome::Planned(plan) => {
            for cmd in plan.commands() {
                println!("{}", cmd.display());
            }
        }
        BuildExtOutcome::Finished(artifact) => {
            eprintln!(
                "    Finished `{}` ({}) -> {}",
                artifact.name,
                artifact.freshness,
                artifact.path.display()
            );
        }
    }

    Ok(())
}
