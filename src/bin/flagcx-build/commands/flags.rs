//! `flagcx-build flags` command

use anyhow::{Context, Result};

use crate::cli::FlagsArgs;
use flagcx_build::ops::configure;

use super::CommandContext;

pub fn execute(args: FlagsArgs, ctx: &CommandContext) -> Result<()> {
    let discovery = ctx.discovery();
    let config = configure(ctx.adaptor, &ctx.layout, &discovery)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&config).context("failed to serialize configuration")?;
        println!("{}", json);
        return Ok(());
    }

    let baseline = ctx.layout.baseline();
    let vendor = ctx.adaptor.as_str();
    let from = |index: usize, baseline_len: usize| {
        if index < baseline_len {
            "baseline"
        } else {
            vendor
        }
    };

    // Print compile flags with provenance
    if !args.link {
        println!("# Compile flags for `{}`:", config.name);

        for (i, dir) in config.include_dirs.iter().enumerate() {
            println!(
                "  -I{}    # from: {}",
                dir.display(),
                from(i, baseline.include_dirs.len())
            );
        }

        println!("  {}    # from: {}", config.define_flag(), vendor);

        for source in &config.sources {
            println!("  {}    # from: baseline", source.display());
        }
    }

    if !args.compile && !args.link {
        println!();
    }

    // Print link flags with provenance
    if !args.compile {
        println!("# Link flags for `{}`:", config.name);

        for (i, dir) in config.library_dirs.iter().enumerate() {
            println!(
                "  -L{}    # from: {}",
                dir.display(),
                from(i, baseline.library_dirs.len())
            );
        }

        for (i, lib) in config.libraries.iter().enumerate() {
            println!("  -l{}    # from: {}", lib, from(i, baseline.libraries.len()));
        }

        println!("  {}    # from: baseline", config.rpath_flag());
    }

    Ok(())
}
