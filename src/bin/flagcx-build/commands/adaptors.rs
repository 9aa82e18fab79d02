//! `flagcx-build adaptors` command

use anyhow::Result;

use flagcx_build::Adaptor;

use super::CommandContext;

pub fn execute(ctx: &CommandContext) -> Result<()> {
    for adaptor in Adaptor::ALL {
        let marker = if adaptor == ctx.adaptor { "*" } else { " " };
        println!("{} {:<16} {}", marker, adaptor.as_str(), adaptor.define_flag());
    }

    Ok(())
}
