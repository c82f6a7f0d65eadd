//! Rendering identifiers from seeds.

use anyhow::{Context, Result};
use clap::Args;

use crate::output::print_output;

use super::{CommandContext, IdRow};

/// Render the identifier for a seed.
#[derive(Debug, Args)]
pub struct SeedCommand {
    /// Seed in alphabet symbols, or a decimal number with --integer.
    seed: String,

    /// Read the seed as a decimal integer.
    #[arg(long)]
    integer: bool,
}

impl SeedCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let family = ctx.family()?;

        let id = if self.integer {
            let value: u128 = self
                .seed
                .parse()
                .with_context(|| format!("'{}' is not a decimal integer", self.seed))?;
            family.from_integer(value)?
        } else {
            family.from_seed(&self.seed)?
        };

        print_output(&[IdRow::from(&id)], ctx.format);
        Ok(())
    }
}
