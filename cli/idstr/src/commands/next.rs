//! Local increments of an existing identifier.

use anyhow::Result;
use clap::Args;

use crate::output::print_output;

use super::{CommandContext, IdRow};

/// Show the identifiers following an existing one.
///
/// No seed record is consulted; use `mint` to issue from a shared counter.
#[derive(Debug, Args)]
pub struct NextCommand {
    /// A previously issued identifier.
    id: String,

    /// How many identifiers to show.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
}

impl NextCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let family = ctx.family()?;
        let current = family.parse(&self.id)?;

        let rows = current
            .sequence()
            .take(self.count)
            .map(|id| id.map(|id| IdRow::from(&id)))
            .collect::<Result<Vec<_>, _>>()?;

        print_output(&rows, ctx.format);
        Ok(())
    }
}
