//! Check symbol computation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

/// Append the check symbol to one or more bodies.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Bodies (seed plus host) to complete.
    #[arg(required = true)]
    bodies: Vec<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct CheckRow {
    body: String,
    checked: String,
}

impl CheckCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let family = ctx.family()?;

        let rows = self
            .bodies
            .iter()
            .map(|body| -> Result<CheckRow> {
                let body = family.case_shift().apply(body);
                let checked = family.checked_string(&body)?;
                Ok(CheckRow { body, checked })
            })
            .collect::<Result<Vec<_>>>()?;

        print_output(&rows, ctx.format);
        Ok(())
    }
}
