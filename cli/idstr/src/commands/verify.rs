//! Identifier verification.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::error::CliError;
use crate::output::{print_output, OutputFormat};

use super::CommandContext;

/// Verify identifiers against the active family settings.
#[derive(Debug, Args)]
pub struct VerifyCommand {
    /// Identifiers to verify.
    #[arg(required = true)]
    ids: Vec<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct VerifyRow {
    id: String,
    valid: bool,
}

impl VerifyCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let family = ctx.family()?;

        let rows: Vec<VerifyRow> = self
            .ids
            .into_iter()
            .map(|id| VerifyRow {
                valid: family.verify(&id),
                id,
            })
            .collect();

        let failed = rows.iter().filter(|row| !row.valid).count();
        info!(total = rows.len(), failed, "verified identifiers");

        match ctx.format {
            OutputFormat::Json => print_output(&rows, ctx.format),
            OutputFormat::Table => {
                for row in &rows {
                    let mark = if row.valid {
                        "ok".green().bold()
                    } else {
                        "FAILED".red().bold()
                    };
                    println!("{} {}", row.id, mark);
                }
            }
        }

        if failed > 0 {
            return Err(CliError::VerificationFailed {
                failed,
                total: rows.len(),
            }
            .into());
        }
        Ok(())
    }
}
