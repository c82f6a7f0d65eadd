//! Config commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{print_single, OutputFormat};

use super::{or_dash, CommandContext};

/// Inspect the active configuration.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    /// Show the settings in effect after flags and environment.
    Show,
}

#[derive(Debug, Serialize)]
struct ConfigView {
    config_file: String,
    alphabet: String,
    host: String,
    checksum: bool,
    hash: String,
    case_shift: String,
    forbidden_words: Vec<String>,
    store: Option<String>,
}

impl ConfigCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ConfigSubcommand::Show => show(ctx),
        }
    }
}

fn show(ctx: CommandContext) -> Result<()> {
    // Validates the merged settings before showing them.
    let family = ctx.family()?;

    let view = ConfigView {
        config_file: ctx.config_path.display().to_string(),
        alphabet: family.alphabet().to_string(),
        host: family.host().to_string(),
        checksum: family.checksum().is_enabled(),
        hash: family.checksum().hash().unwrap_or_default().to_string(),
        case_shift: format!("{:?}", family.case_shift()).to_lowercase(),
        forbidden_words: family.forbidden_words().words().to_vec(),
        store: ctx.config.store.as_ref().map(|p| p.display().to_string()),
    };

    match ctx.format {
        OutputFormat::Json => print_single(&view),
        OutputFormat::Table => {
            println!("config_file: {}", view.config_file);
            println!("alphabet: {}", view.alphabet);
            println!("host: {}", or_dash(&view.host));
            println!("checksum: {}", view.checksum);
            println!("hash: {}", or_dash(&view.hash));
            println!("case: {}", view.case_shift);
            println!("forbidden_words: {}", view.forbidden_words.join(", "));
            println!("store: {}", view.store.as_deref().unwrap_or("-"));
        }
    }

    Ok(())
}
