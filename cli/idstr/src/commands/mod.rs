//! CLI commands.

mod check;
mod config;
mod mint;
mod next;
mod seed;
mod verify;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idstring::{CaseShift, FamilyConfig, IdFamily, IdString};
use serde::Serialize;
use tabled::Tabled;

use crate::config::{Config, FamilyOverrides};
use crate::output::OutputFormat;

/// idstr - Issue and check compact serial identifiers with a check symbol.
#[derive(Debug, Parser)]
#[command(name = "idstr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Config file (defaults to config.toml in the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Issuer host suffix.
    #[arg(long, global = true, env = "IDSTR_HOST")]
    host: Option<String>,

    /// Hash mixed into the check symbol.
    #[arg(long, global = true, env = "IDSTR_HASH")]
    hash: Option<String>,

    /// Issue and accept identifiers without a check symbol.
    #[arg(long, global = true)]
    no_checksum: bool,

    /// Alphabet symbols in ordinal order.
    #[arg(long, global = true)]
    alphabet: Option<String>,

    /// Case policy for input (upper, lower or none).
    #[arg(long = "case", global = true)]
    case_shift: Option<CaseShift>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Append the check symbol to a body.
    Check(check::CheckCommand),

    /// Verify identifiers (exits non-zero if any fail).
    Verify(verify::VerifyCommand),

    /// Render the identifier for a seed.
    Seed(seed::SeedCommand),

    /// Show the identifiers following an existing one.
    Next(next::NextCommand),

    /// Issue identifiers from a shared seed record.
    Mint(mint::MintCommand),

    /// Show the active configuration.
    Config(config::ConfigCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        let (config, config_path) = Config::load(self.config.as_deref())?;

        let overrides = FamilyOverrides {
            alphabet: self.alphabet,
            host: self.host,
            hash: self.hash,
            no_checksum: self.no_checksum,
            case_shift: self.case_shift,
        };

        let ctx = CommandContext {
            family: overrides.apply(config.family.clone()),
            config,
            config_path,
            format: self.format,
        };

        match self.command {
            Commands::Check(cmd) => cmd.run(ctx),
            Commands::Verify(cmd) => cmd.run(ctx),
            Commands::Seed(cmd) => cmd.run(ctx),
            Commands::Next(cmd) => cmd.run(ctx),
            Commands::Mint(cmd) => cmd.run(ctx),
            Commands::Config(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("idstr {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    /// Config as loaded from disk.
    pub config: Config,
    pub config_path: PathBuf,
    /// Family settings after flags and environment are applied.
    pub family: FamilyConfig,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Build the identifier family for this invocation.
    pub fn family(&self) -> Result<IdFamily> {
        IdFamily::new(self.family.clone()).context("Invalid identifier family settings")
    }
}

/// One identifier, as shown by the listing commands.
#[derive(Debug, Serialize, Tabled)]
pub struct IdRow {
    pub id: String,
    pub seed: String,
    pub host: String,
    pub check: String,
}

impl From<&IdString> for IdRow {
    fn from(id: &IdString) -> Self {
        Self {
            id: id.to_string(),
            seed: id.seed().to_string(),
            host: or_dash(id.host()).to_string(),
            check: id
                .check_symbol()
                .map_or_else(|| "-".to_string(), String::from),
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
