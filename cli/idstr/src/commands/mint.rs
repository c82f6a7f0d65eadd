//! Issuance from a shared seed record.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use idstring::{IdFamilyBuilder, IdString};
use idstring_seedstore::file_seed_store;
use tracing::info;

use crate::error::CliError;
use crate::output::print_output;

use super::{CommandContext, IdRow};

/// Issue identifiers from a seed record shared with other issuers.
#[derive(Debug, Args)]
pub struct MintCommand {
    /// Seed record file.
    #[arg(long, env = "IDSTR_STORE")]
    store: Option<PathBuf>,

    /// How many identifiers to issue.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Seed recorded when the store is empty; issuance starts after it.
    #[arg(long, default_value = "0")]
    first_seed: String,
}

impl MintCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let path = self
            .store
            .or_else(|| ctx.config.store.clone())
            .ok_or(CliError::NoStore)?;

        let issued = mint(&ctx, path.clone(), &self.first_seed, self.count)?;
        info!(
            store = %path.display(),
            count = issued.len(),
            last = issued.last().map_or("-", IdString::as_str),
            "minted identifiers"
        );

        let rows: Vec<IdRow> = issued.iter().map(IdRow::from).collect();
        print_output(&rows, ctx.format);
        Ok(())
    }
}

fn mint(
    ctx: &CommandContext,
    path: PathBuf,
    first_seed: &str,
    count: usize,
) -> Result<Vec<IdString>> {
    let store = Arc::new(file_seed_store(path));
    let family = IdFamilyBuilder::from_config(ctx.family.clone())
        .seed_store(Arc::clone(&store))
        .build()?;

    let mut current = store.resume(&family, first_seed)?;
    let mut issued = Vec::with_capacity(count);
    for _ in 0..count {
        current = current.next()?;
        issued.push(current.clone());
    }
    Ok(issued)
}
