//! Configuration file handling.
//!
//! Resolution order for every setting:
//! - command-line flag
//! - environment variable (`IDSTR_HOST`, `IDSTR_HASH`, `IDSTR_STORE`)
//! - `config.toml` in the platform config directory, or `--config <PATH>`
//! - built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use idstring::{CaseShift, FamilyConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration file name.
const CONFIG_FILE: &str = "config.toml";

/// Get the default config file path.
pub fn default_config_path() -> Result<PathBuf> {
    ProjectDirs::from("com", "idstring", "idstr")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
///
/// ```toml
/// store = "/var/lib/idstr/next_id.json"
///
/// [family]
/// host = "101"
/// hash = "0"
/// forbidden_words = ["FUCK", "CUNT", "FART", "TURD", "TWAT", "BALLS"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifier family settings.
    pub family: FamilyConfig,

    /// Seed record used by `mint`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,
}

impl Config {
    /// Load config from `path`, or from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok((Self::default(), path));
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;

        debug!(path = %path.display(), "loaded config");
        Ok((config, path))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Family settings given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct FamilyOverrides {
    pub alphabet: Option<String>,
    pub host: Option<String>,
    pub hash: Option<String>,
    pub no_checksum: bool,
    pub case_shift: Option<CaseShift>,
}

impl FamilyOverrides {
    /// Layers these settings over `config`.
    pub fn apply(&self, mut config: FamilyConfig) -> FamilyConfig {
        if let Some(alphabet) = &self.alphabet {
            config.alphabet = alphabet.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(hash) = &self.hash {
            config.checksum = true;
            config.hash = hash.clone();
        }
        if self.no_checksum {
            config.checksum = false;
        }
        if let Some(case_shift) = self.case_shift {
            config.case_shift = case_shift;
        }
        config
    }
}
