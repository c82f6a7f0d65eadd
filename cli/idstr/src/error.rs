//! Error handling and display for the CLI.

use colored::Colorize;
use idstring::IdError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{failed} of {total} identifiers failed verification")]
    VerificationFailed { failed: usize, total: usize },

    #[error("No seed record specified. Use --store, IDSTR_STORE, or set `store` in the config file.")]
    NoStore,

    #[error(transparent)]
    Id(#[from] IdError),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    let id_err = match err.downcast_ref::<CliError>() {
        Some(CliError::Id(id_err)) => id_err,
        Some(CliError::NoStore) => return Some("Run `idstr config show` to see the active settings."),
        Some(CliError::VerificationFailed { .. }) => {
            return Some("Check --hash and --alphabet match the issuer of these identifiers.")
        }
        None => err.downcast_ref::<IdError>()?,
    };

    match id_err {
        IdError::InvalidId { .. } => {
            Some("Identifiers must carry this family's host and check symbol.")
        }
        IdError::InvalidSymbol { .. } => {
            Some("Symbols must come from the configured alphabet (see `idstr config show`).")
        }
        IdError::Store(_) => Some("Check the seed record path is readable and writable."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_for_wrapped_id_error() {
        let err = anyhow::Error::from(CliError::from(IdError::Store("down".into())));
        assert!(hint_for(&err).unwrap().contains("seed record"));
    }

    #[test]
    fn test_hint_for_bare_id_error() {
        let err = anyhow::Error::from(IdError::InvalidSymbol { symbol: 'O' });
        assert!(hint_for(&err).unwrap().contains("alphabet"));
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        let err = anyhow::anyhow!("something else");
        assert!(hint_for(&err).is_none());
    }

    #[test]
    fn test_verification_message() {
        let err = CliError::VerificationFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "1 of 3 identifiers failed verification");
    }
}
