//! Error types for identifier construction, validation, and issuance.

use thiserror::Error;

/// Errors that can occur when building, parsing, or advancing identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is malformed, fails verification, or conflicts
    /// with the lineage it is being attached to.
    #[error("invalid ID '{value}': {reason}")]
    InvalidId { value: String, reason: String },

    /// A character is not a member of the active alphabet.
    #[error("symbol '{symbol}' is not in the alphabet")]
    InvalidSymbol { symbol: char },

    /// An ordinal does not address a symbol of the alphabet.
    #[error("ordinal {position} is out of range for an alphabet of {size} symbols")]
    OutOfRange { position: usize, size: usize },

    /// The sequence space is exhausted.
    ///
    /// Reserved: seeds grow without bound, so the increment arithmetic never
    /// produces this.
    #[error("identifier sequence exhausted")]
    RangeExhausted,

    /// The alphabet definition is unusable.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    /// A body is too long to be represented as an integer.
    #[error("value does not fit in a 128-bit integer")]
    IntegerOverflow,

    /// The persistence hook or its backing store failed.
    #[error("seed store error: {0}")]
    Store(String),
}

impl IdError {
    pub(crate) fn invalid_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        IdError::InvalidId {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error rejects an identifier string or host.
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, IdError::InvalidId { .. })
    }

    /// Returns true if this error comes from symbol/ordinal conversion.
    pub fn is_symbol_error(&self) -> bool {
        matches!(
            self,
            IdError::InvalidSymbol { .. } | IdError::OutOfRange { .. }
        )
    }
}
