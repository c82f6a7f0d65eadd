//! Alphabet codec: symbols ⇄ ordinals, and input case normalization.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::IdError;

/// The default alphabet: digits plus uppercase letters, without `I`, `O`, `Q`
/// and `Z` so that `1Il`, `0OQ` and `2Z` cannot be confused.
pub const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHJKLMNPRSTUVWXY";

/// An ordered set of unique symbols.
///
/// A symbol's position in the sequence is its ordinal value in all
/// arithmetic, including the check symbol computation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Alphabet {
    symbols: Arc<[char]>,
}

impl Alphabet {
    /// Creates an alphabet from a string of unique symbols.
    pub fn new(symbols: &str) -> Result<Self, IdError> {
        let symbols: Vec<char> = symbols.chars().collect();

        if symbols.len() < 2 {
            return Err(IdError::InvalidAlphabet(format!(
                "need at least 2 symbols, got {}",
                symbols.len()
            )));
        }

        for (i, c) in symbols.iter().enumerate() {
            if symbols[..i].contains(c) {
                return Err(IdError::InvalidAlphabet(format!(
                    "symbol '{c}' appears more than once"
                )));
            }
        }

        Ok(Self {
            symbols: symbols.into(),
        })
    }

    /// Number of symbols (the numeric base).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false; alphabets hold at least two symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The lowest ("zero") symbol.
    pub fn first(&self) -> char {
        self.symbols[0]
    }

    /// The highest symbol.
    pub fn last(&self) -> char {
        self.symbols[self.symbols.len() - 1]
    }

    /// Returns true if `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Ordinal position of `symbol`.
    pub fn ordinal_of(&self, symbol: char) -> Result<usize, IdError> {
        self.symbols
            .iter()
            .position(|&c| c == symbol)
            .ok_or(IdError::InvalidSymbol { symbol })
    }

    /// Symbol at `position`.
    pub fn symbol_at(&self, position: usize) -> Result<char, IdError> {
        self.symbols
            .get(position)
            .copied()
            .ok_or(IdError::OutOfRange {
                position,
                size: self.len(),
            })
    }

    /// The symbol one position above `symbol`, or `None` if `symbol` is the
    /// last one.
    pub fn successor(&self, symbol: char) -> Result<Option<char>, IdError> {
        let ordinal = self.ordinal_of(symbol)?;
        Ok(self.symbols.get(ordinal + 1).copied())
    }

    /// Returns true if every symbol of `text` belongs to the alphabet.
    ///
    /// No case normalization is applied here; see [`CaseShift::apply`].
    pub fn validate(&self, text: &str) -> bool {
        text.chars().all(|c| self.contains(c))
    }

    /// Fails with the first symbol of `text` outside the alphabet.
    pub fn check(&self, text: &str) -> Result<(), IdError> {
        match text.chars().find(|&c| !self.contains(c)) {
            Some(symbol) => Err(IdError::InvalidSymbol { symbol }),
            None => Ok(()),
        }
    }

    /// Encodes an integer in this alphabet's base, most significant symbol
    /// first. Zero encodes as a single first symbol.
    pub fn encode(&self, mut value: u128) -> String {
        let base = self.len() as u128;
        let mut digits = Vec::new();
        loop {
            digits.push(self.symbols[(value % base) as usize]);
            value /= base;
            if value == 0 {
                break;
            }
        }
        digits.iter().rev().collect()
    }

    /// Decodes a string of symbols as a base-N integer.
    pub fn decode(&self, text: &str) -> Result<u128, IdError> {
        let base = self.len() as u128;
        text.chars().try_fold(0u128, |acc, c| {
            let digit = self.ordinal_of(c)? as u128;
            acc.checked_mul(base)
                .and_then(|v| v.checked_add(digit))
                .ok_or(IdError::IntegerOverflow)
        })
    }

    /// The symbols as a string.
    pub fn as_string(&self) -> String {
        self.symbols.iter().collect()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.chars().collect::<Vec<_>>().into(),
        }
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alphabet({:?})", self.as_string())
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Case policy applied to every input string before validation or storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseShift {
    /// Uppercase all input.
    #[default]
    Upper,
    /// Lowercase all input.
    Lower,
    /// Leave input unchanged.
    None,
}

impl CaseShift {
    /// Applies the policy to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseShift::Upper => text.to_uppercase(),
            CaseShift::Lower => text.to_lowercase(),
            CaseShift::None => text.to_string(),
        }
    }
}

impl std::str::FromStr for CaseShift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upper" => Ok(CaseShift::Upper),
            "lower" => Ok(CaseShift::Lower),
            "none" => Ok(CaseShift::None),
            other => Err(format!(
                "unknown case policy '{other}' (expected upper, lower or none)"
            )),
        }
    }
}
