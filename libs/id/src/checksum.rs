//! Check symbol generation and verification (Luhn mod N).
//!
//! The check symbol is drawn from the same alphabet as the identifier. It
//! detects every single-symbol substitution and every adjacent transposition
//! except a swap of the alphabet's first and last symbols.
//!
//! An optional hash string is mixed into the computation so that identifiers
//! minted for different purposes never validate against each other.

use crate::alphabet::{Alphabet, CaseShift};
use crate::IdError;

/// Check symbol mode for an identifier family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Checksum {
    /// No check symbol is generated; verification only checks membership.
    Disabled,
    /// A check symbol is appended, computed over `body ++ hash`.
    Hashed(String),
}

impl Checksum {
    /// Returns true if a check symbol is generated.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Checksum::Hashed(_))
    }

    /// Number of trailing symbols the checksum adds to a rendered id.
    pub fn width(&self) -> usize {
        usize::from(self.is_enabled())
    }

    /// The hash string, if checksums are enabled.
    pub fn hash(&self) -> Option<&str> {
        match self {
            Checksum::Disabled => None,
            Checksum::Hashed(hash) => Some(hash),
        }
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::Hashed(String::new())
    }
}

/// Weighted right-to-left sum over `symbols`, folding each addend into its
/// base-N digit sum.
fn luhn_sum(symbols: &[char], alphabet: &Alphabet, mut factor: usize) -> Result<usize, IdError> {
    let n = alphabet.len();
    let mut sum = 0;
    for &c in symbols.iter().rev() {
        let addend = factor * alphabet.ordinal_of(c)?;
        factor = if factor == 2 { 1 } else { 2 };
        sum += addend / n + addend % n;
    }
    Ok(sum)
}

/// Returns `body` with its check symbol appended.
///
/// With [`Checksum::Disabled`] the body is returned unchanged. Fails if the
/// body or hash contains a symbol outside the alphabet.
pub fn compute_checked_string(
    body: &str,
    checksum: &Checksum,
    alphabet: &Alphabet,
) -> Result<String, IdError> {
    let Checksum::Hashed(hash) = checksum else {
        return Ok(body.to_string());
    };

    let input: Vec<char> = body.chars().chain(hash.chars()).collect();
    let n = alphabet.len();
    let sum = luhn_sum(&input, alphabet, 2)?;
    let check = alphabet.symbol_at((n - sum % n) % n)?;

    let mut out = String::with_capacity(body.len() + check.len_utf8());
    out.push_str(body);
    out.push(check);
    Ok(out)
}

/// Computes only the check symbol for `body`.
pub fn check_symbol(body: &str, hash: &str, alphabet: &Alphabet) -> Result<char, IdError> {
    let checked = compute_checked_string(body, &Checksum::Hashed(hash.to_string()), alphabet)?;
    checked.chars().last().ok_or(IdError::OutOfRange {
        position: 0,
        size: alphabet.len(),
    })
}

/// Verifies a full identifier string (body plus trailing check symbol).
///
/// Never fails: any malformed input yields `false`. With checksums disabled
/// this only checks that every symbol, after `case_shift`, is in the alphabet.
pub fn verify(full: &str, checksum: &Checksum, alphabet: &Alphabet, case_shift: CaseShift) -> bool {
    let shifted = case_shift.apply(full);

    let Checksum::Hashed(hash) = checksum else {
        return alphabet.validate(&shifted);
    };

    let mut symbols: Vec<char> = shifted.chars().collect();
    let Some(check) = symbols.pop() else {
        return false;
    };
    symbols.extend(case_shift.apply(hash).chars());
    symbols.push(check);

    match luhn_sum(&symbols, alphabet, 1) {
        Ok(sum) => sum % alphabet.len() == 0,
        Err(_) => false,
    }
}
