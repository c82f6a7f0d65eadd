//! # idstring
//!
//! Compact, human-transcribable serial identifiers with a check symbol.
//!
//! ## Design Principles
//!
//! - Identifiers are drawn from an alphabet of non-confusable symbols
//! - A Luhn mod N check symbol catches single-symbol and most transposition errors
//! - Incrementing is string arithmetic with carry; seeds grow, never wrap
//! - Issued identifiers never contain a forbidden word
//! - Issuers are told apart by a fixed-width host suffix, so they never collide
//! - Issuers sharing one counter resolve races through a caller-supplied seed store
//!
//! ## Identifier Format
//!
//! `{seed}{host}{check}`, for example with host `1234`:
//!
//! - `90A1234A` (seed `90A`, check symbol `A`)
//! - `90B12348` (the next identifier)
//!
//! The default alphabet is `0123456789ABCDEFGHJKLMNPRSTUVWXY`; `I`, `O`, `Q`
//! and `Z` are left out so `1Il`, `0OQ` and `2Z` cannot be confused.
//!
//! ## Example
//!
//! ```
//! use idstring::IdFamily;
//!
//! let family = IdFamily::builder().host("1234").build()?;
//! let id = family.from_seed("90a")?;
//! assert_eq!(id, "90A1234A");
//! assert_eq!(id.next()?, "90B12348");
//! assert!(family.verify("90B12348"));
//! # Ok::<(), idstring::IdError>(())
//! ```

pub mod alphabet;
pub mod checksum;
mod error;
mod family;
mod idstring;
pub mod store;
pub mod words;

pub use alphabet::{Alphabet, CaseShift, DEFAULT_ALPHABET};
pub use checksum::{compute_checked_string, verify, Checksum};
pub use error::IdError;
pub use family::{FamilyConfig, IdFamily, IdFamilyBuilder};
pub use idstring::{IdString, Sequence};
pub use store::{CasSeedStore, Claim, MemoryBackend, SeedBackend, SeedStore};
pub use words::{ForbiddenWords, DEFAULT_FORBIDDEN_WORDS, I_FORBIDDEN_WORDS};
