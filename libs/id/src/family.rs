//! Identifier families: the immutable configuration shared by every value
//! in one lineage.
//!
//! A family fixes the alphabet, the host suffix (and therefore its width),
//! the checksum mode and hash, the input case policy, the forbidden-word list
//! and the optional persistence hook. Identifiers carry their family, so
//! `next()` never consults global state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alphabet::{Alphabet, CaseShift, DEFAULT_ALPHABET};
use crate::checksum::{self, Checksum};
use crate::idstring::IdString;
use crate::store::SeedStore;
use crate::words::ForbiddenWords;
use crate::IdError;

/// Serializable description of an identifier family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    /// Symbols in ordinal order.
    pub alphabet: String,

    /// Issuer suffix. Its length fixes the host width for the family.
    pub host: String,

    /// Whether a check symbol is appended.
    pub checksum: bool,

    /// Extra symbols mixed into the check symbol computation.
    pub hash: String,

    /// Case policy applied to every input string.
    pub case_shift: CaseShift,

    /// Substrings never allowed in an issued identifier.
    pub forbidden_words: ForbiddenWords,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            host: String::new(),
            checksum: true,
            hash: String::new(),
            case_shift: CaseShift::default(),
            forbidden_words: ForbiddenWords::default(),
        }
    }
}

#[derive(Clone)]
struct FamilyInner {
    alphabet: Alphabet,
    host: String,
    host_width: usize,
    checksum: Checksum,
    case_shift: CaseShift,
    words: ForbiddenWords,
    store: Option<Arc<dyn SeedStore>>,
}

/// A validated identifier family. Cloning is cheap.
#[derive(Clone)]
pub struct IdFamily {
    inner: Arc<FamilyInner>,
}

impl IdFamily {
    /// Builds a family from a config, without a persistence hook.
    pub fn new(config: FamilyConfig) -> Result<Self, IdError> {
        Self::with_store(config, None)
    }

    /// Starts a builder over the default configuration.
    pub fn builder() -> IdFamilyBuilder {
        IdFamilyBuilder::default()
    }

    fn with_store(
        config: FamilyConfig,
        store: Option<Arc<dyn SeedStore>>,
    ) -> Result<Self, IdError> {
        let alphabet = Alphabet::new(&config.alphabet)?;
        let case_shift = config.case_shift;

        let checksum = if config.checksum {
            let hash = case_shift.apply(&config.hash);
            if let Err(e) = alphabet.check(&hash) {
                return Err(IdError::invalid_id(hash, format!("hash: {e}")));
            }
            Checksum::Hashed(hash)
        } else {
            Checksum::Disabled
        };

        let host = normalize_host(&config.host, case_shift, &alphabet, &config.forbidden_words)?;

        Ok(Self {
            inner: Arc::new(FamilyInner {
                alphabet,
                host_width: host.chars().count(),
                host,
                checksum,
                case_shift,
                words: config.forbidden_words,
                store,
            }),
        })
    }

    /// Derives a sibling family for another issuer.
    ///
    /// Everything but the host is shared; the new host must have the same
    /// width as this family's host.
    pub fn with_host(&self, host: &str) -> Result<Self, IdError> {
        let inner = &self.inner;
        let host = normalize_host(host, inner.case_shift, &inner.alphabet, &inner.words)?;
        let width = host.chars().count();
        if width != inner.host_width {
            return Err(IdError::invalid_id(
                host,
                format!(
                    "host must be {} symbols wide like '{}'",
                    inner.host_width, inner.host
                ),
            ));
        }

        let mut sibling = (**inner).clone();
        sibling.host = host;
        Ok(Self {
            inner: Arc::new(sibling),
        })
    }

    /// Returns a copy of this family that calls `store` after every increment.
    #[must_use]
    pub fn with_seed_store<S: SeedStore + 'static>(&self, store: Arc<S>) -> Self {
        let store: Arc<dyn SeedStore> = store;
        let mut inner = (*self.inner).clone();
        inner.store = Some(store);
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.inner.alphabet
    }

    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Host width in symbols.
    pub fn host_width(&self) -> usize {
        self.inner.host_width
    }

    pub fn checksum(&self) -> &Checksum {
        &self.inner.checksum
    }

    pub fn case_shift(&self) -> CaseShift {
        self.inner.case_shift
    }

    pub fn forbidden_words(&self) -> &ForbiddenWords {
        &self.inner.words
    }

    /// The persistence hook, if one is attached.
    pub fn seed_store(&self) -> Option<&Arc<dyn SeedStore>> {
        self.inner.store.as_ref()
    }

    /// Number of trailing symbols after the seed: host plus check symbol.
    pub(crate) fn suffix_width(&self) -> usize {
        self.inner.host_width + self.inner.checksum.width()
    }

    /// Creates an identifier from a bare seed, appending host and check symbol.
    pub fn from_seed(&self, seed: &str) -> Result<IdString, IdError> {
        let seed = self.inner.case_shift.apply(seed);
        self.build(seed)
    }

    /// Creates an identifier whose seed is `value` written in the alphabet's
    /// base.
    pub fn from_integer(&self, value: u128) -> Result<IdString, IdError> {
        self.build(self.inner.alphabet.encode(value))
    }

    fn build(&self, seed: String) -> Result<IdString, IdError> {
        if seed.is_empty() {
            return Err(IdError::invalid_id(seed, "seed is empty"));
        }
        if let Err(e) = self.inner.alphabet.check(&seed) {
            return Err(IdError::invalid_id(seed, e.to_string()));
        }

        let value = self.render(&seed)?;
        Ok(IdString::new(value, Some(seed), self.clone()))
    }

    /// Re-hydrates a previously issued identifier string.
    ///
    /// The string is case-normalized and verified. The seed is derived lazily
    /// by stripping the host and check symbol. To accept a stored value
    /// without checking its check symbol, use [`IdFamily::parse_unverified`];
    /// [`IdFamilyBuilder::no_checksum`] instead describes identifiers that
    /// carry no check symbol at all.
    pub fn parse(&self, text: &str) -> Result<IdString, IdError> {
        let value = self.inner.case_shift.apply(text);

        if !self.verify(&value) {
            let reason = if self.inner.checksum.is_enabled() {
                "checksum verification failed"
            } else {
                "contains symbols outside the alphabet"
            };
            return Err(IdError::invalid_id(value, reason));
        }

        self.rehydrate(value)
    }

    /// Re-hydrates an identifier string without checking its check symbol.
    ///
    /// The trailing symbol is still treated as the check position; only its
    /// value goes unverified.
    pub fn parse_unverified(&self, text: &str) -> Result<IdString, IdError> {
        let value = self.inner.case_shift.apply(text);
        if let Err(e) = self.inner.alphabet.check(&value) {
            return Err(IdError::invalid_id(value, e.to_string()));
        }
        self.rehydrate(value)
    }

    fn rehydrate(&self, value: String) -> Result<IdString, IdError> {
        let length = value.chars().count();
        if length <= self.suffix_width() {
            return Err(IdError::invalid_id(value, "too short to hold a seed"));
        }

        let body_end = length - self.inner.checksum.width();
        let body: String = value.chars().take(body_end).collect();
        if !body.ends_with(self.inner.host.as_str()) {
            let reason = format!("does not end with host '{}'", self.inner.host);
            return Err(IdError::invalid_id(value, reason));
        }

        Ok(IdString::new(value, None, self.clone()))
    }

    /// Returns `body` with this family's check symbol appended.
    pub fn checked_string(&self, body: &str) -> Result<String, IdError> {
        checksum::compute_checked_string(body, &self.inner.checksum, &self.inner.alphabet)
    }

    /// Verifies a full identifier string under this family's settings.
    pub fn verify(&self, text: &str) -> bool {
        checksum::verify(
            text,
            &self.inner.checksum,
            &self.inner.alphabet,
            self.inner.case_shift,
        )
    }

    /// Renders `seed ++ host ++ check`.
    pub(crate) fn render(&self, seed: &str) -> Result<String, IdError> {
        let mut body = String::with_capacity(seed.len() + self.inner.host.len());
        body.push_str(seed);
        body.push_str(&self.inner.host);
        self.checked_string(&body)
    }

    /// The plain base-N successor of `seed`.
    ///
    /// A carry out of the most significant position prepends a new one. When
    /// the alphabet's first symbol is `0` the new position holds the second
    /// symbol, so the grown seed does not read as the old one zero-padded.
    pub(crate) fn successor(&self, seed: &str) -> Result<String, IdError> {
        let alphabet = &self.inner.alphabet;
        let mut digits: Vec<char> = seed.chars().collect();

        for i in (0..digits.len()).rev() {
            match alphabet.successor(digits[i])? {
                Some(next) => {
                    digits[i] = next;
                    return Ok(digits.into_iter().collect());
                }
                None => digits[i] = alphabet.first(),
            }
        }

        let lead = if alphabet.first() == '0' {
            alphabet.symbol_at(1)?
        } else {
            alphabet.first()
        };
        digits.insert(0, lead);
        Ok(digits.into_iter().collect())
    }

    /// Renders `seed`, patching forbidden words out of it.
    ///
    /// For each match, the last symbol of the match that lies in the seed is
    /// bumped by one. Returns `None` when that symbol is already the
    /// alphabet's last, in which case the caller must move to the next seed.
    pub(crate) fn remediate(&self, seed: &str) -> Result<Option<String>, IdError> {
        let alphabet = &self.inner.alphabet;
        let mut digits: Vec<char> = seed.chars().collect();

        loop {
            let candidate: String = digits.iter().collect();
            let rendered = self.render(&candidate)?;

            let Some((start, end)) = self.inner.words.find_first(&rendered) else {
                return Ok(Some(rendered));
            };

            let position = end.min(digits.len()) - 1;
            match alphabet.successor(digits[position])? {
                Some(next) => {
                    debug!(
                        rendered = %rendered,
                        start,
                        position,
                        "patching forbidden word out of identifier"
                    );
                    digits[position] = next;
                }
                None => {
                    debug!(
                        rendered = %rendered,
                        position,
                        "forbidden word ends in last symbol, skipping seed"
                    );
                    return Ok(None);
                }
            }
        }
    }
}

fn normalize_host(
    host: &str,
    case_shift: CaseShift,
    alphabet: &Alphabet,
    words: &ForbiddenWords,
) -> Result<String, IdError> {
    let host = case_shift.apply(host.trim());
    if let Err(e) = alphabet.check(&host) {
        return Err(IdError::invalid_id(host, e.to_string()));
    }
    // A forbidden word inside the host could never be patched away.
    if words.is_found_in(&host) {
        return Err(IdError::invalid_id(host, "host contains a forbidden word"));
    }
    Ok(host)
}

impl fmt::Debug for IdFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("IdFamily")
            .field("alphabet", &inner.alphabet)
            .field("host", &inner.host)
            .field("checksum", &inner.checksum)
            .field("case_shift", &inner.case_shift)
            .field("forbidden_words", &inner.words)
            .field("seed_store", &inner.store.is_some())
            .finish()
    }
}

/// Builder for [`IdFamily`].
#[derive(Default)]
pub struct IdFamilyBuilder {
    config: FamilyConfig,
    store: Option<Arc<dyn SeedStore>>,
}

impl IdFamilyBuilder {
    /// Starts from an existing config.
    pub fn from_config(config: FamilyConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    pub fn alphabet(mut self, symbols: impl Into<String>) -> Self {
        self.config.alphabet = symbols.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Enables checksums with the given hash.
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.config.checksum = true;
        self.config.hash = hash.into();
        self
    }

    /// Disables the check symbol entirely.
    pub fn no_checksum(mut self) -> Self {
        self.config.checksum = false;
        self
    }

    pub fn case_shift(mut self, case_shift: CaseShift) -> Self {
        self.config.case_shift = case_shift;
        self
    }

    pub fn forbidden_words(mut self, words: ForbiddenWords) -> Self {
        self.config.forbidden_words = words;
        self
    }

    /// Attaches the persistence hook called after every increment.
    pub fn seed_store<S: SeedStore + 'static>(mut self, store: Arc<S>) -> Self {
        let store: Arc<dyn SeedStore> = store;
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<IdFamily, IdError> {
        IdFamily::with_store(self.config, self.store)
    }
}
