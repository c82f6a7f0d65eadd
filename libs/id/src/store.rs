//! Persistence hook contract and a compare-and-swap seed store.
//!
//! After every local increment, [`IdString::next`] hands the new identifier
//! to the family's [`SeedStore`]. The store either accepts it (it was durably
//! and exclusively recorded) or supplants it with another identifier, which
//! becomes the result of `next`. Conflict detection between issuers sharing a
//! counter lives entirely here, never in the engine.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::family::IdFamily;
use crate::idstring::IdString;
use crate::IdError;

/// Outcome of a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The locally computed identifier is final.
    Accepted,
    /// Another identifier replaces the locally computed one.
    Supplanted(IdString),
}

/// A persistence hook invoked synchronously after each increment.
///
/// Implementations may block on I/O and may call [`IdString::next`]
/// themselves (re-entering the hook) to skip values claimed elsewhere.
pub trait SeedStore: Send + Sync {
    /// Records `id` or returns a replacement for it.
    fn claim(&self, id: &IdString) -> Result<Claim, IdError>;
}

impl<F> SeedStore for F
where
    F: Fn(&IdString) -> Result<Claim, IdError> + Send + Sync,
{
    fn claim(&self, id: &IdString) -> Result<Claim, IdError> {
        self(id)
    }
}

/// Durable single-record storage of the last issued identifier.
pub trait SeedBackend: Send + Sync {
    /// Reads the stored identifier, if any.
    fn load(&self) -> Result<Option<String>, IdError>;

    /// Replaces the stored identifier with `new` only if it currently equals
    /// `expected` (`None` meaning no record yet). Returns whether the swap
    /// happened.
    fn compare_and_swap(&self, expected: Option<&str>, new: &str) -> Result<bool, IdError>;
}

impl<B: SeedBackend + ?Sized> SeedBackend for Arc<B> {
    fn load(&self) -> Result<Option<String>, IdError> {
        (**self).load()
    }

    fn compare_and_swap(&self, expected: Option<&str>, new: &str) -> Result<bool, IdError> {
        (**self).compare_and_swap(expected, new)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, IdError> {
    mutex
        .lock()
        .map_err(|_| IdError::Store("seed store lock poisoned".to_string()))
}

/// In-process [`SeedBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    value: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl SeedBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, IdError> {
        Ok(lock(&self.value)?.clone())
    }

    fn compare_and_swap(&self, expected: Option<&str>, new: &str) -> Result<bool, IdError> {
        let mut value = lock(&self.value)?;
        if value.as_deref() != expected {
            return Ok(false);
        }
        *value = Some(new.to_string());
        Ok(true)
    }
}

/// A [`SeedStore`] for one issuer over a shared [`SeedBackend`].
///
/// The store remembers the last identifier this issuer saw in the backend.
/// A claim swaps that value for its direct successor; if the swap fails,
/// another issuer got there first, so the stored value is re-hydrated,
/// advanced with `next` (which claims again), and returned in place of the
/// local value.
#[derive(Debug)]
pub struct CasSeedStore<B> {
    backend: B,
    last_seen: Mutex<Option<String>>,
}

impl<B: SeedBackend> CasSeedStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            last_seen: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The last stored identifier this issuer observed.
    pub fn last_seen(&self) -> Result<Option<String>, IdError> {
        Ok(lock(&self.last_seen)?.clone())
    }

    fn remember(&self, value: &str) -> Result<(), IdError> {
        *lock(&self.last_seen)? = Some(value.to_string());
        Ok(())
    }

    /// Loads the current identifier for `family`, initializing the backend
    /// from `first_seed` if it holds no record yet.
    ///
    /// `family` should carry this store as its seed store so that later
    /// increments are claimed here.
    pub fn resume(&self, family: &IdFamily, first_seed: &str) -> Result<IdString, IdError> {
        let current = match self.backend.load()? {
            Some(stored) => family.parse(&stored)?,
            None => {
                let first = family.from_seed(first_seed)?;
                if self.backend.compare_and_swap(None, first.as_str())? {
                    info!(id = %first, "initialized seed store");
                    first
                } else {
                    let stored = self.backend.load()?.ok_or_else(|| {
                        IdError::Store("record disappeared during initialization".to_string())
                    })?;
                    family.parse(&stored)?
                }
            }
        };

        self.remember(current.as_str())?;
        debug!(id = %current, "resumed from seed store");
        Ok(current)
    }
}

impl<B: SeedBackend> SeedStore for CasSeedStore<B> {
    fn claim(&self, id: &IdString) -> Result<Claim, IdError> {
        let expected = self.last_seen()?;

        // Only the direct successor of the last seen value may be swapped in;
        // anything else was derived from a stale identifier.
        let in_sequence = match expected.as_deref() {
            Some(prev) => id.family().parse(prev)?.advance()? == *id,
            None => true,
        };

        if in_sequence
            && self
                .backend
                .compare_and_swap(expected.as_deref(), id.as_str())?
        {
            self.remember(id.as_str())?;
            return Ok(Claim::Accepted);
        }

        let stored = self
            .backend
            .load()?
            .ok_or_else(|| IdError::Store("seed record is missing".to_string()))?;
        debug!(
            claimed = %id,
            stored = %stored,
            expected = expected.as_deref().unwrap_or("-"),
            "claim conflicted, advancing past stored identifier"
        );

        let latest = id.family().parse(&stored)?;
        self.remember(&stored)?;
        let advanced = latest.next()?;
        Ok(Claim::Supplanted(advanced))
    }
}
