//! The identifier value and its increment operation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;

use tracing::{debug, trace};

use crate::family::IdFamily;
use crate::store::Claim;
use crate::IdError;

/// An issued identifier: `seed ++ host ++ check`.
///
/// Values are immutable; [`IdString::next`] produces a successor. Equality
/// and hashing consider only the rendered string.
#[derive(Clone)]
pub struct IdString {
    value: String,
    /// Known seed, when it did not have to be recovered from `value`.
    seed: Option<String>,
    family: IdFamily,
}

impl IdString {
    pub(crate) fn new(value: String, seed: Option<String>, family: IdFamily) -> Self {
        Self {
            value,
            seed,
            family,
        }
    }

    /// Builds an identifier from an existing one, keeping every parameter.
    ///
    /// A `host`, if given, must match the existing identifier's host.
    pub fn from_existing(existing: &IdString, host: Option<&str>) -> Result<Self, IdError> {
        if let Some(host) = host {
            let host = existing.family.case_shift().apply(host);
            if host != existing.host() {
                return Err(IdError::invalid_id(
                    existing.as_str(),
                    format!(
                        "cannot use host '{}' with host '{}'",
                        host,
                        existing.host()
                    ),
                ));
            }
        }

        Ok(Self {
            value: existing.value.clone(),
            seed: Some(existing.seed().to_string()),
            family: existing.family.clone(),
        })
    }

    /// The rendered identifier.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The family this identifier belongs to.
    pub fn family(&self) -> &IdFamily {
        &self.family
    }

    pub fn host(&self) -> &str {
        self.family.host()
    }

    /// The incrementable part: the rendered string without host and check
    /// symbol.
    pub fn seed(&self) -> &str {
        match &self.seed {
            Some(seed) => seed,
            None => {
                let keep = self
                    .value
                    .chars()
                    .count()
                    .saturating_sub(self.family.suffix_width());
                &self.value[..byte_offset(&self.value, keep)]
            }
        }
    }

    /// Seed plus host, without the check symbol.
    pub fn body(&self) -> &str {
        let keep = self
            .value
            .chars()
            .count()
            .saturating_sub(self.family.checksum().width());
        &self.value[..byte_offset(&self.value, keep)]
    }

    /// The trailing check symbol, if checksums are enabled.
    pub fn check_symbol(&self) -> Option<char> {
        if self.family.checksum().is_enabled() {
            self.value.chars().last()
        } else {
            None
        }
    }

    /// Re-verifies the rendered string against the family settings.
    pub fn is_valid(&self) -> bool {
        self.family.verify(&self.value)
    }

    /// The body read as a base-N integer.
    pub fn to_integer(&self) -> Result<u128, IdError> {
        self.family.alphabet().decode(self.body())
    }

    /// Produces the next identifier in the sequence.
    ///
    /// The seed is advanced by one, forbidden words are patched out, and the
    /// family's seed store (if any) gets to accept the result or supplant it
    /// with its own value.
    pub fn next(&self) -> Result<IdString, IdError> {
        let family = &self.family;
        let candidate = self.advance()?;

        let Some(store) = family.seed_store() else {
            return Ok(candidate);
        };

        match store.claim(&candidate)? {
            Claim::Accepted => Ok(candidate),
            Claim::Supplanted(replacement) => {
                debug!(
                    candidate = %candidate,
                    replacement = %replacement,
                    "seed store supplanted identifier"
                );
                Ok(replacement)
            }
        }
    }

    /// The local successor, before any seed store is consulted.
    pub(crate) fn advance(&self) -> Result<IdString, IdError> {
        let family = &self.family;

        let mut seed = family.successor(self.seed())?;
        let value = loop {
            match family.remediate(&seed)? {
                Some(value) => break value,
                None => seed = family.successor(&seed)?,
            }
        };
        trace!(from = %self.value, to = %value, "advanced identifier");

        // Remediation may have changed the seed, so leave it to be derived.
        Ok(IdString::new(value, None, family.clone()))
    }

    /// Iterates over the identifiers following this one.
    ///
    /// The iterator stops after yielding the first error.
    pub fn sequence(&self) -> Sequence {
        Sequence {
            current: Some(self.clone()),
        }
    }
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

impl fmt::Display for IdString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for IdString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdString({:?})", self.value)
    }
}

impl PartialEq for IdString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for IdString {}

impl Hash for IdString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialEq<str> for IdString {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for IdString {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl AsRef<str> for IdString {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl From<IdString> for String {
    fn from(id: IdString) -> Self {
        id.value
    }
}

/// Appending text yields a plain `String`, never a successor.
///
/// Advancing the sequence is only done through [`IdString::next`].
impl Add<&str> for &IdString {
    type Output = String;

    fn add(self, rhs: &str) -> String {
        let mut out = self.value.clone();
        out.push_str(rhs);
        out
    }
}

impl serde::Serialize for IdString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

/// Iterator returned by [`IdString::sequence`].
#[derive(Debug, Clone)]
pub struct Sequence {
    current: Option<IdString>,
}

impl Iterator for Sequence {
    type Item = Result<IdString, IdError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        match current.next() {
            Ok(next) => {
                self.current = Some(next.clone());
                Some(Ok(next))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::words::ForbiddenWords;

    fn default_family(host: &str) -> IdFamily {
        IdFamily::builder().host(host).build().unwrap()
    }

    #[rstest]
    #[case("90a", "1234", "90A1234A", "90B12348", "90B")]
    #[case("000Y", "ppp", "000YPPPC", "0010PPP9", "0010")]
    #[case("dcballr", "", "DCBALLRC", "DCBALLT8", "DCBALLT")]
    #[case("fucjyyy", "", "FUCJYYY0", "FUCL000U", "FUCL000")]
    #[case("000vfub", "", "000VFUBM", "000VFUDH", "000VFUD")]
    #[case("0ct", "nt", "0CTNTL", "0CVNTG", "0CV")]
    #[case("fartwas", "", "FARTWASM", "FARUWATJ", "FARUWAT")]
    #[case("fartwas", "t", "FARTWASTH", "FARUWATTE", "FARUWAT")]
    fn test_next_scenarios(
        #[case] seed: &str,
        #[case] host: &str,
        #[case] rendered: &str,
        #[case] expected: &str,
        #[case] expected_seed: &str,
    ) {
        let id = default_family(host).from_seed(seed).unwrap();
        assert_eq!(id, rendered);
        let next = id.next().unwrap();
        assert_eq!(next, expected);
        assert_eq!(next.seed(), expected_seed);
        assert!(next.is_valid());
    }

    #[test]
    fn test_carry_out_of_top_digit() {
        let id = default_family("").from_seed("YYYY").unwrap();
        assert_eq!(id, "YYYY4");
        let next = id.next().unwrap();
        assert_eq!(next, "10000X");
        assert_eq!(next.seed(), "10000");
    }

    #[test]
    fn test_custom_forbidden_word() {
        let family = IdFamily::builder()
            .forbidden_words(ForbiddenWords::default().extended(["ass"]))
            .build()
            .unwrap();
        let id = family.from_seed("dcasr").unwrap();
        assert_eq!(id, "DCASRV");
        let next = id.next().unwrap();
        assert_eq!(next, "DCASTR");
        assert!(!next.body().contains("ASS"));
    }

    #[test]
    fn test_forbidden_word_ending_in_last_symbol_skips_ahead() {
        let family = IdFamily::builder()
            .forbidden_words(ForbiddenWords::new(["0Y"]))
            .build()
            .unwrap();
        let id = family.from_seed("10X").unwrap();
        let next = id.next().unwrap();
        // 10Y is skipped entirely; its successor 110 is clean.
        assert_eq!(next.seed(), "110");
        assert!(next.is_valid());
    }

    #[test]
    fn test_integer_seed() {
        let family = default_family("");
        let zero = family.from_integer(0).unwrap();
        assert_eq!(zero, "00");
        let one = zero.next().unwrap();
        assert_eq!(one, "1X");
        assert_eq!(one.next().unwrap(), "2V");

        assert_eq!(family.from_integer(32767).unwrap(), "YYY3");

        let with_host = default_family("2").from_integer(17).unwrap();
        assert_eq!(with_host, "H2B");
        assert_eq!(with_host.next().unwrap().to_integer().unwrap(), 18 * 32 + 2);
    }

    #[test]
    fn test_integer_seed_hex_alphabet() {
        let family = IdFamily::builder()
            .alphabet("0123456789ABCDEF")
            .build()
            .unwrap();
        assert_eq!(family.from_integer(32767).unwrap(), "7FFFC");
    }

    #[test]
    fn test_hash_changes_check_symbol() {
        let family = IdFamily::builder().host("1234").hash("0").build().unwrap();
        let id = family.from_seed("90a").unwrap();
        assert_eq!(id, "90A1234Y");
        assert_eq!(id.next().unwrap(), "90B1234X");

        let family = IdFamily::builder().host("ppp").hash("0").build().unwrap();
        assert_eq!(family.from_seed("000Y").unwrap().next().unwrap(), "0010PPP2");
    }

    #[test]
    fn test_parse_verifies_checksum() {
        let family = default_family("");
        let id = family.parse("testme2k").unwrap();
        assert_eq!(id, "TESTME2K");
        assert_eq!(id.seed(), "TESTME2");
        assert_eq!(id.check_symbol(), Some('K'));

        let err = family.parse("TESTME3K").unwrap_err();
        assert!(err.is_invalid_id());
        assert!(err.to_string().contains("TESTME3K"));
    }

    #[test]
    fn test_parse_derives_seed_after_host() {
        let family = default_family("1234");
        let id = family.parse("90B12348").unwrap();
        assert_eq!(id.seed(), "90B");
        assert_eq!(id.body(), "90B1234");
        assert_eq!(id.next().unwrap(), family.from_seed("90C").unwrap());
    }

    #[test]
    fn test_parse_rejects_wrong_host() {
        let family = default_family("1235");
        assert!(family.parse("90B12348").is_err());
    }

    #[test]
    fn test_parse_rejects_too_short() {
        let family = default_family("1234");
        let body_only = family.checked_string("1234").unwrap();
        assert!(family.parse(&body_only).is_err());
    }

    #[test]
    fn test_checksum_disabled() {
        let family = IdFamily::builder().host("AB").no_checksum().build().unwrap();
        let id = family.from_seed("0").unwrap();
        assert_eq!(id, "0AB");
        assert_eq!(id.check_symbol(), None);

        let next = id.next().unwrap();
        assert_eq!(next, "1AB");
        assert_eq!(next.seed(), "1");

        let parsed = family.parse("yyab").unwrap();
        assert_eq!(parsed.next().unwrap(), "100AB");
        assert!(family.parse("QQAB").is_err());
    }

    #[test]
    fn test_disabled_checksum_patches_inside_seed() {
        let family = IdFamily::builder()
            .no_checksum()
            .forbidden_words(ForbiddenWords::new(["ABC"]))
            .build()
            .unwrap();
        let next = family.from_seed("ABB").unwrap().next().unwrap();
        assert_eq!(next, "ABD");
    }

    #[rstest]
    #[case(&["1B", "1C"], "1A", "1D")]
    #[case(&["1C", "1B"], "1A", "1D")]
    #[case(&["FART", "TWAT"], "FARTWAS", "FARUWAT")]
    fn test_next_rescans_after_each_patch(
        #[case] words: &[&str],
        #[case] seed: &str,
        #[case] expected: &str,
    ) {
        let family = IdFamily::builder()
            .no_checksum()
            .forbidden_words(ForbiddenWords::new(words))
            .build()
            .unwrap();
        let next = family.from_seed(seed).unwrap().next().unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn test_empty_seed_rejected() {
        let err = default_family("").from_seed("").unwrap_err();
        assert!(err.is_invalid_id());
    }

    #[test]
    fn test_seed_with_foreign_symbol_rejected() {
        let err = default_family("").from_seed("0O1").unwrap_err();
        assert!(err.is_invalid_id());
    }

    #[test]
    fn test_from_existing_keeps_host() {
        let id = default_family("101").from_seed("0000").unwrap();
        let copy = IdString::from_existing(&id, Some("101")).unwrap();
        assert_eq!(copy, id);
        assert_eq!(copy.seed(), "0000");
        assert!(IdString::from_existing(&id, None).is_ok());

        let err = IdString::from_existing(&id, Some("102")).unwrap_err();
        assert!(err.is_invalid_id());
        let err = IdString::from_existing(&id, Some("10")).unwrap_err();
        assert!(err.is_invalid_id());
    }

    #[test]
    fn test_next_does_not_mutate_original() {
        let id = default_family("").from_seed("90A").unwrap();
        let first = id.next().unwrap();
        let second = id.next().unwrap();
        assert_eq!(first, second);
        assert_eq!(id.seed(), "90A");
    }

    #[test]
    fn test_equality_ignores_seed_cache() {
        let family = default_family("1234");
        let built = family.from_seed("90A").unwrap();
        let parsed = family.parse(built.as_str()).unwrap();
        assert_eq!(built, parsed);

        let mut set = std::collections::HashSet::new();
        set.insert(built);
        assert!(set.contains(&parsed));
    }

    #[test]
    fn test_add_is_concatenation() {
        let id = default_family("").from_seed("90A").unwrap();
        let joined: String = &id + "-1";
        assert_eq!(joined, format!("{id}-1"));
    }

    #[test]
    fn test_sequence_yields_successive_values() {
        let start = default_family("").from_integer(0).unwrap();
        let ids: Vec<String> = start
            .sequence()
            .take(4)
            .map(|r| r.unwrap().to_string())
            .collect();
        assert_eq!(ids, ["1X", "2V", "3T", "4R"]);
    }

    #[test]
    fn test_serialize_as_string() {
        let id = default_family("").from_seed("90A").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
