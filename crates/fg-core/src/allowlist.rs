//! The set of domains reachable during a focus session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::match_allowed;
use crate::types::{Domain, ValidationError};

/// Unique, sorted set of allowlisted domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allowlist(BTreeSet<Domain>);

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an allowlist from raw stored strings.
    ///
    /// Entries are re-normalized; invalid entries are dropped and duplicates
    /// collapse.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeSet::new();
        for value in raw {
            match Domain::parse(value.as_ref()) {
                Ok(domain) => {
                    entries.insert(domain);
                }
                Err(err) => {
                    tracing::debug!(value = value.as_ref(), error = %err, "dropping allowlist entry");
                }
            }
        }
        Self(entries)
    }

    /// Adds a domain, returning the normalized entry.
    pub fn add(&mut self, input: &str) -> Result<Domain, ValidationError> {
        let domain = Domain::parse(input)?;
        if self.0.contains(&domain) {
            return Err(ValidationError::DuplicateDomain {
                domain: domain.into(),
            });
        }
        self.0.insert(domain.clone());
        Ok(domain)
    }

    /// Removes a domain. Input is normalized the same way as [`Self::add`].
    pub fn remove(&mut self, input: &str) -> bool {
        match Domain::parse(input) {
            Ok(domain) => self.0.remove(&domain),
            Err(_) => self.0.remove(input.trim()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the entry a URL or hostname belongs to, if any.
    pub fn match_url(&self, url: &str) -> Option<&Domain> {
        match_allowed(url, &self.0)
    }

    /// Sorted plain strings, the persisted representation.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|d| d.as_str().to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a Allowlist {
    type Item = &'a Domain;
    type IntoIter = std::collections::btree_set::Iter<'a, Domain>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Domain> for Allowlist {
    fn from_iter<T: IntoIterator<Item = Domain>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_normalizes_and_sorts() {
        let mut allowlist = Allowlist::new();
        allowlist.add("https://www.Rust-Lang.org/learn").unwrap();
        allowlist.add("docs.rs").unwrap();

        assert_eq!(allowlist.to_strings(), vec!["docs.rs", "rust-lang.org"]);
    }

    #[test]
    fn add_rejects_duplicates_after_normalization() {
        let mut allowlist = Allowlist::new();
        allowlist.add("example.com").unwrap();

        let err = allowlist.add("WWW.example.com").unwrap_err();
        assert_eq!(err.to_string(), "Domain already in allowlist.");
        assert_eq!(allowlist.len(), 1);
    }

    #[test]
    fn remove_accepts_unnormalized_input() {
        let mut allowlist = Allowlist::from_raw(["example.com", "docs.rs"]);
        assert!(allowlist.remove("https://www.example.com"));
        assert!(!allowlist.remove("example.com"));
        assert_eq!(allowlist.to_strings(), vec!["docs.rs"]);
    }

    #[test]
    fn from_raw_drops_invalid_and_dedupes() {
        let allowlist = Allowlist::from_raw(["", "Example.com", "www.example.com", "bad host"]);
        assert_eq!(allowlist.to_strings(), vec!["example.com"]);
    }

    #[test]
    fn serializes_as_sorted_array() {
        let allowlist = Allowlist::from_raw(["b.com", "a.com"]);
        let json = serde_json::to_string(&allowlist).unwrap();
        assert_eq!(json, r#"["a.com","b.com"]"#);
    }

    #[test]
    fn match_url_uses_entries() {
        let allowlist = Allowlist::from_raw(["github.com"]);
        assert_eq!(
            allowlist.match_url("https://gist.github.com/x").map(Domain::as_str),
            Some("github.com")
        );
        assert!(allowlist.match_url("https://gitlab.com").is_none());
    }
}
