//! Trusted-issuer whitelist parsing and evaluation.
//!
//! The whitelist is derived once from configuration text (semicolon
//! separated) and rebuilt wholesale on configuration change, never mutated
//! incrementally. Entries are kept verbatim (no URL normalization, no
//! case folding), so what the operator wrote is exactly what is matched.
//!
//! The filter only answers membership. Whether an absent or empty
//! whitelist means "trust everyone" or "trust no one" is a policy decision
//! that belongs to the calling layer, not to this utility.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use url::Url;

/// Maximum accepted length of a whitelist URI, in characters.
///
/// Matches the SAML bound on entity identifiers; longer entries are
/// dropped at parse time.
pub const MAX_URI_LENGTH: usize = 1024;

/// How issuer candidates are compared against whitelist entries.
///
/// The historical behavior is an exact, case-sensitive string match; this
/// is a visible policy knob rather than a hidden assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Exact, case-sensitive comparison (default).
    #[default]
    Exact,
    /// ASCII case-insensitive comparison.
    CaseInsensitive,
}

/// An ordered, de-duplicated set of trusted issuer URIs.
///
/// Immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistSet {
    entries: IndexSet<String>,
}

impl WhitelistSet {
    /// Parses configuration text into a whitelist.
    ///
    /// The text is split on `;`; each candidate is stripped of embedded
    /// tab/newline characters, trimmed, and validated as a well-formed URI
    /// of bounded length. Malformed or oversized candidates are dropped
    /// with a warning; a single bad entry never fails the whole list.
    /// Empty or whitespace-only input yields an empty set.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut entries = IndexSet::new();
        for candidate in raw.split(';') {
            let candidate: String = candidate
                .chars()
                .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
                .collect();
            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }
            if candidate.len() > MAX_URI_LENGTH {
                tracing::warn!(
                    length = candidate.len(),
                    "dropping whitelist entry: URI longer than {MAX_URI_LENGTH} characters"
                );
                continue;
            }
            if let Err(e) = Url::parse(candidate) {
                tracing::warn!(entry = %candidate, error = %e, "dropping malformed whitelist entry");
                continue;
            }
            entries.insert(candidate.to_string());
        }
        Self { entries }
    }

    /// Parses optional configuration text; absent text yields an empty
    /// set.
    #[must_use]
    pub fn parse_opt(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    /// Returns `true` if `issuer` matches an entry under `policy`.
    #[must_use]
    pub fn contains(&self, issuer: &str, policy: MatchPolicy) -> bool {
        match policy {
            MatchPolicy::Exact => self.entries.contains(issuer),
            MatchPolicy::CaseInsensitive => self
                .entries
                .iter()
                .any(|entry| entry.eq_ignore_ascii_case(issuer)),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the entries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Returns `true` only if `whitelist` is present, non-empty, and contains
/// a match for `issuer` under `policy`.
///
/// This answers membership only; defaulting to allow or deny on an absent
/// whitelist is the caller's policy decision.
#[must_use]
pub fn is_trusted(issuer: &str, whitelist: Option<&WhitelistSet>, policy: MatchPolicy) -> bool {
    whitelist.is_some_and(|set| !set.is_empty() && set.contains(issuer, policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_valid_uris() {
        let set = WhitelistSet::parse("http://Europa.eu;mickey://mouse.com");
        assert_eq!(set.len(), 2);
        assert!(set.contains("http://Europa.eu", MatchPolicy::Exact));
        assert!(set.contains("mickey://mouse.com", MatchPolicy::Exact));
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        let set = WhitelistSet::parse("http://a.eu;bad uri;http://B.eu");
        assert_eq!(set.len(), 2);
        assert!(set.contains("http://a.eu", MatchPolicy::Exact));
        assert!(set.contains("http://B.eu", MatchPolicy::Exact));
        assert!(!set.contains("bad uri", MatchPolicy::Exact));
    }

    #[test]
    fn test_parse_drops_scheme_less_entries() {
        let set = WhitelistSet::parse("://Europa.eu;donald:duck.com");
        assert_eq!(set.len(), 1);
        assert!(set.contains("donald:duck.com", MatchPolicy::Exact));
    }

    #[test]
    fn test_entries_kept_verbatim() {
        // No normalization: host case is preserved exactly as configured.
        let set = WhitelistSet::parse("http://EURopa.eu");
        assert!(set.contains("http://EURopa.eu", MatchPolicy::Exact));
        assert!(!set.contains("http://europa.eu", MatchPolicy::Exact));
    }

    #[test]
    fn test_matching_is_case_sensitive_by_default() {
        let set = WhitelistSet::parse("http://a.eu;http://B.eu");
        assert!(is_trusted("http://a.eu", Some(&set), MatchPolicy::Exact));
        assert!(!is_trusted("http://A.eu", Some(&set), MatchPolicy::Exact));
    }

    #[test]
    fn test_case_insensitive_policy() {
        let set = WhitelistSet::parse("http://a.eu");
        assert!(is_trusted(
            "http://A.eu",
            Some(&set),
            MatchPolicy::CaseInsensitive
        ));
        assert!(!is_trusted(
            "http://other.eu",
            Some(&set),
            MatchPolicy::CaseInsensitive
        ));
    }

    #[test]
    fn test_empty_and_absent_input() {
        assert!(WhitelistSet::parse("").is_empty());
        assert!(WhitelistSet::parse("   ").is_empty());
        assert!(WhitelistSet::parse(";;;").is_empty());
        assert!(WhitelistSet::parse_opt(None).is_empty());
    }

    #[test]
    fn test_absent_or_empty_whitelist_is_never_trusted() {
        assert!(!is_trusted("http://a.eu", None, MatchPolicy::Exact));
        let empty = WhitelistSet::default();
        assert!(!is_trusted("http://a.eu", Some(&empty), MatchPolicy::Exact));
    }

    #[test]
    fn test_embedded_tabs_and_newlines_stripped() {
        let set = WhitelistSet::parse("http://a.eu\n;\thttp://b.eu\r\n");
        assert_eq!(set.len(), 2);
        assert!(set.contains("http://a.eu", MatchPolicy::Exact));
        assert!(set.contains("http://b.eu", MatchPolicy::Exact));
    }

    #[test]
    fn test_uri_length_bound() {
        let max = format!("http://a.eu/{}", "x".repeat(MAX_URI_LENGTH - 12));
        assert_eq!(max.len(), MAX_URI_LENGTH);
        let too_long = format!("{max}x");

        let set = WhitelistSet::parse(&format!("{max};{too_long}"));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&max, MatchPolicy::Exact));
    }

    #[test]
    fn test_duplicates_collapse_and_order_is_preserved() {
        let set = WhitelistSet::parse("http://b.eu;http://a.eu;http://b.eu");
        assert_eq!(set.len(), 2);
        let entries: Vec<&str> = set.iter().collect();
        assert_eq!(entries, vec!["http://b.eu", "http://a.eu"]);
    }
}
