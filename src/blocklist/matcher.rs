//! Domain rule matching.
//!
//! # Design Decisions
//! - Matching is case-insensitive (rules lowercased at load, hosts at lookup)
//! - A rule matches the domain itself and any subdomain, never a substring
//! - Suffix checks walk label boundaries, so lookups cost O(labels) not O(rules)

use std::collections::HashSet;

/// A read-only set of blocked domain rules.
#[derive(Debug, Default)]
pub struct Blocklist {
    rules: HashSet<String>,
}

impl Blocklist {
    /// An empty blocklist that matches nothing.
    pub fn new() -> Self {
        Self {
            rules: HashSet::new(),
        }
    }

    /// Build a blocklist from raw rule strings.
    ///
    /// Rules are trimmed and lowercased; blank entries are dropped.
    pub fn from_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|rule| rule.as_ref().trim().to_ascii_lowercase())
            .filter(|rule| !rule.is_empty())
            .collect();
        Self { rules }
    }

    /// Number of loaded rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if `host` equals a rule exactly or is a subdomain of one.
    ///
    /// A rule `example.com` blocks `example.com` and `www.example.com`
    /// but not `notexample.com`.
    pub fn is_blocked(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        if self.rules.contains(&host) {
            return true;
        }

        // Strip one leading label at a time so only dot-aligned suffixes match.
        let mut rest = host.as_str();
        while let Some(dot) = rest.find('.') {
            rest = &rest[dot + 1..];
            if self.rules.contains(rest) {
                return true;
            }
        }
        false
    }
}
