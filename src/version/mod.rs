// src/version/mod.rs

//! Version parsing and ordering for installed packages
//!
//! Versions are dotted sequences of tokens such as `11.2v3`, `2.1.0` or
//! `2023.1-beta`. Tokens are separated by `.`, `-` or `_`, and each token is
//! split further into alternating numeric and alphabetic runs:
//!
//! - "11.2v3" → [11] [2 "v" 3]
//! - "2.1.0"  → [2] [1] [0]
//!
//! Comparison walks tokens left to right. Numeric runs compare numerically,
//! alphabetic runs lexically, and an alphabetic run sorts below a numeric
//! one. When one version is a prefix of the other, the longer one is newer
//! ("11.2v3" > "11.2").
//!
//! Strings that do not follow this shape (empty, stray characters, empty
//! tokens, no leading digit) are kept as *malformed* versions. They never
//! fail to parse, but always sort below every well-formed version so the
//! resolver never prefers them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One run inside a version token
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Alpha(String),
    Number(u64),
}

impl Part {
    fn compare(&self, other: &Part) -> Ordering {
        match (self, other) {
            (Part::Number(a), Part::Number(b)) => a.cmp(b),
            (Part::Alpha(a), Part::Alpha(b)) => a.cmp(b),
            (Part::Alpha(_), Part::Number(_)) => Ordering::Less,
            (Part::Number(_), Part::Alpha(_)) => Ordering::Greater,
        }
    }
}

/// A package version with structured ordering
#[derive(Debug, Clone)]
pub struct PackageVersion {
    raw: String,
    /// `None` when the raw string is malformed
    tokens: Option<Vec<Vec<Part>>>,
}

impl PackageVersion {
    /// Parse a version string
    ///
    /// Never fails: malformed input is retained and sorts lowest.
    pub fn parse(s: &str) -> Self {
        Self {
            raw: s.to_string(),
            tokens: tokenize(s),
        }
    }

    /// The version exactly as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the version follows the dotted token grammar
    pub fn is_well_formed(&self) -> bool {
        self.tokens.is_some()
    }

    /// Compare two versions
    pub fn compare(&self, other: &PackageVersion) -> Ordering {
        let structural = match (&self.tokens, &other.tokens) {
            (Some(a), Some(b)) => compare_tokens(a, b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };

        // Equal token sequences ("1.01" vs "1.1") fall back to the raw text
        // so that ordering agrees with equality.
        structural.then_with(|| self.raw.cmp(&other.raw))
    }
}

fn tokenize(s: &str) -> Option<Vec<Vec<Part>>> {
    if !s.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let mut tokens = Vec::new();
    for token in s.split(['.', '-', '_']) {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let mut parts = Vec::new();
        let mut rest = token;
        while let Some(first) = rest.chars().next() {
            let numeric = first.is_ascii_digit();
            let end = rest
                .find(|c: char| c.is_ascii_digit() != numeric)
                .unwrap_or(rest.len());
            let (run, tail) = rest.split_at(end);
            if numeric {
                parts.push(Part::Number(run.parse().ok()?));
            } else {
                parts.push(Part::Alpha(run.to_ascii_lowercase()));
            }
            rest = tail;
        }
        tokens.push(parts);
    }

    Some(tokens)
}

fn compare_tokens(a: &[Vec<Part>], b: &[Vec<Part>]) -> Ordering {
    for (ta, tb) in a.iter().zip(b) {
        for (pa, pb) in ta.iter().zip(tb) {
            match pa.compare(pb) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        match ta.len().cmp(&tb.len()) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PackageVersion {}

impl std::hash::Hash for PackageVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PackageVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s)
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("1.2") > v("1.0"));
        assert!(v("2.0") > v("1.10"));
        assert!(v("1.10") > v("1.9"));
    }

    #[test]
    fn test_longer_version_is_newer() {
        assert!(v("1.0.1") > v("1.0"));
        assert!(v("11.2v3") > v("11.2"));
    }

    #[test]
    fn test_alpha_suffixes() {
        assert!(v("11.2v3") > v("11.2v1"));
        assert!(v("11.3v1") > v("11.2v9"));
        // Alphabetic runs sort below numeric ones
        assert!(v("1.0.0") > v("1.0.beta"));
        assert!(v("2023.1-beta") < v("2023.1-1"));
    }

    #[test]
    fn test_malformed_sorts_lowest() {
        let malformed = ["", "latest", "1..2", "1.0!", ".1"];
        for raw in malformed {
            let bad = v(raw);
            assert!(!bad.is_well_formed(), "{raw:?} should be malformed");
            assert!(bad < v("0.0.1"), "{raw:?} should sort below 0.0.1");
        }
    }

    #[test]
    fn test_equality_is_textual() {
        assert_ne!(v("1.01"), v("1.1"));
        assert_ne!(v("1.01").cmp(&v("1.1")), Ordering::Equal);
        assert_eq!(v("11.2v3"), v("11.2v3"));
    }

    #[test]
    fn test_sort_is_total() {
        let mut versions = vec![v("2.0"), v("bad"), v("1.2"), v("1.0"), v("1.2v1")];
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(sorted, vec!["bad", "1.0", "1.2", "1.2v1", "2.0"]);
    }

    #[test]
    fn test_display_round_trips_raw() {
        assert_eq!(v("11.2v3").to_string(), "11.2v3");
        assert_eq!(v("not a version").to_string(), "not a version");
    }
}
