// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line suppression rules applied to raw input before any decoding.
//!
//! The blacklist is configured with a single string holding zero or more regular
//! expressions separated by `;`, for example `J2G_BLACKLIST="foo.*;bar.*"`.
//! Every pattern is independent: a line is dropped when any of them matches
//! anywhere in it. Empty pieces are ignored, so a stray `;` never turns into a
//! match-everything rule.

use std::fmt;

use regex::bytes::Regex;

use crate::errors::ConfigError;

const PATTERN_SEPARATOR: char = ';';

/// Compiled set of suppression patterns. Immutable once built.
#[derive(Clone)]
pub struct Blacklist {
    patterns: Vec<Regex>,
}

impl Blacklist {
    /// Compiles every non-empty `;`-separated pattern of `patterns`.
    ///
    /// Fails on the first pattern that is not a valid regular expression, so a bad
    /// configuration is reported before any input is processed.
    pub fn new(patterns: &str) -> Result<Self, ConfigError> {
        let patterns = patterns
            .split(PATTERN_SEPARATOR)
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::BlacklistPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if at least one pattern matches somewhere in `line`.
    #[must_use]
    pub fn matches(&self, line: &[u8]) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl fmt::Debug for Blacklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.patterns.iter().map(Regex::as_str))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_pattern_matches() {
        let blacklist = Blacklist::new("foo.*").unwrap();
        assert!(blacklist.matches(b"foo"));
    }

    #[test]
    fn test_single_pattern_does_not_match() {
        let blacklist = Blacklist::new("foo.*").unwrap();
        assert!(!blacklist.matches(b"bar"));
    }

    #[test]
    fn test_empty_blacklist_never_matches() {
        let blacklist = Blacklist::new("").unwrap();
        assert!(blacklist.is_empty());
        assert!(!blacklist.matches(b"bar"));
        assert!(!blacklist.matches(b""));
    }

    #[test]
    fn test_multiple_patterns() {
        let blacklist = Blacklist::new("foo.*;bar.*").unwrap();
        assert_eq!(blacklist.len(), 2);
        assert!(blacklist.matches(b"foo"));
        assert!(blacklist.matches(b"bar"));
        assert!(!blacklist.matches(b"doe"));
    }

    #[test]
    fn test_stray_separators_are_ignored() {
        let blacklist = Blacklist::new(";foo;;bar;").unwrap();
        assert_eq!(blacklist.len(), 2);
        assert!(!blacklist.matches(b"something else entirely"));
    }

    #[test]
    fn test_patterns_are_not_anchored() {
        let blacklist = Blacklist::new("sshd\\[[0-9]+\\]").unwrap();
        assert!(blacklist.matches(br#"{"MESSAGE":"sshd[42]: session opened"}"#));
    }

    #[test]
    fn test_matches_non_utf8_lines() {
        let blacklist = Blacklist::new("noise").unwrap();
        assert!(blacklist.matches(b"\xff\xfe noise \xff"));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let err = Blacklist::new("ok;(unclosed").unwrap_err();
        match err {
            ConfigError::BlacklistPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_lists_patterns() {
        let blacklist = Blacklist::new("foo.*;bar").unwrap();
        assert_eq!(format!("{blacklist:?}"), r#"["foo.*", "bar"]"#);
    }

    proptest! {
        #[test]
        fn prop_no_patterns_never_match(line in proptest::collection::vec(any::<u8>(), 0..256)) {
            let blacklist = Blacklist::new(";;").unwrap();
            prop_assert!(!blacklist.matches(&line));
        }

        #[test]
        fn prop_matches_iff_any_pattern_matches(
            words in proptest::collection::vec("[a-z]{1,6}", 1..5),
            line in "[a-z ]{0,40}",
        ) {
            let joined = words.join(";");
            let blacklist = Blacklist::new(&joined).unwrap();
            let expected = words
                .iter()
                .any(|word| Regex::new(word).unwrap().is_match(line.as_bytes()));
            prop_assert_eq!(blacklist.matches(line.as_bytes()), expected);
        }
    }
}
