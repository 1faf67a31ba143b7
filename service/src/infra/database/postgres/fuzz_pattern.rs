//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `SIMILAR TO` pattern for fuzzy text matching.
///
/// Splits the input on whitespace and matches any of the resulting words as
/// an infix, with pattern metacharacters escaped.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Builds a [`FuzzPattern`] out of the given free-form `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self(format!(
            "({})",
            input.split_ascii_whitespace().format_with("|", |word, f| {
                f(&format_args!(
                    "%{}%",
                    word.replace('\\', r"\\")
                        .replace('%', r"\%")
                        .replace('|', r"\|")
                        .replace('*', r"\*")
                        .replace('+', r"\+")
                        .replace('?', r"\?")
                        .replace('{', r"\{")
                        .replace('}', r"\}")
                        .replace('(', r"\(")
                        .replace(')', r"\)")
                        .replace('[', r"\[")
                        .replace(']', r"\]")
                        .replace('_', r"\_")
                ))
            }),
        ))
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn words_become_alternatives() {
        assert_eq!(
            FuzzPattern::new("sea view").to_string(),
            "(%sea%|%view%)",
        );
    }

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(
            FuzzPattern::new("50%_off").to_string(),
            r"(%50\%\_off%)",
        );
    }
}
