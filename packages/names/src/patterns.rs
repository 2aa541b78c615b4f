//! Shared character classes, token tests and name normalisation.

use std::collections::BTreeSet;

use regex::Regex;

use crate::NameError;

/// Uppercase letters a Portuguese personal name may contain.
pub const UPPERCASE_LETTERS: &str = "A-ZÁÀÂÃÉÊÍÓÔÕÚÇ";

/// Collapses every whitespace run to a single `_`, trimming the ends.
///
/// ```
/// use paysplit_names::patterns::normalize_name;
///
/// assert_eq!(normalize_name("  MARIA   DOS SANTOS "), "MARIA_DOS_SANTOS");
/// ```
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Number of characters (not bytes) in `s`.
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Anchored test for a single uppercase word of at least `min_len` letters.
///
/// # Errors
///
/// Returns [`NameError::Regex`] if the pattern fails to compile.
pub fn uppercase_word(min_len: usize) -> Result<Regex, NameError> {
    Ok(Regex::new(&format!("^[{UPPERCASE_LETTERS}]{{{min_len},}}$"))?)
}

/// Anchored test for uppercase letters and whitespace, at least `min_len`
/// characters long.
///
/// # Errors
///
/// Returns [`NameError::Regex`] if the pattern fails to compile.
pub fn uppercase_phrase(min_len: usize) -> Result<Regex, NameError> {
    Ok(Regex::new(&format!(
        r"^[{UPPERCASE_LETTERS}\s]{{{min_len},}}$"
    ))?)
}

/// Anchored test for exactly `digits` ASCII digits.
///
/// # Errors
///
/// Returns [`NameError::Regex`] if the pattern fails to compile.
pub fn exact_digits(digits: usize) -> Result<Regex, NameError> {
    Ok(Regex::new(&format!("^[0-9]{{{digits}}}$"))?)
}

/// Anchored test for at least `min_digits` ASCII digits.
///
/// # Errors
///
/// Returns [`NameError::Regex`] if the pattern fails to compile.
pub fn long_number(min_digits: usize) -> Result<Regex, NameError> {
    Ok(Regex::new(&format!("^[0-9]{{{min_digits},}}$"))?)
}

/// Boilerplate words that must never be taken for part of a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    tokens: BTreeSet<String>,
}

impl Denylist {
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Whether `token` is exactly one of the denied words.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Whether any denied word occurs anywhere inside `text`.
    #[must_use]
    pub fn occurs_in(&self, text: &str) -> bool {
        self.tokens.iter().any(|t| text.contains(t.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_internal_whitespace() {
        assert_eq!(normalize_name("JOAO\t SILVA"), "JOAO_SILVA");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn uppercase_word_accepts_diacritics() {
        let re = uppercase_word(3).unwrap();
        assert!(re.is_match("CONCEIÇÃO"));
        assert!(re.is_match("JOÃO"));
        assert!(!re.is_match("Joao"));
        assert!(!re.is_match("AB"));
        assert!(!re.is_match("ANA MARIA"));
    }

    #[test]
    fn uppercase_phrase_counts_characters_not_bytes() {
        let re = uppercase_phrase(5).unwrap();
        assert!(re.is_match("JOÃO S"));
        assert!(re.is_match("ÇÃÕÉÍ"));
        assert!(!re.is_match("ÇÃÕÉ"));
        assert_eq!(char_len("ÇÃÕÉ"), 4);
    }

    #[test]
    fn digit_patterns() {
        assert!(exact_digits(3).unwrap().is_match("381"));
        assert!(!exact_digits(3).unwrap().is_match("3810"));
        assert!(long_number(5).unwrap().is_match("322205"));
        assert!(!long_number(5).unwrap().is_match("3222"));
    }

    #[test]
    fn denylist_matches_tokens_and_substrings() {
        let deny = Denylist::new(["CASA", " BANCO ", ""]);
        assert_eq!(deny.len(), 2);
        assert!(deny.contains("BANCO"));
        assert!(!deny.contains("BANCOS"));
        assert!(deny.occurs_in("CASA DE SAUDE"));
        assert!(!deny.occurs_in("MARIA DOS SANTOS"));
    }
}
