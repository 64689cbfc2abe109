//! Text canonicalization for fuzzy matching.
//!
//! Catalog text mixes English with Spanish and Portuguese proper names, so the
//! same query must match "Educación", "educacion" and "EDUCACION" alike. Both
//! the query and every indexed field go through [`canonicalize_for_search`]
//! before any distance is computed.
//!
//! # Processing Pipeline
//!
//! 1. **Unicode NFKD decomposition** - "ó" → "o" + combining acute
//! 2. **Combining mark removal** - drop the accents left over from step 1
//! 3. **Lowercasing**
//! 4. **Whitespace normalization** - collapse runs, trim

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonicalize text for fuzzy comparison.
pub fn canonicalize_for_search(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    normalize_whitespace(&folded)
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Number of whitespace-separated tokens, never less than one.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(canonicalize_for_search("Educación Básica"), "educacion basica");
        assert_eq!(canonicalize_for_search("BOLSA FAMÍLIA"), "bolsa familia");
        assert_eq!(canonicalize_for_search("Niñez"), "ninez");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(canonicalize_for_search("  Plan \t Ceibal\n"), "plan ceibal");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn token_count_floor_is_one() {
        assert_eq!(token_count(""), 1);
        assert_eq!(token_count("conectar igualdad"), 2);
    }
}
