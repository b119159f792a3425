//! Unicode-aware text folding for name search and list ordering.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Case-fold for substring search.
///
/// Composes first (NFC) so precomposed and decomposed input compare equal,
/// then lowercases. Accents are kept: "elo" does not match "Élodie".
pub fn casefold(input: &str) -> String {
    input.nfc().collect::<String>().to_lowercase()
}

/// Primary collation key: decomposed (NFKD), combining marks removed,
/// lowercased. "Émile" sorts with the other E names.
pub fn collation_key(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
