//! Term normalization. A term is a non-empty, lowercase, letters-only
//! string; nothing else enters the index.

/// Normalize a single word: keep alphabetic characters, lowercase them.
/// Returns an empty string when no letters remain; callers must drop it.
pub fn normalize(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split `text` on whitespace and normalize each token, dropping tokens
/// that normalize to nothing. Re-tokenizing the same text yields the same
/// sequence in the same order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

/// True iff every character is an ASCII digit. Used only to validate
/// numeric command-line fields; vacuously true for the empty string, so
/// callers still need to parse.
pub fn is_numeric(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}
