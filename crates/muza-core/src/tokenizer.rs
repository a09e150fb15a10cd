use regex::Regex;
use std::sync::LazyLock;

use crate::constants::MIN_TOKEN_CHARS;

static STRIPPED_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,/#!$%^&*;:{}=\-_`~()]").unwrap());

/// Tokenize text for learning: lowercase, strip punctuation, split on
/// whitespace, drop tokens of two UTF-16 code units or fewer.
///
/// Stripped characters are removed, not replaced by spaces, so "well-known"
/// becomes the single token "wellknown". Characters outside the stripped set
/// (quotes, question marks, brackets) stay part of the token.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    STRIPPED_PUNCTUATION
        .replace_all(&lowered, "")
        .split_whitespace()
        .filter(|t| t.encode_utf16().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}
