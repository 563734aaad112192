//! Tokenizer shared by documents and queries.

/// Lowercase `text` and split it on non-alphanumeric characters.
///
/// No stop words are removed; common terms fall out through the IDF floor.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
