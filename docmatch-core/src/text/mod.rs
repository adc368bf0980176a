pub mod normalizer;
pub mod similarity;
pub mod tables;
pub mod tokenizer;

pub use normalizer::{normalize, normalized_key, TextOrigin};
pub use similarity::{context_overlap, score_normalized, similarity, SimilarityBreakdown};
pub use tokenizer::{tokenize, Token};

/// Text of one entity in all the forms the matcher compares.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    pub cleaned_text: String,
    /// Lower-cased, whitespace-free key for exact comparison
    pub normalized_text: String,
    pub tokens: Vec<Token>,
}

impl NormalizedText {
    pub fn new(raw: &str, origin: TextOrigin) -> Self {
        Self::from_cleaned(&normalize(raw, origin))
    }

    /// Wrap text that has already been through `normalize`.
    pub fn from_cleaned(cleaned: &str) -> Self {
        Self {
            cleaned_text: cleaned.to_string(),
            normalized_text: normalized_key(cleaned),
            tokens: tokenize(cleaned),
        }
    }
}

/// Last `n` characters of `text`.
pub fn last_chars(text: &str, n: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(n)).collect()
}

/// First `n` characters of `text`.
pub fn first_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_clipping_counts_chars() {
        assert_eq!(last_chars("абвгд", 2), "гд");
        assert_eq!(first_chars("абвгд", 2), "аб");
        assert_eq!(last_chars("ab", 10), "ab");
        assert_eq!(first_chars("", 3), "");
    }

    #[test]
    fn test_duplicated_tree_text_matches_layout_key() {
        let layout = NormalizedText::new("E=mc^2", TextOrigin::Layout);
        let tree = NormalizedText::new("E=mc2c^2", TextOrigin::ObjectTree);
        assert_eq!(layout.normalized_text, "e=mc^2");
        assert_eq!(layout.normalized_text, tree.normalized_text);
        assert_eq!(layout.tokens, tree.tokens);
    }
}
