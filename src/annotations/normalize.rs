//! Free-text object label normalization.
//!
//! Labels come from free-form scene descriptions ("The Chairs", "a table"),
//! so near-duplicates are folded before indexing:
//! 1. lower-case
//! 2. drop the articles `a`, `an`, `the` as whole words
//! 3. strip one trailing `s` from every word
//!
//! Step 3 is a crude plural stemmer. It folds words that merely end in `s`
//! ("glass" -> "glas", "bus" -> "bu") and misses irregular plurals
//! ("mice"). Both are accepted: the output is only used as an index key.

const ARTICLES: [&str; 3] = ["a", "an", "the"];

/// Normalize one label. A label made only of articles becomes `""`.
pub fn normalize_label(text: &str) -> String {
    let lowered = text.to_lowercase();
    lowered
        .split_whitespace()
        .filter(|word| !ARTICLES.contains(word))
        .map(|word| word.strip_suffix('s').unwrap_or(word))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_and_case() {
        assert_eq!(normalize_label("Chairs"), "chair");
        assert_eq!(normalize_label("TABLE"), "table");
    }

    #[test]
    fn test_articles_removed() {
        assert_eq!(normalize_label("the chair"), "chair");
        assert_eq!(normalize_label("A Lamp"), "lamp");
        assert_eq!(normalize_label("an outlet"), "outlet");
        // Only whole words: "theater" and "another" keep their letters
        assert_eq!(normalize_label("another theater"), "another theater");
    }

    #[test]
    fn test_article_only_is_empty() {
        assert_eq!(normalize_label("the"), "");
        assert_eq!(normalize_label("  A  "), "");
        assert!(normalize_label("the").trim().is_empty());
    }

    #[test]
    fn test_every_word_stemmed() {
        assert_eq!(normalize_label("boxes of books"), "boxe of book");
    }

    #[test]
    fn test_known_false_merges() {
        assert_eq!(normalize_label("glass"), "glas");
        assert_eq!(normalize_label("bus"), "bu");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize_label("  coffee   mugs "), "coffee mug");
        assert_eq!(normalize_label(""), "");
    }
}
