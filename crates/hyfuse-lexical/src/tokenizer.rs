//! Query and document tokenization.
//!
//! Index build and query time both go through [`tokenize`]; any divergence
//! between the two silently loses recall.

/// Lowercase, drop ASCII punctuation, split on whitespace.
///
/// Punctuation is removed rather than replaced, so `"low-beam"` becomes the
/// single token `"lowbeam"`.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_split() {
        assert_eq!(tokenize("Brake  FAILURE\treport"), vec!["brake", "failure", "report"]);
    }

    #[test]
    fn test_punctuation_removed_not_split() {
        assert_eq!(
            tokenize("Low-beam headlights, too bright!"),
            vec!["lowbeam", "headlights", "too", "bright"]
        );
        assert_eq!(tokenize("2021's \"Model-Y\""), vec!["2021s", "modely"]);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("?!... --").is_empty());
    }

    #[test]
    fn test_non_ascii_kept() {
        assert_eq!(tokenize("Phare défectueux"), vec!["phare", "défectueux"]);
    }
}
