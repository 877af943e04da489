// ============================================================
// Layer 4 — Word Tokenizer
// ============================================================
// Turns free symptom text into normalised word tokens.
//
// Steps (applied in order):
//   1. Lower-case the whole string
//   2. Remove every character that is neither a word character
//      ([A-Za-z0-9_]) nor white space
//   3. Split on runs of white space
//   4. Drop tokens of length <= 2 ("a", "of", "in", ...)
//
// The output is the same token list the inference runtime
// produces, so any change here invalidates saved vocabularies.

use std::sync::LazyLock;

use regex::Regex;

/// Tokens this short or shorter are treated as noise
pub const MIN_TOKEN_LEN: usize = 3;

// ASCII word characters, Unicode white space
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("valid tokenizer pattern"));

/// Split `text` into normalised tokens.
///
/// Empty or punctuation-only input yields an empty vector.
///
/// ```
/// use clinic_trainer::data::tokenizer::tokenize;
///
/// assert_eq!(tokenize("Sharp chest-pain, since 2 AM!"), vec!["sharp", "chestpain", "since"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered  = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(tokenize("Severe HEADACHE!!"), vec!["severe", "headache"]);
    }

    #[test]
    fn test_drops_short_tokens() {
        assert_eq!(tokenize("i am ok now"), vec!["now"]);
    }

    #[test]
    fn test_empty_input_gives_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
        assert!(tokenize("?!.,").is_empty());
    }

    #[test]
    fn test_underscore_and_digits_are_word_chars() {
        assert_eq!(tokenize("bp_high 120/80"), vec!["bp_high", "12080"]);
    }

    #[test]
    fn test_non_ascii_letters_are_stripped() {
        // Only ASCII letters count as word characters
        assert_eq!(tokenize("fièvre élevée"), vec!["fivre", "leve"]);
    }

    #[test]
    fn test_idempotent_on_ascii() {
        let inputs = [
            "Sharp chest pain radiating to the left arm",
            "mild   headache, today 3x",
            "Fever of 39C for 2 days; no rash",
            "",
        ];
        for input in inputs {
            let once  = tokenize(input);
            let twice = tokenize(&once.join(" "));
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Shortness of breath while climbing stairs";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
