/// A user-supplied search term, lower-cased once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPhrase {
    text: String,
    tokens: Vec<String>,
}

impl KeyPhrase {
    /// Build a phrase from raw input. Blank input yields `None`.
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return None;
        }
        Some(Self { text, tokens })
    }

    /// Whole lower-cased phrase, as checked against the full-text gate.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace-separated words of the phrase, in order.
    ///
    /// # Returns
    /// At least one token. Each is matched against one consecutive OCR
    /// word box.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether matching spans more than one word box.
    pub fn is_multi_word(&self) -> bool {
        self.tokens.len() > 1
    }
}

/// Parse a list of raw phrases, dropping blank entries and keeping order.
pub fn parse_phrases<I, S>(raw: I) -> Vec<KeyPhrase>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|s| KeyPhrase::new(s.as_ref()))
        .collect()
}

/// The matching policy for one phrase token against one OCR word.
///
/// Both sides must already be lower-cased. This is a plain substring test:
/// `"bone"` matches `"bones,"` and also `"trombone"`.
pub fn phrase_token_matches(token: &str, word_text: &str) -> bool {
    word_text.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrases_are_lower_cased_and_tokenized() {
        let phrase = KeyPhrase::new("  Sutura   Lacrimal ").unwrap();
        assert_eq!(phrase.text(), "sutura   lacrimal");
        assert_eq!(phrase.tokens(), ["sutura", "lacrimal"]);
        assert!(phrase.is_multi_word());
        assert!(!KeyPhrase::new("Femur").unwrap().is_multi_word());
    }

    #[test]
    fn blank_phrases_are_dropped() {
        let phrases = parse_phrases(["tibia", "   ", "", "Fibula"]);
        let texts: Vec<_> = phrases.iter().map(KeyPhrase::text).collect();
        assert_eq!(texts, ["tibia", "fibula"]);
    }

    #[test]
    fn token_match_is_substring_not_equality() {
        assert!(phrase_token_matches("bone", "bone"));
        assert!(phrase_token_matches("bone", "bones,"));
        assert!(phrase_token_matches("bone", "trombone"));
        assert!(!phrase_token_matches("bones", "bone"));
    }
}
