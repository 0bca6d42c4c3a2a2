use crate::phrase::{KeyPhrase, parse_phrases};

/// Word boxes at or below this confidence are ignored when highlighting.
pub const HIGHLIGHT_MIN_CONFIDENCE: f32 = 30.0;
/// Word boxes at or below this confidence are ignored when erasing.
pub const ERASE_MIN_CONFIDENCE: f32 = 0.0;

/// Everything one image-processing call needs besides the image itself.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    phrases: Vec<KeyPhrase>,
    cover: bool,
    number: bool,
    min_confidence: f32,
}

impl ProcessingContext {
    /// Outline-only context using [`HIGHLIGHT_MIN_CONFIDENCE`].
    pub fn new(phrases: Vec<KeyPhrase>) -> Self {
        Self {
            phrases,
            cover: false,
            number: false,
            min_confidence: HIGHLIGHT_MIN_CONFIDENCE,
        }
    }

    /// Lower-case and tokenize raw phrases, dropping blanks.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(parse_phrases(raw))
    }

    pub fn with_cover(mut self, cover: bool) -> Self {
        self.cover = cover;
        self
    }

    pub fn with_number(mut self, number: bool) -> Self {
        self.number = number;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn phrases(&self) -> &[KeyPhrase] {
        &self.phrases
    }

    pub fn cover(&self) -> bool {
        self.cover
    }

    /// Numbering only applies to covered regions.
    pub fn numbering_enabled(&self) -> bool {
        self.cover && self.number
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }
}
