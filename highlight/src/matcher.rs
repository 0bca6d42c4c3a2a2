//! Locating key phrases among OCR word boxes.

use crate::phrase::{KeyPhrase, phrase_token_matches};
use image_proc::PixelBounds;
use ocr::WordBox;
use std::ops::Range;

/// One located occurrence of a key phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRegion {
    /// Index of the phrase in the caller's list.
    pub phrase: usize,
    /// Word boxes that took part in the match.
    pub words: Range<usize>,
    pub bounds: PixelBounds,
}

/// Result of scanning one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Whether any phrase appears in the whole-image text.
    pub keyword_present: bool,
    /// Regions in emission order: phrase order, then word order.
    pub regions: Vec<MatchRegion>,
}

/// Cheap whole-text check run before any box-level matching.
///
/// This can disagree with box-level matching: the engine's plain text may
/// join or split tokens differently from its word boxes, in which case a
/// box-level hit is suppressed. That loss is accepted.
pub fn full_text_gate(full_text: &str, phrases: &[KeyPhrase]) -> bool {
    let haystack = full_text.to_lowercase();
    phrases.iter().any(|p| haystack.contains(p.text()))
}

/// Gate on the whole-image text, then locate every phrase occurrence.
pub fn scan(full_text: &str, words: &[WordBox], phrases: &[KeyPhrase]) -> MatchOutcome {
    if !full_text_gate(full_text, phrases) {
        return MatchOutcome::default();
    }
    MatchOutcome {
        keyword_present: true,
        regions: find_matches(words, phrases),
    }
}

/// Every occurrence of every phrase, without deduplication.
pub fn find_matches(words: &[WordBox], phrases: &[KeyPhrase]) -> Vec<MatchRegion> {
    let lowered: Vec<String> = words.iter().map(WordBox::lowercase_text).collect();
    let mut regions = Vec::new();

    for (phrase_idx, phrase) in phrases.iter().enumerate() {
        let tokens = phrase.tokens();
        let span = tokens.len();
        if span > words.len() {
            continue;
        }

        for start in 0..=(words.len() - span) {
            let window = start..start + span;
            let hit = tokens
                .iter()
                .zip(&lowered[window.clone()])
                .all(|(token, word)| phrase_token_matches(token, word));
            if hit {
                regions.push(MatchRegion {
                    phrase: phrase_idx,
                    bounds: window_bounds(&words[window.clone()]),
                    words: window,
                });
            }
        }
    }

    regions
}

/// Rectangle spanning a run of words: horizontally from the first word's
/// left edge to the last word's right edge, vertically over all of them.
fn window_bounds(window: &[WordBox]) -> PixelBounds {
    let first = &window[0].bbox;
    let last = &window[window.len() - 1].bbox;
    let top = window.iter().map(|w| w.bbox.y).min().unwrap_or(first.y);
    let bottom = window
        .iter()
        .map(|w| w.bbox.bottom())
        .max()
        .unwrap_or(first.bottom());
    PixelBounds::from_unsigned(first.x, top, last.right(), bottom)
}
