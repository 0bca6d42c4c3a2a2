//! Keyword highlighting and covering for scanned images.
//!
//! The flow for one image is: OCR page -> word boxes -> phrase matches ->
//! painted regions -> optional sequence numbers. [`Highlighter`] drives it
//! for a file and any number of output renderings.

mod context;
mod erase;
mod matcher;
mod numbering;
mod phrase;
mod pipeline;
mod redact;
mod report;

pub use context::{ERASE_MIN_CONFIDENCE, HIGHLIGHT_MIN_CONFIDENCE, ProcessingContext};
pub use erase::{erase_all_text, erase_file};
pub use matcher::{MatchOutcome, MatchRegion, find_matches, full_text_gate, scan};
pub use numbering::{LabelPlacement, NumberingOverlay, label_size};
pub use phrase::{KeyPhrase, parse_phrases};
pub use pipeline::{Highlighter, OutputPlan, highlight_image, load_rgb};
pub use redact::{CoveredRegion, RegionRedactor};
pub use report::{BatchSummary, ImageReport};
