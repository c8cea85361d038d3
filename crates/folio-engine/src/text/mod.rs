//! Text content of content blocks: grapheme segmentation and styled runs.

pub mod grapheme;
pub mod runs;

pub use grapheme::{SegmentError, grapheme_length};
pub use runs::{Style, TextError, TextFragment, TextRuns};
