//! Grapheme cluster segmentation over `char` offsets.
//!
//! Every offset in this module counts Unicode scalar values (`char`s), the
//! code unit used throughout the engine. A boundary is an offset where a
//! grapheme cluster starts, plus the end of the text.

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("index {index} is not the start of a grapheme cluster (text length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Number of `char`s in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char` offset, or `text.len()` when the offset is at (or past) the end.
pub fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Returns the number of code units composing the grapheme cluster starting at `index`.
///
/// Fails when `index` is not itself a cluster start (including the end of the text).
pub fn grapheme_length(text: &str, index: usize) -> Result<usize, SegmentError> {
    let mut position = 0;
    for grapheme in text.graphemes(true) {
        let len = char_len(grapheme);
        if position == index {
            return Ok(len);
        }
        if position > index {
            break;
        }
        position += len;
    }
    Err(SegmentError::IndexOutOfRange {
        index,
        len: char_len(text),
    })
}

/// All grapheme boundaries of `text`, always starting with 0 and ending with its length.
pub fn grapheme_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut position = 0;
    for grapheme in text.graphemes(true) {
        position += char_len(grapheme);
        boundaries.push(position);
    }
    boundaries
}

pub fn is_grapheme_boundary(text: &str, index: usize) -> bool {
    grapheme_boundaries(text).binary_search(&index).is_ok()
}

/// The boundary following `index`, or `None` at the end of the text.
pub fn next_boundary(text: &str, index: usize) -> Option<usize> {
    grapheme_boundaries(text).into_iter().find(|&b| b > index)
}

/// The boundary preceding `index`, or `None` at the start of the text.
pub fn previous_boundary(text: &str, index: usize) -> Option<usize> {
    grapheme_boundaries(text)
        .into_iter()
        .take_while(|&b| b < index)
        .last()
}

/// Snaps `index` back onto a boundary, clamping to the text length first.
pub fn floor_boundary(text: &str, index: usize) -> usize {
    grapheme_boundaries(text)
        .into_iter()
        .take_while(|&b| b <= index)
        .last()
        .unwrap_or(0)
}

/// Number of grapheme clusters in `text`.
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// The cluster starting at `index`, if `index` is a cluster start.
pub fn grapheme_at(text: &str, index: usize) -> Option<&str> {
    let mut position = 0;
    for grapheme in text.graphemes(true) {
        if position == index {
            return Some(grapheme);
        }
        position += char_len(grapheme);
    }
    None
}

/// The cluster ending at `index`, if `index` is a boundary past the start.
pub fn grapheme_before(text: &str, index: usize) -> Option<&str> {
    let mut position = 0;
    for grapheme in text.graphemes(true) {
        position += char_len(grapheme);
        if position == index {
            return Some(grapheme);
        }
        if position > index {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const COMBINING: &str = "a\u{0304}\u{0308}bc\u{0327}";

    #[rstest]
    #[case(0, 3)]
    #[case(3, 1)]
    #[case(4, 2)]
    fn grapheme_length_around_combining_marks(#[case] index: usize, #[case] expected: usize) {
        assert_eq!(grapheme_length(COMBINING, index), Ok(expected));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    #[case(6)]
    fn grapheme_length_rejects_non_cluster_starts(#[case] index: usize) {
        assert_eq!(
            grapheme_length(COMBINING, index),
            Err(SegmentError::IndexOutOfRange { index, len: 6 })
        );
    }

    #[test]
    fn boundaries_skip_combining_marks() {
        assert_eq!(grapheme_boundaries(COMBINING), vec![0, 3, 4, 6]);
        assert_eq!(grapheme_boundaries(""), vec![0]);
    }

    #[test]
    fn stepping_between_boundaries() {
        assert_eq!(next_boundary(COMBINING, 0), Some(3));
        assert_eq!(next_boundary(COMBINING, 4), Some(6));
        assert_eq!(next_boundary(COMBINING, 6), None);
        assert_eq!(previous_boundary(COMBINING, 6), Some(4));
        assert_eq!(previous_boundary(COMBINING, 3), Some(0));
        assert_eq!(previous_boundary(COMBINING, 0), None);
    }

    #[test]
    fn floor_boundary_snaps_inside_clusters() {
        assert_eq!(floor_boundary(COMBINING, 2), 0);
        assert_eq!(floor_boundary(COMBINING, 5), 4);
        assert_eq!(floor_boundary(COMBINING, 42), 6);
    }

    #[test]
    fn cluster_lookup() {
        assert_eq!(grapheme_at(COMBINING, 3), Some("b"));
        assert_eq!(grapheme_at(COMBINING, 1), None);
        assert_eq!(grapheme_before(COMBINING, 6), Some("c\u{0327}"));
        assert_eq!(grapheme_before(COMBINING, 0), None);
        assert_eq!(grapheme_count(COMBINING), 3);
    }

    #[test]
    fn emoji_sequences_are_single_clusters() {
        let family = "👨\u{200d}👩\u{200d}👧";
        assert_eq!(grapheme_length(family, 0), Ok(char_len(family)));
        assert_eq!(byte_index(family, char_len(family)), family.len());
    }
}
