//! Turning a host selection into character offsets within its block.

use quill_api::{OffsetRange, Selection};
use tracing::debug;

use crate::text::{char_len, char_slice, find_from};

/// Selection as reported by the host, before offsets are computed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSelection {
    /// Text under the selection, untrimmed.
    pub text: String,
    /// Flattened text of the block containing the selection.
    pub container_text: String,
    /// Block text from its start up to the selection start.
    pub prefix_text: String,
}

/// Host capability to report the active text selection.
pub trait SelectionSource {
    /// Current selection, or `None` when nothing is selected.
    fn active_selection(&self) -> Option<RawSelection>;
}

/// Captures selections from a host and anchors them in their block.
#[derive(Debug)]
pub struct SelectionAnchor<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: SelectionSource + ?Sized> SelectionAnchor<'a, S> {
    /// Anchor selections reported by `source`.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Capture and anchor the active selection.
    ///
    /// Returns `None` when the host reports no selection or only whitespace.
    pub fn capture(&self) -> Option<Selection> {
        let raw = self.source.active_selection()?;
        if raw.text.trim().is_empty() {
            debug!("ignoring empty selection");
            return None;
        }
        Some(anchor_selection(&raw))
    }
}

/// Compute the character range of `raw.text` within its block.
///
/// The prefix length gives the start offset. If the block does not contain
/// the selected text at that offset, the first occurrence is used instead,
/// and when there is none the selection is left unanchored.
#[must_use]
pub fn anchor_selection(raw: &RawSelection) -> Selection {
    let start = char_len(&raw.prefix_text);
    let candidate = OffsetRange::new(start, start + char_len(&raw.text));

    let range = if char_slice(&raw.container_text, candidate) == Some(raw.text.as_str()) {
        Some(candidate)
    } else if let Some(found) = find_from(&raw.container_text, &raw.text, 0) {
        debug!(
            expected = start,
            found, "selection prefix disagrees with block text, using first occurrence"
        );
        Some(OffsetRange::new(found, found + char_len(&raw.text)))
    } else {
        debug!("selection not present in block text, leaving it unanchored");
        None
    };

    Selection::new(raw.text.clone(), raw.container_text.clone(), range)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixed(Option<RawSelection>);

    impl SelectionSource for Fixed {
        fn active_selection(&self) -> Option<RawSelection> {
            self.0.clone()
        }
    }

    fn raw(text: &str, container: &str, prefix: &str) -> RawSelection {
        RawSelection {
            text: text.into(),
            container_text: container.into(),
            prefix_text: prefix.into(),
        }
    }

    #[test]
    fn prefix_gives_offsets() {
        let selection = anchor_selection(&raw("world", "Hello world, nice world", "Hello world, nice "));
        assert_eq!(selection.range, Some(OffsetRange::new(18, 23)));
        assert_eq!(selection.start_offset(), 18);
        assert!(selection.is_anchored_in("Hello world, nice world"));
    }

    #[test]
    fn offsets_count_characters() {
        let selection = anchor_selection(&raw("wörld", "héllo wörld", "héllo "));
        assert_eq!(selection.range, Some(OffsetRange::new(6, 11)));
    }

    #[test]
    fn disagreeing_prefix_falls_back_to_first_occurrence() {
        let selection = anchor_selection(&raw("fox", "The quick fox", "The "));
        assert_eq!(selection.range, Some(OffsetRange::new(10, 13)));
    }

    #[test]
    fn missing_text_is_unanchored() {
        let selection = anchor_selection(&raw("wolf", "The quick fox", "The "));
        assert_eq!(selection.range, None);
        assert_eq!(selection.start_offset(), -1);
        assert_eq!(selection.end_offset(), -1);
    }

    #[test]
    fn capture_skips_blank_and_absent_selections() {
        assert_eq!(SelectionAnchor::new(&Fixed(None)).capture(), None);
        let blank = Fixed(Some(raw("  ", "a  b", "a")));
        assert_eq!(SelectionAnchor::new(&blank).capture(), None);
        let real = Fixed(Some(raw("quick", "The quick fox", "The ")));
        let selection = SelectionAnchor::new(&real).capture().expect("selection");
        assert_eq!(selection.display_text(), "quick");
        assert!(!selection.is_full_block_replace);
    }
}
