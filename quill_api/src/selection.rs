use serde::{Deserialize, Serialize};

/// Half-open range of character offsets (Unicode scalar values) within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRange {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl OffsetRange {
    /// Construct a range with explicit bounds.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range covers no characters.
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A text selection captured inside one block.
///
/// When the anchor is fresh, `block_full_text[range] == selected_text`. The
/// block may be edited before the selection is used, so consumers must treat
/// the range as a hint and re-verify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Selection {
    /// Raw selected text, untrimmed.
    pub selected_text: String,
    /// Flattened text of the block at capture time.
    #[serde(default)]
    pub block_full_text: String,
    /// Character offsets of the selection, `None` when no precise anchor exists.
    #[serde(default)]
    pub range: Option<OffsetRange>,
    /// Whether the whole block is being replaced.
    #[serde(default)]
    pub is_full_block_replace: bool,
}

impl Selection {
    /// Create a partial-block selection.
    pub fn new(
        selected_text: impl Into<String>,
        block_full_text: impl Into<String>,
        range: Option<OffsetRange>,
    ) -> Self {
        Self {
            selected_text: selected_text.into(),
            block_full_text: block_full_text.into(),
            range,
            is_full_block_replace: false,
        }
    }

    /// Select an entire block for replacement.
    pub fn full_block(block_text: impl Into<String>) -> Self {
        let block_full_text = block_text.into();
        Self {
            selected_text: block_full_text.clone(),
            range: Some(OffsetRange::new(0, block_full_text.chars().count())),
            block_full_text,
            is_full_block_replace: true,
        }
    }

    /// Start offset, or `-1` when no anchor is available.
    pub fn start_offset(&self) -> i64 {
        self.range
            .and_then(|range| i64::try_from(range.start).ok())
            .unwrap_or(-1)
    }

    /// End offset, or `-1` when no anchor is available.
    pub fn end_offset(&self) -> i64 {
        self.range
            .and_then(|range| i64::try_from(range.end).ok())
            .unwrap_or(-1)
    }

    /// Selected text with surrounding whitespace removed, for display only.
    pub fn display_text(&self) -> &str {
        self.selected_text.trim()
    }

    /// Whether the range still points at `selected_text` inside `text`.
    pub fn is_anchored_in(&self, text: &str) -> bool {
        let Some(range) = self.range else {
            return false;
        };
        if range.is_empty() {
            return false;
        }

        let slice: String = text
            .chars()
            .skip(range.start)
            .take(range.len())
            .collect();
        slice.chars().count() == range.len() && slice == self.selected_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_report_minus_one_without_anchor() {
        let selection = Selection::new("quick", "The quick fox", None);
        assert_eq!(selection.start_offset(), -1);
        assert_eq!(selection.end_offset(), -1);
        assert!(!selection.is_anchored_in("The quick fox"));
    }

    #[test]
    fn anchored_selection_is_detected() {
        let selection = Selection::new("quick", "The quick fox", Some(OffsetRange::new(4, 9)));
        assert!(selection.is_anchored_in("The quick fox"));
        assert!(!selection.is_anchored_in("The slow fox"));
    }

    #[test]
    fn anchor_counts_characters_not_bytes() {
        let text = "héllo wörld";
        let selection = Selection::new("wörld", text, Some(OffsetRange::new(6, 11)));
        assert!(selection.is_anchored_in(text));
    }

    #[test]
    fn full_block_covers_everything() {
        let selection = Selection::full_block("über");
        assert!(selection.is_full_block_replace);
        assert_eq!(selection.range, Some(OffsetRange::new(0, 4)));
        assert!(selection.is_anchored_in("über"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let json = r#"{"selected_text": " padded "}"#;
        let selection: Selection = serde_json::from_str(json).expect("deserialize selection");
        assert!(selection.range.is_none());
        assert!(!selection.is_full_block_replace);
        assert_eq!(selection.display_text(), "padded");
    }
}
