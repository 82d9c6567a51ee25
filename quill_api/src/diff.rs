use serde::{Deserialize, Serialize};

/// Role a span plays in a diff between an original and a modified text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Text present on both sides.
    Equal,
    /// Text only present in the modified side.
    Insert,
    /// Text only present in the original side.
    Delete,
}

impl SpanKind {
    /// Whether the span contributes to the original projection.
    pub const fn in_original(self) -> bool {
        matches!(self, Self::Equal | Self::Delete)
    }

    /// Whether the span contributes to the modified projection.
    pub const fn in_modified(self) -> bool {
        matches!(self, Self::Equal | Self::Insert)
    }
}

/// A contiguous run of text tagged with its diff role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Diff role of the span.
    pub kind: SpanKind,
    /// Text covered by the span.
    pub text: String,
}

impl TextSpan {
    /// Create a span of the given kind.
    pub fn new(kind: SpanKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Shorthand for an equal span.
    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Equal, text)
    }

    /// Shorthand for an inserted span.
    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Insert, text)
    }

    /// Shorthand for a deleted span.
    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Delete, text)
    }

    /// Text this span contributes to the original side.
    pub fn original_text(&self) -> &str {
        if self.kind.in_original() {
            &self.text
        } else {
            ""
        }
    }

    /// Text this span contributes to the modified side.
    pub fn modified_text(&self) -> &str {
        if self.kind.in_modified() {
            &self.text
        } else {
            ""
        }
    }
}

/// A single reviewable entry of a diff result.
///
/// `accepted` means "take the modified side of this entry" when merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffChange {
    /// Diff role of the entry.
    pub kind: SpanKind,
    /// Text on the original side; empty for insertions.
    #[serde(default)]
    pub original_text: String,
    /// Text on the modified side; empty for deletions.
    #[serde(default)]
    pub modified_text: String,
    /// Whether the modified side is kept when merging.
    #[serde(default = "accepted_by_default")]
    pub accepted: bool,
}

const fn accepted_by_default() -> bool {
    true
}

impl DiffChange {
    /// Whether the entry represents an edit rather than shared text.
    pub const fn is_change(&self) -> bool {
        !matches!(self.kind, SpanKind::Equal)
    }

    /// Text emitted for this entry when merging.
    pub fn chosen_text(&self) -> &str {
        if self.accepted {
            &self.modified_text
        } else {
            &self.original_text
        }
    }

    /// Copy of this entry with a different acceptance flag.
    #[must_use]
    pub fn with_accepted(&self, accepted: bool) -> Self {
        Self {
            accepted,
            ..self.clone()
        }
    }
}

impl From<TextSpan> for DiffChange {
    fn from(span: TextSpan) -> Self {
        let (original_text, modified_text) = match span.kind {
            SpanKind::Equal => (span.text.clone(), span.text),
            SpanKind::Insert => (String::new(), span.text),
            SpanKind::Delete => (span.text, String::new()),
        };

        Self {
            kind: span.kind,
            original_text,
            modified_text,
            accepted: true,
        }
    }
}

/// Counters describing a diff under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiffStats {
    /// Number of entries.
    pub total: usize,
    /// Entries shared by both sides.
    pub unchanged: usize,
    /// Entries that insert or delete text.
    pub modified: usize,
    /// Entries currently taking the modified side.
    pub accepted: usize,
    /// Entries currently taking the original side.
    pub rejected: usize,
}

/// A rendering segment on one side of an inline diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSegment {
    /// Rendering role; never `Insert` on the original side or `Delete` on the modified side.
    pub kind: SpanKind,
    /// Segment text.
    pub text: String,
}

/// One side of an inline diff: the full text plus its annotated segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InlineText {
    /// Complete text of this side.
    pub full_text: String,
    /// Ordered segments whose texts concatenate to `full_text`.
    #[serde(default)]
    pub segments: Vec<InlineSegment>,
}

impl InlineText {
    /// Concatenate the segment texts.
    pub fn joined_segments(&self) -> String {
        self.segments.iter().map(|segment| segment.text.as_str()).collect()
    }
}

/// Two parallel rendering tracks for the same underlying diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InlineDiff {
    /// Original side: equal and deleted segments.
    pub original: InlineText,
    /// Modified side: equal and inserted segments.
    pub modified: InlineText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_from_span_populates_sides() {
        let equal = DiffChange::from(TextSpan::equal("same"));
        assert_eq!(equal.original_text, "same");
        assert_eq!(equal.modified_text, "same");
        assert!(!equal.is_change());

        let insert = DiffChange::from(TextSpan::insert("new"));
        assert!(insert.original_text.is_empty());
        assert_eq!(insert.modified_text, "new");

        let delete = DiffChange::from(TextSpan::delete("old"));
        assert_eq!(delete.original_text, "old");
        assert!(delete.modified_text.is_empty());
        assert!(delete.accepted);
    }

    #[test]
    fn chosen_text_follows_flag() {
        let delete = DiffChange::from(TextSpan::delete("old"));
        assert_eq!(delete.chosen_text(), "");
        assert_eq!(delete.with_accepted(false).chosen_text(), "old");
    }

    #[test]
    fn accepted_defaults_to_true_when_missing() {
        let json = r#"{"kind": "insert", "modified_text": "hi"}"#;
        let change: DiffChange = serde_json::from_str(json).expect("deserialize change");
        assert!(change.accepted);
        assert!(change.original_text.is_empty());
    }

    #[test]
    fn span_kind_uses_snake_case() {
        let json = serde_json::to_string(&SpanKind::Delete).expect("serialize kind");
        assert_eq!(json, "\"delete\"");
    }

    #[test]
    fn projections_skip_foreign_side() {
        let span = TextSpan::insert("added");
        assert_eq!(span.original_text(), "");
        assert_eq!(span.modified_text(), "added");
    }
}
