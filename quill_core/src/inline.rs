use quill_api::{DiffStats, InlineDiff, InlineSegment, InlineText, SpanKind, TextSpan};

use crate::diff::TextDiffer;

/// Inline diff of `original` against `modified` using the default differ.
#[must_use]
pub fn compute_inline_diff(original: &str, modified: &str) -> InlineDiff {
    TextDiffer::new().compute_inline_diff(original, modified)
}

/// Split diff spans into an original track (equal and deleted segments) and
/// a modified track (equal and inserted segments).
#[must_use]
pub fn split_tracks(original: &str, modified: &str, spans: &[TextSpan]) -> InlineDiff {
    let mut original_segments = Vec::new();
    let mut modified_segments = Vec::new();

    for span in spans {
        let segment = InlineSegment {
            kind: span.kind,
            text: span.text.clone(),
        };
        match span.kind {
            SpanKind::Equal => {
                original_segments.push(segment.clone());
                modified_segments.push(segment);
            }
            SpanKind::Delete => original_segments.push(segment),
            SpanKind::Insert => modified_segments.push(segment),
        }
    }

    InlineDiff {
        original: InlineText {
            full_text: original.to_owned(),
            segments: original_segments,
        },
        modified: InlineText {
            full_text: modified.to_owned(),
            segments: modified_segments,
        },
    }
}

/// Segment counts across both tracks. Inline review has no per-segment
/// rejection, so every edit counts as accepted.
#[must_use]
pub fn inline_stats(diff: &InlineDiff) -> DiffStats {
    let count = |text: &InlineText, kind: SpanKind| {
        text.segments
            .iter()
            .filter(|segment| segment.kind == kind)
            .count()
    };
    let deletions = count(&diff.original, SpanKind::Delete);
    let insertions = count(&diff.modified, SpanKind::Insert);

    DiffStats {
        total: diff.original.segments.len() + diff.modified.segments.len(),
        unchanged: count(&diff.original, SpanKind::Equal),
        modified: deletions + insertions,
        accepted: deletions + insertions,
        rejected: 0,
    }
}
