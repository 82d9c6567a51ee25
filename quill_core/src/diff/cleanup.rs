//! Span normalization and semantic cleanup.

use quill_api::{SpanKind, TextSpan};

use crate::text::char_len;

/// Coalesce adjacent spans: drop empty ones, merge neighbouring equalities,
/// and order every run of edits as one deletion followed by one insertion.
pub(crate) fn merge_runs(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    let flush = |merged: &mut Vec<TextSpan>, deleted: &mut String, inserted: &mut String| {
        if !deleted.is_empty() {
            merged.push(TextSpan::delete(std::mem::take(deleted)));
        }
        if !inserted.is_empty() {
            merged.push(TextSpan::insert(std::mem::take(inserted)));
        }
    };

    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match span.kind {
            SpanKind::Delete => deleted.push_str(&span.text),
            SpanKind::Insert => inserted.push_str(&span.text),
            SpanKind::Equal => {
                flush(&mut merged, &mut deleted, &mut inserted);
                if let Some(last) = merged
                    .last_mut()
                    .filter(|last| last.kind == SpanKind::Equal)
                {
                    last.text.push_str(&span.text);
                } else {
                    merged.push(span);
                }
            }
        }
    }
    flush(&mut merged, &mut deleted, &mut inserted);
    merged
}

/// Fold short equalities that sit between larger edits into those edits.
///
/// An equality is absorbed when it is no longer than the larger side of the
/// edits on either side of it. This keeps reviews from flickering between
/// one-character keeps and rewrites.
pub(crate) fn semantic_cleanup(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    let mut spans = merge_runs(spans);
    while let Some(index) = absorbable_equality(&spans) {
        let text = std::mem::take(&mut spans[index].text);
        spans.splice(
            index..=index,
            [TextSpan::delete(text.clone()), TextSpan::insert(text)],
        );
        spans = merge_runs(spans);
    }
    spans
}

fn absorbable_equality(spans: &[TextSpan]) -> Option<usize> {
    (1..spans.len().saturating_sub(1)).find(|&index| {
        if spans[index].kind != SpanKind::Equal {
            return false;
        }
        let length = char_len(&spans[index].text);
        let before = edit_weight(spans[..index].iter().rev());
        let after = edit_weight(spans[index + 1..].iter());
        before > 0 && after > 0 && length <= before && length <= after
    })
}

/// Larger of the deleted and inserted character counts up to the next equality.
fn edit_weight<'a>(spans: impl Iterator<Item = &'a TextSpan>) -> usize {
    let (mut deleted, mut inserted) = (0, 0);
    for span in spans {
        match span.kind {
            SpanKind::Equal => break,
            SpanKind::Delete => deleted += char_len(&span.text),
            SpanKind::Insert => inserted += char_len(&span.text),
        }
    }
    deleted.max(inserted)
}
