//! Diff generation, accept/reject merging and patch primitives.

mod cleanup;
mod myers;
pub mod patch;

use quill_api::{DiffChange, DiffStats, InlineDiff, SpanKind, TextSpan};

use self::myers::EditOp;
use crate::inline;

/// Edit cost above which the differ stops searching and reports a block replacement.
pub const DEFAULT_MAX_EDIT_COST: usize = 1_000;

/// Ordered, reviewable diff entries.
pub type DiffResult = Vec<DiffChange>;

/// Computes character or line diffs between an original and a modified text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDiffer {
    max_edit_cost: usize,
    semantic_cleanup: bool,
}

impl Default for TextDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDiffer {
    /// Differ with semantic cleanup and the default cost limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_edit_cost: DEFAULT_MAX_EDIT_COST,
            semantic_cleanup: true,
        }
    }

    /// Override the edit cost limit.
    #[must_use]
    pub const fn with_max_edit_cost(mut self, max_edit_cost: usize) -> Self {
        self.max_edit_cost = max_edit_cost;
        self
    }

    /// Enable or disable the semantic cleanup pass.
    #[must_use]
    pub const fn with_semantic_cleanup(mut self, enabled: bool) -> Self {
        self.semantic_cleanup = enabled;
        self
    }

    /// Character-level spans between `original` and `modified`.
    #[must_use]
    pub fn compute_spans(&self, original: &str, modified: &str) -> Vec<TextSpan> {
        let a: Vec<char> = original.chars().collect();
        let b: Vec<char> = modified.chars().collect();
        let ops = myers::edit_script(&a, &b, self.max_edit_cost);
        self.finish(collect_spans(&a, &b, &ops, |text, ch: &char| text.push(*ch)))
    }

    /// Line-level spans; each line keeps its trailing newline.
    #[must_use]
    pub fn compute_line_spans(&self, original: &str, modified: &str) -> Vec<TextSpan> {
        let a: Vec<&str> = original.split_inclusive('\n').collect();
        let b: Vec<&str> = modified.split_inclusive('\n').collect();
        let ops = myers::edit_script(&a, &b, self.max_edit_cost);
        self.finish(collect_spans(&a, &b, &ops, |text, line: &&str| {
            text.push_str(line);
        }))
    }

    /// Reviewable character diff; every entry starts accepted.
    #[must_use]
    pub fn compute_diff(&self, original: &str, modified: &str) -> DiffResult {
        self.compute_spans(original, modified)
            .into_iter()
            .map(DiffChange::from)
            .collect()
    }

    /// Reviewable line diff for paragraph-scale changes.
    #[must_use]
    pub fn compute_line_diff(&self, original: &str, modified: &str) -> DiffResult {
        self.compute_line_spans(original, modified)
            .into_iter()
            .map(DiffChange::from)
            .collect()
    }

    /// Two rendering tracks, one per side, over the character diff.
    #[must_use]
    pub fn compute_inline_diff(&self, original: &str, modified: &str) -> InlineDiff {
        let spans = self.compute_spans(original, modified);
        inline::split_tracks(original, modified, &spans)
    }

    fn finish(&self, spans: Vec<TextSpan>) -> Vec<TextSpan> {
        if self.semantic_cleanup {
            cleanup::semantic_cleanup(spans)
        } else {
            cleanup::merge_runs(spans)
        }
    }
}

fn collect_spans<T>(
    a: &[T],
    b: &[T],
    ops: &[EditOp],
    push: impl Fn(&mut String, &T),
) -> Vec<TextSpan> {
    let mut spans: Vec<TextSpan> = Vec::new();
    let (mut ai, mut bi) = (0, 0);
    for op in ops {
        let (kind, token) = match op {
            EditOp::Keep => {
                ai += 1;
                bi += 1;
                (SpanKind::Equal, &a[ai - 1])
            }
            EditOp::Delete => {
                ai += 1;
                (SpanKind::Delete, &a[ai - 1])
            }
            EditOp::Insert => {
                bi += 1;
                (SpanKind::Insert, &b[bi - 1])
            }
        };
        match spans.last_mut().filter(|span| span.kind == kind) {
            Some(span) => push(&mut span.text, token),
            None => {
                let mut text = String::new();
                push(&mut text, token);
                spans.push(TextSpan::new(kind, text));
            }
        }
    }
    spans
}

/// Concatenate each entry's chosen side: modified text when accepted, original otherwise.
#[must_use]
pub fn merge_accepted_changes(changes: &[DiffChange]) -> String {
    changes.iter().map(DiffChange::chosen_text).collect()
}

/// Copy of `changes` with every entry accepted.
#[must_use]
pub fn accept_all(changes: &[DiffChange]) -> DiffResult {
    changes.iter().map(|change| change.with_accepted(true)).collect()
}

/// Copy of `changes` with every entry rejected.
#[must_use]
pub fn reject_all(changes: &[DiffChange]) -> DiffResult {
    changes.iter().map(|change| change.with_accepted(false)).collect()
}

/// Copy of `changes` with the entry at `index` flipped; out-of-range indices change nothing.
#[must_use]
pub fn toggle_at_index(changes: &[DiffChange], index: usize) -> DiffResult {
    changes
        .iter()
        .enumerate()
        .map(|(position, change)| {
            if position == index {
                change.with_accepted(!change.accepted)
            } else {
                change.clone()
            }
        })
        .collect()
}

/// Counts of unchanged, edited, accepted and rejected entries.
///
/// Acceptance is only counted for edits; shared text is the same either way.
#[must_use]
pub fn diff_stats(changes: &[DiffChange]) -> DiffStats {
    let mut stats = DiffStats {
        total: changes.len(),
        ..DiffStats::default()
    };
    for change in changes {
        if !change.is_change() {
            stats.unchanged += 1;
        } else if change.accepted {
            stats.modified += 1;
            stats.accepted += 1;
        } else {
            stats.modified += 1;
            stats.rejected += 1;
        }
    }
    stats
}
