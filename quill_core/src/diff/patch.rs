//! Textual patches in the diff-match-patch layout.
//!
//! ```text
//! @@ -5,9 +5,9 @@
//!  The
//! -quick
//! +swift
//!   fox
//! ```
//!
//! Coordinates count characters. Line bodies are percent-encoded so that
//! newlines and other control characters survive transport; spaces are kept
//! literal.

use quill_api::{SpanKind, TextSpan};
use tracing::debug;

use super::TextDiffer;
use crate::text::{char_len, find_all, splice};

/// Characters of unchanged context kept around each edit.
pub const PATCH_MARGIN: usize = 4;

/// Upper bound on the context window grown to make a hunk unique.
pub const MAX_PATTERN_CHARS: usize = 64;

/// Furthest a hunk may land from the position recorded in its header.
pub const PATCH_MAX_DRIFT: usize = 500;

/// Errors raised while reading or applying patch text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Patch text does not follow the expected layout.
    #[error("malformed patch at line {line}: {reason}")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// Some hunks no longer match the document.
    #[error("{failed} of {total} patch hunks no longer match the document")]
    Stale {
        /// Hunks that failed to apply.
        failed: usize,
        /// Hunks in the patch.
        total: usize,
    },
}

/// Result of applying a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Text after applying every hunk that matched.
    pub result: String,
    /// Whether every hunk applied.
    pub applied: bool,
    /// Per-hunk success flags, in patch order.
    pub hunks_applied: Vec<bool>,
}

impl PatchOutcome {
    /// The patched text, or [`PatchError::Stale`] when any hunk failed.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Stale`] if the document drifted from the patch context.
    pub fn into_result(self) -> Result<String, PatchError> {
        if self.applied {
            Ok(self.result)
        } else {
            Err(PatchError::Stale {
                failed: self.hunks_applied.iter().filter(|ok| !**ok).count(),
                total: self.hunks_applied.len(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Hunk {
    start1: usize,
    length1: usize,
    start2: usize,
    length2: usize,
    lines: Vec<TextSpan>,
}

impl Hunk {
    fn push(&mut self, span: TextSpan) {
        let length = char_len(&span.text);
        if span.kind.in_original() {
            self.length1 += length;
        }
        if span.kind.in_modified() {
            self.length2 += length;
        }
        self.lines.push(span);
    }

    fn source(&self) -> String {
        self.lines.iter().map(TextSpan::original_text).collect()
    }

    fn target(&self) -> String {
        self.lines.iter().map(TextSpan::modified_text).collect()
    }

    fn leading_context(&self) -> usize {
        context_length(self.lines.first())
    }

    fn trailing_context(&self) -> usize {
        context_length(self.lines.last())
    }
}

fn context_length(line: Option<&TextSpan>) -> usize {
    line.filter(|line| line.kind == SpanKind::Equal)
        .map_or(0, |line| char_len(&line.text))
}

/// Build a patch turning `original` into `modified`.
///
/// Each hunk carries enough surrounding context that its source text occurs
/// once in the document it will be applied to.
#[must_use]
pub fn create_patch(original: &str, modified: &str) -> String {
    let spans = TextDiffer::new()
        .with_semantic_cleanup(false)
        .compute_spans(original, modified);
    let mut hunks = build_hunks(&spans);
    let original: Vec<char> = original.chars().collect();
    let modified: Vec<char> = modified.chars().collect();
    for hunk in &mut hunks {
        // Text as it reads once every earlier hunk has been applied.
        let prepatch: Vec<char> = modified[..hunk.start2]
            .iter()
            .chain(&original[hunk.start1..])
            .copied()
            .collect();
        add_context(hunk, &prepatch);
    }
    hunks.iter().map(write_hunk).collect()
}

fn build_hunks(spans: &[TextSpan]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    let (mut position1, mut position2) = (0, 0);

    for (index, span) in spans.iter().enumerate() {
        let length = char_len(&span.text);
        match span.kind {
            SpanKind::Insert | SpanKind::Delete => {
                current
                    .get_or_insert_with(|| Hunk {
                        start1: position1,
                        start2: position2,
                        ..Hunk::default()
                    })
                    .push(span.clone());
            }
            SpanKind::Equal => {
                if let Some(mut hunk) = current.take() {
                    let is_last = index + 1 == spans.len();
                    if length <= 2 * PATCH_MARGIN && !is_last {
                        hunk.push(span.clone());
                        current = Some(hunk);
                    } else {
                        hunks.push(hunk);
                    }
                }
            }
        }
        if span.kind.in_original() {
            position1 += length;
        }
        if span.kind.in_modified() {
            position2 += length;
        }
    }

    if let Some(hunk) = current {
        hunks.push(hunk);
    }
    hunks
}

/// Surround `hunk` with context from `text` until its source is unique, then
/// add one more margin. `hunk.start2` is its position within `text`.
fn add_context(hunk: &mut Hunk, text: &[char]) {
    let start = hunk.start2;
    let end = start + hunk.length1;
    let window = |padding: usize| (start.saturating_sub(padding), (end + padding).min(text.len()));
    let haystack: String = text.iter().collect();

    let mut padding = 0;
    loop {
        let (from, to) = window(padding);
        let pattern: String = text[from..to].iter().collect();
        let whole_text = from == 0 && to == text.len();
        if whole_text
            || to - from + 2 * PATCH_MARGIN >= MAX_PATTERN_CHARS
            || occurs_once(&haystack, &pattern)
        {
            break;
        }
        padding += PATCH_MARGIN;
    }
    padding += PATCH_MARGIN;

    let (from, to) = window(padding);
    let prefix: String = text[from..start].iter().collect();
    let suffix: String = text[end..to].iter().collect();
    let (prefix_length, suffix_length) = (start - from, to - end);

    let mut lines = Vec::with_capacity(hunk.lines.len() + 2);
    if !prefix.is_empty() {
        lines.push(TextSpan::equal(prefix));
    }
    lines.append(&mut hunk.lines);
    if !suffix.is_empty() {
        lines.push(TextSpan::equal(suffix));
    }
    hunk.lines = lines;
    hunk.start1 = hunk.start1.saturating_sub(prefix_length);
    hunk.start2 -= prefix_length;
    hunk.length1 += prefix_length + suffix_length;
    hunk.length2 += prefix_length + suffix_length;
}

fn occurs_once(haystack: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return haystack.is_empty();
    }
    let Some(first) = haystack.find(pattern) else {
        return true;
    };
    let next = first + haystack[first..].chars().next().map_or(1, char::len_utf8);
    !haystack[next..].contains(pattern)
}

fn write_hunk(hunk: &Hunk) -> String {
    let mut out = format!(
        "@@ -{} +{} @@\n",
        coordinates(hunk.start1, hunk.length1),
        coordinates(hunk.start2, hunk.length2)
    );
    for line in &hunk.lines {
        out.push(match line.kind {
            SpanKind::Equal => ' ',
            SpanKind::Delete => '-',
            SpanKind::Insert => '+',
        });
        out.push_str(&encode(&line.text));
        out.push('\n');
    }
    out
}

fn coordinates(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{length}", start + 1),
    }
}

fn encode(text: &str) -> String {
    urlencoding::encode(text).replace("%20", " ")
}

fn parse_coordinates(text: &str, line: usize) -> Result<(usize, usize), PatchError> {
    let malformed = |reason: &str| PatchError::Malformed {
        line,
        reason: reason.to_owned(),
    };
    let number = |value: &str| {
        value
            .parse::<usize>()
            .map_err(|_| malformed("coordinate is not a number"))
    };
    match text.split_once(',') {
        None => Ok((number(text)?.saturating_sub(1), 1)),
        Some((start, "0")) => Ok((number(start)?, 0)),
        Some((start, length)) => Ok((number(start)?.saturating_sub(1), number(length)?)),
    }
}

fn parse_header(text: &str, line: usize) -> Result<Hunk, PatchError> {
    let malformed = || PatchError::Malformed {
        line,
        reason: "expected `@@ -a,b +c,d @@`".to_owned(),
    };
    let body = text
        .strip_prefix("@@ -")
        .and_then(|rest| rest.strip_suffix(" @@"))
        .ok_or_else(malformed)?;
    let (first, second) = body.split_once(" +").ok_or_else(malformed)?;
    let (start1, length1) = parse_coordinates(first, line)?;
    let (start2, length2) = parse_coordinates(second, line)?;
    Ok(Hunk {
        start1,
        length1,
        start2,
        length2,
        lines: Vec::new(),
    })
}

fn parse_patch(patch: &str) -> Result<Vec<Hunk>, PatchError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    for (index, raw) in patch.lines().enumerate() {
        let line = index + 1;
        if raw.is_empty() {
            continue;
        }
        if raw.starts_with("@@") {
            hunks.push(parse_header(raw, line)?);
            continue;
        }
        let hunk = hunks.last_mut().ok_or_else(|| PatchError::Malformed {
            line,
            reason: "content before the first hunk header".to_owned(),
        })?;
        let mut chars = raw.chars();
        let kind = match chars.next() {
            Some(' ') => SpanKind::Equal,
            Some('-') => SpanKind::Delete,
            Some('+') => SpanKind::Insert,
            _ => {
                return Err(PatchError::Malformed {
                    line,
                    reason: format!("unexpected line prefix in {raw:?}"),
                })
            }
        };
        let decoded = urlencoding::decode(chars.as_str()).map_err(|err| PatchError::Malformed {
            line,
            reason: format!("invalid percent-encoding: {err}"),
        })?;
        hunk.lines.push(TextSpan::new(kind, decoded.into_owned()));
    }
    Ok(hunks)
}

/// Apply `patch` to `text`.
///
/// A hunk applies only where its source text occurs verbatim within
/// [`PATCH_MAX_DRIFT`] characters of its expected position. A leading hunk
/// whose context stops short of [`PATCH_MARGIN`] must sit at the start of the
/// document, and a trailing one at the end. Hunks that cannot be placed are
/// skipped and reported.
///
/// # Errors
///
/// Returns [`PatchError::Malformed`] when the patch text cannot be parsed. A
/// document that no longer matches is not an error; see [`PatchOutcome::applied`].
pub fn apply_patch(text: &str, patch: &str) -> Result<PatchOutcome, PatchError> {
    let hunks = parse_patch(patch)?;
    let mut result = text.to_owned();
    let mut hunks_applied = Vec::with_capacity(hunks.len());
    let mut delta: isize = 0;

    for (index, hunk) in hunks.iter().enumerate() {
        let expected = hunk.start2.saturating_add_signed(delta);
        let source = hunk.source();
        let source_length = char_len(&source);
        let length = char_len(&result);
        let pinned_start = index == 0 && hunk.leading_context() < PATCH_MARGIN;
        let pinned_end = index + 1 == hunks.len() && hunk.trailing_context() < PATCH_MARGIN;

        let candidates = if source.is_empty() {
            vec![0, length]
        } else {
            find_all(&result, &source)
        };
        let location = candidates
            .into_iter()
            .filter(|at| !pinned_start || *at == 0)
            .filter(|at| !pinned_end || at + source_length == length)
            .filter(|at| at.abs_diff(expected) <= PATCH_MAX_DRIFT)
            .min_by_key(|at| at.abs_diff(expected));

        let spliced = location.and_then(|at| {
            let range = quill_api::OffsetRange::new(at, at + source_length);
            splice(&result, range, &hunk.target()).map(|patched| (at, patched))
        });

        match spliced {
            Some((at, patched)) => {
                delta = signed(at) - signed(hunk.start2);
                result = patched;
                hunks_applied.push(true);
            }
            None => {
                debug!(
                    hunk = index,
                    expected,
                    pinned_start,
                    pinned_end,
                    "patch context not found"
                );
                delta -= signed(hunk.length2) - signed(hunk.length1);
                hunks_applied.push(false);
            }
        }
    }

    Ok(PatchOutcome {
        applied: hunks_applied.iter().all(|ok| *ok),
        result,
        hunks_applied,
    })
}

#[allow(clippy::cast_possible_wrap)]
const fn signed(value: usize) -> isize {
    value as isize
}
