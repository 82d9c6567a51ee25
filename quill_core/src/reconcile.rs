//! Splicing AI output back into a block whose text may have drifted since
//! the selection was captured.
//!
//! Strategies are tried in a fixed order and the first that locates the
//! selection wins:
//!
//! 1. full-block replacement
//! 2. empty block (nothing to preserve)
//! 3. captured offsets, if they still cover the selected text
//! 4. first verbatim occurrence of the selected text
//! 5. first occurrence of the trimmed selected text
//! 6. fuzzy window anchored on the selection's leading characters
//!
//! When every strategy fails the block is left alone and a failure result is
//! returned.

use quill_api::{MatchTier, OffsetRange, ReconciliationResult, Selection};
use tracing::{debug, warn};

use crate::text::{char_len, char_slice, find_all, find_from, splice, whitespace_margins};

/// Leading characters of the trimmed selection used to anchor the fuzzy tier.
pub const FUZZY_PREFIX_CHARS: usize = 10;

/// Reason reported when no strategy located the selection.
pub const NOT_FOUND: &str = "selection not found in current content";

/// Compute the new block text with `replacement` spliced in place of the
/// selection.
///
/// Pure: `current` is never modified, and a failed result carries no content.
#[must_use]
pub fn reconcile(
    current: &str,
    selection: &Selection,
    replacement: &str,
    is_full_block_replace: bool,
) -> ReconciliationResult {
    if is_full_block_replace {
        debug!(tier = ?MatchTier::FullBlock, "replacing whole block");
        return ReconciliationResult::spliced(
            replacement,
            MatchTier::FullBlock,
            OffsetRange::new(0, char_len(replacement)),
        );
    }

    if current.trim().is_empty() {
        debug!(tier = ?MatchTier::EmptyBlock, "block has no text to preserve");
        return ReconciliationResult::spliced(
            replacement,
            MatchTier::EmptyBlock,
            OffsetRange::new(0, char_len(replacement)),
        );
    }

    let located = offset_match(current, selection)
        .map(|range| (MatchTier::Offset, range))
        .or_else(|| exact_match(current, &selection.selected_text).map(|r| (MatchTier::Exact, r)))
        .or_else(|| trimmed_match(current, &selection.selected_text).map(|r| (MatchTier::Trimmed, r)))
        .or_else(|| fuzzy_match(current, selection).map(|r| (MatchTier::Fuzzy, r)));

    let Some((tier, range)) = located else {
        warn!(
            selected_chars = char_len(&selection.selected_text),
            block_chars = char_len(current),
            start = selection.start_offset(),
            "{}",
            NOT_FOUND
        );
        return ReconciliationResult::failure(NOT_FOUND);
    };

    match splice(current, range, replacement) {
        Some(new_content) => {
            debug!(?tier, start = range.start, end = range.end, "selection located");
            ReconciliationResult::spliced(
                new_content,
                tier,
                OffsetRange::new(range.start, range.start + char_len(replacement)),
            )
        }
        None => {
            warn!(?tier, start = range.start, end = range.end, "located range is out of bounds");
            ReconciliationResult::failure(NOT_FOUND)
        }
    }
}

/// Captured offsets, accepted only while they still cover the selected text.
fn offset_match(current: &str, selection: &Selection) -> Option<OffsetRange> {
    let range = selection.range.filter(|range| !range.is_empty())?;
    if char_slice(current, range) == Some(selection.selected_text.as_str()) {
        Some(range)
    } else {
        debug!(
            start = range.start,
            end = range.end,
            "captured offsets are stale"
        );
        None
    }
}

/// First verbatim occurrence. Whitespace the selection picked up at its
/// edges stays in the block; only the core of the match is replaced.
fn exact_match(current: &str, selected: &str) -> Option<OffsetRange> {
    if selected.trim().is_empty() {
        return None;
    }
    let start = find_from(current, selected, 0)?;
    let (leading, trailing) = whitespace_margins(selected);
    Some(OffsetRange::new(
        start + leading,
        start + char_len(selected) - trailing,
    ))
}

fn trimmed_match(current: &str, selected: &str) -> Option<OffsetRange> {
    let trimmed = selected.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = find_from(current, trimmed, 0)?;
    Some(OffsetRange::new(start, start + char_len(trimmed)))
}

/// Anchor on the first [`FUZZY_PREFIX_CHARS`] characters of the trimmed
/// selection, preferring the occurrence nearest the captured start. The
/// window ends after the selection's trailing characters when they appear
/// within twice the selection length, and otherwise spans the selection's
/// length.
fn fuzzy_match(current: &str, selection: &Selection) -> Option<OffsetRange> {
    let trimmed = selection.selected_text.trim();
    let length = char_len(trimmed);
    if length == 0 {
        return None;
    }

    let prefix: String = trimmed.chars().take(FUZZY_PREFIX_CHARS).collect();
    let hint = selection.range.map_or(0, |range| range.start);
    let start = find_all(current, &prefix)
        .into_iter()
        .min_by_key(|found| found.abs_diff(hint))?;

    let block_length = char_len(current);
    let prefix_end = start + char_len(&prefix);
    let limit = start + 2 * length;
    let suffix: String = {
        let skip = length.saturating_sub(FUZZY_PREFIX_CHARS);
        trimmed.chars().skip(skip).collect()
    };
    let suffix_length = char_len(&suffix);

    let mut end = None;
    let mut from = start;
    while let Some(found) = find_from(current, &suffix, from) {
        let candidate = found + suffix_length;
        if candidate > limit {
            break;
        }
        if candidate >= prefix_end {
            end = Some(candidate);
            break;
        }
        from = found + 1;
    }

    let end = end.unwrap_or_else(|| (start + length).min(block_length));
    debug!(start, end, "fuzzy window");
    Some(OffsetRange::new(start, end.max(prefix_end).min(block_length)))
}
