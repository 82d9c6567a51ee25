//! Character-offset helpers.
//!
//! Offsets throughout the crate count Unicode scalar values, while Rust
//! strings index by byte. These helpers convert between the two.

use quill_api::OffsetRange;

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_index`-th character, or `text.len()` at the end.
pub(crate) fn byte_index(text: &str, char_index: usize) -> Option<usize> {
    if char_index == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .nth(char_index)
}

pub(crate) fn char_index(text: &str, byte_index: usize) -> usize {
    text[..byte_index].chars().count()
}

pub(crate) fn char_slice(text: &str, range: OffsetRange) -> Option<&str> {
    if range.start > range.end {
        return None;
    }
    let start = byte_index(text, range.start)?;
    let end = byte_index(text, range.end)?;
    Some(&text[start..end])
}

/// Character offset of the first occurrence of `needle` at or after `from`.
pub(crate) fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let start = byte_index(haystack, from)?;
    haystack[start..]
        .find(needle)
        .map(|found| from + char_index(&haystack[start..], found))
}

/// Character offsets of every (possibly overlapping) occurrence of `needle`.
pub(crate) fn find_all(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(at) = find_from(haystack, needle, from) {
        found.push(at);
        from = at + 1;
    }
    found
}

/// Replace the characters in `range` with `replacement`.
pub(crate) fn splice(text: &str, range: OffsetRange, replacement: &str) -> Option<String> {
    let start = byte_index(text, range.start)?;
    let end = byte_index(text, range.end)?;
    if start > end {
        return None;
    }
    let mut spliced = String::with_capacity(text.len() - (end - start) + replacement.len());
    spliced.push_str(&text[..start]);
    spliced.push_str(replacement);
    spliced.push_str(&text[end..]);
    Some(spliced)
}

/// Number of leading and trailing whitespace characters.
pub(crate) fn whitespace_margins(text: &str) -> (usize, usize) {
    let leading = text.chars().take_while(|c| c.is_whitespace()).count();
    if leading == char_len(text) {
        return (leading, 0);
    }
    let trailing = text.chars().rev().take_while(|c| c.is_whitespace()).count();
    (leading, trailing)
}
