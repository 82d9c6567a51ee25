use pretty_assertions::assert_eq;
use quill_core::api::{MatchTier, OffsetRange, Selection};
use quill_core::reconcile::reconcile;

fn unanchored(selected: &str) -> Selection {
    Selection::new(selected, "", None)
}

#[test]
fn exact_tier_replaces_first_occurrence_only() {
    let result = reconcile("Hello world, nice world", &unanchored("world"), "earth", false);
    assert!(result.success);
    assert_eq!(result.tier, Some(MatchTier::Exact));
    assert_eq!(result.new_content.as_deref(), Some("Hello earth, nice world"));
}

#[test]
fn stale_padding_does_not_leak_into_block() {
    let result = reconcile("  foo bar  ", &unanchored(" foo "), "X", false);
    assert_eq!(result.new_content.as_deref(), Some("  X bar  "));
}

#[test]
fn full_block_ignores_selection_fields() {
    let garbage = Selection::new("not in block", "???", Some(OffsetRange::new(99, 3)));
    let result = reconcile("anything at all", &garbage, "Replacement.", true);
    assert_eq!(result.tier, Some(MatchTier::FullBlock));
    assert_eq!(result.new_content.as_deref(), Some("Replacement."));
}

#[test]
fn missing_selection_fails_without_content() {
    let result = reconcile("abc", &unanchored("xyz"), "replacement", false);
    assert!(!result.success);
    assert_eq!(result.new_content, None);
    assert_eq!(
        result.error.as_deref(),
        Some("selection not found in current content")
    );
}

#[test]
fn valid_offsets_splice_exactly() {
    let block = "alpha beta gamma beta";
    let selection = Selection::new("beta", block, Some(OffsetRange::new(17, 21)));
    let result = reconcile(block, &selection, "delta", false);
    assert_eq!(result.tier, Some(MatchTier::Offset));
    assert_eq!(
        result.new_content.as_deref(),
        Some("alpha beta gamma delta")
    );
}

#[test]
fn quick_fox_end_to_end() {
    let selection = Selection::new(
        "quick",
        "The quick fox jumps.",
        Some(OffsetRange::new(4, 9)),
    );
    let fresh = reconcile("The quick fox jumps.", &selection, "swift", false);
    assert_eq!(fresh.new_content.as_deref(), Some("The swift fox jumps."));

    let edited = reconcile("The quick brown fox jumps.", &selection, "swift", false);
    assert_eq!(
        edited.new_content.as_deref(),
        Some("The swift brown fox jumps.")
    );

    let shifted = reconcile("So, the quick brown fox jumps.", &selection, "swift", false);
    assert_eq!(shifted.tier, Some(MatchTier::Exact));
    assert_eq!(
        shifted.new_content.as_deref(),
        Some("So, the swift brown fox jumps.")
    );
}

#[test]
fn tiers_are_tried_in_order() {
    let block = "one two three";
    let offset = Selection::new("two", block, Some(OffsetRange::new(4, 7)));
    assert_eq!(reconcile(block, &offset, "2", false).tier, Some(MatchTier::Offset));

    let exact = Selection::new("two", block, Some(OffsetRange::new(0, 3)));
    assert_eq!(reconcile(block, &exact, "2", false).tier, Some(MatchTier::Exact));

    let trimmed = unanchored("\ntwo\n");
    assert_eq!(reconcile(block, &trimmed, "2", false).tier, Some(MatchTier::Trimmed));

    let fuzzy = unanchored("one two three four five");
    let result = reconcile(block, &fuzzy, "1-5", false);
    assert_eq!(result.tier, Some(MatchTier::Fuzzy));
    assert_eq!(result.new_content.as_deref(), Some("1-5"));
}
