use serde::{Deserialize, Serialize};

use super::selection::OffsetRange;

/// Strategy that located the splice point during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// The replacement stands in for the whole block.
    FullBlock,
    /// The block had no text to preserve.
    EmptyBlock,
    /// The captured offsets still pointed at the selected text.
    Offset,
    /// First verbatim occurrence of the selected text.
    Exact,
    /// First occurrence of the selected text without surrounding whitespace.
    Trimmed,
    /// Prefix-anchored window approximating the selection.
    Fuzzy,
}

/// Outcome of splicing replacement text back into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Whether a splice point was found.
    pub success: bool,
    /// Full block text after the splice.
    #[serde(default)]
    pub new_content: Option<String>,
    /// Reason the reconciliation failed.
    #[serde(default)]
    pub error: Option<String>,
    /// Strategy that succeeded.
    #[serde(default)]
    pub tier: Option<MatchTier>,
    /// Character range the replacement occupies inside `new_content`.
    #[serde(default)]
    pub replacement_range: Option<OffsetRange>,
}

impl ReconciliationResult {
    /// Successful splice.
    pub fn spliced(
        new_content: impl Into<String>,
        tier: MatchTier,
        replacement_range: OffsetRange,
    ) -> Self {
        Self {
            success: true,
            new_content: Some(new_content.into()),
            error: None,
            tier: Some(tier),
            replacement_range: Some(replacement_range),
        }
    }

    /// Failed reconciliation carrying a reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            new_content: None,
            error: Some(error.into()),
            tier: None,
            replacement_range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_has_no_content() {
        let result = ReconciliationResult::failure("selection not found in current content");
        assert!(!result.success);
        assert!(result.new_content.is_none());
        assert!(result.tier.is_none());
    }

    #[test]
    fn tier_serializes_snake_case() {
        let json = serde_json::to_string(&MatchTier::FullBlock).expect("serialize tier");
        assert_eq!(json, "\"full_block\"");
    }

    #[test]
    fn spliced_round_trip() {
        let result = ReconciliationResult::spliced(
            "The swift fox jumps.",
            MatchTier::Offset,
            OffsetRange::new(4, 9),
        );
        let json = serde_json::to_string(&result).expect("serialize result");
        let decoded: ReconciliationResult =
            serde_json::from_str(&json).expect("deserialize result");
        assert_eq!(result, decoded);
    }
}
