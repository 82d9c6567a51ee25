use std::fmt;

use serde::{Deserialize, Serialize};

use super::selection::{OffsetRange, Selection};

/// Text transformation requested from the AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// Improve fluency while keeping the meaning.
    Polish,
    /// Translate between Chinese and English.
    Translate,
    /// Condense into the key points.
    Summarize,
    /// Add detail and explanation.
    Expand,
    /// Remove redundancy.
    Condense,
    /// Rewrite in a formal register.
    Rewrite,
    /// Continue writing after the text.
    Continue,
    /// First user-defined button.
    Custom1,
    /// Second user-defined button.
    Custom2,
    /// Third user-defined button.
    Custom3,
    /// Instruction typed by the user for this operation only.
    CustomInput,
}

impl OperationKind {
    /// Every operation, in toolbar order.
    pub const ALL: [Self; 11] = [
        Self::Polish,
        Self::Translate,
        Self::Summarize,
        Self::Expand,
        Self::Condense,
        Self::Rewrite,
        Self::Continue,
        Self::Custom1,
        Self::Custom2,
        Self::Custom3,
        Self::CustomInput,
    ];

    /// Built-in instruction template; empty for user-defined operations.
    pub const fn default_prompt(self) -> &'static str {
        match self {
            Self::Polish => "Polish the following text so it reads more fluently and professionally. Strict requirements: 1. keep the original meaning; 2. output only the polished text, with no explanation or preamble; 3. do not add any extra content:",
            Self::Translate => "Translate the following text. Strict rules: 1. if the text is Chinese, translate it into English; 2. if the text is English or another language, translate it into Chinese; 3. output only the translation, never the source text; 4. keep the meaning and terminology accurate; 5. do not add any explanation, preamble or extra content:",
            Self::Summarize => "Extract the core points of the following text. Strict requirements: 1. summarize the key information in 3-5 sentences; 2. output only the summary; 3. do not add any explanation or extra content:",
            Self::Expand => "Expand on the following content. Strict rules: 1. add relevant detail and explanation; 2. make the content richer and more complete; 3. stay on topic; 4. output only the expanded content; 5. do not add any explanation or extra content:",
            Self::Condense => "Condense the following text. Strict rules: 1. remove redundant description and repetition; 2. keep the core points and key data; 3. output only the condensed content; 4. do not add any explanation or extra content:",
            Self::Rewrite => "Rewrite the following text. Strict rules: 1. use a formal written register suitable for academic or business settings; 2. keep the original meaning; 3. output only the rewritten content; 4. do not add any explanation or extra content:",
            Self::Continue => "Continue writing after the following text. Strict rules: 1. keep the style and topic consistent; 2. keep the logic coherent; 3. output only the continuation; 4. do not add any explanation or extra content:",
            Self::Custom1 | Self::Custom2 | Self::Custom3 | Self::CustomInput => "",
        }
    }

    /// Short label for UI surfaces.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Polish => "Polish",
            Self::Translate => "Translate",
            Self::Summarize => "Summarize",
            Self::Expand => "Expand",
            Self::Condense => "Condense",
            Self::Rewrite => "Rewrite",
            Self::Continue => "Continue",
            Self::Custom1 => "Custom 1",
            Self::Custom2 => "Custom 2",
            Self::Custom3 => "Custom 3",
            Self::CustomInput => "Custom instruction",
        }
    }

    /// Zero-based custom button slot for `Custom1..Custom3`.
    pub const fn custom_slot(self) -> Option<usize> {
        match self {
            Self::Custom1 => Some(0),
            Self::Custom2 => Some(1),
            Self::Custom3 => Some(2),
            _ => None,
        }
    }

    /// Stable identifier matching the serialized form.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Polish => "polish",
            Self::Translate => "translate",
            Self::Summarize => "summarize",
            Self::Expand => "expand",
            Self::Condense => "condense",
            Self::Rewrite => "rewrite",
            Self::Continue => "continue",
            Self::Custom1 => "custom1",
            Self::Custom2 => "custom2",
            Self::Custom3 => "custom3",
            Self::CustomInput => "customInput",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// State of one in-flight operation, from selection to apply or cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    /// Requested transformation.
    pub operation: OperationKind,
    /// Resolved instruction sent ahead of the text.
    pub instruction: String,
    /// Block the selection belongs to, when known.
    #[serde(default)]
    pub block_id: Option<String>,
    /// Backend answering this operation.
    pub backend_id: String,
    /// Block text at capture time.
    pub original_full_text: String,
    /// Raw selected text.
    pub selected_text: String,
    /// Character offsets of the selection, if anchored.
    #[serde(default)]
    pub selection_range: Option<OffsetRange>,
    /// Whether the AI output replaces the whole block.
    #[serde(default)]
    pub is_full_block_replace: bool,
    /// Text shown as the original side of the review.
    pub display_text: String,
}

impl OperationContext {
    /// Selection described by this context.
    pub fn selection(&self) -> Selection {
        Selection {
            selected_text: self.selected_text.clone(),
            block_full_text: self.original_full_text.clone(),
            range: self.selection_range,
            is_full_block_replace: self.is_full_block_replace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_names_match_ids() {
        for kind in OperationKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize kind");
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn custom_operations_have_no_builtin_prompt() {
        assert!(OperationKind::Custom2.default_prompt().is_empty());
        assert!(OperationKind::CustomInput.default_prompt().is_empty());
        assert!(!OperationKind::Polish.default_prompt().is_empty());
    }

    #[test]
    fn custom_slots() {
        assert_eq!(OperationKind::Custom1.custom_slot(), Some(0));
        assert_eq!(OperationKind::Custom3.custom_slot(), Some(2));
        assert_eq!(OperationKind::Translate.custom_slot(), None);
    }

    #[test]
    fn context_selection_carries_anchor() {
        let context = OperationContext {
            operation: OperationKind::Polish,
            instruction: "polish".into(),
            block_id: Some("block-1".into()),
            backend_id: "ollama-default".into(),
            original_full_text: "The quick fox jumps.".into(),
            selected_text: "quick".into(),
            selection_range: Some(OffsetRange::new(4, 9)),
            is_full_block_replace: false,
            display_text: "quick".into(),
        };
        let selection = context.selection();
        assert!(selection.is_anchored_in("The quick fox jumps."));
    }
}
