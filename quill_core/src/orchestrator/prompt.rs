//! Chat messages sent for operations and refinements.

use quill_backend_api::ChatMessage;

/// System message for every operation.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful writing assistant. Respond only with the processed text, no explanations. Preserve the original paragraph and line formatting.";

/// System message for refinement rounds.
pub const REFINEMENT_SYSTEM_INSTRUCTION: &str = "You are a professional writing assistant. Using the original instruction, the original text and the current revision, produce improved text that satisfies the user's request. Output only the resulting text, with no explanation. Preserve the original paragraph and line formatting.";

const NO_INSTRUCTION: &str = "(no specific instruction)";

/// Messages for a first-round operation: the instruction followed by the text.
#[must_use]
pub fn operation_messages(instruction: &str, text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(format!("{instruction}\n\n{text}")),
    ]
}

/// Messages asking the backend to improve `current` according to `refinement`.
#[must_use]
pub fn refinement_messages(
    instruction: &str,
    original: &str,
    current: &str,
    refinement: &str,
) -> Vec<ChatMessage> {
    let instruction = if instruction.trim().is_empty() {
        NO_INSTRUCTION
    } else {
        instruction
    };
    let body = format!(
        "[Original instruction] (the prompt that started this operation)\n{instruction}\n\n\
         [Original text]\n{original}\n\n\
         [Current version] (the previous result, which the user wants improved)\n{current}\n\n\
         [Refinement request]\n{refinement}\n\n\
         Combine the original instruction, the original text and the current version, and \
         produce better text that meets the refinement request. Output the text directly."
    );
    vec![
        ChatMessage::system(REFINEMENT_SYSTEM_INSTRUCTION),
        ChatMessage::user(body),
    ]
}
