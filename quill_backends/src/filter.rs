//! Response normalization for reasoning models.

use std::sync::OnceLock;

use regex::Regex;

#[allow(clippy::expect_used)]
fn reasoning_blocks() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<think>.*?</think>|<thinking>.*?</thinking>|<reasoning>.*?</reasoning>")
            .expect("reasoning pattern is a valid literal")
    })
}

#[allow(clippy::expect_used)]
fn blank_line_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n{3,}").expect("blank line pattern is a valid literal"))
}

/// Strip `<think>`, `<thinking>` and `<reasoning>` blocks, collapse runs of
/// three or more newlines to two, and trim the result.
#[must_use]
pub fn strip_reasoning(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let without_reasoning = reasoning_blocks().replace_all(content, "");
    let collapsed = blank_line_runs().replace_all(&without_reasoning, "\n\n");
    collapsed.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::strip_reasoning;

    #[test]
    fn removes_think_blocks_across_lines() {
        let raw = "<think>\nweighing options\n</think>\n\nPolished sentence.";
        assert_eq!(strip_reasoning(raw), "Polished sentence.");
    }

    #[test]
    fn tags_are_case_insensitive() {
        let raw = "<THINKING>a</Thinking>kept<Reasoning>b</reasoning> text";
        assert_eq!(strip_reasoning(raw), "kept text");
    }

    #[test]
    fn collapses_blank_line_runs() {
        assert_eq!(strip_reasoning("one\n\n\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn leaves_unclosed_tags_alone() {
        assert_eq!(strip_reasoning("<think>never closed"), "<think>never closed");
    }

    #[test]
    fn multiple_blocks_are_non_greedy() {
        let raw = "<think>x</think>alpha <think>y</think>beta";
        assert_eq!(strip_reasoning(raw), "alpha beta");
    }
}
