//! Prompt construction for a single stage.

use crate::registry::StageDescriptor;
use crate::result::StageResult;

/// Maximum number of characters of each prior response quoted in a prompt.
pub const PRIOR_EXCERPT_CHARS: usize = 500;

/// Closing instruction appended to every prompt.
pub const CLOSING_INSTRUCTION: &str = "Be concise and actionable. Include file paths, line numbers, and concrete fixes where applicable.";

/// Truncate `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Render the instruction text sent to `stage`'s model.
///
/// `context` is embedded verbatim. When `prior` is non-empty each earlier
/// stage is summarized by role, model and a truncated excerpt of its
/// response, followed by an instruction not to repeat those findings.
pub fn build_prompt(stage: &StageDescriptor, context: &str, prior: &[StageResult]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "You are the {}. Your primary task: {}.\n\n",
        stage.role,
        stage.primary_task()
    ));

    out.push_str("## Problem context\n");
    out.push_str(context);
    out.push_str("\n\n");

    out.push_str("## Your tasks\n");
    for (i, task) in stage.tasks.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, task));
    }
    out.push('\n');

    if !prior.is_empty() {
        out.push_str("## Findings from earlier stages\n");
        for result in prior {
            let text = result.response_text();
            out.push_str(&format!(
                "- {} ({}): {}\n",
                result.role,
                result.model,
                truncate_chars(&text, PRIOR_EXCERPT_CHARS)
            ));
        }
        out.push_str(
            "\nDo not duplicate the findings above. Add only what your role contributes.\n\n",
        );
    }

    out.push_str(CLOSING_INSTRUCTION);
    out
}
