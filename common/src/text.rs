//! Text helpers shared by the context stack display and the conversation log.

/// Collapses newlines to spaces and truncates to `max_chars`, appending an
/// ellipsis when truncated. Used for the one-line content preview in
/// `render-display` (spec §4.B) and for `,history` (SPEC_FULL §3).
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let truncated: String = collapsed.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// The ~120-char preview width spec §4.B calls for.
pub const STACK_PREVIEW_CHARS: usize = 120;
