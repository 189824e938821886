//! Rendering documentation text as an indented docstring block.

use crate::analysis::cleandoc;

/// Strip quote markers a caller may have wrapped around the text.
fn strip_markers(text: &str) -> &str {
    let trimmed = text.trim();
    let unprefixed = trimmed
        .strip_prefix(['r', 'R'])
        .filter(|rest| rest.starts_with("\"\"\"") || rest.starts_with("'''"))
        .unwrap_or(trimmed);
    for marker in ["\"\"\"", "'''"] {
        if unprefixed.len() >= 2 * marker.len() {
            if let Some(inner) = unprefixed
                .strip_prefix(marker)
                .and_then(|rest| rest.strip_suffix(marker))
            {
                return inner;
            }
        }
    }
    trimmed
}

/// Normalize caller text: markers removed, dedented, outer blank lines dropped.
pub fn normalize_text(text: &str) -> String {
    let cleaned = cleandoc(strip_markers(text));
    cleaned
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape the text for a `"""` literal. Returns the string prefix to use.
fn escape(text: &str, single_line: bool) -> (&'static str, String) {
    let has_quotes = text.contains("\"\"\"") || (single_line && text.ends_with('"'));
    let trailing_backslash = single_line && text.ends_with('\\');
    if text.contains('\\') && !has_quotes && !trailing_backslash {
        return ("r", text.to_string());
    }

    let escaped = text.replace('\\', "\\\\");
    let count = escaped.chars().count();
    let mut body = String::with_capacity(escaped.len());
    // consecutive unescaped quotes; a third one would close the literal
    let mut run = 0;
    for (i, c) in escaped.chars().enumerate() {
        if c != '"' {
            body.push(c);
            run = 0;
        } else if run == 2 || (single_line && i + 1 == count) {
            body.push_str("\\\"");
            run = 0;
        } else {
            body.push('"');
            run += 1;
        }
    }
    ("", body)
}

/// Render normalized text as docstring lines (without terminators).
///
/// One line of text becomes `"""text"""`. Longer text gets the opening and
/// closing markers on their own lines. Blank lines stay empty.
pub fn render_block(text: &str, indent: &str) -> Vec<String> {
    let single_line = !text.contains('\n');
    let (prefix, body) = escape(text, single_line);

    if single_line {
        return vec![format!("{indent}{prefix}\"\"\"{body}\"\"\"")];
    }

    let mut lines = Vec::new();
    lines.push(format!("{indent}{prefix}\"\"\""));
    for line in body.lines() {
        if line.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("{indent}{line}"));
        }
    }
    lines.push(format!("{indent}\"\"\""));
    lines
}
