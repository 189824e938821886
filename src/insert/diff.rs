//! Unified diff of a single-span edit.
//!
//! The planner changes one contiguous run of lines, so the common prefix and
//! suffix of the two texts bound the only hunk.

/// Lines of unchanged context around the hunk.
pub const DEFAULT_CONTEXT: usize = 3;

/// Render the change from `old` to `new` as a unified diff with one hunk.
/// Returns an empty string when the texts are equal.
pub fn unified_diff(label: &str, old: &str, new: &str, context: usize) -> String {
    let before: Vec<&str> = old.split_inclusive('\n').collect();
    let after: Vec<&str> = new.split_inclusive('\n').collect();

    let prefix = before
        .iter()
        .zip(&after)
        .take_while(|(a, b)| a == b)
        .count();
    if prefix == before.len() && prefix == after.len() {
        return String::new();
    }
    let suffix = before
        .iter()
        .rev()
        .zip(after.iter().rev())
        .take(before.len().min(after.len()) - prefix)
        .take_while(|(a, b)| a == b)
        .count();

    let start = prefix.saturating_sub(context);
    let old_changed = before.len() - suffix;
    let new_changed = after.len() - suffix;
    let old_end = (old_changed + context).min(before.len());
    let new_end = (new_changed + context).min(after.len());

    let mut out = format!("--- a/{label}\n+++ b/{label}\n");
    out.push_str(&format!(
        "@@ -{} +{} @@\n",
        hunk_range(start, old_end),
        hunk_range(start, new_end)
    ));
    push_lines(&mut out, ' ', &before[start..prefix]);
    push_lines(&mut out, '-', &before[prefix..old_changed]);
    push_lines(&mut out, '+', &after[prefix..new_changed]);
    push_lines(&mut out, ' ', &before[old_changed..old_end]);
    out
}

fn hunk_range(start: usize, end: usize) -> String {
    match end - start {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        len => format!("{},{}", start + 1, len),
    }
}

fn push_lines(out: &mut String, tag: char, lines: &[&str]) {
    for line in lines {
        out.push(tag);
        out.push_str(line.trim_end_matches(['\r', '\n']));
        out.push('\n');
    }
}
