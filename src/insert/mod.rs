//! Line-oriented docstring insertion.
//!
//! The planner splices a docstring block into the raw text of a file and
//! leaves every other line byte-for-byte intact:
//!
//! 1. Find the `def NAME` / `async def NAME` line by text search, anchored so
//!    the name is not the prefix of a longer identifier.
//! 2. Skip blank lines and placeholder comments after the header.
//! 3. Replace an existing docstring found there, or insert a new one.
//! 4. Re-parse the result and require the target to be documented before
//!    anything is written.

mod block;
mod diff;
mod write;

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use tree_sitter::Node;

use crate::analysis::{python_analyzer, FunctionRecord, ParsedFile, PythonAnalyzer, Selector};
use crate::error::{Error, Result};

pub use block::{normalize_text, render_block};
pub use diff::{unified_diff, DEFAULT_CONTEXT};
pub use write::{backup_path, write_atomic};

/// Comment vocabulary marking a placeholder for missing documentation.
const PLACEHOLDER_WORDS: &[&str] = &["docstring", "missing", "ai will generate"];

/// Longest docstring, in lines past its opening line, that is replaced.
const DOCSTRING_LOOKAHEAD: usize = 100;

/// Width of one indentation level added below the declaration.
const INDENT_UNIT: &str = "    ";

/// Summary of a planned edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertionPlan {
    /// Target as requested (bare or qualified).
    pub function: String,
    /// Line of the `def` keyword (1-based).
    pub declaration_line: usize,
    /// Line holding the `:` that ends the header (1-based).
    pub header_end_line: usize,
    /// Lines of the docstring that was replaced (1-based, inclusive).
    pub replaced_lines: Option<(usize, usize)>,
    /// Placeholder comments dropped.
    pub placeholders_removed: usize,
    /// Whether a body written on the header line was moved below the block.
    pub inline_body_moved: bool,
    /// Lines in the new docstring block.
    pub block_lines: usize,
}

impl InsertionPlan {
    /// Whether an existing docstring was replaced.
    pub fn replaced_existing(&self) -> bool {
        self.replaced_lines.is_some()
    }
}

/// A planned edit: the full new text and what changed.
#[derive(Debug, Clone)]
pub struct Insertion {
    pub text: String,
    pub plan: InsertionPlan,
}

/// Options for [`apply_docstring`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Copy the original to `<file>.bak` before rewriting.
    pub backup: bool,
    /// Plan and verify only, never write.
    pub dry_run: bool,
}

/// Result of [`apply_docstring`].
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub path: PathBuf,
    pub plan: InsertionPlan,
    /// Whether the file content differs from before. False for repeated
    /// applications of the same text and for dry runs.
    pub changed: bool,
    pub backup: Option<PathBuf>,
    /// The new file text.
    pub text: String,
}

/// Plan an insertion into source text without touching the filesystem.
pub fn plan_insertion(source: &str, target: &str, text: &str) -> Result<Insertion> {
    plan_with(python_analyzer()?, Path::new("<source>"), source, target, text)
}

/// Insert or replace the docstring of `target` in the file at `path`.
///
/// `target` is a bare name (first match in source order) or a qualified name
/// such as `Class.method`, optionally suffixed with `#N` to pick the Nth
/// definition of that name (`Class.prop#2` for a property setter). The file is only written after the new text has
/// been parsed and the target found documented in it.
pub fn apply_docstring(
    path: &Path,
    target: &str,
    text: &str,
    options: &ApplyOptions,
) -> Result<ApplyOutcome> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let source = String::from_utf8(bytes).map_err(|_| Error::Encoding {
        path: path.to_path_buf(),
    })?;

    let insertion = plan_with(python_analyzer()?, path, &source, target, text)?;
    let changed = insertion.text != source;

    let mut backup = None;
    if changed && !options.dry_run {
        if options.backup {
            let bak = backup_path(path);
            fs::copy(path, &bak).map_err(|e| Error::io(&bak, e))?;
            backup = Some(bak);
        }
        write_atomic(path, insertion.text.as_bytes())?;
        info!(
            path = %path.display(),
            function = target,
            line = insertion.plan.declaration_line,
            replaced = insertion.plan.replaced_existing(),
            "applied docstring"
        );
    } else if !changed {
        debug!(path = %path.display(), function = target, "docstring already up to date");
    }

    Ok(ApplyOutcome {
        path: path.to_path_buf(),
        plan: insertion.plan,
        changed: changed && !options.dry_run,
        backup,
        text: insertion.text,
    })
}

fn plan_with(
    analyzer: &PythonAnalyzer,
    path: &Path,
    source: &str,
    target: &str,
    text: &str,
) -> Result<Insertion> {
    let parsed = analyzer.parse(path, source)?;
    parsed.ensure_valid()?;
    let unit = analyzer.extract(&parsed);

    let not_found = || Error::NotFound {
        path: path.to_path_buf(),
        function: target.to_string(),
    };

    let selector = Selector::parse(target).ok_or_else(not_found)?;
    let pattern = format!(
        r"^[ \t]*(?:async[ \t]+)?def[ \t]+{}(?:\W|$)",
        regex::escape(selector.bare_name())
    );
    let declaration = Regex::new(&pattern).map_err(|_| not_found())?;

    let lines: Vec<&str> = source.split_inclusive('\n').collect();

    // textual matches that are real definitions of the target, in source order
    let record = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| declaration.is_match(line))
        .filter_map(|(row, _)| {
            unit.functions
                .iter()
                .find(|f| f.start_line == row + 1 && selector.matches(f))
        })
        .nth(selector.index())
        .ok_or_else(not_found)?;

    let node = function_node(&parsed, record).ok_or_else(not_found)?;
    let normalized = normalize_text(text);
    if normalized.trim().is_empty() {
        return Err(Error::Corruption {
            path: path.to_path_buf(),
            function: target.to_string(),
            reason: "documentation text is empty".to_string(),
        });
    }

    let insertion = splice(&lines, record, node, target, &normalized);
    verify(analyzer, path, &insertion, target)?;
    Ok(insertion)
}

/// The `function_definition` node starting at the record's span.
fn function_node<'t>(parsed: &'t ParsedFile, record: &FunctionRecord) -> Option<Node<'t>> {
    let start = record.span.start_byte;
    let mut node = parsed
        .tree
        .root_node()
        .descendant_for_byte_range(start, start)?;
    loop {
        if node.kind() == "function_definition" && node.start_byte() == start {
            return Some(node);
        }
        node = node.parent()?;
    }
}

fn splice(
    lines: &[&str],
    record: &FunctionRecord,
    node: Node,
    target: &str,
    text: &str,
) -> Insertion {
    let decl_row = record.start_line - 1;
    let decl_line = lines[decl_row];
    let newline = if decl_line.ends_with("\r\n") { "\r\n" } else { "\n" };
    let decl_indent = leading_whitespace(decl_line);

    let mut walker = node.walk();
    let colon = node.children(&mut walker).filter(|c| c.kind() == ":").last();
    let header_row = colon.map(|c| c.start_position().row).unwrap_or(decl_row);
    let body = node.child_by_field_name("body");
    let inline = body.is_some_and(|b| b.start_position().row == header_row);

    let body_indent = body
        .and_then(first_statement)
        .filter(|_| !inline)
        .map(|stmt| leading_whitespace(lines[stmt.start_position().row]))
        .filter(|indent| indent.len() > decl_indent.len() && indent.starts_with(decl_indent))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{decl_indent}{INDENT_UNIT}"));

    let block: Vec<String> = render_block(text, &body_indent)
        .into_iter()
        .map(|line| line + newline)
        .collect();

    let mut out: Vec<String> = lines[..header_row].iter().map(|l| l.to_string()).collect();
    let mut plan = InsertionPlan {
        function: target.to_string(),
        declaration_line: decl_row + 1,
        header_end_line: header_row + 1,
        replaced_lines: None,
        placeholders_removed: 0,
        inline_body_moved: false,
        block_lines: block.len(),
    };

    if inline {
        // `def f(x): return x` keeps the header up to the colon
        let header = lines[header_row];
        let split = colon.map(|c| c.end_byte() - line_start_byte(lines, header_row));
        let (head, rest) = header.split_at(split.unwrap_or(header.len()).min(header.len()));
        out.push(format!("{}{newline}", head.trim_end()));
        out.extend(block);

        let mut rest = rest.trim();
        if let Some(literal) = &record.docstring_literal {
            if let Some(after) = rest.strip_prefix(literal.as_str()) {
                plan.replaced_lines = Some((header_row + 1, header_row + 1));
                rest = after.trim_start().trim_start_matches(';').trim();
            }
        }
        if !rest.is_empty() {
            out.push(format!("{body_indent}{rest}{newline}"));
            plan.inline_body_moved = true;
        }
        out.extend(lines[header_row + 1..].iter().map(|l| l.to_string()));
        debug!(function = target, "moved one-line body below docstring");
        return Insertion {
            text: out.concat(),
            plan,
        };
    }

    out.push(lines[header_row].to_string());

    // skip blanks and placeholders; `cursor` is the first other line
    let mut idx = header_row + 1;
    while idx < lines.len() {
        let trimmed = lines[idx].trim();
        if trimmed.is_empty() {
            idx += 1;
        } else if is_placeholder(trimmed) {
            plan.placeholders_removed += 1;
            idx += 1;
        } else {
            break;
        }
    }
    let cursor = idx;

    // an existing docstring may sit below ordinary comments
    let existing = body
        .and_then(first_statement)
        .filter(|_| record.docstring_literal.is_some())
        .map(|stmt| (stmt.start_position().row, stmt.end_position()))
        .filter(|(start, end)| *start >= cursor && end.row - start < DOCSTRING_LOOKAHEAD);

    out.extend(block);
    match existing {
        Some((doc_row, end)) => {
            plan.replaced_lines = Some((doc_row + 1, end.row + 1));
            // comments between the header and the old docstring stay, below
            out.extend(
                lines[cursor..doc_row]
                    .iter()
                    .filter(|l| !is_placeholder(l.trim()))
                    .map(|l| l.to_string()),
            );
            plan.placeholders_removed += lines[cursor..doc_row]
                .iter()
                .filter(|l| is_placeholder(l.trim()))
                .count();

            // code sharing the closing line (`"""Old."""; x = 1`) is kept
            let closing = lines[end.row];
            let rest = closing
                .get(end.column..)
                .unwrap_or("")
                .trim()
                .trim_start_matches(';')
                .trim();
            if !rest.is_empty() {
                out.push(format!("{body_indent}{rest}{newline}"));
            }
            out.extend(lines[end.row + 1..].iter().map(|l| l.to_string()));
        }
        None => {
            out.extend(lines[cursor..].iter().map(|l| l.to_string()));
        }
    }

    debug!(
        function = target,
        cursor = cursor + 1,
        replaced = ?plan.replaced_lines,
        placeholders = plan.placeholders_removed,
        "planned docstring splice"
    );

    Insertion {
        text: out.concat(),
        plan,
    }
}

fn first_statement(body: Node) -> Option<Node> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    first
}

fn is_placeholder(trimmed: &str) -> bool {
    if !trimmed.starts_with('#') {
        return false;
    }
    let lower = trimmed.to_lowercase();
    PLACEHOLDER_WORDS.iter().any(|w| lower.contains(w))
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

fn line_start_byte(lines: &[&str], row: usize) -> usize {
    lines[..row].iter().map(|l| l.len()).sum()
}

/// Parse the planned text and require the target to be documented in it.
fn verify(
    analyzer: &PythonAnalyzer,
    path: &Path,
    insertion: &Insertion,
    target: &str,
) -> Result<()> {
    let corruption = |reason: String| Error::Corruption {
        path: path.to_path_buf(),
        function: target.to_string(),
        reason,
    };

    let parsed = analyzer.parse(path, &insertion.text)?;
    if let Err(Error::Syntax { line, column, .. }) = parsed.ensure_valid() {
        return Err(corruption(format!(
            "result does not parse (line {line}, column {column})"
        )));
    }

    let unit = analyzer.extract(&parsed);
    let documented = unit
        .functions
        .iter()
        .find(|f| f.start_line == insertion.plan.declaration_line)
        .is_some_and(|f| f.has_documentation);
    if !documented {
        return Err(corruption("docstring not recognised after the edit".to_string()));
    }
    Ok(())
}
