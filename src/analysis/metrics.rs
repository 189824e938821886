//! Raw line counts and Halstead operator/operand counts of a parsed file.
//!
//! Every physical line falls in exactly one class:
//! - code: touched by a token outside a standalone string statement
//! - multi: inside a standalone string statement (docstrings and bare strings)
//! - single comment: holds only a comment
//! - blank: everything else
//!
//! so `loc == sloc + multi + single_comments + blank`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::analysis::ParsedFile;

/// Expression kinds whose unnamed children are operators and whose named
/// children are operands.
const OPERATOR_KINDS: &[&str] = &[
    "binary_operator",
    "boolean_operator",
    "comparison_operator",
    "unary_operator",
    "not_operator",
    "augmented_assignment",
];

/// Line counts of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    /// Physical lines.
    pub loc: usize,
    /// Logical lines: statements and definitions.
    pub lloc: usize,
    /// Lines holding code.
    pub sloc: usize,
    /// Comment tokens, inline ones included.
    pub comments: usize,
    /// Lines holding nothing but a comment.
    pub single_comments: usize,
    /// Lines of standalone string statements.
    pub multi: usize,
    pub blank: usize,
}

impl RawMetrics {
    /// Percentage of physical lines that are comments or docstrings.
    /// `None` for an empty file.
    pub fn comment_ratio(&self) -> Option<f64> {
        (self.loc > 0).then(|| (self.comments + self.multi) as f64 / self.loc as f64 * 100.0)
    }

    /// Comment and docstring lines as a percentage of code lines, the
    /// comment term of the maintainability index.
    pub fn comment_percent(&self) -> f64 {
        if self.sloc == 0 {
            0.0
        } else {
            (self.comments + self.multi) as f64 / self.sloc as f64 * 100.0
        }
    }
}

/// Halstead counts over the operator expressions of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Halstead {
    pub distinct_operators: usize,
    pub distinct_operands: usize,
    pub total_operators: usize,
    pub total_operands: usize,
}

impl Halstead {
    /// Program volume `N * log2(n)`, 0 when nothing was counted.
    pub fn volume(&self) -> f64 {
        let vocabulary = self.distinct_operators + self.distinct_operands;
        let length = self.total_operators + self.total_operands;
        if vocabulary == 0 {
            0.0
        } else {
            length as f64 * (vocabulary as f64).log2()
        }
    }
}

/// File-level measurements taken alongside function extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub raw: RawMetrics,
    pub halstead: Halstead,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Blank,
    Comment,
    Multi,
    Code,
}

impl LineClass {
    /// Code beats multi beats comment beats blank.
    fn rank(self) -> u8 {
        match self {
            LineClass::Blank => 0,
            LineClass::Comment => 1,
            LineClass::Multi => 2,
            LineClass::Code => 3,
        }
    }
}

struct Collector<'a> {
    parsed: &'a ParsedFile,
    lines: Vec<LineClass>,
    lloc: usize,
    comments: usize,
    operators: HashSet<String>,
    operands: HashSet<String>,
    total_operators: usize,
    total_operands: usize,
}

impl Collector<'_> {
    fn mark(&mut self, node: Node, class: LineClass) {
        let start = node.start_position().row;
        let end = node.end_position();
        // a node ending at column 0 finished on the previous line
        let last = if end.column == 0 && end.row > start {
            end.row - 1
        } else {
            end.row
        };
        for row in start..=last {
            if let Some(line) = self.lines.get_mut(row) {
                if class.rank() > line.rank() {
                    *line = class;
                }
            }
        }
    }

    fn visit(&mut self, node: Node) {
        let kind = node.kind();

        if kind == "comment" {
            self.comments += 1;
            self.mark(node, LineClass::Comment);
            return;
        }
        if kind.ends_with("_statement") || kind == "function_definition" || kind == "class_definition" {
            self.lloc += 1;
        }
        if is_string_statement(node) {
            self.mark(node, LineClass::Multi);
            return;
        }
        if OPERATOR_KINDS.contains(&kind) {
            self.count_operator(node);
        }
        if kind == "string" || node.child_count() == 0 {
            self.mark(node, LineClass::Code);
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn count_operator(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            let text = self.parsed.node_text(child).trim().to_string();
            if child.is_named() {
                self.total_operands += 1;
                self.operands.insert(text);
            } else {
                self.total_operators += 1;
                self.operators.insert(text);
            }
        }
    }
}

/// An expression statement made of a single string literal.
fn is_string_statement(node: Node) -> bool {
    node.kind() == "expression_statement"
        && node.named_child_count() == 1
        && node
            .named_child(0)
            .is_some_and(|c| matches!(c.kind(), "string" | "concatenated_string"))
}

/// Measure a parsed file.
pub fn measure(parsed: &ParsedFile) -> FileMetrics {
    let loc = parsed.source.lines().count();
    let mut collector = Collector {
        parsed,
        lines: vec![LineClass::Blank; loc],
        lloc: 0,
        comments: 0,
        operators: HashSet::new(),
        operands: HashSet::new(),
        total_operators: 0,
        total_operands: 0,
    };
    collector.visit(parsed.tree.root_node());

    let count = |class: LineClass| collector.lines.iter().filter(|l| **l == class).count();
    let raw = RawMetrics {
        loc,
        lloc: collector.lloc,
        sloc: count(LineClass::Code),
        comments: collector.comments,
        single_comments: count(LineClass::Comment),
        multi: count(LineClass::Multi),
        blank: count(LineClass::Blank),
    };
    let halstead = Halstead {
        distinct_operators: collector.operators.len(),
        distinct_operands: collector.operands.len(),
        total_operators: collector.total_operators,
        total_operands: collector.total_operands,
    };

    FileMetrics { raw, halstead }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PythonAnalyzer;
    use std::path::Path;

    fn metrics(source: &str) -> FileMetrics {
        let parsed = PythonAnalyzer::new()
            .unwrap()
            .parse(Path::new("m.py"), source)
            .unwrap();
        measure(&parsed)
    }

    const SAMPLE: &str = r#""""Module doc."""
# a comment

def f(x):
    """Add one.

    More.
    """
    y = x + 1  # inline
    return y
"#;

    #[test]
    fn test_raw_line_classes() {
        let raw = metrics(SAMPLE).raw;
        assert_eq!(raw.loc, 10);
        assert_eq!(raw.sloc, 3);
        assert_eq!(raw.multi, 5);
        assert_eq!(raw.single_comments, 1);
        assert_eq!(raw.comments, 2);
        assert_eq!(raw.blank, 1);
        assert_eq!(raw.loc, raw.sloc + raw.multi + raw.single_comments + raw.blank);
        // module docstring, def, function docstring, assignment, return
        assert_eq!(raw.lloc, 5);
        assert_eq!(raw.comment_ratio(), Some(70.0));
    }

    #[test]
    fn test_string_in_code_counts_as_code() {
        let raw = metrics("x = \"\"\"\ntext\n\"\"\"\n").raw;
        assert_eq!(raw.sloc, 3);
        assert_eq!(raw.multi, 0);
    }

    #[test]
    fn test_halstead_counts() {
        let halstead = metrics(SAMPLE).halstead;
        assert_eq!(halstead.distinct_operators, 1);
        assert_eq!(halstead.distinct_operands, 2);
        assert_eq!(halstead.total_operators + halstead.total_operands, 3);
        assert!((halstead.volume() - 3.0 * 3f64.log2()).abs() < 1e-9);

        let halstead = metrics("def f(a, b):\n    return a + b if a and not b else a - b\n").halstead;
        // +, and, not, -
        assert_eq!(halstead.distinct_operators, 4);
        assert_eq!(halstead.total_operators, 4);
    }

    #[test]
    fn test_empty_file() {
        let m = metrics("");
        assert_eq!(m.raw, RawMetrics::default());
        assert_eq!(m.raw.comment_ratio(), None);
        assert_eq!(m.halstead.volume(), 0.0);
    }
}
