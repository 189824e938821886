//! Structural model extracted from a Python source file.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::metrics::FileMetrics;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// How a parameter binds arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Declared before a `/` separator.
    PositionalOnly,
    /// Ordinary positional-or-keyword parameter.
    Regular,
    /// `*args`
    VarPositional,
    /// Declared after `*` or `*args`.
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::PositionalOnly => "positional_only",
            ParameterKind::Regular => "regular",
            ParameterKind::VarPositional => "var_positional",
            ParameterKind::KeywordOnly => "keyword_only",
            ParameterKind::VarKeyword => "var_keyword",
        }
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Bare name, without `*` or `**`.
    pub name: String,
    /// Annotation text, if annotated.
    pub annotation: Option<String>,
    pub kind: ParameterKind,
    /// Whether a default value is declared.
    pub has_default: bool,
}

impl Parameter {
    /// Name as it appears in a signature (`*args`, `**kwargs`).
    pub fn display_name(&self) -> String {
        match self.kind {
            ParameterKind::VarPositional => format!("*{}", self.name),
            ParameterKind::VarKeyword => format!("**{}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// Control flow counts for cyclomatic complexity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlFlowInfo {
    /// `if` and `elif` branches.
    pub if_count: usize,
    /// `for` and `while` loops.
    pub loop_count: usize,
    /// `case` clauses of `match` statements.
    pub case_count: usize,
    /// `except` clauses.
    pub except_count: usize,
    /// `with` statements.
    pub with_count: usize,
    /// Conditional expressions (`a if c else b`).
    pub ternary_count: usize,
    /// `and` / `or` operators.
    pub boolean_count: usize,
    /// List, set, dict comprehensions and generator expressions.
    pub comprehension_count: usize,
}

impl ControlFlowInfo {
    /// Calculate cyclomatic complexity.
    ///
    /// CC = 1 + decision_points
    pub fn cyclomatic_complexity(&self) -> u32 {
        let decision_points = self.if_count
            + self.loop_count
            + self.case_count
            + self.except_count
            + self.with_count
            + self.ternary_count
            + self.boolean_count
            + self.comprehension_count;

        1 + decision_points as u32
    }
}

/// One function or method definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    /// Bare function name. Not unique within a file.
    pub name: String,
    /// Dotted path through enclosing classes and functions (`Outer.method`).
    pub qualified_name: String,
    pub is_async: bool,
    /// Whether the direct parent scope is a class body.
    pub is_method: bool,
    pub has_documentation: bool,
    /// Cleaned docstring text, empty when undocumented.
    pub documentation_text: String,
    /// The docstring literal exactly as written, quotes included.
    pub docstring_literal: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    /// Decorator expressions in source order.
    pub decorators: Vec<String>,
    /// Line of the `def` keyword (1-based), never the decorator line.
    pub start_line: usize,
    /// Last line of the body (1-based, inclusive).
    pub end_line: usize,
    /// Leading whitespace width of the declaration line.
    pub indent_columns: usize,
    pub raised_exceptions: BTreeSet<String>,
    pub complexity: u32,
    pub span: Span,
}

impl FunctionRecord {
    /// Whether the name marks the function as private (`_helper`).
    ///
    /// Dunder methods are public.
    pub fn is_public(&self) -> bool {
        !self.name.starts_with('_') || self.is_magic()
    }

    /// Whether this is a dunder method such as `__len__`.
    pub fn is_magic(&self) -> bool {
        self.name.len() > 4 && self.name.starts_with("__") && self.name.ends_with("__")
    }

    /// Number of source lines spanned by the definition.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// One parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    pub path: PathBuf,
    /// Functions sorted by start line.
    pub functions: Vec<FunctionRecord>,
    /// Line and operator counts of the whole file.
    pub metrics: FileMetrics,
}

impl SourceUnit {
    pub fn new(path: impl AsRef<Path>, mut functions: Vec<FunctionRecord>) -> Self {
        functions.sort_by_key(|f| (f.start_line, f.span.start_byte));
        Self {
            path: path.as_ref().to_path_buf(),
            functions,
            metrics: FileMetrics::default(),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: FileMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sum of the cyclomatic complexity of every function.
    pub fn total_complexity(&self) -> u32 {
        self.functions.iter().map(|f| f.complexity).sum()
    }

    /// Number of documented functions.
    pub fn documented_count(&self) -> usize {
        self.functions.iter().filter(|f| f.has_documentation).count()
    }

    /// Functions lacking a docstring.
    pub fn undocumented(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions.iter().filter(|f| !f.has_documentation)
    }

    /// First function with the given bare or qualified name.
    pub fn find(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions
            .iter()
            .find(|f| f.qualified_name == name)
            .or_else(|| self.functions.iter().find(|f| f.name == name))
    }

    /// The function a selector picks: the Nth match in source order.
    pub fn select(&self, selector: &Selector) -> Option<&FunctionRecord> {
        self.functions
            .iter()
            .filter(|f| selector.matches(f))
            .nth(selector.index())
    }

    /// Selector naming `record` unambiguously within this unit.
    ///
    /// A property getter and its setter share a qualified name; the second
    /// one is `Class.prop#2`.
    pub fn selector_for(&self, record: &FunctionRecord) -> Selector {
        let earlier = self
            .functions
            .iter()
            .take_while(|f| f.span.start_byte != record.span.start_byte)
            .filter(|f| f.qualified_name == record.qualified_name)
            .count();
        Selector {
            name: record.qualified_name.clone(),
            occurrence: (earlier > 0).then_some(earlier + 1),
        }
    }
}

/// A function chosen by name: bare (`add`) or qualified (`Circle.area`),
/// optionally followed by `#N` for the Nth definition of that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub name: String,
    /// 1-based occurrence; `None` means the first.
    pub occurrence: Option<usize>,
}

impl Selector {
    /// Parse `name` or `name#N`. Returns `None` for an empty name or an
    /// occurrence that is not a positive integer.
    pub fn parse(text: &str) -> Option<Self> {
        let (name, occurrence) = match text.rsplit_once('#') {
            Some((name, n)) => (name, Some(n.parse::<usize>().ok().filter(|n| *n > 0)?)),
            None => (text, None),
        };
        let bare = name.rsplit('.').next().unwrap_or(name);
        if bare.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            occurrence,
        })
    }

    /// Last component of the name.
    pub fn bare_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Zero-based index among the matching definitions.
    pub fn index(&self) -> usize {
        self.occurrence.map_or(0, |n| n - 1)
    }

    /// Whether `record` carries this name (ignoring the occurrence).
    pub fn matches(&self, record: &FunctionRecord) -> bool {
        if self.name.contains('.') {
            record.qualified_name == self.name
        } else {
            record.name == self.name
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.occurrence {
            Some(n) => write!(f, "{}#{}", self.name, n),
            None => f.write_str(&self.name),
        }
    }
}
