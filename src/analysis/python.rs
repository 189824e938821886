//! Python structural extractor using tree-sitter.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::docstring::{cleandoc, decode_literal};
use crate::analysis::expr::expression_text;
use crate::analysis::metrics;
use crate::analysis::{
    ControlFlowInfo, FunctionRecord, Parameter, ParameterKind, ParsedFile, SourceUnit, Span,
};
use crate::error::{Error, Result};

/// Matches every function definition, sync or async, at any depth.
const FUNCTION_QUERY: &str = r#"
(function_definition
  name: (identifier) @func_name
) @function
"#;

/// Shared analyzer; the grammar and query are loaded once per process.
static PYTHON_ANALYZER: OnceCell<PythonAnalyzer> = OnceCell::new();

/// Get the process-wide analyzer, loading it on first use.
pub fn python_analyzer() -> Result<&'static PythonAnalyzer> {
    PYTHON_ANALYZER.get_or_try_init(PythonAnalyzer::new)
}

/// Builds [`SourceUnit`]s from Python source text.
pub struct PythonAnalyzer {
    language: Language,
    function_query: Query,
}

/// An existing docstring found at the top of a function body.
struct FoundDocstring {
    literal: String,
    text: String,
}

impl PythonAnalyzer {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let function_query =
            Query::new(&language, FUNCTION_QUERY).map_err(|e| Error::Grammar(e.to_string()))?;
        Ok(Self {
            language,
            function_query,
        })
    }

    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| Error::Grammar(e.to_string()))?;
        Ok(parser)
    }

    /// Parse source text without rejecting syntax errors.
    pub fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::Grammar("parser returned no tree".to_string()))?;
        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// Parse and extract, failing with [`Error::Syntax`] on broken input.
    pub fn analyze_source(&self, path: &Path, source: &str) -> Result<SourceUnit> {
        let parsed = self.parse(path, source)?;
        parsed.ensure_valid()?;
        Ok(self.extract(&parsed))
    }

    /// Decode raw bytes as UTF-8 and analyze them.
    pub fn analyze_bytes(&self, path: &Path, bytes: &[u8]) -> Result<SourceUnit> {
        let source = std::str::from_utf8(bytes).map_err(|_| Error::Encoding {
            path: path.to_path_buf(),
        })?;
        self.analyze_source(path, source)
    }

    /// Emit one record per function definition in the tree.
    pub fn extract(&self, parsed: &ParsedFile) -> SourceUnit {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(
            &self.function_query,
            parsed.tree.root_node(),
            parsed.source.as_bytes(),
        );

        let mut functions = Vec::new();
        let mut seen = HashSet::new();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = self.function_query.capture_names()[capture.index as usize];
                if capture_name != "function" {
                    continue;
                }
                if seen.insert(capture.node.start_byte()) {
                    functions.push(self.extract_function(parsed, capture.node));
                }
            }
        }

        SourceUnit::new(&parsed.path, functions).with_metrics(metrics::measure(parsed))
    }

    fn extract_function(&self, parsed: &ParsedFile, node: Node) -> FunctionRecord {
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(n).to_string())
            .unwrap_or_default();

        let (scope, is_method) = enclosing_scopes(parsed, node);
        let qualified_name = if scope.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", scope.join("."), name)
        };

        let body = node.child_by_field_name("body");
        let docstring = body.and_then(|b| find_docstring(parsed, b));
        let (has_documentation, documentation_text, docstring_literal) = match docstring {
            Some(doc) => (!doc.text.trim().is_empty(), doc.text, Some(doc.literal)),
            None => (false, String::new(), None),
        };

        let mut raised = BTreeSet::new();
        let mut control_flow = ControlFlowInfo::default();
        if let Some(body) = body {
            collect_body_facts(parsed, body, &mut raised, &mut control_flow);
        }

        let start = node.start_position();
        let end = node.end_position();
        // a node ending at column 0 finished on the previous line
        let end_line = if end.column == 0 && end.row > start.row {
            end.row
        } else {
            end.row + 1
        };

        FunctionRecord {
            name,
            qualified_name,
            is_async: is_async(node),
            is_method,
            has_documentation,
            documentation_text,
            docstring_literal,
            parameters: node
                .child_by_field_name("parameters")
                .map(|p| extract_parameters(parsed, p))
                .unwrap_or_default(),
            return_type: node
                .child_by_field_name("return_type")
                .map(|n| expression_text(n, &parsed.source)),
            decorators: extract_decorators(parsed, node),
            start_line: start.row + 1,
            end_line,
            indent_columns: leading_whitespace(parsed.line(start.row)),
            raised_exceptions: raised,
            complexity: control_flow.cyclomatic_complexity(),
            span: Span::from_node(node),
        }
    }
}

fn is_async(node: Node) -> bool {
    node.child(0).is_some_and(|c| c.kind() == "async")
}

/// Names of enclosing classes and functions, outermost first, and whether the
/// innermost one is a class.
fn enclosing_scopes(parsed: &ParsedFile, node: Node) -> (Vec<String>, bool) {
    let mut names = Vec::new();
    let mut direct_parent_is_class = None;
    let mut current = node.parent();

    while let Some(n) = current {
        if matches!(n.kind(), "class_definition" | "function_definition") {
            if direct_parent_is_class.is_none() {
                direct_parent_is_class = Some(n.kind() == "class_definition");
            }
            if let Some(name) = n.child_by_field_name("name") {
                names.push(parsed.node_text(name).to_string());
            }
        }
        current = n.parent();
    }

    names.reverse();
    (names, direct_parent_is_class.unwrap_or(false))
}

fn extract_decorators(parsed: &ParsedFile, node: Node) -> Vec<String> {
    let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };
    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .filter_map(|d| d.named_children(&mut d.walk()).find(|c| c.kind() != "comment"))
        .map(|expr| expression_text(expr, &parsed.source))
        .collect()
}

fn extract_parameters(parsed: &ParsedFile, params: Node) -> Vec<Parameter> {
    let mut out: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;
    let mut cursor = params.walk();

    for child in params.named_children(&mut cursor) {
        let regular = if keyword_only {
            ParameterKind::KeywordOnly
        } else {
            ParameterKind::Regular
        };
        let annotation = child
            .child_by_field_name("type")
            .map(|t| expression_text(t, &parsed.source));

        match child.kind() {
            "identifier" => out.push(Parameter {
                name: parsed.node_text(child).to_string(),
                annotation: None,
                kind: regular,
                has_default: false,
            }),
            "default_parameter" | "typed_default_parameter" => out.push(Parameter {
                name: child
                    .child_by_field_name("name")
                    .map(|n| parsed.node_text(n).to_string())
                    .unwrap_or_default(),
                annotation,
                kind: regular,
                has_default: true,
            }),
            "typed_parameter" => {
                // `x: int`, `*args: int` or `**kw: int`
                let Some(target) = child.named_child(0) else {
                    continue;
                };
                let (name, kind) = splat_or_plain(parsed, target, regular);
                if kind == ParameterKind::VarPositional {
                    keyword_only = true;
                }
                out.push(Parameter {
                    name,
                    annotation,
                    kind,
                    has_default: false,
                });
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                let (name, kind) = splat_or_plain(parsed, child, regular);
                if kind == ParameterKind::VarPositional {
                    keyword_only = true;
                }
                out.push(Parameter {
                    name,
                    annotation: None,
                    kind,
                    has_default: false,
                });
            }
            "keyword_separator" => keyword_only = true,
            "positional_separator" => {
                for p in out.iter_mut() {
                    if p.kind == ParameterKind::Regular {
                        p.kind = ParameterKind::PositionalOnly;
                    }
                }
            }
            "tuple_pattern" => out.push(Parameter {
                name: parsed.node_text(child).to_string(),
                annotation: None,
                kind: regular,
                has_default: false,
            }),
            _ => {}
        }
    }

    out
}

fn splat_or_plain(
    parsed: &ParsedFile,
    node: Node,
    regular: ParameterKind,
) -> (String, ParameterKind) {
    let kind = match node.kind() {
        "list_splat_pattern" => ParameterKind::VarPositional,
        "dictionary_splat_pattern" => ParameterKind::VarKeyword,
        _ => return (parsed.node_text(node).to_string(), regular),
    };
    let name = parsed
        .node_text(node)
        .trim_start_matches('*')
        .trim()
        .to_string();
    (name, kind)
}

/// The docstring is the first statement of the body when it is a bare string
/// expression. Comments before it do not count as statements.
fn find_docstring(parsed: &ParsedFile, body: Node) -> Option<FoundDocstring> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let literal = first.named_child(0)?;

    let text = match literal.kind() {
        "string" => decode_literal(parsed.node_text(literal))?,
        "concatenated_string" => {
            let mut joined = String::new();
            let mut parts = literal.walk();
            for part in literal.named_children(&mut parts) {
                if part.kind() == "string" {
                    joined.push_str(&decode_literal(parsed.node_text(part))?);
                }
            }
            joined
        }
        _ => return None,
    };

    Some(FoundDocstring {
        literal: parsed.node_text(literal).to_string(),
        text: cleandoc(&text),
    })
}

/// Walk a function body collecting raised names and decision points, without
/// descending into nested function definitions.
fn collect_body_facts(
    parsed: &ParsedFile,
    node: Node,
    raised: &mut BTreeSet<String>,
    cf: &mut ControlFlowInfo,
) {
    match node.kind() {
        "function_definition" => return,
        "if_statement" | "elif_clause" => cf.if_count += 1,
        "for_statement" | "while_statement" => cf.loop_count += 1,
        "case_clause" => cf.case_count += 1,
        "except_clause" | "except_group_clause" => cf.except_count += 1,
        "with_statement" => cf.with_count += 1,
        "conditional_expression" => cf.ternary_count += 1,
        "boolean_operator" => cf.boolean_count += 1,
        "list_comprehension"
        | "set_comprehension"
        | "dictionary_comprehension"
        | "generator_expression" => cf.comprehension_count += 1,
        "raise_statement" => {
            if let Some(name) = raised_name(parsed, node) {
                raised.insert(name);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_body_facts(parsed, child, raised, cf);
    }
}

/// `raise Name`, `raise Name(...)` and their dotted forms yield the name.
/// Bare `raise` and other expressions yield nothing.
fn raised_name(parsed: &ParsedFile, raise: Node) -> Option<String> {
    let mut cursor = raise.walk();
    let target = raise
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    let callee = match target.kind() {
        "call" => target.child_by_field_name("function")?,
        _ => target,
    };
    match callee.kind() {
        "identifier" | "attribute" => Some(expression_text(callee, &parsed.source)),
        _ => None,
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}
