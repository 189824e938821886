//! Canonical text for annotation and decorator expressions.

use tree_sitter::Node;

/// Node kinds rendered from their raw text without descending into them.
const ATOMIC_KINDS: &[&str] = &["string", "concatenated_string", "integer", "float"];

/// Render an expression node as normalized source text.
///
/// Identifiers are returned as written. Compound expressions are rebuilt from
/// their tokens with single spaces after commas, none inside brackets,
/// `a | b` for unions and `k=v` for keyword arguments. Nodes containing parse
/// errors fall back to their raw text with whitespace collapsed, and to the
/// node kind if even that is unavailable.
pub fn expression_text(node: Node, source: &str) -> String {
    if node.kind() == "type" && node.named_child_count() == 1 {
        if let Some(inner) = node.named_child(0) {
            return expression_text(inner, source);
        }
    }

    if !node.has_error() {
        let mut tokens = Vec::new();
        collect_tokens(node, source, &mut tokens);
        if !tokens.is_empty() {
            return join_tokens(&tokens);
        }
    }

    match node.utf8_text(source.as_bytes()) {
        Ok(raw) if !raw.trim().is_empty() => collapse_whitespace(raw),
        _ => node.kind().to_string(),
    }
}

#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    parent: &'static str,
}

fn collect_tokens<'a>(node: Node, source: &'a str, out: &mut Vec<Token<'a>>) {
    if node.kind() == "comment" {
        return;
    }
    if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
        if let Ok(text) = node.utf8_text(source.as_bytes()) {
            if !text.is_empty() {
                let parent = node.parent().map(|p| p.kind()).unwrap_or("");
                out.push(Token { text, parent });
            }
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, source, out);
    }
}

fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && needs_space(&tokens[i - 1], token) {
            out.push(' ');
        }
        if token.text.contains('\n') {
            out.push_str(&collapse_whitespace(token.text));
        } else {
            out.push_str(token.text);
        }
    }
    out
}

fn needs_space(prev: &Token, next: &Token) -> bool {
    if matches!(next.text, "," | ")" | "]" | "}" | ":" | ".") {
        return false;
    }
    if matches!(prev.text, "(" | "[" | "{" | ".") {
        return false;
    }
    if matches!(next.text, "(" | "[") {
        // call or subscript directly follows its target
        return is_operator(prev.text);
    }
    if next.text == "=" && next.parent == "keyword_argument"
        || prev.text == "=" && prev.parent == "keyword_argument"
    {
        return false;
    }
    if matches!(prev.text, "-" | "+" | "~") && prev.parent == "unary_operator" {
        return false;
    }
    if matches!(prev.text, "*" | "**")
        && matches!(prev.parent, "list_splat" | "dictionary_splat")
    {
        return false;
    }
    if prev.text == ":" && prev.parent == "slice" || next.parent == "slice" && next.text == ":" {
        return false;
    }
    true
}

fn is_operator(text: &str) -> bool {
    matches!(
        text,
        "," | ":"
            | "="
            | "|"
            | "&"
            | "^"
            | "+"
            | "-"
            | "*"
            | "/"
            | "%"
            | "**"
            | "//"
            | "<"
            | ">"
            | "=="
            | "!="
            | "<="
            | ">="
            | "and"
            | "or"
            | "not"
            | "in"
            | "is"
            | "if"
            | "else"
            | "lambda"
            | "await"
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
