//! PEP 257 docstring checks and style detection.
//!
//! Works on the structural model only; no source re-parsing. Checks cover
//! a subset of the pydocstyle codes:
//!
//! - D102, D103, D105, D107: missing docstring in a public definition
//! - D200, D205, D210, D300: layout of the literal
//! - D400, D401, D403, D404: summary line wording
//! - D419: docstring present but empty

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::{FunctionRecord, SourceUnit};
use crate::generate::DocStyle;

lazy_static! {
    /// String prefix and opening quotes of a literal.
    static ref LITERAL_OPEN: Regex = Regex::new(r#"^(?i:[rub]{0,2})("""|'''|"|')"#).unwrap();
}

/// Minimum length of a docstring counted as complete.
pub const MIN_COMPLETE_LENGTH: usize = 10;

/// PEP 257 rule codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    #[serde(rename = "D102")]
    MissingMethod,
    #[serde(rename = "D103")]
    MissingFunction,
    #[serde(rename = "D105")]
    MissingMagic,
    #[serde(rename = "D107")]
    MissingInit,
    #[serde(rename = "D200")]
    OneLinerSpansLines,
    #[serde(rename = "D205")]
    NoBlankAfterSummary,
    #[serde(rename = "D210")]
    SurroundingWhitespace,
    #[serde(rename = "D300")]
    NotTripleDouble,
    #[serde(rename = "D400")]
    NoPeriod,
    #[serde(rename = "D401")]
    NotImperative,
    #[serde(rename = "D403")]
    NotCapitalized,
    #[serde(rename = "D404")]
    StartsWithThis,
    #[serde(rename = "D419")]
    Empty,
}

impl Rule {
    pub fn code(&self) -> &'static str {
        match self {
            Rule::MissingMethod => "D102",
            Rule::MissingFunction => "D103",
            Rule::MissingMagic => "D105",
            Rule::MissingInit => "D107",
            Rule::OneLinerSpansLines => "D200",
            Rule::NoBlankAfterSummary => "D205",
            Rule::SurroundingWhitespace => "D210",
            Rule::NotTripleDouble => "D300",
            Rule::NoPeriod => "D400",
            Rule::NotImperative => "D401",
            Rule::NotCapitalized => "D403",
            Rule::StartsWithThis => "D404",
            Rule::Empty => "D419",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single style issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub file: String,
    pub line: usize,
    pub code: Rule,
    pub message: String,
    /// Qualified name of the function concerned.
    pub function: String,
}

/// Check every function of a unit. Violations are ordered by line, then code.
pub fn check_unit(unit: &SourceUnit) -> Vec<Violation> {
    let file = unit.path.display().to_string();
    let mut violations: Vec<Violation> = unit
        .functions
        .iter()
        .flat_map(|record| check_function(&file, record))
        .collect();
    violations.sort_by(|a, b| a.line.cmp(&b.line).then(a.code.cmp(&b.code)));
    violations
}

/// Check one function.
pub fn check_function(file: &str, record: &FunctionRecord) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut push = |code: Rule, message: String| {
        out.push(Violation {
            file: file.to_string(),
            line: record.start_line,
            code,
            message,
            function: record.qualified_name.clone(),
        })
    };

    let literal = match &record.docstring_literal {
        Some(literal) => literal,
        None => {
            if let Some(rule) = missing_rule(record) {
                let what = match rule {
                    Rule::MissingInit => "__init__",
                    Rule::MissingMagic => "magic method",
                    Rule::MissingMethod => "public method",
                    _ => "public function",
                };
                push(rule, format!("Missing docstring in {what}"));
            }
            return out;
        }
    };

    if !record.has_documentation {
        push(Rule::Empty, "Docstring is empty".to_string());
        return out;
    }

    let (quotes, inner) = split_literal(literal);
    if quotes != "\"\"\"" {
        push(
            Rule::NotTripleDouble,
            "Use \"\"\"triple double quotes\"\"\"".to_string(),
        );
    }

    let text = &record.documentation_text;
    let lines: Vec<&str> = text.lines().collect();
    let summary = lines.first().copied().unwrap_or("").trim();

    if lines.len() == 1 {
        if inner.contains('\n') {
            push(
                Rule::OneLinerSpansLines,
                "One-line docstring should fit on one line with quotes".to_string(),
            );
        } else if inner != inner.trim() {
            push(
                Rule::SurroundingWhitespace,
                "No whitespaces allowed surrounding docstring text".to_string(),
            );
        }
    } else if lines.len() > 1 && !lines[1].trim().is_empty() {
        push(
            Rule::NoBlankAfterSummary,
            "1 blank line required between summary line and description".to_string(),
        );
    }

    if !summary.ends_with('.') {
        push(Rule::NoPeriod, "First line should end with a period".to_string());
    }

    let first_word = summary
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| !c.is_alphanumeric());

    if first_word.eq_ignore_ascii_case("this") {
        push(
            Rule::StartsWithThis,
            "First word of the docstring should not be `This`".to_string(),
        );
    } else if !is_property(record) {
        if let Some(base) = imperative_form(first_word) {
            push(
                Rule::NotImperative,
                format!(
                    "First line should be in imperative mood (perhaps '{}', not '{}')",
                    capitalize(&base),
                    capitalize(first_word)
                ),
            );
        }
    }

    if !first_word.is_empty()
        && first_word.chars().all(|c| c.is_alphabetic())
        && first_word.chars().next().is_some_and(char::is_lowercase)
    {
        push(
            Rule::NotCapitalized,
            format!(
                "First word of the first line should be properly capitalized ('{}', not '{}')",
                capitalize(first_word),
                first_word
            ),
        );
    }

    out
}

/// Which missing-docstring rule applies, if the definition is public.
fn missing_rule(record: &FunctionRecord) -> Option<Rule> {
    let nested_in_function = !record.is_method && record.qualified_name != record.name;
    let private_scope = record
        .qualified_name
        .split('.')
        .any(|part| part.starts_with('_') && !(part.starts_with("__") && part.ends_with("__")));
    if nested_in_function || private_scope {
        return None;
    }

    Some(if record.name == "__init__" {
        Rule::MissingInit
    } else if record.is_magic() {
        Rule::MissingMagic
    } else if record.is_method {
        Rule::MissingMethod
    } else {
        Rule::MissingFunction
    })
}

/// Split a literal into its opening quotes and raw content.
fn split_literal(literal: &str) -> (&str, &str) {
    match LITERAL_OPEN.captures(literal) {
        Some(caps) => {
            let (whole, quotes) = match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(quotes)) => (whole, quotes.as_str()),
                _ => return ("", literal),
            };
            let body = &literal[whole.end()..];
            let inner = body.strip_suffix(quotes).unwrap_or(body);
            (quotes, inner)
        }
        None => ("", literal),
    }
}

fn is_property(record: &FunctionRecord) -> bool {
    record
        .decorators
        .iter()
        .any(|d| d == "property" || d.ends_with(".setter") || d.ends_with(".getter"))
}

/// The imperative form of a third-person verb (`Returns` -> `Return`).
fn imperative_form(word: &str) -> Option<String> {
    let lower = word.to_lowercase();
    if lower.len() < 4 || !lower.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if ["ss", "us", "is", "ous", "ics"].iter().any(|s| lower.ends_with(s)) {
        return None;
    }

    if let Some(stem) = lower.strip_suffix("ies") {
        return Some(format!("{stem}y"));
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return Some(lower[..lower.len() - 2].to_string());
        }
    }
    lower.strip_suffix('s').map(str::to_string)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Guess the layout convention of docstring text.
pub fn detect_style(text: &str) -> Option<DocStyle> {
    let doc = text.trim().to_lowercase();
    if doc.is_empty() {
        return None;
    }

    if ["args:", "returns:", "raises:", "yields:"]
        .iter()
        .any(|kw| doc.contains(kw))
    {
        return Some(DocStyle::Google);
    }

    if (doc.contains("parameters") && doc.contains("----------"))
        || (doc.contains("returns") && doc.contains("-------"))
    {
        return Some(DocStyle::Numpy);
    }

    if [":param", ":type", ":return", ":rtype", ":raises"]
        .iter()
        .any(|kw| doc.contains(kw))
    {
        return Some(DocStyle::Rest);
    }

    None
}

/// Whether the function has a substantial docstring in the requested style.
pub fn is_complete(record: &FunctionRecord, style: DocStyle) -> bool {
    record.has_documentation
        && record.documentation_text.trim().chars().count() >= MIN_COMPLETE_LENGTH
        && detect_style(&record.documentation_text) == Some(style)
}
