//! Docstring text generation.
//!
//! Builds a prompt from the structural model, sends it to a [`TextGenerator`]
//! and cleans the reply. Any failure yields a placeholder docstring flagged as
//! a fallback, so callers can always continue.

mod client;
mod error;
mod template;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::FunctionRecord;

pub use client::ChatClient;
pub use error::GenerationError;
pub use template::render_skeleton;

/// Docstring layout convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStyle {
    #[default]
    Google,
    Numpy,
    Rest,
}

impl DocStyle {
    pub const ALL: [DocStyle; 3] = [DocStyle::Google, DocStyle::Numpy, DocStyle::Rest];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocStyle::Google => "google",
            DocStyle::Numpy => "numpy",
            DocStyle::Rest => "rest",
        }
    }

    /// Name used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            DocStyle::Google => "Google style",
            DocStyle::Numpy => "NumPy style",
            DocStyle::Rest => "reStructuredText (reST) style",
        }
    }
}

impl fmt::Display for DocStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(DocStyle::Google),
            "numpy" | "numpydoc" => Ok(DocStyle::Numpy),
            "rest" | "rst" | "restructuredtext" => Ok(DocStyle::Rest),
            other => Err(format!(
                "unknown docstring style {other:?}, expected google, numpy or rest"
            )),
        }
    }
}

/// A source of completions for a prompt.
pub trait TextGenerator {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generated docstring text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDoc {
    pub text: String,
    /// Whether the placeholder was used because generation failed.
    pub fallback: bool,
    /// The failure that caused the fallback.
    pub error: Option<String>,
}

/// Placeholder used when generation fails.
pub fn fallback_text(name: &str) -> String {
    format!("Short description of `{name}`.")
}

/// Synthesize a stub definition for the prompt.
///
/// Unannotated parameters are shown as `Any`.
pub fn signature(record: &FunctionRecord) -> String {
    let params: Vec<String> = record
        .parameters
        .iter()
        .map(|p| {
            format!(
                "{}: {}",
                p.display_name(),
                p.annotation.as_deref().unwrap_or("Any")
            )
        })
        .collect();

    let mut out = String::new();
    if record.is_async {
        out.push_str("async ");
    }
    out.push_str(&format!("def {}({})", record.name, params.join(", ")));
    if let Some(ret) = &record.return_type {
        out.push_str(&format!(" -> {ret}"));
    }
    out.push_str(":\n    pass");
    out
}

/// Build the completion prompt for one function.
pub fn build_prompt(record: &FunctionRecord, style: DocStyle) -> String {
    format!(
        "You are a senior Python engineer.\n\
         \n\
         Generate a HIGH-QUALITY Python docstring in {label}.\n\
         \n\
         STRICT RULES:\n\
         - Start summary with an IMPERATIVE VERB (Add, Calculate, Return, Validate)\n\
         - DO NOT use words like \"Process\"\n\
         - End summary with a period\n\
         - Include Args, Returns only if applicable\n\
         - Do NOT include markdown\n\
         - Do NOT include code fences\n\
         - Return ONLY the docstring text\n\
         \n\
         Function source:\n\
         {source}\n",
        label = style.label(),
        source = signature(record),
    )
}

/// Strip code fences and enclosing quote markers from a model reply.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // drop the fence line, which may carry a language tag
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        text = text.trim_end().strip_suffix("```").unwrap_or(text).trim();
    }

    for marker in ["\"\"\"", "'''"] {
        if text.len() >= 2 * marker.len() && text.starts_with(marker) && text.ends_with(marker) {
            text = text[marker.len()..text.len() - marker.len()].trim();
        }
    }

    text.to_string()
}

/// Generate documentation text for one function.
pub fn generate_docstring(
    generator: &dyn TextGenerator,
    record: &FunctionRecord,
    style: DocStyle,
) -> GeneratedDoc {
    let prompt = build_prompt(record, style);
    debug!(function = %record.qualified_name, %style, "requesting docstring");

    let failure = match generator.complete(&prompt) {
        Ok(raw) => {
            let text = clean_response(&raw);
            if !text.is_empty() {
                return GeneratedDoc {
                    text,
                    fallback: false,
                    error: None,
                };
            }
            GenerationError::EmptyResponse
        }
        Err(e) => e,
    };

    warn!(
        function = %record.qualified_name,
        error = %failure,
        "generation failed, using placeholder"
    );
    GeneratedDoc {
        text: fallback_text(&record.name),
        fallback: true,
        error: Some(failure.to_string()),
    }
}
