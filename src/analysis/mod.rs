//! Structural extraction of Python source files.
//!
//! This module turns Python source into a function-level model using
//! tree-sitter. For every `def` (sync or async, at any depth) it records:
//! - Name, qualified name and whether it is a method
//! - Parameters with annotations and kinds, return annotation, decorators
//! - The existing docstring, raw and cleaned
//! - Raised exception names and cyclomatic complexity
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌────────────────┐     ┌───────────────┐
//! │ .py files       │────▶│ PythonAnalyzer │────▶│ SourceUnit    │
//! └─────────────────┘     └────────────────┘     │ (FunctionRec- │
//!         ▲                                      │  ords by line)│
//!         │                                      └───────────────┘
//! ┌─────────────────┐
//! │ Extractor       │  walks trees, skips excluded dirs and globs
//! └─────────────────┘
//! ```

mod docstring;
mod expr;
mod extractor;
mod facts;
mod metrics;
mod parsed;
mod python;

pub use docstring::{cleandoc, decode_literal};
pub use expr::expression_text;
pub use extractor::{extract_file, extract_tree, Extractor, DEFAULT_EXCLUDE_DIRS};
pub use facts::{
    ControlFlowInfo, FunctionRecord, Parameter, ParameterKind, Selector, SourceUnit, Span,
};
pub use metrics::{measure, FileMetrics, Halstead, RawMetrics};
pub use parsed::ParsedFile;
pub use python::{python_analyzer, PythonAnalyzer};
