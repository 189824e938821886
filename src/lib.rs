//! docsmith - docstring coverage and insertion for Python sources.
//!
//! docsmith reads Python files, builds a structural model of every function
//! definition, reports how many carry a docstring, and writes new docstrings
//! into the source without disturbing the surrounding text.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter extraction of [`FunctionRecord`]s per file
//! - `insert`: line-oriented docstring planner with verified atomic writes
//! - `coverage`: per-file and overall documentation coverage
//! - `generate`: prompt building, the chat completion client and skeletons
//! - `style`: PEP 257 checks and docstring style detection
//! - `score`: complexity ranks and per-file quality scores
//! - `report`: output formatting (pretty, JSON, CSV)
//! - `config`: YAML configuration
//! - `session`: functions applied during one run

pub mod analysis;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod generate;
pub mod insert;
pub mod logger;
pub mod report;
pub mod score;
pub mod session;
pub mod style;

pub use analysis::{extract_file, extract_tree, Extractor, FunctionRecord, Selector, SourceUnit};
pub use config::Config;
pub use coverage::{CoverageReport, FileCoverage};
pub use error::{Error, Result};
pub use generate::{generate_docstring, DocStyle, GeneratedDoc, GenerationError, TextGenerator};
pub use insert::{apply_docstring, plan_insertion, ApplyOptions, ApplyOutcome, InsertionPlan};
pub use session::Session;
