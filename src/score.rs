//! Complexity ranks, maintainability index and per-file quality scores.
//!
//! The base score starts at 100 and loses points for style violations and
//! for functions above the complexity threshold. The final score averages
//! the base with the maintainability index and drops 5 points for files
//! whose comments and docstrings make up less than 5% of the lines.

use serde::{Deserialize, Serialize};

use crate::analysis::{FunctionRecord, RawMetrics, SourceUnit};
use crate::style::{self, Violation};

/// Point deductions.
pub mod points {
    pub const VIOLATION: usize = 5;
    pub const COMPLEX_FUNCTION: usize = 10;
    pub const LOW_COMMENT_RATIO: f64 = 5.0;
}

/// Comment ratio (percent of lines) below which a file is penalized.
pub const MIN_COMMENT_RATIO: f64 = 5.0;

/// Grade lower bounds.
pub mod grades {
    pub const A_MIN: usize = 90;
    pub const B_MIN: usize = 80;
    pub const C_MIN: usize = 70;
    pub const D_MIN: usize = 60;
}

/// Rank of a cyclomatic complexity value, `A` (simple) to `F`.
pub fn complexity_rank(complexity: u32) -> char {
    match complexity {
        0..=5 => 'A',
        6..=10 => 'B',
        11..=20 => 'C',
        21..=30 => 'D',
        31..=40 => 'E',
        _ => 'F',
    }
}

/// Letter grade of a quality score.
fn calculate_grade(score: f64) -> char {
    match score {
        s if s >= grades::A_MIN as f64 => 'A',
        s if s >= grades::B_MIN as f64 => 'B',
        s if s >= grades::C_MIN as f64 => 'C',
        s if s >= grades::D_MIN as f64 => 'D',
        _ => 'F',
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Maintainability index on a 0-100 scale.
///
/// `171 - 5.2 ln V - 0.23 G - 16.2 ln L + 50 sin(sqrt(2.46 C))` rescaled by
/// `100 / 171`, where V is the Halstead volume, G the total cyclomatic
/// complexity, L the logical lines and C the comment percentage in radians.
/// A file without operators or statements scores 100.
pub fn maintainability_index(volume: f64, complexity: u32, lloc: usize, comment_percent: f64) -> f64 {
    if volume <= 0.0 || lloc == 0 {
        return 100.0;
    }
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * complexity as f64 - 16.2 * (lloc as f64).ln()
        + 50.0 * (2.46 * comment_percent.to_radians()).sqrt().sin();
    round2((raw * 100.0 / 171.0).clamp(0.0, 100.0))
}

/// Final score from the base score, the maintainability index and the
/// comment ratio (`None` for an empty file, which is never penalized).
pub fn blend(base: usize, maintainability: f64, comment_ratio: Option<f64>) -> f64 {
    let mut score = base as f64;
    if maintainability > 0.0 {
        score = (score + maintainability) / 2.0;
    }
    if comment_ratio.is_some_and(|ratio| ratio < MIN_COMMENT_RATIO) {
        score -= points::LOW_COMMENT_RATIO;
    }
    round2(score.clamp(0.0, 100.0))
}

/// Complexity of one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionComplexity {
    pub name: String,
    pub line: usize,
    pub complexity: u32,
    pub rank: char,
}

impl From<&FunctionRecord> for FunctionComplexity {
    fn from(record: &FunctionRecord) -> Self {
        Self {
            name: record.qualified_name.clone(),
            line: record.start_line,
            complexity: record.complexity,
            rank: complexity_rank(record.complexity),
        }
    }
}

/// Quality assessment of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub file_path: String,
    /// Score from 0 to 100, higher is better.
    pub score: f64,
    /// Score from violations and complex functions alone.
    pub base_score: usize,
    pub grade: char,
    pub maintainability_index: f64,
    pub raw_metrics: RawMetrics,
    pub violations: Vec<Violation>,
    pub high_complexity_functions: usize,
    /// Mean complexity rounded to two decimals, 0 for a file without functions.
    pub average_complexity: f64,
    pub max_complexity: u32,
    pub functions: Vec<FunctionComplexity>,
}

impl QualityScore {
    /// Assess a file: run the style checks and rank every function.
    pub fn assess(unit: &SourceUnit, complexity_threshold: usize) -> Self {
        let violations = style::check_unit(unit);
        let functions: Vec<FunctionComplexity> =
            unit.functions.iter().map(FunctionComplexity::from).collect();

        let high_complexity_functions = functions
            .iter()
            .filter(|f| f.complexity as usize > complexity_threshold)
            .count();
        let penalty = violations.len() * points::VIOLATION
            + high_complexity_functions * points::COMPLEX_FUNCTION;
        let base_score = 100usize.saturating_sub(penalty);

        let metrics = &unit.metrics;
        let maintainability_index = maintainability_index(
            metrics.halstead.volume(),
            unit.total_complexity(),
            metrics.raw.lloc,
            metrics.raw.comment_percent(),
        );
        let score = blend(base_score, maintainability_index, metrics.raw.comment_ratio());

        let max_complexity = functions.iter().map(|f| f.complexity).max().unwrap_or(0);
        let average_complexity = if functions.is_empty() {
            0.0
        } else {
            let total: u32 = functions.iter().map(|f| f.complexity).sum();
            (total as f64 / functions.len() as f64 * 100.0).round() / 100.0
        };

        Self {
            file_path: unit.path.display().to_string(),
            score,
            base_score,
            grade: calculate_grade(score),
            maintainability_index,
            raw_metrics: metrics.raw,
            violations,
            high_complexity_functions,
            average_complexity,
            max_complexity,
            functions,
        }
    }
}
