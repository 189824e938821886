//! Documentation coverage aggregation.
//!
//! Folds per-file structural models into file and project coverage numbers.
//! An empty file is vacuously fully covered.

use serde::{Deserialize, Serialize};

use crate::analysis::SourceUnit;

/// Coverage of a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub file_path: String,
    pub total_functions: usize,
    pub documented: usize,
    /// Percentage rounded to two decimals.
    pub coverage_percent: f64,
}

impl FileCoverage {
    pub fn missing(&self) -> usize {
        self.total_functions - self.documented
    }
}

/// Coverage across a set of files, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub total_functions: usize,
    pub documented: usize,
    pub missing: usize,
    pub coverage_percent: f64,
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    /// Build the report from extracted units.
    pub fn from_units(units: &[SourceUnit]) -> Self {
        let files: Vec<FileCoverage> = units
            .iter()
            .map(|unit| {
                let total = unit.functions.len();
                let documented = unit.documented_count();
                FileCoverage {
                    file_path: unit.path.display().to_string(),
                    total_functions: total,
                    documented,
                    coverage_percent: percent(documented, total),
                }
            })
            .collect();

        let total_functions: usize = files.iter().map(|f| f.total_functions).sum();
        let documented: usize = files.iter().map(|f| f.documented).sum();

        Self {
            total_functions,
            documented,
            missing: total_functions - documented,
            coverage_percent: percent(documented, total_functions),
            files,
        }
    }

    /// Whether overall coverage reaches the threshold.
    pub fn meets(&self, min_coverage: f64) -> bool {
        self.coverage_percent >= min_coverage
    }
}

/// `documented / total * 100` rounded to two decimals, 100 when total is 0.
pub fn percent(documented: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let raw = documented as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
