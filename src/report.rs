//! Output formatting for docsmith results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: camelCase structured output for programmatic consumption
//! - CSV: one row per file, RFC 4180 quoting

use colored::*;
use serde::Serialize;
use std::io::{self, Write};

use crate::analysis::SourceUnit;
use crate::coverage::{CoverageReport, FileCoverage};
use crate::score::QualityScore;

/// Header row of the CSV report.
pub const CSV_HEADER: &str = "File,Total Functions,Documented,Missing,Coverage";

/// Status label for a coverage percentage.
pub fn coverage_status(percent: f64) -> &'static str {
    if percent >= 90.0 {
        "Excellent"
    } else if percent >= 70.0 {
        "Good"
    } else {
        "Needs Improvement"
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Write any report as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// CSV Format
// =============================================================================

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(file: &FileCoverage) -> String {
    format!(
        "{},{},{},{},{:.1}%",
        csv_field(&file.file_path),
        file.total_functions,
        file.documented,
        file.missing(),
        file.coverage_percent
    )
}

/// Write the per-file coverage table as CSV.
pub fn write_csv<W: Write>(out: &mut W, report: &CoverageReport) -> anyhow::Result<()> {
    write!(out, "{CSV_HEADER}\r\n")?;
    for file in &report.files {
        write!(out, "{}\r\n", csv_row(file))?;
    }
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header<W: Write>(out: &mut W, label: &str, path: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "docsmith".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", format!("{label:<10}").dimmed(), path)?;
    writeln!(out)
}

fn colored_percent(percent: f64) -> ColoredString {
    let text = format!("{percent:.2}%");
    if percent >= 90.0 {
        text.green().bold()
    } else if percent >= 70.0 {
        text.yellow()
    } else {
        text.red()
    }
}

fn file_badge(file: &FileCoverage) -> ColoredString {
    if file.total_functions == file.documented {
        "✓".green()
    } else if file.documented == 0 {
        "✗".red()
    } else {
        "~".yellow()
    }
}

/// Write a coverage report in pretty format.
///
/// With `units`, undocumented functions are listed under their file.
pub fn write_coverage_pretty<W: Write>(
    out: &mut W,
    path: &str,
    report: &CoverageReport,
    min_coverage: f64,
    units: Option<&[SourceUnit]>,
) -> io::Result<()> {
    write_header(out, "Scanning:", path)?;

    if report.files.is_empty() {
        writeln!(out, "  {}", "No Python files found".dimmed())?;
        writeln!(out)?;
    }

    for (idx, file) in report.files.iter().enumerate() {
        writeln!(
            out,
            "  {} {}  {}/{}  {}",
            file_badge(file),
            file.file_path,
            file.documented,
            file.total_functions,
            colored_percent(file.coverage_percent)
        )?;

        let Some(unit) = units.and_then(|u| u.get(idx)) else {
            continue;
        };
        for record in unit.undocumented() {
            writeln!(
                out,
                "      {} {} {}",
                "missing".red(),
                record.qualified_name,
                format!("(line {})", record.start_line).dimmed()
            )?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "  {}  {} functions, {} documented, {} missing",
        "Summary:".bold(),
        report.total_functions,
        report.documented,
        report.missing
    )?;
    writeln!(
        out,
        "  {}  {} ({})",
        "Coverage:".bold(),
        colored_percent(report.coverage_percent),
        coverage_status(report.coverage_percent)
    )?;

    if min_coverage > 0.0 {
        let status = if report.meets(min_coverage) {
            "PASSED".green()
        } else {
            "FAILED".red()
        };
        writeln!(out, "  {}  {} (minimum {min_coverage}%)", "Result:".bold(), status)?;
    }
    writeln!(out)
}

/// Write validation results in pretty format.
pub fn write_validation_pretty<W: Write>(
    out: &mut W,
    path: &str,
    scores: &[QualityScore],
) -> io::Result<()> {
    write_header(out, "Checking:", path)?;

    for score in scores {
        writeln!(
            out,
            "  {}  score {:.2}  grade {}",
            score.file_path.bold(),
            score.score,
            colored_grade(score.grade)
        )?;
        let raw = &score.raw_metrics;
        writeln!(
            out,
            "    {}",
            format!(
                "maintainability {:.2}  loc {}  sloc {}  comments {}  docstring lines {}  blank {}",
                score.maintainability_index, raw.loc, raw.sloc, raw.comments, raw.multi, raw.blank
            )
            .dimmed()
        )?;

        if score.violations.is_empty() {
            writeln!(out, "    {}", "no PEP 257 violations".green())?;
        }
        for v in &score.violations {
            writeln!(
                out,
                "    {} {:>5}  {}  {}",
                v.code.to_string().yellow(),
                format!("L{}", v.line),
                v.function.dimmed(),
                v.message
            )?;
        }

        for f in score.functions.iter().filter(|f| f.rank != 'A') {
            writeln!(
                out,
                "    {} {:>5}  {}  complexity {} (rank {})",
                "CC  ".cyan(),
                format!("L{}", f.line),
                f.name.dimmed(),
                f.complexity,
                f.rank
            )?;
        }
        writeln!(out)?;
    }

    let total: usize = scores.iter().map(|s| s.violations.len()).sum();
    writeln!(
        out,
        "  {}  {} file(s), {} violation(s)",
        "Summary:".bold(),
        scores.len(),
        total
    )?;
    writeln!(out)
}

fn colored_grade(grade: char) -> ColoredString {
    let text = grade.to_string();
    match grade {
        'A' => text.green().bold(),
        'B' => text.green(),
        'C' => text.yellow(),
        'D' => text.yellow().bold(),
        _ => text.red(),
    }
}
