//! Command-line interface for docsmith.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analysis::{FunctionRecord, Selector, SourceUnit};
use crate::config::{self, Config};
use crate::coverage::CoverageReport;
use crate::generate::{self, render_skeleton, ChatClient, DocStyle, GeneratedDoc};
use crate::insert::{self, ApplyOptions};
use crate::report;
use crate::score::QualityScore;
use crate::session::Session;
use crate::style;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Measure, generate and insert Python docstrings.
///
/// docsmith extracts every function definition from Python sources, reports
/// documentation coverage, checks docstrings against PEP 257, and writes new
/// docstrings into files without disturbing the surrounding code.
#[derive(Parser)]
#[command(name = "docsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report documentation coverage
    #[command(visible_alias = "coverage")]
    Scan(ScanArgs),
    /// Insert or replace the docstring of one function
    Apply(ApplyArgs),
    /// Generate docstrings for undocumented functions
    Generate(GenerateArgs),
    /// Check docstrings against PEP 257 and rank complexity
    #[command(visible_alias = "check")]
    Validate(ValidateArgs),
    /// Write a config file from the template
    Init(InitArgs),
}

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Output format: pretty, json, or csv
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum coverage percentage (exit non-zero below it)
    #[arg(short, long)]
    pub min_coverage: Option<f64>,

    /// List undocumented functions under each file
    #[arg(long)]
    pub functions: bool,
}

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Python file to edit
    pub file: PathBuf,

    /// Function name, bare (`add`) or qualified (`Calculator.add`); append
    /// `#N` for the Nth definition of a repeated name (`Account.balance#2`)
    pub function: String,

    /// Docstring text
    #[arg(short, long, conflicts_with = "from", required_unless_present = "from")]
    pub text: Option<String>,

    /// Read the docstring text from a file
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Print a diff of the edit instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Copy the original to <file>.bak first
    #[arg(long)]
    pub backup: bool,
}

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Path to process (file or directory)
    pub path: PathBuf,

    /// Docstring style: google, numpy, or rest (default: from config)
    #[arg(short, long)]
    pub style: Option<DocStyle>,

    /// Only this function (bare or qualified name)
    #[arg(long)]
    pub function: Option<String>,

    /// Also regenerate docstrings not complete in the chosen style
    #[arg(long)]
    pub incomplete: bool,

    /// Render style skeletons locally instead of calling the service
    #[arg(long)]
    pub offline: bool,

    /// Write the generated docstrings into the files
    #[arg(long)]
    pub apply: bool,

    /// With --apply, verify the edits without writing
    #[arg(long, requires = "apply")]
    pub dry_run: bool,
}

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Style used for completeness (default: from config)
    #[arg(short, long)]
    pub style: Option<DocStyle>,
}

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "docsmith.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Run the parsed command line.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if let Commands::Init(args) = &cli.command {
        return run_init(args);
    }

    let cwd = std::env::current_dir()?;
    let (config, _) = Config::load(cli.config.as_deref(), &cwd)?;

    match &cli.command {
        Commands::Scan(args) => run_scan(args, &config),
        Commands::Apply(args) => run_apply(args, &config),
        Commands::Generate(args) => run_generate(args, &config, cli.quiet),
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Init(args) => run_init(args),
    }
}

/// Extract all units under `path` with the configured exclusions.
fn extract(path: &Path, config: &Config) -> anyhow::Result<Vec<SourceUnit>> {
    if !path.exists() {
        anyhow::bail!("cannot access path {:?}: no such file or directory", path);
    }
    Ok(config.extractor()?.extract_tree(path))
}

fn open_output(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(io::BufWriter::new(fs::File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs, config: &Config) -> anyhow::Result<i32> {
    if !matches!(args.format.as_str(), "pretty" | "json" | "csv") {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'csv'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let min_coverage = args.min_coverage.unwrap_or(config.min_coverage);
    if !(0.0..=100.0).contains(&min_coverage) {
        eprintln!("Error: --min-coverage must be between 0 and 100");
        return Ok(EXIT_ERROR);
    }

    let units = extract(&args.path, config)?;
    let coverage = CoverageReport::from_units(&units);

    let mut out = open_output(args.output.as_deref())?;
    match args.format.as_str() {
        "json" => report::write_json(&mut out, &coverage)?,
        "csv" => report::write_csv(&mut out, &coverage)?,
        _ => report::write_coverage_pretty(
            &mut out,
            &args.path.to_string_lossy(),
            &coverage,
            min_coverage,
            args.functions.then_some(units.as_slice()),
        )?,
    }
    out.flush()?;

    if coverage.meets(min_coverage) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the apply command.
pub fn run_apply(args: &ApplyArgs, config: &Config) -> anyhow::Result<i32> {
    let text = match (&args.text, &args.from) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?,
        (None, None) => anyhow::bail!("either --text or --from is required"),
    };

    let options = ApplyOptions {
        backup: args.backup || config.backup,
        dry_run: args.dry_run,
    };
    let outcome = insert::apply_docstring(&args.file, &args.function, &text, &options)?;
    let plan = &outcome.plan;

    if args.dry_run {
        eprintln!("{}", describe_plan(plan));
        let original = fs::read_to_string(&args.file)?;
        let label = args.file.to_string_lossy();
        print!(
            "{}",
            insert::unified_diff(&label, &original, &outcome.text, insert::DEFAULT_CONTEXT)
        );
        io::stdout().flush()?;
        return Ok(EXIT_SUCCESS);
    }

    if outcome.changed {
        println!("{} in {}", describe_plan(plan), args.file.display());
        if let Some(bak) = &outcome.backup {
            println!("Backup written to {}", bak.display());
        }
    } else {
        println!(
            "{} in {} already has this docstring",
            plan.function,
            args.file.display()
        );
    }
    Ok(EXIT_SUCCESS)
}

fn describe_plan(plan: &insert::InsertionPlan) -> String {
    let mut line = match plan.replaced_lines {
        Some((start, end)) => format!(
            "Replaced docstring of {} (lines {}-{})",
            plan.function, start, end
        ),
        None => format!(
            "Inserted docstring for {} after line {}",
            plan.function, plan.header_end_line
        ),
    };
    if plan.placeholders_removed > 0 {
        line.push_str(&format!(
            ", removed {} placeholder comment(s)",
            plan.placeholders_removed
        ));
    }
    line
}

/// Whether `record` is selected by a `--function` filter. Without `#N`
/// every definition carrying the name is selected.
fn matches_function(unit: &SourceUnit, record: &FunctionRecord, filter: &Selector) -> bool {
    match filter.occurrence {
        Some(_) => unit
            .select(filter)
            .is_some_and(|chosen| chosen.span == record.span),
        None => filter.matches(record),
    }
}

/// Run the generate command.
pub fn run_generate(args: &GenerateArgs, config: &Config, quiet: bool) -> anyhow::Result<i32> {
    let style = args.style.unwrap_or(config.style);
    let filter = match args.function.as_deref().map(Selector::parse) {
        Some(None) => {
            eprintln!("Error: invalid function name {:?}", args.function.as_deref().unwrap_or(""));
            return Ok(EXIT_ERROR);
        }
        Some(Some(selector)) => Some(selector),
        None => None,
    };
    let units = extract(&args.path, config)?;

    let targets: Vec<(&SourceUnit, &FunctionRecord)> = units
        .iter()
        .flat_map(|unit| unit.functions.iter().map(move |record| (unit, record)))
        .filter(|(unit, record)| match &filter {
            Some(filter) => matches_function(unit, record, filter),
            None => {
                !record.has_documentation || (args.incomplete && !style::is_complete(record, style))
            }
        })
        .collect();

    if targets.is_empty() {
        match &filter {
            Some(filter) => {
                eprintln!("Error: function \"{}\" not found", filter);
                return Ok(EXIT_ERROR);
            }
            None => {
                println!("All functions are documented.");
                return Ok(EXIT_SUCCESS);
            }
        }
    }

    let client = if args.offline {
        None
    } else {
        match ChatClient::from_config(&config.llm) {
            Ok(client) => Some(client),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Set the key or run with --offline to render skeletons locally");
                return Ok(EXIT_ERROR);
            }
        }
    };

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(targets.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    let options = ApplyOptions {
        backup: config.backup,
        dry_run: args.dry_run,
    };
    let mut session = Session::new();
    let mut fallbacks = 0;
    let mut failures = 0;
    let mut stdout = io::stdout().lock();

    for (unit, record) in &targets {
        // repeated names (property getter and setter) are told apart by occurrence
        let selector = unit.selector_for(record).to_string();
        progress.set_message(selector.clone());

        let doc = match &client {
            Some(client) => generate::generate_docstring(client, record, style),
            None => GeneratedDoc {
                text: render_skeleton(record, style),
                fallback: false,
                error: None,
            },
        };
        if doc.fallback {
            fallbacks += 1;
        }

        if args.apply {
            match insert::apply_docstring(&unit.path, &selector, &doc.text, &options) {
                Ok(outcome) => {
                    if outcome.changed {
                        session = session.record(&unit.path, &selector);
                    }
                }
                Err(e) => {
                    warn!(
                        path = %unit.path.display(),
                        function = %selector,
                        error = %e,
                        "could not apply docstring"
                    );
                    failures += 1;
                }
            }
        } else {
            progress.suspend(|| -> io::Result<()> {
                writeln!(
                    stdout,
                    "# {}:{} {}",
                    unit.path.display(),
                    record.start_line,
                    selector
                )?;
                for line in insert::render_block(&insert::normalize_text(&doc.text), "") {
                    writeln!(stdout, "{line}")?;
                }
                writeln!(stdout)
            })?;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    writeln!(
        stdout,
        "Generated {} {} docstring(s), {} fallback(s)",
        targets.len(),
        style,
        fallbacks
    )?;
    if args.apply {
        if args.dry_run {
            writeln!(stdout, "Dry run: {} edit(s) verified, nothing written", targets.len() - failures)?;
        } else {
            writeln!(stdout, "Applied {} docstring(s):", session.len())?;
            for (path, name) in session.iter() {
                writeln!(stdout, "  {} {}", path.display(), name)?;
            }
        }
        if failures > 0 {
            writeln!(stdout, "{} docstring(s) could not be applied", failures)?;
            return Ok(EXIT_FAILED);
        }
    }

    Ok(EXIT_SUCCESS)
}

/// JSON shape of the validate command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport<'a> {
    style: DocStyle,
    total_functions: usize,
    complete_functions: usize,
    files: &'a [QualityScore],
}

/// Run the validate command.
pub fn run_validate(args: &ValidateArgs, config: &Config) -> anyhow::Result<i32> {
    if !matches!(args.format.as_str(), "pretty" | "json") {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let style = args.style.unwrap_or(config.style);
    let units = extract(&args.path, config)?;
    let scores: Vec<QualityScore> = units
        .iter()
        .map(|unit| QualityScore::assess(unit, config.complexity_threshold))
        .collect();

    let total_functions: usize = units.iter().map(|u| u.functions.len()).sum();
    let complete_functions = units
        .iter()
        .flat_map(|u| &u.functions)
        .filter(|record| style::is_complete(record, style))
        .count();

    let mut out = io::stdout().lock();
    if args.format == "json" {
        let validation = ValidationReport {
            style,
            total_functions,
            complete_functions,
            files: &scores,
        };
        report::write_json(&mut out, &validation)?;
    } else {
        report::write_validation_pretty(&mut out, &args.path.to_string_lossy(), &scores)?;
        writeln!(
            out,
            "  {} of {} function(s) fully documented in {} style",
            complete_functions, total_functions, style
        )?;
        writeln!(out)?;
    }

    if scores.iter().any(|s| !s.violations.is_empty()) {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it or --output to choose another path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("failed to create directory: {}", e))?;
        }
    }

    fs::write(&args.output, config::TEMPLATE)
        .map_err(|e| anyhow::anyhow!("failed to write config: {}", e))?;

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: docsmith scan . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
