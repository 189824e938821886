//! Properties of docstring insertion on real files.
//!
//! Every test works on a temporary copy of a fixture so the fixtures stay
//! untouched.

use std::fs;
use std::path::{Path, PathBuf};

use docsmith::analysis::{extract_file, extract_tree};
use docsmith::coverage::CoverageReport;
use docsmith::{apply_docstring, plan_insertion, ApplyOptions, Error};
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Copy a fixture into a fresh temporary directory.
fn copy_fixture(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join(Path::new(name).file_name().unwrap());
    fs::copy(testdata_path().join(name), &target).unwrap();
    (dir, target)
}

#[test]
fn test_three_line_scenario() {
    let insertion = plan_insertion(
        "def f(a, b):\n    return a + b\n",
        "f",
        "Add a and b.",
    )
    .unwrap();
    assert_eq!(
        insertion.text,
        "def f(a, b):\n    \"\"\"Add a and b.\"\"\"\n    return a + b\n"
    );
}

#[test]
fn test_round_trip_and_placeholder_removal() {
    let (_dir, path) = copy_fixture("project/arithmetic.py");
    let text = "Sum every value.\n\nArgs:\n    values: numbers to add\n\nReturns:\n    The total.";

    let outcome = apply_docstring(&path, "add_all", text, &ApplyOptions::default()).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.plan.placeholders_removed, 1);

    let source = fs::read_to_string(&path).unwrap();
    assert!(!source.contains("# Missing docstring"));

    let unit = extract_file(&path).unwrap();
    let record = unit.find("add_all").unwrap();
    assert!(record.has_documentation);
    assert_eq!(record.documentation_text, text);
    assert_eq!(record.start_line, 9);
}

#[test]
fn test_reapplying_is_idempotent() {
    let (_dir, path) = copy_fixture("project/arithmetic.py");

    let first = apply_docstring(&path, "mean", "Return the mean.", &ApplyOptions::default()).unwrap();
    assert!(first.changed);
    let after_first = fs::read(&path).unwrap();

    let second = apply_docstring(&path, "mean", "Return the mean.", &ApplyOptions::default()).unwrap();
    assert!(!second.changed);
    assert_eq!(fs::read(&path).unwrap(), after_first);
}

#[test]
fn test_bytes_outside_the_edit_are_unchanged() {
    let (_dir, path) = copy_fixture("project/arithmetic.py");
    let before = fs::read_to_string(&path).unwrap();
    let before_lines: Vec<&str> = before.lines().collect();

    apply_docstring(&path, "mean", "Return the mean.", &ApplyOptions::default()).unwrap();
    let after = fs::read_to_string(&path).unwrap();
    let after_lines: Vec<&str> = after.lines().collect();

    // header is line 17, the placeholder on line 18 becomes the docstring
    assert_eq!(after_lines[..17], before_lines[..17]);
    assert_eq!(after_lines[17], "    \"\"\"Return the mean.\"\"\"");
    assert_eq!(after_lines[18..], before_lines[18..]);
}

#[test]
fn test_replacing_multi_line_docstring() {
    let (_dir, path) = copy_fixture("project/arithmetic.py");
    let outcome = apply_docstring(
        &path,
        "clamp",
        "Clamp x between low and high.",
        &ApplyOptions::default(),
    )
    .unwrap();
    assert!(outcome.plan.replaced_existing());
    assert_eq!(outcome.plan.replaced_lines, Some((25, 35)));

    let unit = extract_file(&path).unwrap();
    let clamp = unit.find("clamp").unwrap();
    assert_eq!(clamp.documentation_text, "Clamp x between low and high.");
    assert_eq!(clamp.line_count(), 3);
}

#[test]
fn test_prefix_name_is_not_matched() {
    let (_dir, path) = copy_fixture("project/arithmetic.py");
    let err = apply_docstring(&path, "add_al", "Nope.", &ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = apply_docstring(&path, "ad", "Nope.", &ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_documenting_every_method_reaches_full_coverage() {
    let (_dir, path) = copy_fixture("project/shapes.py");
    let targets: Vec<String> = extract_file(&path)
        .unwrap()
        .undocumented()
        .map(|f| f.qualified_name.clone())
        .collect();
    assert_eq!(targets.len(), 4);

    for target in &targets {
        apply_docstring(&path, target, "Describe the shape.", &ApplyOptions::default()).unwrap();
    }

    let unit = extract_file(&path).unwrap();
    let report = CoverageReport::from_units(&[unit]);
    assert_eq!(report.coverage_percent, 100.0);
}

#[test]
fn test_backup_and_dry_run() {
    let (dir, path) = copy_fixture("project/arithmetic.py");
    let original = fs::read(&path).unwrap();

    let dry = apply_docstring(
        &path,
        "add_all",
        "Sum values.",
        &ApplyOptions {
            backup: true,
            dry_run: true,
        },
    )
    .unwrap();
    assert!(!dry.changed);
    assert!(dry.backup.is_none());
    assert!(dry.text.contains("\"\"\"Sum values.\"\"\""));
    assert_eq!(fs::read(&path).unwrap(), original);

    let applied = apply_docstring(
        &path,
        "add_all",
        "Sum values.",
        &ApplyOptions {
            backup: true,
            dry_run: false,
        },
    )
    .unwrap();
    let backup = applied.backup.expect("backup should be written");
    assert_eq!(backup, dir.path().join("arithmetic.py.bak"));
    assert_eq!(fs::read(&backup).unwrap(), original);
}

#[test]
fn test_broken_file_is_refused() {
    let (_dir, path) = copy_fixture("broken/bad_syntax.py");
    let original = fs::read(&path).unwrap();

    let err = apply_docstring(&path, "ok", "Do nothing.", &ApplyOptions::default()).unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn test_repeated_names_each_get_their_own_docstring() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("account.py");
    fs::write(
        &path,
        "class A:\n    @property\n    def v(self):\n        return self._v\n\n    @v.setter\n    def v(self, value):\n        self._v = value\n",
    )
    .unwrap();

    // targets are collected once, before any edit
    let units = extract_tree(dir.path()).unwrap();
    let selectors: Vec<String> = units[0]
        .undocumented()
        .map(|f| units[0].selector_for(f).to_string())
        .collect();
    assert_eq!(selectors, ["A.v", "A.v#2"]);

    for (n, selector) in selectors.iter().enumerate() {
        let text = format!("Doc number {}.", n + 1);
        let outcome = apply_docstring(&path, selector, &text, &ApplyOptions::default()).unwrap();
        assert!(outcome.changed);
    }

    let unit = extract_file(&path).unwrap();
    let docs: Vec<(usize, &str)> = unit
        .functions
        .iter()
        .map(|f| (f.start_line, f.documentation_text.as_str()))
        .collect();
    assert_eq!(docs, [(3, "Doc number 1."), (8, "Doc number 2.")]);
    assert_eq!(CoverageReport::from_units(&[unit]).coverage_percent, 100.0);
}
