//! Integration tests for extraction and coverage over the testdata fixtures.

use std::fs;
use std::path::PathBuf;

use docsmith::analysis::{extract_file, extract_tree, Extractor, ParameterKind};
use docsmith::coverage::CoverageReport;
use docsmith::Error;
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

#[test]
fn test_project_walk_skips_excluded_dirs() {
    let units = extract_tree(testdata_path().join("project")).expect("walk should succeed");

    let names: Vec<String> = units
        .iter()
        .map(|u| u.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["arithmetic.py", "shapes.py"]);
}

#[test]
fn test_function_records() {
    let unit = extract_file(testdata_path().join("project/arithmetic.py")).unwrap();

    let names: Vec<&str> = unit.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["add", "add_all", "mean", "clamp"]);

    let lines: Vec<usize> = unit.functions.iter().map(|f| f.start_line).collect();
    assert_eq!(lines, [4, 9, 17, 24]);

    let mean = unit.find("mean").unwrap();
    assert!(!mean.has_documentation);
    assert_eq!(mean.return_type.as_deref(), Some("float"));
    assert_eq!(mean.parameters[0].annotation.as_deref(), Some("list"));
    assert!(mean.raised_exceptions.contains("ValueError"));
    assert_eq!(mean.complexity, 2);

    let clamp = unit.find("clamp").unwrap();
    assert!(clamp.has_documentation);
    assert!(clamp.documentation_text.starts_with("Clamp x into the closed range.\n\nArgs:"));
    assert_eq!(clamp.parameters.len(), 3);
    assert!(clamp
        .parameters
        .iter()
        .all(|p| p.kind == ParameterKind::Regular));
}

#[test]
fn test_methods_and_nested_functions() {
    let unit = extract_file(testdata_path().join("project/shapes.py")).unwrap();

    let qualified: Vec<&str> = unit
        .functions
        .iter()
        .map(|f| f.qualified_name.as_str())
        .collect();
    assert_eq!(
        qualified,
        [
            "Circle.__init__",
            "Circle.area",
            "Circle.refresh",
            "Circle.describe",
            "Circle.describe.fmt",
        ]
    );

    let refresh = unit.find("Circle.refresh").unwrap();
    assert!(refresh.is_async);
    assert!(refresh.is_method);
    assert_eq!(refresh.start_line, 14);

    let fmt = unit.find("fmt").unwrap();
    assert!(!fmt.is_method);
}

#[test]
fn test_project_coverage() {
    let units = extract_tree(testdata_path().join("project")).unwrap();
    let report = CoverageReport::from_units(&units);

    assert_eq!(report.total_functions, 9);
    assert_eq!(report.documented, 3);
    assert_eq!(report.missing, 6);
    assert_eq!(report.coverage_percent, 33.33);
    assert_eq!(report.files[0].coverage_percent, 50.0);
    assert_eq!(report.files[1].coverage_percent, 20.0);
}

#[test]
fn test_broken_file_is_reported_and_skipped() {
    let broken = testdata_path().join("broken/bad_syntax.py");
    match extract_file(&broken) {
        Err(Error::Syntax { line, .. }) => assert_eq!(line, 5),
        other => panic!("expected syntax error, got {:?}", other.map(|u| u.functions.len())),
    }

    let dir = TempDir::new().unwrap();
    fs::copy(&broken, dir.path().join("bad.py")).unwrap();
    fs::write(dir.path().join("good.py"), "def f():\n    pass\n").unwrap();

    let units = extract_tree(dir.path()).unwrap();
    assert_eq!(units.len(), 1);
    assert!(units[0].path.ends_with("good.py"));
}

#[test]
fn test_glob_exclusions() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("app/migrations")).unwrap();
    fs::write(dir.path().join("app/models.py"), "def f():\n    pass\n").unwrap();
    fs::write(dir.path().join("app/migrations/0001.py"), "def g():\n    pass\n").unwrap();

    let extractor = Extractor::new()
        .unwrap()
        .exclude_globs(&["**/migrations/**"])
        .unwrap();
    let units = extractor.extract_tree(dir.path());
    assert_eq!(units.len(), 1);
    assert!(units[0].path.ends_with("models.py"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = extract_file(testdata_path().join("does_not_exist.py")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_non_utf8_file_is_encoding_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.py");
    fs::write(&path, b"def f():\n    return '\xe9'\n").unwrap();
    assert!(matches!(extract_file(&path), Err(Error::Encoding { .. })));
}
