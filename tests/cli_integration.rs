//! End-to-end tests of the docsmith binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Command running in `dir`, so no config file is discovered by accident.
fn docsmith(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docsmith").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

/// Copy the sample project into a temporary directory.
fn project_copy() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in ["arithmetic.py", "shapes.py"] {
        fs::copy(
            testdata_path().join("project").join(name),
            dir.path().join(name),
        )
        .unwrap();
    }
    dir
}

#[test]
fn test_scan_json() {
    let dir = TempDir::new().unwrap();
    docsmith(dir.path())
        .args(["scan", "--format", "json"])
        .arg(testdata_path().join("project"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"coveragePercent\": 33.33"))
        .stdout(predicate::str::contains("\"totalFunctions\": 9"))
        .stdout(predicate::str::contains("stale.py").not());
}

#[test]
fn test_scan_below_minimum_fails() {
    let dir = TempDir::new().unwrap();
    docsmith(dir.path())
        .args(["scan", "--min-coverage", "50"])
        .arg(testdata_path().join("project"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Needs Improvement"));
}

#[test]
fn test_scan_min_coverage_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("docsmith.yaml"), "min_coverage: 90\n").unwrap();
    docsmith(dir.path())
        .arg("scan")
        .arg(testdata_path().join("project"))
        .assert()
        .code(1);
}

#[test]
fn test_scan_csv_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("coverage.csv");
    docsmith(dir.path())
        .args(["scan", "--format", "csv", "--output"])
        .arg(&out)
        .arg(testdata_path().join("project/arithmetic.py"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let csv = fs::read_to_string(&out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("File,Total Functions,Documented,Missing,Coverage")
    );
    assert!(lines.next().unwrap().ends_with("arithmetic.py,4,2,2,50.0%"));
}

#[test]
fn test_scan_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    docsmith(dir.path())
        .args(["scan", "--format", "xml", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid format"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    docsmith(dir.path())
        .args(["scan", ".", "--config", "nope.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_apply_dry_run_leaves_file() {
    let dir = project_copy();
    let path = dir.path().join("arithmetic.py");
    let original = fs::read(&path).unwrap();

    docsmith(dir.path())
        .args(["apply", "arithmetic.py", "add_all", "--text", "Sum values.", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- a/arithmetic.py\n+++ b/arithmetic.py\n@@ -7,7 +7,7 @@\n"))
        .stdout(predicate::str::contains("-    # Missing docstring\n+    \"\"\"Sum values.\"\"\"\n"))
        .stdout(predicate::str::contains("def mean").not())
        .stderr(predicate::str::contains("Inserted docstring for add_all after line 9"));

    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn test_apply_writes_file() {
    let dir = project_copy();
    fs::write(dir.path().join("doc.txt"), "Sum values.\n\nReturns:\n    The total.\n").unwrap();

    docsmith(dir.path())
        .args(["apply", "arithmetic.py", "add_all", "--from", "doc.txt", "--backup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 placeholder comment(s)"))
        .stdout(predicate::str::contains("arithmetic.py.bak"));

    let source = fs::read_to_string(dir.path().join("arithmetic.py")).unwrap();
    assert!(source.contains("    \"\"\"\n    Sum values.\n\n    Returns:\n        The total.\n    \"\"\"\n"));
    assert!(dir.path().join("arithmetic.py.bak").exists());
}

#[test]
fn test_apply_unknown_function() {
    let dir = project_copy();
    docsmith(dir.path())
        .args(["apply", "arithmetic.py", "add_al", "--text", "Nope."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_generate_offline_prints_skeletons() {
    let dir = project_copy();
    docsmith(dir.path())
        .args(["generate", "arithmetic.py", "--offline", "--style", "numpy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# arithmetic.py:17 mean"))
        .stdout(predicate::str::contains("Short description of `mean`."))
        .stdout(predicate::str::contains("values : list"))
        .stdout(predicate::str::contains("Generated 2 numpy docstring(s), 0 fallback(s)"));
}

#[test]
fn test_generate_offline_apply_documents_everything() {
    let dir = project_copy();
    docsmith(dir.path())
        .args(["generate", ".", "--offline", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 6 docstring(s):"))
        .stdout(predicate::str::contains("Circle.describe.fmt"));

    docsmith(dir.path())
        .args(["scan", ".", "--format", "json", "--min-coverage", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"coveragePercent\": 100.0"));
}

const ACCOUNT: &str = "class Account:
    @property
    def balance(self):
        return self._balance

    @balance.setter
    def balance(self, value):
        self._balance = value
";

#[test]
fn test_generate_apply_documents_getter_and_setter() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("account.py"), ACCOUNT).unwrap();

    docsmith(dir.path())
        .args(["generate", "account.py", "--offline", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 docstring(s):"))
        .stdout(predicate::str::contains("account.py Account.balance\n"))
        .stdout(predicate::str::contains("account.py Account.balance#2\n"));

    docsmith(dir.path())
        .args(["scan", "account.py", "--format", "json", "--min-coverage", "100"])
        .assert()
        .success();
}

#[test]
fn test_apply_selects_second_definition() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("account.py"), ACCOUNT).unwrap();

    docsmith(dir.path())
        .args(["apply", "account.py", "Account.balance#2", "--text", "Set the balance."])
        .assert()
        .success()
        .stdout(predicate::str::contains("after line 7"));

    let source = fs::read_to_string(dir.path().join("account.py")).unwrap();
    assert!(source.contains("    def balance(self, value):\n        \"\"\"Set the balance.\"\"\"\n"));
    assert!(source.contains("    def balance(self):\n        return self._balance\n"));
}

#[test]
fn test_generate_without_api_key() {
    let dir = project_copy();
    docsmith(dir.path())
        .env_remove("GROQ_API_KEY")
        .args(["generate", "arithmetic.py"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GROQ_API_KEY"))
        .stderr(predicate::str::contains("--offline"));
}

#[test]
fn test_validate_reports_violations() {
    let dir = TempDir::new().unwrap();
    docsmith(dir.path())
        .arg("validate")
        .arg(testdata_path().join("project/arithmetic.py"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("D103"))
        .stdout(predicate::str::contains("Missing docstring in public function"));
}

#[test]
fn test_validate_json() {
    let dir = TempDir::new().unwrap();
    let output = docsmith(dir.path())
        .args(["validate", "--format", "json"])
        .arg(testdata_path().join("project/shapes.py"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["style"], "google");
    assert_eq!(value["totalFunctions"], 5);
    let codes: Vec<&str> = value["files"][0]["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, ["D107", "D102", "D102"]);
}

#[test]
fn test_init_writes_template_once() {
    let dir = TempDir::new().unwrap();
    docsmith(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created docsmith.yaml"));
    assert!(dir.path().join("docsmith.yaml").exists());

    docsmith(dir.path())
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    docsmith(dir.path()).args(["init", "--force"]).assert().success();

    // the written template is a valid configuration
    docsmith(dir.path())
        .args(["scan", "."])
        .assert()
        .success();
}
