//! End-to-end tests for modev CLI commands.
//!
//! These tests run the `modev` binary against temporary projects.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// A temporary project with a `pyproject.toml` naming the package `demo`.
struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            temp_dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n",
        )
        .expect("Failed to write pyproject.toml");
        Self { temp_dir }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn notebook(&self, name: &str, source: &str) {
        let dir = self.root().join("nbs");
        fs::create_dir_all(&dir).expect("Failed to create nbs");
        fs::write(dir.join(name), source).expect("Failed to write notebook");
    }

    fn output(&self, name: &str) -> PathBuf {
        self.root().join("src").join("demo").join(name)
    }
}

fn modev() -> Command {
    Command::cargo_bin("modev").expect("Failed to find modev binary")
}

fn core_notebook() -> String {
    r#"import marimo

__generated_with = "0.12.8"
app = marimo.App(width="medium")


@app.cell
def _():
    #| default_exp core
    return


@app.cell
def _():
    import marimo as mo
    return (mo,)


@app.cell
def _():
    #| export
    def hello() -> str:
        return "Hello from modev!"
    return (hello,)


if __name__ == "__main__":
    app.run()
"#
    .to_string()
}

// =============================================================================
// modev export Tests
// =============================================================================

#[test]
fn test_export_writes_module() {
    let project = TestProject::new();
    project.notebook("core.py", &core_notebook());

    modev()
        .current_dir(project.root())
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"))
        .stdout(predicate::str::contains("1 of 1 notebooks (1 processed, 0 skipped, 0 failed)"))
        .stdout(predicate::str::contains("default_exp core.py"));

    let output = fs::read_to_string(project.output("core.py")).expect("Failed to read output");
    assert!(output.starts_with("__all__ = ['hello']\n\n# Exported from nbs/core.py (cell ID: "));
    assert!(output.contains("def hello() -> str:"));
}

#[test]
fn test_export_with_root_flag() {
    let project = TestProject::new();
    project.notebook("core.py", &core_notebook());

    modev()
        .args(["export", "--root", project.root().to_str().unwrap()])
        .assert()
        .success();

    assert!(project.output("core.py").is_file());
}

#[test]
fn test_export_dir_override() {
    let project = TestProject::new();
    project.notebook("core.py", &core_notebook());

    modev()
        .current_dir(project.root())
        .args(["export", "--export-dir", "lib"])
        .assert()
        .success();

    assert!(project.root().join("lib").join("core.py").is_file());
    assert!(!project.output("core.py").exists());
}

#[test]
fn test_export_missing_notebooks_dir_fails() {
    let project = TestProject::new();

    modev()
        .current_dir(project.root())
        .arg("export")
        .assert()
        .failure()
        .stderr(predicate::str::contains("notebooks directory"))
        .stderr(predicate::str::contains("modev init"));
}

#[test]
fn test_export_continues_past_broken_notebook() {
    let project = TestProject::new();
    project.notebook("a_broken.py", "this is not a marimo notebook\n");
    project.notebook("core.py", &core_notebook());

    modev()
        .current_dir(project.root())
        .arg("export")
        .assert()
        .success()
        .stderr(predicate::str::contains("a_broken.py"))
        .stdout(predicate::str::contains("1 failed"));

    assert!(project.output("core.py").is_file());
}

// =============================================================================
// modev init Tests
// =============================================================================

#[test]
fn test_init_creates_config_and_notebooks_dir() {
    let project = TestProject::new();

    modev()
        .current_dir(project.root())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let config = fs::read_to_string(project.root().join("modev.yaml")).expect("Failed to read config");
    assert!(config.contains("notebooks_dir: nbs"));
    assert!(config.contains("export_dir: src/demo"));
    assert!(project.root().join("nbs").is_dir());
}

#[test]
fn test_init_keeps_existing_config() {
    let project = TestProject::new();
    fs::write(project.root().join("modev.yaml"), "export_dir: lib\n").unwrap();

    modev()
        .args(["init", "--root", project.root().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Keeping existing"));

    assert_eq!(
        fs::read_to_string(project.root().join("modev.yaml")).unwrap(),
        "export_dir: lib\n"
    );
}

#[test]
fn test_init_then_export() {
    let project = TestProject::new();

    modev().current_dir(project.root()).arg("init").assert().success();
    project.notebook("core.py", &core_notebook());
    modev().current_dir(project.root()).arg("export").assert().success();

    assert!(project.output("core.py").is_file());
}
