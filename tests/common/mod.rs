//! Common test utilities and helpers.

use indoc::indoc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Creates a temporary project with tagged ward-style test modules.
///
/// Layout:
///
/// ```text
/// test_project/
///   pyproject.toml
///   tests/
///     test_fruit.py        apples, bananas
///     test_veg.py          carrots (x2)
///     helpers.py           not a test module
///     fixtures/test_data.py
///     pkg/__init__.py
///     pkg/test_nested.py   untagged
/// ```
#[allow(dead_code)]
pub fn create_test_project() -> (TempDir, PathBuf) {
    let mut files = HashMap::new();

    files.insert("pyproject.toml", "[project]\nname = \"fruit\"\n");

    files.insert(
        "tests/test_fruit.py",
        indoc! {r#"
            from ward import test

            @test("apples are crunchy", tags=["apples"])
            def _():
                assert "crunch" in "crunchy"

            @test("bananas are yellow", tags=["bananas", "slow"])
            def bananas():
                assert "yellow" == "yellow"
        "#},
    );

    files.insert(
        "tests/test_veg.py",
        indoc! {r#"
            from ward import test

            @test("carrots are orange", tags=["carrots"])
            def _():
                colour = "orange"
                assert colour == "orange"

            @test("carrots grow underground", tags=["carrots", "slow"])
            def grow():
                assert True
        "#},
    );

    files.insert(
        "tests/helpers.py",
        indoc! {r#"
            @test("not collected", tags=["apples"])
            def helper():
                pass
        "#},
    );

    files.insert(
        "tests/fixtures/test_data.py",
        indoc! {r#"
            @test("fixture data", tags=["data"])
            def _():
                pass
        "#},
    );

    files.insert("tests/pkg/__init__.py", "");

    files.insert(
        "tests/pkg/test_nested.py",
        indoc! {r#"
            @test("nested without tags")
            def nested():
                basket = []
                assert basket == []
        "#},
    );

    create_test_project_with_files(files)
}

/// Creates a temporary directory with the given files.
///
/// Keys are paths relative to the project root, values are file contents.
/// The project lives in a `test_project` subdirectory so the temp dir's
/// own hidden name never takes part in scanning.
#[allow(dead_code)]
pub fn create_test_project_with_files(files: HashMap<&str, &str>) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project_path = temp_dir.path().join("test_project");
    fs::create_dir_all(&project_path).expect("Failed to create project directory");

    for (file_path, content) in files {
        let full_path = project_path.join(file_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file {file_path}: {e}"));
    }

    let project_path = project_path
        .canonicalize()
        .expect("Failed to canonicalize project path");
    (temp_dir, project_path)
}

/// Runs the rcollect binary in `project_path` with `args`.
#[allow(dead_code)]
pub fn run_rcollect(project_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rcollect"))
        .args(args)
        .current_dir(project_path)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute rcollect")
}

/// Qualified names of a list of tests, in order.
#[allow(dead_code)]
pub fn qualified_names(tests: &[rcollect::Test]) -> Vec<String> {
    tests.iter().map(|t| t.qualified_name()).collect()
}
