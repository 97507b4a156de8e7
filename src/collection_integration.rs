//! Wiring of the collection pipeline: scan, exclude, import, search.

use crate::collection::error::{CollectionError, CollectionResult};
use crate::collection::exclude::{compile_excludes, is_excluded_module, ExcludePattern};
use crate::collection::scanner::{is_test_module, ModuleScan};
use crate::collection::search::{search_generally, TestSearch};
use crate::collection::types::{ModuleDescriptor, Test};
use crate::tag_expression::{TagExpression, TagMatcher};
use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Turns a module descriptor into the tests it declares.
///
/// Stands in for importing the module: the collection core never loads
/// code itself.
pub trait ModuleImporter {
    fn import_tests(&self, module: &ModuleDescriptor) -> CollectionResult<Vec<Test>>;
}

/// Holds errors encountered during collection
#[derive(Debug, Default)]
pub struct CollectionErrors {
    pub errors: Vec<(String, CollectionError)>,
}

impl CollectionErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// Raw, unvalidated inputs for a collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Search roots; relative entries are resolved against the project root.
    pub paths: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
}

/// A validated collection run.
///
/// Construction compiles exclusion patterns and parses the tag expression,
/// so configuration mistakes surface before any directory is read.
#[derive(Debug)]
pub struct Session {
    pub rootpath: PathBuf,
    roots: Vec<PathBuf>,
    excludes: Vec<ExcludePattern>,
    query: Option<String>,
    tag_expr: Option<TagExpression>,
}

impl Session {
    pub fn new(rootpath: PathBuf, options: CollectionOptions) -> CollectionResult<Self> {
        let excludes = compile_excludes(&options.exclude)?;
        let tag_expr = options
            .tags
            .as_deref()
            .map(TagExpression::from_text)
            .transpose()?;

        let paths = if options.paths.is_empty() {
            vec![rootpath.clone()]
        } else {
            options.paths
        };
        let roots = paths
            .iter()
            .map(|path| resolve_root(&rootpath, path))
            .collect::<CollectionResult<Vec<_>>>()?;

        debug!("Session roots: {roots:?}, excludes: {:?}", options.exclude);

        Ok(Self {
            rootpath,
            roots,
            excludes,
            query: options.search,
            tag_expr,
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lazily yield every test module under the roots that survives the
    /// exclusion patterns.
    pub fn modules(&self) -> impl Iterator<Item = CollectionResult<ModuleDescriptor>> + '_ {
        ModuleScan::new(self.roots.iter().cloned(), self.excludes.clone()).filter(|result| {
            match result {
                Ok(module) => is_test_module(module) && !self.is_excluded(module),
                Err(_) => true,
            }
        })
    }

    fn is_excluded(&self, module: &ModuleDescriptor) -> bool {
        let excluded = is_excluded_module(module, &self.excludes);
        if excluded {
            debug!("Excluding module {}", module.name());
        }
        excluded
    }

    /// Import every test module. A module that fails to import is recorded
    /// and the remaining modules are still imported.
    pub fn collect_tests(&self, importer: &dyn ModuleImporter) -> (Vec<Test>, CollectionErrors) {
        let mut tests = Vec::new();
        let mut errors = CollectionErrors::default();

        for result in self.modules() {
            let module = match result {
                Ok(module) => module,
                Err(e) => {
                    warn!("Scan error: {e}");
                    errors.errors.push(("<scan>".to_string(), e));
                    continue;
                }
            };

            match importer.import_tests(&module) {
                Ok(mut module_tests) => {
                    debug!("{}: {} tests", module.name(), module_tests.len());
                    tests.append(&mut module_tests);
                }
                Err(e) => {
                    warn!("Failed to import {}: {e}", module.name());
                    errors.errors.push((module.name().to_string(), e));
                }
            }
        }

        (tests, errors)
    }

    /// Narrow `tests` by the session's query and tag expression.
    pub fn select<'a>(&'a self, tests: &'a [Test]) -> TestSearch<'a, std::slice::Iter<'a, Test>> {
        search_generally(
            tests,
            self.query.as_deref(),
            self.tag_expr.as_ref().map(|e| e as &dyn TagMatcher),
        )
    }
}

fn resolve_root(rootpath: &Path, path: &Path) -> CollectionResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        rootpath.join(path)
    };

    joined.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CollectionError::FileNotFound(joined.clone()),
        _ => CollectionError::IoError(e),
    })
}

/// Run collection and selection under `rootpath`, returning the selected
/// tests and any per-module errors.
pub fn collect_and_select(
    rootpath: PathBuf,
    options: CollectionOptions,
    importer: &dyn ModuleImporter,
) -> CollectionResult<(Vec<Test>, CollectionErrors)> {
    let session = Session::new(rootpath, options)?;
    let (tests, errors) = session.collect_tests(importer);
    let selected = session.select(&tests).cloned().collect();
    Ok((selected, errors))
}

/// Serializable summary of a selected test
#[derive(Debug, Serialize)]
pub struct TestRecord<'a> {
    pub id: String,
    pub module: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub tags: Vec<&'a str>,
    pub path: Option<&'a Path>,
    pub line: Option<usize>,
}

impl<'a> From<&'a Test> for TestRecord<'a> {
    fn from(test: &'a Test) -> Self {
        Self {
            id: test.qualified_name(),
            module: test.module_name(),
            name: test.name(),
            description: test.description(),
            tags: test.tags().iter().map(String::as_str).collect(),
            path: test.location().map(|l| l.path.as_path()),
            line: test.location().and_then(|l| l.line),
        }
    }
}

/// Render the selected tests as a JSON array
pub fn tests_to_json(tests: &[Test]) -> serde_json::Result<String> {
    let records: Vec<TestRecord<'_>> = tests.iter().map(TestRecord::from).collect();
    serde_json::to_string_pretty(&records)
}

/// Display collection results
pub fn display_collection_results(tests: &[Test], errors: &CollectionErrors) {
    // ANSI color codes
    const RED: &str = "\x1b[31m";
    const BOLD_RED: &str = "\x1b[1;31m";
    const RESET: &str = "\x1b[0m";

    if !errors.is_empty() {
        println!(
            "===================================== ERRORS ======================================"
        );
        for (name, error) in &errors.errors {
            println!("{BOLD_RED}_ ERROR collecting {name} _{RESET}");
            println!("{RED}E   {error}{RESET}");
        }
    }

    let item_count = tests.len();
    let error_count = errors.len();

    if item_count == 0 && error_count == 0 {
        println!("No tests selected.");
        return;
    }

    let mut summary_parts = Vec::new();
    if item_count > 0 {
        summary_parts.push(format!(
            "selected {} test{}",
            item_count,
            if item_count == 1 { "" } else { "s" }
        ));
    }
    if error_count > 0 {
        summary_parts.push(format!(
            "{} error{}",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    }
    println!("{}", summary_parts.join(" / "));

    if !tests.is_empty() {
        println!();
        for test in tests {
            println!("  {}", format_test_line(test));
        }
    }
}

fn format_test_line(test: &Test) -> String {
    let mut line = test.qualified_name();

    if let Some(location) = test.location() {
        match location.line {
            Some(n) => line.push_str(&format!(" ({}:{n})", location.path.display())),
            None => line.push_str(&format!(" ({})", location.path.display())),
        }
    }
    if let Some(description) = test.description() {
        line.push_str(&format!(": {description}"));
    }

    line
}
