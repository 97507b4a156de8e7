//! Collection types: discovered tests and module descriptors.

use super::error::{CollectionError, CollectionResult};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Separator between a module's dotted name and a test's own name.
const QUALIFIED_NAME_SEPARATOR: &str = ".";

/// Location information for a test item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: Option<usize>,
}

/// The callable behind a test, reduced to the data the search engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFunction {
    name: String,
    source: String,
}

impl TestFunction {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full source text of the definition, decorators included.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A single discovered test case.
///
/// Built once by the import step and never mutated afterwards; every
/// accessor hands out shared references only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    function: TestFunction,
    module_name: String,
    description: Option<String>,
    tags: BTreeSet<String>,
    location: Option<Location>,
}

impl Test {
    pub fn new(function: TestFunction, module_name: impl Into<String>) -> Self {
        Self {
            function,
            module_name: module_name.into(),
            description: None,
            tags: BTreeSet::new(),
            location: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn function(&self) -> &TestFunction {
        &self.function
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn qualified_name(&self) -> String {
        format!(
            "{}{}{}",
            self.module_name,
            QUALIFIED_NAME_SEPARATOR,
            self.function.name()
        )
    }
}

/// Resolves a module's simple name to the file that backs it.
pub trait ModuleFinder: fmt::Debug + Send + Sync {
    fn find_module(&self, simple_name: &str) -> Option<PathBuf>;
}

/// Finder for modules that live directly inside one directory.
#[derive(Debug, Clone)]
pub struct DirectoryFinder {
    dir: PathBuf,
}

impl DirectoryFinder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ModuleFinder for DirectoryFinder {
    fn find_module(&self, simple_name: &str) -> Option<PathBuf> {
        // A package shadows a same-named module file.
        let init = self.dir.join(simple_name).join("__init__.py");
        if init.is_file() {
            return Some(init);
        }

        let file = self.dir.join(format!("{simple_name}.py"));
        file.is_file().then_some(file)
    }
}

/// A discoverable module, prior to import.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    name: String,
    is_package: bool,
    finder: Arc<dyn ModuleFinder>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, is_package: bool, finder: Arc<dyn ModuleFinder>) -> Self {
        Self {
            name: name.into(),
            is_package,
            finder,
        }
    }

    /// Dotted module name, e.g. `pkg.sub.test_mod`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final segment of the dotted name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_package(&self) -> bool {
        self.is_package
    }

    pub fn finder(&self) -> &dyn ModuleFinder {
        self.finder.as_ref()
    }
}

/// Resolve the filesystem path backing `module` through its finder.
pub fn get_module_path(module: &ModuleDescriptor) -> CollectionResult<PathBuf> {
    module
        .finder
        .find_module(module.simple_name())
        .ok_or_else(|| CollectionError::ModuleNotFound(module.name.clone()))
}
