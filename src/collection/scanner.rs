//! Module scanning under one or more search roots.
//!
//! Roots are walked in the order given, each in file-name order, so a fixed
//! directory tree always produces the same sequence. A root that is equal to
//! or nested inside an earlier root is dropped, and a walk never descends
//! into a directory that is itself one of the other roots.

use super::containment::handled_within;
use super::error::{CollectionError, CollectionResult};
use super::exclude::{exclude_path, ExcludePattern};
use super::types::{DirectoryFinder, ModuleDescriptor};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

type Walker = Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>;

/// Returns true if the module's simple name follows the test naming
/// convention: exactly `test`, or `test` followed by a non-alphanumeric
/// character (`test_apples`, `test-apples`).
pub fn is_test_module(module: &ModuleDescriptor) -> bool {
    is_test_module_name(module.simple_name())
}

pub fn is_test_module_name(name: &str) -> bool {
    match name.strip_prefix("test") {
        Some(rest) => rest.chars().next().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}

/// Scan `roots` for Python modules.
pub fn scan<I, P>(roots: I) -> ModuleScan
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    ModuleScan::new(roots, Vec::new())
}

/// Lazy sequence of the modules found under a set of search roots.
///
/// Walk failures (an unreadable directory, a missing root) are yielded as
/// `Err` items in place; the scan carries on with the next entry.
pub struct ModuleScan {
    roots: Arc<Vec<PathBuf>>,
    excludes: Arc<Vec<ExcludePattern>>,
    pending: std::vec::IntoIter<PathBuf>,
    walker: Option<Walker>,
}

impl ModuleScan {
    /// Scan `roots`, pruning directories that match `excludes`.
    pub fn new<I, P>(roots: I, excludes: Vec<ExcludePattern>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = accept_roots(roots.into_iter().map(Into::into));
        Self {
            pending: roots.clone().into_iter(),
            roots: Arc::new(roots),
            excludes: Arc::new(excludes),
            walker: None,
        }
    }

    /// Roots that will actually be walked, after overlap removal.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn walk(&self, root: &Path) -> Walker {
        let roots = Arc::clone(&self.roots);
        let excludes = Arc::clone(&self.excludes);

        Box::new(
            WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(move |entry| should_descend(entry, &roots, &excludes)),
        )
    }
}

impl Iterator for ModuleScan {
    type Item = CollectionResult<ModuleDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(walker) = self.walker.as_mut() {
                match walker.next() {
                    Some(Ok(entry)) => {
                        if entry.file_type().is_file() && is_python_file(entry.path()) {
                            return Some(Ok(describe_module(entry.path())));
                        }
                    }
                    Some(Err(e)) => return Some(Err(walk_error(e))),
                    None => self.walker = None,
                }
                continue;
            }

            let root = self.pending.next()?;
            debug!("Scanning search root {}", root.display());
            self.walker = Some(self.walk(&root));
        }
    }
}

fn accept_roots(roots: impl Iterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut accepted: Vec<PathBuf> = Vec::new();

    for root in roots {
        if accepted.contains(&root) || handled_within(&root, &accepted) {
            debug!("Search root {} is already covered", root.display());
            continue;
        }
        accepted.push(root);
    }

    accepted
}

fn should_descend(entry: &DirEntry, roots: &[PathBuf], excludes: &[ExcludePattern]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }

    let name = entry.file_name().to_string_lossy();
    if name == "__pycache__" || name.starts_with('.') {
        return false;
    }

    if roots.iter().any(|root| root.as_path() == entry.path()) {
        return false;
    }

    if exclude_path(entry.path(), excludes) {
        debug!("Pruning excluded directory {}", entry.path().display());
        return false;
    }

    true
}

fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

/// Build the descriptor for a module file: its dotted name is prefixed by
/// every enclosing directory that is a package.
fn describe_module(path: &Path) -> ModuleDescriptor {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut parts = package_parts(dir);

    if stem == "__init__" {
        if parts.is_empty() {
            parts.push(stem);
        }
        let finder = DirectoryFinder::new(dir.parent().unwrap_or_else(|| Path::new("")));
        return ModuleDescriptor::new(parts.join("."), true, Arc::new(finder));
    }

    parts.push(stem);
    ModuleDescriptor::new(parts.join("."), false, Arc::new(DirectoryFinder::new(dir)))
}

fn package_parts(dir: &Path) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = Some(dir);

    while let Some(d) = current {
        if !d.join("__init__.py").is_file() {
            break;
        }
        match d.file_name() {
            Some(name) => parts.push(name.to_string_lossy().into_owned()),
            None => break,
        }
        current = d.parent();
    }

    parts.reverse();
    parts
}

fn walk_error(err: walkdir::Error) -> CollectionError {
    let missing_root = err.depth() == 0
        && err
            .io_error()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound);

    if missing_root {
        if let Some(path) = err.path() {
            return CollectionError::FileNotFound(path.to_path_buf());
        }
    }

    CollectionError::IoError(err.into())
}
