//! Containment checks between module paths and search roots.

use std::path::Path;

/// Returns true if `module_path` lies beneath at least one of `search_paths`.
///
/// Containment is a proper directory-ancestor relationship compared
/// component by component: a search path equal to the module path itself
/// does not contain it, and `/proj/tests` does not contain
/// `/proj/tests_extra/x.py`. The empty path and the filesystem root contain everything
/// beneath them. No filesystem access is performed.
pub fn handled_within<P: AsRef<Path>>(module_path: &Path, search_paths: &[P]) -> bool {
    search_paths
        .iter()
        .any(|search_path| is_proper_ancestor(search_path.as_ref(), module_path))
}

fn is_proper_ancestor(ancestor: &Path, path: &Path) -> bool {
    path.starts_with(ancestor) && path.components().ne(ancestor.components())
}
