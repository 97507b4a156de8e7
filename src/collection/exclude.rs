//! Glob-style path exclusion.
//!
//! A pattern is split on `/` into segments. `**` as a whole segment matches
//! zero or more path segments; every other segment is a glob matched against
//! exactly one path segment, so `*` never crosses a separator. Relative
//! patterns are anchored at the end of the path: `to/*.py` excludes any
//! `.py` file whose parent directory is named `to`, and `*` on its own
//! matches every non-empty path. Patterns starting with `/` must match the
//! whole of an absolute path.

use super::error::{CollectionError, CollectionResult};
use super::types::{get_module_path, ModuleDescriptor};
use glob::{MatchOptions, Pattern};
use log::debug;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

const SEGMENT_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
enum Segment {
    Recursive,
    Glob(Pattern),
}

/// A compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct ExcludePattern {
    raw: String,
    anchored: bool,
    segments: Vec<Segment>,
}

impl ExcludePattern {
    pub fn new(pattern: &str) -> CollectionResult<Self> {
        let invalid = |reason: String| CollectionError::InvalidExcludePattern {
            pattern: pattern.to_string(),
            reason,
        };

        let anchored = pattern.starts_with('/');
        let mut segments = Vec::new();

        for part in pattern.split('/') {
            if part.is_empty() || part == "." {
                continue;
            }

            if part == "**" {
                if !matches!(segments.last(), Some(Segment::Recursive)) {
                    segments.push(Segment::Recursive);
                }
                continue;
            }

            let glob = Pattern::new(&collapse_stars(part)).map_err(|e| invalid(e.msg.to_string()))?;
            segments.push(Segment::Glob(glob));
        }

        if segments.is_empty() {
            return Err(invalid("pattern has no path segments".into()));
        }

        Ok(Self {
            raw: pattern.to_string(),
            anchored,
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        let (absolute, parts) = split_path(path);

        if self.anchored {
            return absolute && match_segments(&self.segments, &parts);
        }

        (0..=parts.len()).any(|start| match_segments(&self.segments, &parts[start..]))
    }

    /// Match against a dotted module name, treated as a single segment.
    fn matches_name(&self, name: &str) -> bool {
        !self.anchored && match_segments(&self.segments, &[name.to_string()])
    }
}

impl FromStr for ExcludePattern {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ExcludePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compile every pattern up front so a bad one fails before any scanning.
pub fn compile_excludes<S: AsRef<str>>(patterns: &[S]) -> CollectionResult<Vec<ExcludePattern>> {
    patterns
        .iter()
        .map(|p| ExcludePattern::new(p.as_ref()))
        .collect()
}

/// Returns true if `path` matches any of `excludes`.
pub fn exclude_path(path: &Path, excludes: &[ExcludePattern]) -> bool {
    excludes.iter().any(|pattern| pattern.matches_path(path))
}

/// Returns true if the module's resolved path, or its dotted name, matches
/// any of `excludes`.
pub fn is_excluded_module(module: &ModuleDescriptor, excludes: &[ExcludePattern]) -> bool {
    if excludes.iter().any(|pattern| pattern.matches_name(module.name())) {
        return true;
    }

    match get_module_path(module) {
        Ok(path) => exclude_path(&path, excludes),
        Err(e) => {
            debug!("Matching {} by name only: {e}", module.name());
            false
        }
    }
}

/// Drop every path matching one of `excludes`, keeping the order of the rest.
///
/// Directories are judged by their own path only; a directory survives even
/// when some of its contents would be excluded.
pub fn remove_excluded_paths<I, P>(paths: I, excludes: &[ExcludePattern]) -> Vec<P>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .filter(|path| !exclude_path(path.as_ref(), excludes))
        .collect()
}

fn collapse_stars(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

fn split_path(path: &Path) -> (bool, Vec<String>) {
    let mut absolute = false;
    let mut parts = Vec::new();

    for component in path.components() {
        match component {
            Component::RootDir => absolute = true,
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
            Component::ParentDir => parts.push("..".into()),
            Component::CurDir | Component::Prefix(_) => {}
        }
    }

    (absolute, parts)
}

fn match_segments(segments: &[Segment], parts: &[String]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        Some((Segment::Recursive, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match parts.split_first() {
            Some((first, tail)) => {
                glob.matches_with(first, SEGMENT_OPTIONS) && match_segments(rest, tail)
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::types::ModuleFinder;
    use std::path::PathBuf;
    use std::sync::Arc;

    const PATH: &str = "path/to/test_mod.py";

    #[derive(Debug)]
    struct StubModuleFinder;

    impl ModuleFinder for StubModuleFinder {
        fn find_module(&self, _simple_name: &str) -> Option<PathBuf> {
            Some(PathBuf::from(PATH))
        }
    }

    fn test_module() -> ModuleDescriptor {
        ModuleDescriptor::new("test_mod", false, Arc::new(StubModuleFinder))
    }

    fn excludes(patterns: &[&str]) -> Vec<ExcludePattern> {
        compile_excludes(patterns).unwrap()
    }

    #[test]
    fn test_is_excluded_module_true() {
        let module = test_module();
        for pattern in ["*", "*/**.py", PATH, "**/test_mod.py", "path/to/*", "path/*/*.py"] {
            assert!(
                is_excluded_module(&module, &excludes(&[pattern])),
                "{PATH} should be excluded by {pattern:?}"
            );
        }
    }

    #[test]
    fn test_is_excluded_module_false() {
        let module = test_module();
        for pattern in ["abc", "path/to"] {
            assert!(
                !is_excluded_module(&module, &excludes(&[pattern])),
                "{PATH} should not be excluded by {pattern:?}"
            );
        }
    }

    #[test]
    fn test_is_excluded_module_by_dotted_name() {
        let module = ModuleDescriptor::new("pkg.test_mod", false, Arc::new(StubModuleFinder));
        assert!(is_excluded_module(&module, &excludes(&["pkg.test_*"])));
    }

    #[test]
    fn test_remove_excluded_paths() {
        let paths = vec![PathBuf::from("/a/b/c.py"), PathBuf::from("/a/b/")];
        let kept = remove_excluded_paths(paths.clone(), &excludes(&["**/*.py"]));
        assert_eq!(kept, vec![paths[1].clone()]);
    }

    #[test]
    fn test_remove_excluded_paths_preserves_order() {
        let paths = ["z/test_z.py", "a/keep.txt", "m/test_m.py", "b/keep.rs"];
        let kept = remove_excluded_paths(paths, &excludes(&["test_*.py"]));
        assert_eq!(kept, vec!["a/keep.txt", "b/keep.rs"]);
    }

    #[test]
    fn test_single_star_stays_within_a_segment() {
        let pattern = ExcludePattern::new("path/*.py").unwrap();
        assert!(pattern.matches_path(Path::new("path/x.py")));
        assert!(!pattern.matches_path(Path::new("path/to/x.py")));
    }

    #[test]
    fn test_double_star_matches_zero_segments() {
        let pattern = ExcludePattern::new("path/**/x.py").unwrap();
        assert!(pattern.matches_path(Path::new("path/x.py")));
        assert!(pattern.matches_path(Path::new("path/a/b/c/x.py")));
        assert!(!pattern.matches_path(Path::new("path/a/y.py")));
    }

    #[test]
    fn test_anchored_pattern_requires_absolute_path() {
        let pattern = ExcludePattern::new("/a/b/*.py").unwrap();
        assert!(pattern.matches_path(Path::new("/a/b/c.py")));
        assert!(!pattern.matches_path(Path::new("a/b/c.py")));
        assert!(!pattern.matches_path(Path::new("/x/a/b/c.py")));
    }

    #[test]
    fn test_directory_pattern_matches_directory_itself() {
        let pattern = ExcludePattern::new("venv").unwrap();
        assert!(pattern.matches_path(Path::new("/proj/venv")));
        assert!(!pattern.matches_path(Path::new("/proj/venv/lib/test_x.py")));
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        let err = ExcludePattern::new("tests/[abc").unwrap_err();
        assert!(matches!(
            err,
            CollectionError::InvalidExcludePattern { ref pattern, .. } if pattern == "tests/[abc"
        ));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        for pattern in ["", "/", "./"] {
            assert!(ExcludePattern::new(pattern).is_err(), "{pattern:?}");
        }
    }

    #[test]
    fn test_compile_excludes_stops_at_first_bad_pattern() {
        assert!(compile_excludes(&["ok/*", "[", "fine"]).is_err());
        assert_eq!(compile_excludes(&["ok/*", "fine"]).unwrap().len(), 2);
    }

    #[test]
    fn test_display_round_trips_raw_text() {
        let pattern: ExcludePattern = "**/test_*.py".parse().unwrap();
        assert_eq!(pattern.to_string(), "**/test_*.py");
        assert_eq!(pattern.as_str(), "**/test_*.py");
    }
}
