//! Configuration parsing for `[tool.rcollect]` in pyproject.toml

use crate::collection::error::{CollectionError, CollectionResult};
use log::debug;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Files or directories whose presence marks a project root.
const PROJECT_MARKERS: [&str; 3] = ["pyproject.toml", ".git", ".hg"];

/// Settings from the `[tool.rcollect]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Search roots, relative to the project root
    #[serde(deserialize_with = "one_or_many")]
    pub path: Vec<PathBuf>,
    /// Exclusion patterns
    pub exclude: Vec<String>,
    /// Free-text query
    pub search: Option<String>,
    /// Tag expression
    pub tags: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    rcollect: CollectConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// Read configuration from `<root_path>/pyproject.toml`. A missing file
/// yields the defaults.
pub fn read_collect_config(root_path: &Path) -> CollectionResult<CollectConfig> {
    let pyproject_path = root_path.join("pyproject.toml");

    if !pyproject_path.exists() {
        debug!("No pyproject.toml found at {pyproject_path:?}");
        return Ok(CollectConfig::default());
    }

    read_collect_config_file(&pyproject_path)
}

/// Read configuration from an explicit pyproject.toml file.
pub fn read_collect_config_file(pyproject_path: &Path) -> CollectionResult<CollectConfig> {
    let content = std::fs::read_to_string(pyproject_path).map_err(|e| {
        CollectionError::ConfigError(format!("failed to read {}: {e}", pyproject_path.display()))
    })?;

    let pyproject: PyProject = toml::from_str(&content).map_err(|e| {
        CollectionError::ConfigError(format!("failed to parse {}: {e}", pyproject_path.display()))
    })?;

    debug!(
        "Loaded [tool.rcollect] from {}: {:?}",
        pyproject_path.display(),
        pyproject.tool.rcollect
    );
    Ok(pyproject.tool.rcollect)
}

/// Locate the project root for a set of search paths.
///
/// Starts at the deepest directory shared by all `paths` (relative paths
/// are taken from `cwd`) and walks upward to the first directory holding a
/// project marker. Without a marker, the shared directory itself is used.
pub fn find_project_root(paths: &[PathBuf], cwd: &Path) -> PathBuf {
    let absolute: Vec<PathBuf> = if paths.is_empty() {
        vec![cwd.to_path_buf()]
    } else {
        paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { cwd.join(p) })
            .collect()
    };

    let common = common_ancestor(&absolute);
    let start = if common.is_file() {
        common.parent().map(Path::to_path_buf).unwrap_or(common)
    } else {
        common
    };

    for dir in start.ancestors() {
        if PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            debug!("Project root: {}", dir.display());
            return dir.to_path_buf();
        }
    }

    start
}

fn common_ancestor(paths: &[PathBuf]) -> PathBuf {
    let mut common: Vec<Component<'_>> = match paths.first() {
        Some(first) => first.components().collect(),
        None => return PathBuf::new(),
    };

    for path in &paths[1..] {
        let shared = common
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }

    common.iter().collect()
}
