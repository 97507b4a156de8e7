//! Command-line arguments and exit codes for the `rcollect` binary.

use crate::collection_integration::CollectionOptions;
use crate::config::CollectConfig;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Exit codes for the CLI.
pub mod exit_codes {
    /// Tests were selected and every module imported cleanly.
    pub const OK: i32 = 0;
    /// Some test modules could not be imported.
    pub const COLLECTION_ERRORS: i32 = 1;
    /// Bad configuration, pattern, tag expression or path.
    pub const USAGE_ERROR: i32 = 4;
    /// Nothing matched.
    pub const NO_TESTS_SELECTED: i32 = 5;
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to search for test modules
    pub paths: Vec<PathBuf>,

    /// Glob pattern of paths to leave out (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Select tests whose name, description or source contains this text
    #[arg(long, short)]
    pub search: Option<String>,

    /// Select tests by tag expression, e.g. "unit and not slow"
    #[arg(long, short)]
    pub tags: Option<String>,

    /// pyproject.toml to read settings from, instead of the project root's
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the selected tests as JSON
    #[arg(long)]
    pub json: bool,

    /// More log output (repeat for more)
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    /// Search paths given on the command line, made absolute against `cwd`.
    pub fn absolute_paths(&self, cwd: &Path) -> Vec<PathBuf> {
        self.paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { cwd.join(p) })
            .collect()
    }

    /// Combine command-line values with file configuration. Command-line
    /// paths, query and tags replace the configured ones; exclusions from
    /// both sources apply.
    pub fn collection_options(&self, config: CollectConfig, cwd: &Path) -> CollectionOptions {
        let paths = if self.paths.is_empty() {
            config.path
        } else {
            self.absolute_paths(cwd)
        };

        let mut exclude = config.exclude;
        exclude.extend(self.exclude.iter().cloned());

        CollectionOptions {
            paths,
            exclude,
            search: self.search.clone().or(config.search),
            tags: self.tags.clone().or(config.tags),
        }
    }
}
