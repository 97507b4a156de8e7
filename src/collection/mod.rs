//! Test collection and selection.
//!
//! Scanning finds candidate modules under the search roots, exclusion
//! patterns drop unwanted ones, and search narrows imported tests down by
//! query and tag expression.

pub mod containment;
pub mod error;
pub mod exclude;
pub mod scanner;
pub mod search;
pub mod types;

pub use containment::handled_within;
pub use error::{CollectionError, CollectionResult};
pub use exclude::{
    compile_excludes, exclude_path, is_excluded_module, remove_excluded_paths, ExcludePattern,
};
pub use scanner::{is_test_module, scan, ModuleScan};
pub use search::{search_generally, Exhausted, TestSearch};
pub use types::{
    get_module_path, DirectoryFinder, Location, ModuleDescriptor, ModuleFinder, Test,
    TestFunction,
};
