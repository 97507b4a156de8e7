//! Test module discovery and test selection for Python projects.
//!
//! Discovery walks the search roots for modules named like tests, drops the
//! ones matched by exclusion patterns, and reads each module's `@test`
//! functions. Selection then narrows those tests by a free-text query and a
//! boolean tag expression.

pub mod cli;
pub mod collection;
pub mod collection_integration;
pub mod config;
pub mod logging;
pub mod python_discovery;
pub mod tag_expression;

pub use collection::{
    handled_within, is_excluded_module, is_test_module, remove_excluded_paths, scan,
    search_generally, CollectionError, CollectionResult, Exhausted, ExcludePattern,
    ModuleDescriptor, Test, TestFunction,
};
pub use collection_integration::{
    collect_and_select, display_collection_results, tests_to_json, CollectionErrors,
    CollectionOptions, ModuleImporter, Session,
};
pub use python_discovery::SourceImporter;
pub use tag_expression::{TagExpression, TagMatcher};
