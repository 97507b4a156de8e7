//! Static discovery of tests in Python test modules.

pub mod discovery;

pub use discovery::{discover_tests, SourceImporter, TestDiscovery};
