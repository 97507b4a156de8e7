//! Collection error types.

use std::fmt;
use std::path::PathBuf;

/// Result type for collection operations
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Collection-specific errors
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum CollectionError {
    IoError(std::io::Error),
    InvalidExcludePattern { pattern: String, reason: String },
    MalformedTagExpression { expression: String, reason: String },
    ModuleNotFound(String),
    ImportError(String),
    ConfigError(String),
    FileNotFound(PathBuf),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::InvalidExcludePattern { pattern, reason } => {
                write!(f, "invalid exclude pattern '{pattern}': {reason}")
            }
            Self::MalformedTagExpression { expression, reason } => {
                write!(f, "malformed tag expression '{expression}': {reason}")
            }
            Self::ModuleNotFound(name) => write!(f, "module '{name}' could not be located"),
            Self::ImportError(e) => write!(f, "Import error: {e}"),
            Self::ConfigError(e) => write!(f, "Config error: {e}"),
            Self::FileNotFound(path) => {
                write!(f, "file or directory not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CollectionError {
    fn from(err: std::io::Error) -> Self {
        CollectionError::IoError(err)
    }
}
