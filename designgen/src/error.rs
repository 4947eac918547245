//! Error types for the generation pipeline.
//!
//! Fatal errors ([`SchemaError`], [`CyclicDependencyError`], store and write
//! failures) abort a run through [`PipelineError`]. Recoverable conditions
//! (naming collisions, manual edit conflicts) are never raised; they are
//! collected in the run report instead. Hook failures are partial: they are
//! reported through [`HookExecutionError`] after files have been written.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input documents are malformed or cross-referentially invalid.
    #[error("Schema validation failed: {0}")]
    Schema(#[from] SchemaError),

    /// The component catalog contains a reference cycle.
    #[error(transparent)]
    Cycle(#[from] CyclicDependencyError),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error reading or persisting the registry or generation state.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error writing generated artifacts.
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),

    /// An input document could not be read.
    #[error("Failed to read input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A validation failure in the catalog or token document.
///
/// `path` names the offending field, e.g. `catalog[0].properties[1].default`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct SchemaError {
    /// Field path of the offending value.
    pub path: String,

    /// Human-readable description of the problem.
    pub message: String,
}

/// A cycle among `componentRef` children.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circular dependency detected: {}", .cycle.join(" -> "))]
pub struct CyclicDependencyError {
    /// Participating entries, with the first entry repeated at the end.
    pub cycle: Vec<String>,
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error reading or writing one of the persistent stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read a store file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store file exists but is not valid.
    #[error("Corrupt store {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// Failed to persist a store file.
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error writing output files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to create directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an existing artifact.
    #[error("Failed to read existing file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove file.
    #[error("Failed to remove file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A post-generation hook that did not complete successfully.
#[derive(Debug, Error)]
pub enum HookExecutionError {
    /// The hook process could not be started.
    #[error("Hook '{hook}' could not be started: {source}")]
    Spawn {
        hook: String,
        #[source]
        source: std::io::Error,
    },

    /// The hook exited unsuccessfully.
    #[error("Hook '{hook}' failed with {}", describe_exit(*.code))]
    Failed { hook: String, code: Option<i32> },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl SchemaError {
    /// Create a schema error at the given field path.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl StoreError {
    /// Create a corrupt store error.
    pub fn corrupt(path: PathBuf, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path,
            message: message.into(),
        }
    }
}

impl HookExecutionError {
    /// Name of the hook that failed.
    pub fn hook(&self) -> &str {
        match self {
            Self::Spawn { hook, .. } | Self::Failed { hook, .. } => hook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_includes_path() {
        let err = SchemaError::new("catalog[0].properties[1].default", "not in allowed set");
        assert_eq!(
            err.to_string(),
            "catalog[0].properties[1].default: not in allowed set"
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = CyclicDependencyError {
            cycle: vec!["X".into(), "Y".into(), "X".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: X -> Y -> X");
    }

    #[test]
    fn test_hook_error_display() {
        let err = HookExecutionError::Failed {
            hook: "format".into(),
            code: Some(3),
        };
        assert_eq!(err.to_string(), "Hook 'format' failed with exit code 3");
        assert_eq!(err.hook(), "format");
    }

    #[test]
    fn test_pipeline_error_from_schema() {
        let err: PipelineError = SchemaError::new("tokens.colors[0].name", "duplicate").into();
        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
