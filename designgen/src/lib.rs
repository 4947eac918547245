//! # designgen
//!
//! Generates typed design-token modules and component stubs from a design
//! tool export, and keeps them in sync with hand-written code across runs.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`loader`] - Catalog and token document parsing and validation
//! - [`model`] - Validated catalog and token types
//! - [`naming`] - External names to code identifiers
//! - [`registry`] - Persistent naming registry
//! - [`graph`] - Component dependency graph and build order
//! - [`resolver`] - Token binding resolution and coverage
//! - [`emit`] - Token module, stub, story and manifest rendering
//! - [`artifact`] - Generated/preserved region model
//! - [`merge`] - Merge policy against previously generated files
//! - [`writer`] - File output and dry-run support
//! - [`hooks`] - Post-generation hook execution
//! - [`pipeline`] - Stage orchestration
//! - [`config`] - Configuration management and TOML parsing
//! - [`error`] - Error types and handling

pub mod artifact;
pub mod config;
pub mod emit;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod loader;
pub mod merge;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod resolver;
mod state;
pub mod writer;

// Re-export main types for convenience
pub use config::{CliArgs, Config, ConfigManager};
pub use error::{
    CyclicDependencyError, HookExecutionError, PipelineError, PipelineResult, SchemaError,
};
pub use hooks::{HookRunner, HookStatus, ProcessHookRunner};
pub use loader::{load_documents, load_files, DesignExport};
pub use merge::{ConflictReason, ManualEditConflict, MergeAction};
pub use naming::NamingCollision;
pub use pipeline::{remove_component, Pipeline, Removal, RunReport, Stores};
pub use registry::{AliasRegistry, NamingAlias};
