//! Unified error types for the energy hub workspace
//!
//! [`HubError`] covers every failure the model-construction engine can report:
//! malformed input bundles, configuration errors in the topology, per-entity
//! validation findings, and state errors such as asking for results before a
//! solve.
//!
//! # Example
//!
//! ```ignore
//! use ehub_core::{HubError, HubResult};
//!
//! fn construct(path: &str) -> HubResult<()> {
//!     let data = load_case(path)?;
//!     let mut hub = EnergyHub::new(data)?;
//!     hub.construct_model()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all energy hub operations.
#[derive(Error, Debug)]
pub enum HubError {
    /// I/O errors (case files, snapshots, exports)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Topology configuration errors (fail fast, nothing is built)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A node referenced by the input does not exist in the global node set
    #[error("Configuration error: the node '{0}' does not exist in the set of nodes")]
    UnknownNode(String),

    /// A technology referenced by name does not exist at the given node
    #[error("Unknown technology '{technology}' at node '{node}'")]
    UnknownTechnology { node: String, technology: String },

    /// Validation findings for one entity (technology, network, demand)
    #[error("Validation error in {entity}: {}", issues.join("; "))]
    Validation { entity: String, issues: Vec<String> },

    /// Requested behaviour is declared but not implemented
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Solver/bridge errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// The model has not been constructed yet
    #[error("Model has not been constructed; call construct_model first")]
    NotBuilt,

    /// No solution is available yet
    #[error("Model has not been solved")]
    NotSolved,

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using HubError.
pub type HubResult<T> = Result<T, HubError>;

impl HubError {
    /// Build a validation error from an entity label and its issues.
    pub fn validation(entity: impl Into<String>, issues: Vec<String>) -> Self {
        HubError::Validation {
            entity: entity.into(),
            issues,
        }
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Parse(err.to_string())
    }
}
