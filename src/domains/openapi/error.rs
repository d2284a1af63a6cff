//! Specification-document error types.

use thiserror::Error;

/// Errors raised while loading, validating or walking the OpenAPI document.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The document file could not be read.
    #[error("Failed to read OpenAPI document '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or JSON.
    #[error("Failed to parse OpenAPI document '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but does not have the expected shape.
    #[error("OpenAPI document failed validation: {0}")]
    Validation(String),

    /// An internal `#/...` pointer does not lead anywhere.
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),
}

/// Input rejected by a validator set, one message per offending field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl SpecError {
    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new unresolved-reference error.
    pub fn unresolved(pointer: impl Into<String>) -> Self {
        Self::UnresolvedReference(pointer.into())
    }
}
