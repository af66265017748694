//! Error types for RouteKit Core

use thiserror::Error;

/// Raised eagerly when a value cannot be constructed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("Unsupported parameter value type: {0}")]
    UnsupportedValueType(String),

    #[error("Invalid lifetime: {0} seconds (must be greater than zero)")]
    InvalidLifetime(u64),

    #[error("Unknown URI constraint key: {0}")]
    UnknownConstraintKey(String),

    #[error("Unknown configuration path: {0}")]
    UnknownConfigurationPath(String),
}

/// Raised when a caller assumed the presence of something that is absent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Parameter not found: {0}")]
    MissingParameter(String),

    #[error("Parameter namespace not found: {0}")]
    MissingNamespace(String),

    #[error("Parameter '{name}' not found in namespace '{namespace}'")]
    MissingNamespacedParameter { namespace: String, name: String },

    #[error("Route value not found: {0}")]
    MissingRouteValue(String),

    #[error("URI constraint not set: {0}")]
    MissingConstraint(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
