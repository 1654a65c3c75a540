//! Error types for feature generation.
//!
//! Cache *read* failures never surface through this type: the cache layer
//! treats them as misses. Everything else (compute failures, contract
//! violations, malformed input files) is reported here.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for `ppi_features` operations.
///
/// # Examples
///
/// ```
/// use ppi_features::error::FeatureError;
///
/// let err = FeatureError::ShapeMismatch {
///     generator: "degree_undirected".to_string(),
///     expected: (4, 1),
///     actual: (4, 2),
/// };
/// assert!(err.to_string().contains("shape mismatch"));
/// ```
#[derive(Error, Debug)]
pub enum FeatureError {
    /// A generator was asked to run on a graph without nodes.
    #[error("{generator}: cannot compute features on an empty graph")]
    EmptyGraph {
        /// Name of the generator that refused the graph
        generator: String,
    },

    /// A generator's output disagrees with its declared width.
    #[error("{generator}: shape mismatch, expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Name of the offending generator
        generator: String,
        /// Declared `(n_nodes, n_feat)`
        expected: (usize, usize),
        /// Shape actually produced
        actual: (usize, usize),
    },

    /// Invalid constructor or configuration parameter.
    #[error("Invalid parameter: {param} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Malformed graph or table input.
    #[error("Parse error in {}{}: {cause}", path.display(), line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        /// File (or pseudo-path for in-memory input)
        path: PathBuf,
        /// 1-based line number when known
        line: Option<usize>,
        /// What went wrong
        cause: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error (cache payloads, config files).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid run configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for FeatureError {
    fn from(msg: &str) -> Self {
        FeatureError::Other(msg.to_string())
    }
}

impl From<String> for FeatureError {
    fn from(msg: String) -> Self {
        FeatureError::Other(msg)
    }
}

impl From<bincode::Error> for FeatureError {
    fn from(err: bincode::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}

impl FeatureError {
    /// Create an empty-graph error for the named generator.
    #[must_use]
    pub fn empty_graph(generator: &str) -> Self {
        Self::EmptyGraph {
            generator: generator.to_string(),
        }
    }

    /// Create an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(param: &str, value: impl ToString, constraint: &str) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, FeatureError>;
