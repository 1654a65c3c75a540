//! Core numeric primitives.
//!
//! A [`FeatureBlock`] is the `(n_nodes, n_feat)` matrix one generator emits.

mod matrix;

pub use matrix::Matrix;

/// Per-node feature values produced by one generator, one row per node.
pub type FeatureBlock = Matrix<f64>;
