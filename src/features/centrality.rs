//! Centrality features.

use super::{block_from_columns, ensure_nonempty, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::graph::Graph;
use crate::primitives::FeatureBlock;

/// Weighted `PageRank`.
///
/// # Examples
///
/// ```
/// use ppi_features::prelude::*;
///
/// let pr = PageRank::new().with_damping(0.9);
/// assert_eq!(pr.name(), "pagerank_d0.9");
///
/// // Non-default iteration settings are part of the name
/// let short = PageRank::new().with_max_iter(10).with_tolerance(1e-9);
/// assert_eq!(short.name(), "pagerank_d0.85_i10_t1e-9");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRank {
    damping: f64,
    max_iter: usize,
    tol: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iter: 100,
            tol: 1e-6,
        }
    }
}

impl PageRank {
    /// Damping 0.85, 100 iterations, tolerance 1e-6.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the damping factor, in `[0, 1)`.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the L1 convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

impl FeatureGenerator for PageRank {
    fn name(&self) -> String {
        let defaults = Self::default();
        format!(
            "pagerank_d{}{}",
            self.damping,
            iteration_suffix(self.max_iter, self.tol, defaults.max_iter, defaults.tol)
        )
    }

    fn n_feat(&self) -> usize {
        1
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        if !(0.0..1.0).contains(&self.damping) {
            return Err(FeatureError::invalid_parameter(
                "damping",
                self.damping,
                "a value in [0, 1)",
            ));
        }
        ensure_nonempty(graph, &self.name())?;

        let result = graph.pagerank(self.damping, self.max_iter, self.tol);
        if !result.converged {
            tracing::warn!(
                generator = %self.name(),
                max_iter = self.max_iter,
                "pagerank did not converge, using last iterate"
            );
        }
        block_from_columns(&[result.scores])
    }
}

/// `_i{max_iter}` and `_t{tol}` for settings that differ from the defaults.
fn iteration_suffix(max_iter: usize, tol: f64, default_iter: usize, default_tol: f64) -> String {
    let mut suffix = String::new();
    if max_iter != default_iter {
        suffix.push_str(&format!("_i{max_iter}"));
    }
    if tol.to_bits() != default_tol.to_bits() {
        suffix.push_str(&format!("_t{tol:e}"));
    }
    suffix
}

/// Brandes betweenness centrality on hop distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BetweennessCentrality;

impl BetweennessCentrality {
    /// Create a betweenness generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FeatureGenerator for BetweennessCentrality {
    fn name(&self) -> String {
        "betweenness".to_string()
    }

    fn n_feat(&self) -> usize {
        1
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        block_from_columns(&[graph.betweenness_centrality()])
    }
}

/// Closeness centrality with Wasserman-Faust scaling for disconnected graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosenessCentrality;

impl ClosenessCentrality {
    /// Create a closeness generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FeatureGenerator for ClosenessCentrality {
    fn name(&self) -> String {
        "closeness".to_string()
    }

    fn n_feat(&self) -> usize {
        1
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        block_from_columns(&[graph.closeness_centrality()])
    }
}

/// HITS hub and authority scores (two columns).
///
/// # Examples
///
/// ```
/// use ppi_features::prelude::*;
///
/// let g = Graph::from_edges(&[(0, 2), (1, 2)], true);
/// let hits = Hits::new();
/// assert_eq!(hits.feature_names(), vec!["hits_hub", "hits_authority"]);
/// let block = hits.compute(&g).expect("non-empty graph");
/// assert_eq!(block.shape(), (3, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hits {
    max_iter: usize,
    tol: f64,
}

impl Default for Hits {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-8,
        }
    }
}

impl Hits {
    /// 100 iterations, tolerance 1e-8.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

impl FeatureGenerator for Hits {
    fn name(&self) -> String {
        let defaults = Self::default();
        format!(
            "hits{}",
            iteration_suffix(self.max_iter, self.tol, defaults.max_iter, defaults.tol)
        )
    }

    fn n_feat(&self) -> usize {
        2
    }

    fn feature_names(&self) -> Vec<String> {
        vec!["hits_hub".to_string(), "hits_authority".to_string()]
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        let scores = graph.hits(self.max_iter, self.tol);
        if !scores.converged {
            tracing::warn!(max_iter = self.max_iter, "hits did not converge, using last iterate");
        }
        block_from_columns(&[scores.hubs, scores.authorities])
    }
}
