//! Conductance of each node's k-hop neighbourhood.

use super::{block_from_columns, ensure_nonempty, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::graph::Graph;
use crate::primitives::FeatureBlock;

/// For every node, the conductance of the set of nodes within `range`
/// hops of it.
///
/// Low values mark nodes sitting inside a well separated module. Isolated
/// nodes, and nodes whose neighbourhood covers the whole graph, get NaN.
///
/// # Examples
///
/// ```
/// use ppi_features::prelude::*;
///
/// let star = Graph::from_edges(&[(0, 1), (0, 2), (0, 3)], false);
/// let phi = NeighbouringConductance::new(1)
///     .expect("range >= 1")
///     .compute(&star)
///     .expect("non-empty graph");
/// assert!(phi.get(0, 0).is_nan());
/// assert!((phi.get(1, 0) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbouringConductance {
    range: usize,
    weighted: bool,
}

impl NeighbouringConductance {
    /// Neighbourhoods of `range` hops.
    ///
    /// # Errors
    ///
    /// Returns an error if `range` is 0.
    pub fn new(range: usize) -> Result<Self> {
        if range == 0 {
            return Err(FeatureError::invalid_parameter("range", range, ">= 1"));
        }
        Ok(Self {
            range,
            weighted: false,
        })
    }

    /// Use edge weights for cut and volume instead of edge counts.
    #[must_use]
    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    /// Hop radius.
    #[must_use]
    pub fn range(&self) -> usize {
        self.range
    }
}

impl FeatureGenerator for NeighbouringConductance {
    fn name(&self) -> String {
        let suffix = if self.weighted { "_weighted" } else { "" };
        format!("neighbouring_conductance_r{}{suffix}", self.range)
    }

    fn n_feat(&self) -> usize {
        1
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        let phi = graph.neighbourhood_conductance(self.range, self.weighted);
        let undefined = phi.iter().filter(|v| v.is_nan()).count();
        tracing::debug!(generator = %self.name(), undefined, "conductance computed");
        block_from_columns(&[phi])
    }
}
