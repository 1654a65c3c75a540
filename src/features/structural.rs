//! Degree-based and local structural features.

use super::{block_from_columns, ensure_nonempty, indexed_names, FeatureGenerator};
use crate::error::Result;
use crate::graph::Graph;
use crate::primitives::FeatureBlock;

/// Edge weights are confidence scores multiplied by this factor.
pub const WEIGHT_SCALE: f64 = 1000.0;

/// Number of incident edges.
///
/// Undirected: one column, with a self loop counted at both ends.
/// On a directed graph it is in + out degree.
/// Directed: two columns, out-degree then in-degree.
///
/// # Examples
///
/// ```
/// use ppi_features::prelude::*;
///
/// let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], false);
/// let block = Degree::new(false).compute(&g).expect("non-empty graph");
/// assert_eq!(block.column(0), vec![2.0, 2.0, 2.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Degree {
    directed: bool,
}

impl Degree {
    /// Create a degree generator.
    #[must_use]
    pub fn new(directed: bool) -> Self {
        Self { directed }
    }
}

impl FeatureGenerator for Degree {
    fn name(&self) -> String {
        format!("degree_{}directed", if self.directed { "" } else { "un" })
    }

    fn n_feat(&self) -> usize {
        1 + usize::from(self.directed)
    }

    fn feature_names(&self) -> Vec<String> {
        directional_names(&self.name(), self.directed)
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        let n = graph.num_nodes();
        let out: Vec<f64> = (0..n).map(|v| graph.degree(v) as f64).collect();

        if self.directed {
            let incoming: Vec<f64> = (0..n).map(|v| graph.in_degree(v) as f64).collect();
            block_from_columns(&[out, incoming])
        } else if graph.is_directed() {
            let total: Vec<f64> = (0..n)
                .map(|v| (graph.degree(v) + graph.in_degree(v)) as f64)
                .collect();
            block_from_columns(&[total])
        } else {
            let total: Vec<f64> = out
                .iter()
                .enumerate()
                .map(|(v, d)| d + f64::from(u8::from(graph.has_edge(v, v))))
                .collect();
            block_from_columns(&[total])
        }
    }
}

/// Sum of incident edge weights divided by [`WEIGHT_SCALE`].
///
/// With STRING scores this is the expected number of true interactions.
/// Column layout follows [`Degree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpectedDegree {
    directed: bool,
}

impl ExpectedDegree {
    /// Create an expected-degree generator.
    #[must_use]
    pub fn new(directed: bool) -> Self {
        Self { directed }
    }
}

impl FeatureGenerator for ExpectedDegree {
    fn name(&self) -> String {
        format!(
            "expected_degree_{}directed",
            if self.directed { "" } else { "un" }
        )
    }

    fn n_feat(&self) -> usize {
        1 + usize::from(self.directed)
    }

    fn feature_names(&self) -> Vec<String> {
        directional_names(&self.name(), self.directed)
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        let n = graph.num_nodes();
        let out: Vec<f64> = (0..n)
            .map(|v| graph.weighted_degree(v) / WEIGHT_SCALE)
            .collect();

        if self.directed {
            let incoming: Vec<f64> = (0..n)
                .map(|v| graph.in_weighted_degree(v) / WEIGHT_SCALE)
                .collect();
            block_from_columns(&[out, incoming])
        } else if graph.is_directed() {
            let total: Vec<f64> = (0..n)
                .map(|v| (graph.weighted_degree(v) + graph.in_weighted_degree(v)) / WEIGHT_SCALE)
                .collect();
            block_from_columns(&[total])
        } else {
            let total: Vec<f64> = out
                .iter()
                .enumerate()
                .map(|(v, w)| w + graph.edge_weight(v, v).unwrap_or(0.0) / WEIGHT_SCALE)
                .collect();
            block_from_columns(&[total])
        }
    }
}

fn directional_names(name: &str, directed: bool) -> Vec<String> {
    if directed {
        vec![format!("{name}_out"), format!("{name}_in")]
    } else {
        indexed_names(name, 1)
    }
}

/// Local clustering coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusteringCoefficient;

impl ClusteringCoefficient {
    /// Create a clustering generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FeatureGenerator for ClusteringCoefficient {
    fn name(&self) -> String {
        "clustering".to_string()
    }

    fn n_feat(&self) -> usize {
        1
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        ensure_nonempty(graph, &self.name())?;
        block_from_columns(&[graph.local_clustering()])
    }
}
