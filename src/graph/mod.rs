//! Interaction graph with cache-optimized CSR representation.
//!
//! Nodes are dense integers `0..n`; every feature generator allocates
//! per-node arrays indexed by [`NodeId`]. Each node may carry a `name`
//! (a protein identifier) and each edge a non-negative `weight`
//! (STRING confidence scores, scale 1000).
//!
//! - CSR adjacency (outgoing) plus reverse CSR for directed graphs
//! - Centrality kernels in [`centrality`]
//! - Local structure (clustering, k-hop neighbourhoods, conductance) in [`structure`]
//! - Pajek text I/O in [`pajek`]
//!
//! # Examples
//!
//! ```
//! use ppi_features::graph::Graph;
//!
//! let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], false);
//! assert_eq!(g.num_nodes(), 3);
//! assert_eq!(g.degree(0), 2);
//! ```

use crate::error::{FeatureError, Result};

pub mod centrality;
pub mod pajek;
pub mod structure;

pub use pajek::{convert_string_links, write_pajek, PajekReader};

/// Graph node identifier (contiguous integers for cache efficiency).
pub type NodeId = usize;

/// Graph structure using CSR (Compressed Sparse Row) for cache efficiency.
///
/// Undirected edges are stored in both endpoint rows. Directed graphs keep
/// a second, reversed CSR so incoming neighbours are O(in-degree).
#[derive(Debug, Clone)]
pub struct Graph {
    row_ptr: Vec<usize>,
    col_indices: Vec<NodeId>,
    edge_weights: Vec<f64>,

    // Reverse adjacency, only populated for directed graphs
    in_row_ptr: Vec<usize>,
    in_col_indices: Vec<NodeId>,
    in_edge_weights: Vec<f64>,

    node_names: Vec<Option<String>>,

    is_directed: bool,
    n_nodes: usize,
    n_edges: usize,
}

/// Incremental builder with a fixed node count.
///
/// Isolated nodes keep their ids because the node count is declared up
/// front rather than inferred from the edge list.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    n_nodes: usize,
    is_directed: bool,
    edges: Vec<(NodeId, NodeId, f64)>,
    names: Vec<Option<String>>,
}

impl GraphBuilder {
    /// Start a graph with `n_nodes` nodes and no edges.
    #[must_use]
    pub fn new(n_nodes: usize, is_directed: bool) -> Self {
        Self {
            n_nodes,
            is_directed,
            edges: Vec::new(),
            names: vec![None; n_nodes],
        }
    }

    /// Attach a name to node `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is outside `0..n_nodes`.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<&mut Self> {
        self.check_node(id)?;
        self.names[id] = Some(name.into());
        Ok(self)
    }

    /// Add an edge `source -> target` (both directions for undirected graphs).
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is out of range or the weight is
    /// negative or not finite.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, weight: f64) -> Result<&mut Self> {
        self.check_node(source)?;
        self.check_node(target)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(FeatureError::invalid_parameter(
                "weight",
                weight,
                "a finite non-negative number",
            ));
        }
        self.edges.push((source, target, weight));
        Ok(self)
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if id >= self.n_nodes {
            return Err(FeatureError::invalid_parameter(
                "node id",
                id,
                &format!("< {}", self.n_nodes),
            ));
        }
        Ok(())
    }

    /// Freeze the builder into CSR form.
    #[must_use]
    pub fn build(self) -> Graph {
        let n = self.n_nodes;

        let mut adj_list: Vec<Vec<(NodeId, f64)>> = vec![Vec::new(); n];
        for &(source, target, weight) in &self.edges {
            adj_list[source].push((target, weight));
            if !self.is_directed && source != target {
                adj_list[target].push((source, weight));
            }
        }
        // Stable sort so dedup keeps the first weight seen for a pair
        for neighbors in &mut adj_list {
            neighbors.sort_by_key(|&(id, _)| id);
            neighbors.dedup_by_key(|&mut (id, _)| id);
        }

        let (row_ptr, col_indices, edge_weights) = to_csr(&adj_list);

        let n_edges = if self.is_directed {
            col_indices.len()
        } else {
            adj_list
                .iter()
                .enumerate()
                .map(|(v, neighbors)| neighbors.iter().filter(|&&(w, _)| w >= v).count())
                .sum()
        };

        let (in_row_ptr, in_col_indices, in_edge_weights) = if self.is_directed {
            let mut reverse: Vec<Vec<(NodeId, f64)>> = vec![Vec::new(); n];
            for (source, neighbors) in adj_list.iter().enumerate() {
                for &(target, weight) in neighbors {
                    reverse[target].push((source, weight));
                }
            }
            to_csr(&reverse)
        } else {
            (Vec::new(), Vec::new(), Vec::new())
        };

        Graph {
            row_ptr,
            col_indices,
            edge_weights,
            in_row_ptr,
            in_col_indices,
            in_edge_weights,
            node_names: self.names,
            is_directed: self.is_directed,
            n_nodes: n,
            n_edges,
        }
    }
}

fn to_csr(adj_list: &[Vec<(NodeId, f64)>]) -> (Vec<usize>, Vec<NodeId>, Vec<f64>) {
    let mut row_ptr = Vec::with_capacity(adj_list.len() + 1);
    let mut col_indices = Vec::new();
    let mut edge_weights = Vec::new();

    row_ptr.push(0);
    for neighbors in adj_list {
        for &(neighbor, weight) in neighbors {
            col_indices.push(neighbor);
            edge_weights.push(weight);
        }
        row_ptr.push(col_indices.len());
    }
    (row_ptr, col_indices, edge_weights)
}

/// Summary counts reported by the CLI `info` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    /// Number of nodes
    pub nodes: usize,
    /// Number of distinct edges
    pub edges: usize,
    /// Whether edges are directed
    pub directed: bool,
    /// Nodes with neither incoming nor outgoing edges
    pub isolated: usize,
}

impl Graph {
    /// Create empty graph.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::new(false);
    /// assert_eq!(g.num_nodes(), 0);
    /// ```
    #[must_use]
    pub fn new(is_directed: bool) -> Self {
        GraphBuilder::new(0, is_directed).build()
    }

    /// Start a builder with `n_nodes` dense node ids.
    #[must_use]
    pub fn builder(n_nodes: usize, is_directed: bool) -> GraphBuilder {
        GraphBuilder::new(n_nodes, is_directed)
    }

    /// Build an unweighted graph (all weights 1.0) from an edge list.
    ///
    /// The node count is `max id + 1`.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], true);
    /// assert_eq!(g.num_nodes(), 3);
    /// assert_eq!(g.num_edges(), 3);
    /// ```
    #[must_use]
    pub fn from_edges(edges: &[(NodeId, NodeId)], is_directed: bool) -> Self {
        let weighted: Vec<(NodeId, NodeId, f64)> =
            edges.iter().map(|&(s, t)| (s, t, 1.0)).collect();
        Self::from_weighted_edges(&weighted, is_directed)
    }

    /// Build a weighted graph from `(source, target, weight)` triples.
    ///
    /// Negative or non-finite weights are clamped to zero.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_weighted_edges(&[(0, 1, 1000.0), (1, 2, 500.0)], false);
    /// assert_eq!(g.weighted_degree(1), 1500.0);
    /// ```
    #[must_use]
    pub fn from_weighted_edges(edges: &[(NodeId, NodeId, f64)], is_directed: bool) -> Self {
        let n_nodes = edges
            .iter()
            .flat_map(|&(s, t, _)| [s, t])
            .max()
            .map_or(0, |max_node| max_node + 1);

        let mut builder = GraphBuilder::new(n_nodes, is_directed);
        builder.edges = edges
            .iter()
            .map(|&(s, t, w)| (s, t, if w.is_finite() && w > 0.0 { w } else { 0.0 }))
            .collect();
        builder.build()
    }

    /// Get number of nodes in graph.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Get number of distinct edges in graph.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.n_edges
    }

    /// Check if graph is directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.is_directed
    }

    /// True when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_nodes == 0
    }

    /// Name attribute of node `v`, if any.
    #[must_use]
    pub fn name(&self, v: NodeId) -> Option<&str> {
        self.node_names.get(v).and_then(|n| n.as_deref())
    }

    /// Row label for node `v`: its name, or its decimal id when unnamed.
    #[must_use]
    pub fn label(&self, v: NodeId) -> String {
        self.name(v).map_or_else(|| v.to_string(), str::to_string)
    }

    /// Outgoing neighbours of `v` in O(1), sorted by id.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2)], false);
    /// assert_eq!(g.neighbors(1), &[0, 2]);
    /// ```
    #[must_use]
    pub fn neighbors(&self, v: NodeId) -> &[NodeId] {
        if v >= self.n_nodes {
            return &[];
        }
        &self.col_indices[self.row_ptr[v]..self.row_ptr[v + 1]]
    }

    /// Weights parallel to [`Graph::neighbors`].
    #[must_use]
    pub fn neighbor_weights(&self, v: NodeId) -> &[f64] {
        if v >= self.n_nodes {
            return &[];
        }
        &self.edge_weights[self.row_ptr[v]..self.row_ptr[v + 1]]
    }

    /// Incoming neighbours of `v` (same as `neighbors` when undirected).
    #[must_use]
    pub fn in_neighbors(&self, v: NodeId) -> &[NodeId] {
        if !self.is_directed {
            return self.neighbors(v);
        }
        if v >= self.n_nodes {
            return &[];
        }
        &self.in_col_indices[self.in_row_ptr[v]..self.in_row_ptr[v + 1]]
    }

    /// Weights parallel to [`Graph::in_neighbors`].
    #[must_use]
    pub fn in_neighbor_weights(&self, v: NodeId) -> &[f64] {
        if !self.is_directed {
            return self.neighbor_weights(v);
        }
        if v >= self.n_nodes {
            return &[];
        }
        &self.in_edge_weights[self.in_row_ptr[v]..self.in_row_ptr[v + 1]]
    }

    /// Degree of `v` (out-degree for directed graphs).
    #[must_use]
    pub fn degree(&self, v: NodeId) -> usize {
        self.neighbors(v).len()
    }

    /// In-degree of `v` (equals `degree` when undirected).
    #[must_use]
    pub fn in_degree(&self, v: NodeId) -> usize {
        self.in_neighbors(v).len()
    }

    /// Sum of outgoing edge weights of `v`.
    #[must_use]
    pub fn weighted_degree(&self, v: NodeId) -> f64 {
        self.neighbor_weights(v).iter().sum()
    }

    /// Sum of incoming edge weights of `v`.
    #[must_use]
    pub fn in_weighted_degree(&self, v: NodeId) -> f64 {
        self.in_neighbor_weights(v).iter().sum()
    }

    /// Weight of edge `source -> target`, if present.
    #[must_use]
    pub fn edge_weight(&self, source: NodeId, target: NodeId) -> Option<f64> {
        let neighbors = self.neighbors(source);
        let pos = neighbors.binary_search(&target).ok()?;
        Some(self.neighbor_weights(source)[pos])
    }

    /// True if the edge `source -> target` exists.
    #[must_use]
    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.neighbors(source).binary_search(&target).is_ok()
    }

    /// Iterate distinct edges as `(source, target, weight)`.
    ///
    /// Undirected edges are yielded once with `source <= target`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        (0..self.n_nodes).flat_map(move |u| {
            self.neighbors(u)
                .iter()
                .zip(self.neighbor_weights(u))
                .filter(move |&(&v, _)| self.is_directed || v >= u)
                .map(move |(&v, &w)| (u, v, w))
        })
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let isolated = (0..self.n_nodes)
            .filter(|&v| self.degree(v) == 0 && self.in_degree(v) == 0)
            .count();
        GraphStats {
            nodes: self.n_nodes,
            edges: self.n_edges,
            directed: self.is_directed,
            isolated,
        }
    }
}
