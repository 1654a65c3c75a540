//! Local structure: clustering, k-hop neighbourhoods and cut conductance.

use super::{Graph, NodeId};

/// Membership marks reused across many neighbourhood expansions.
///
/// A node belongs to the current set when `marks[node] == epoch`, so
/// clearing the set is a single increment instead of an O(n) fill.
struct Marks {
    marks: Vec<usize>,
    epoch: usize,
}

impl Marks {
    fn new(n: usize) -> Self {
        Self {
            marks: vec![0; n],
            epoch: 0,
        }
    }

    fn reset(&mut self) {
        self.epoch += 1;
    }

    fn insert(&mut self, v: NodeId) -> bool {
        if self.marks[v] == self.epoch {
            return false;
        }
        self.marks[v] = self.epoch;
        true
    }

    fn contains(&self, v: NodeId) -> bool {
        self.marks[v] == self.epoch
    }
}

impl Graph {
    /// Local clustering coefficient of every node.
    ///
    /// `C(v) = 2T(v) / (k(k-1))` over the undirected view of the graph
    /// (self loops ignored); 0 when `k < 2`.
    ///
    /// # Performance
    /// O(n·d²) where d = average degree
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (2, 3)], false);
    /// let cc = g.local_clustering();
    /// assert_eq!(cc[0], 1.0);
    /// assert!((cc[2] - 1.0 / 3.0).abs() < 1e-12);
    /// assert_eq!(cc[3], 0.0);
    /// ```
    #[must_use]
    pub fn local_clustering(&self) -> Vec<f64> {
        (0..self.num_nodes())
            .map(|v| {
                let neighbors = self.undirected_neighbors(v);
                let k = neighbors.len();
                if k < 2 {
                    return 0.0;
                }

                let mut triangles = 0usize;
                for i in 0..k {
                    for j in (i + 1)..k {
                        let (u, w) = (neighbors[i], neighbors[j]);
                        if self.has_edge(u, w) || self.has_edge(w, u) {
                            triangles += 1;
                        }
                    }
                }
                2.0 * triangles as f64 / (k * (k - 1)) as f64
            })
            .collect()
    }

    /// Sorted, deduplicated union of in- and out-neighbours without `v`.
    fn undirected_neighbors(&self, v: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = if self.is_directed() {
            self.neighbors(v)
                .iter()
                .chain(self.in_neighbors(v))
                .copied()
                .collect()
        } else {
            self.neighbors(v).to_vec()
        };
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors.retain(|&u| u != v);
        neighbors
    }

    /// Nodes within `k` hops of `v` (following outgoing edges), sorted.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 3)], false);
    /// assert_eq!(g.k_hop_neighbourhood(0, 2), vec![0, 1, 2]);
    /// ```
    #[must_use]
    pub fn k_hop_neighbourhood(&self, v: NodeId, k: usize) -> Vec<NodeId> {
        if v >= self.num_nodes() {
            return Vec::new();
        }
        let mut marks = Marks::new(self.num_nodes());
        marks.reset();
        let mut members = self.expand(v, k, &mut marks);
        members.sort_unstable();
        members
    }

    /// Breadth-first expansion of `v` to depth `k`, recording members in `marks`.
    ///
    /// Each hop's frontier holds only neighbours of the previous frontier that
    /// were not visited before, so a node is never expanded twice.
    fn expand(&self, v: NodeId, k: usize, marks: &mut Marks) -> Vec<NodeId> {
        marks.insert(v);
        let mut members = vec![v];
        let mut frontier = vec![v];

        for _ in 0..k {
            let mut next = Vec::new();
            for &u in &frontier {
                for &w in self.neighbors(u) {
                    if marks.insert(w) {
                        next.push(w);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            members.extend_from_slice(&next);
            frontier = next;
        }

        members
    }

    /// Conductance of the node set `members` within the whole graph.
    ///
    /// `cut(S, V\S) / min(vol(S), vol(V\S))`, where the volume sums node
    /// degrees (out-degrees when directed) and the cut counts boundary
    /// edges in both directions. With `weighted`, edge weights replace unit
    /// counts. Returns NaN when the smaller volume is zero (empty cut side).
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 3)], false);
    /// // S = {0, 1}: one boundary edge, vol(S) = 3, vol(rest) = 3
    /// assert!((g.conductance(&[0, 1], false) - 1.0 / 3.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn conductance(&self, members: &[NodeId], weighted: bool) -> f64 {
        let mut marks = Marks::new(self.num_nodes());
        marks.reset();
        let members: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&v| v < self.num_nodes() && marks.insert(v))
            .collect();
        let total = self.total_volume(weighted);
        self.conductance_marked(&members, &marks, total, weighted)
    }

    /// Conductance of each node's `k`-hop neighbourhood.
    ///
    /// Isolated nodes (and neighbourhoods covering every edge) yield NaN.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// // Star: center 0 with leaves 1..=4
    /// let g = Graph::from_edges(&[(0, 1), (0, 2), (0, 3), (0, 4)], false);
    /// let phi = g.neighbourhood_conductance(1, false);
    /// assert!(phi[0].is_nan());
    /// assert!((phi[1] - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn neighbourhood_conductance(&self, k: usize, weighted: bool) -> Vec<f64> {
        let n = self.num_nodes();
        let total = self.total_volume(weighted);
        let mut marks = Marks::new(n);

        (0..n)
            .map(|v| {
                marks.reset();
                let members = self.expand(v, k, &mut marks);
                self.conductance_marked(&members, &marks, total, weighted)
            })
            .collect()
    }

    fn volume_of(&self, v: NodeId, weighted: bool) -> f64 {
        if weighted {
            self.weighted_degree(v)
        } else {
            self.degree(v) as f64
        }
    }

    fn total_volume(&self, weighted: bool) -> f64 {
        (0..self.num_nodes())
            .map(|v| self.volume_of(v, weighted))
            .sum()
    }

    fn conductance_marked(
        &self,
        members: &[NodeId],
        marks: &Marks,
        total_volume: f64,
        weighted: bool,
    ) -> f64 {
        let edge_value = |w: f64| if weighted { w } else { 1.0 };

        let mut volume = 0.0;
        let mut cut = 0.0;
        for &u in members {
            volume += self.volume_of(u, weighted);
            for (&w, &weight) in self.neighbors(u).iter().zip(self.neighbor_weights(u)) {
                if !marks.contains(w) {
                    cut += edge_value(weight);
                }
            }
            if self.is_directed() {
                for (&w, &weight) in self.in_neighbors(u).iter().zip(self.in_neighbor_weights(u)) {
                    if !marks.contains(w) {
                        cut += edge_value(weight);
                    }
                }
            }
        }

        let complement = (total_volume - volume).max(0.0);
        let denominator = volume.min(complement);
        if denominator <= 0.0 {
            return f64::NAN;
        }
        cut / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(leaves: usize) -> Graph {
        let edges: Vec<(NodeId, NodeId)> = (1..=leaves).map(|l| (0, l)).collect();
        Graph::from_edges(&edges, false)
    }

    #[test]
    fn test_clustering_triangle() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], false);
        assert_eq!(g.local_clustering(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_clustering_directed_uses_undirected_view() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], true);
        assert_eq!(g.local_clustering(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_clustering_ignores_self_loop() {
        let g = Graph::from_edges(&[(0, 0), (0, 1)], false);
        assert_eq!(g.local_clustering(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_k_hop_excludes_visited() {
        // Cycle of 4: two hops from 0 reach everything exactly once
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 0)], false);
        assert_eq!(g.k_hop_neighbourhood(0, 1), vec![0, 1, 3]);
        assert_eq!(g.k_hop_neighbourhood(0, 2), vec![0, 1, 2, 3]);
        assert_eq!(g.k_hop_neighbourhood(0, 5), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_k_hop_zero_is_self() {
        let g = star(3);
        assert_eq!(g.k_hop_neighbourhood(2, 0), vec![2]);
    }

    #[test]
    fn test_star_conductance() {
        let g = star(4);
        let phi = g.neighbourhood_conductance(1, false);
        assert!(phi[0].is_nan());
        for leaf in 1..=4 {
            // cut = 3, vol(S) = 1 + 4, vol(rest) = 3
            assert!((phi[leaf] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_isolated_node_is_nan() {
        let mut b = Graph::builder(3, false);
        b.add_edge(0, 1, 1.0).expect("valid edge");
        let phi = b.build().neighbourhood_conductance(2, false);
        assert!(phi[2].is_nan());
    }

    #[test]
    fn test_disconnected_component_has_zero_conductance() {
        let g = Graph::from_edges(&[(0, 1), (2, 3)], false);
        let phi = g.neighbourhood_conductance(1, false);
        assert_eq!(phi[0], 0.0);
    }

    #[test]
    fn test_weighted_conductance() {
        let g = Graph::from_weighted_edges(&[(0, 1, 2.0), (1, 2, 1.0), (2, 3, 2.0)], false);
        // S = {0,1}: cut 1, vol(S) = 2 + 3 = 5, vol(rest) = 3 + 2 = 5
        assert!((g.conductance(&[0, 1], true) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_directed_cut_counts_both_directions() {
        let g = Graph::from_edges(&[(0, 1), (1, 0), (1, 2), (2, 1)], true);
        // S = {0}: cut {0->1, 1->0} = 2, vol(S) = 1 (out-degree), vol(rest) = 3
        assert!((g.conductance(&[0], false) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_conductance_deduplicates_members() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 3)], false);
        assert_eq!(g.conductance(&[0, 1, 1, 0], false), g.conductance(&[0, 1], false));
    }
}
