//! Graph centrality measures.
//!
//! - PageRank (weighted power iteration with Kahan summation)
//! - Betweenness centrality (Brandes, parallel over sources)
//! - Closeness centrality (Wasserman & Faust scaling)
//! - HITS hub/authority scores (Kleinberg 1999)

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::VecDeque;

use super::{Graph, NodeId};

/// Kahan summation for computing L1 distance between two vectors.
///
/// Uses compensated summation to prevent floating-point drift.
fn kahan_diff(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut c = 0.0; // Compensation term

    for (ai, bi) in a.iter().zip(b.iter()) {
        let y = (ai - bi).abs() - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }

    sum
}

/// Scores from a HITS run.
#[derive(Debug, Clone, PartialEq)]
pub struct HitsScores {
    /// Hub score per node (sums to 1)
    pub hubs: Vec<f64>,
    /// Authority score per node (sums to 1)
    pub authorities: Vec<f64>,
    /// Whether the tolerance was reached before `max_iter`
    pub converged: bool,
}

/// Result of a power iteration that may stop at its iteration cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Iterated {
    /// Final scores
    pub scores: Vec<f64>,
    /// Whether the tolerance was reached before `max_iter`
    pub converged: bool,
}

impl Graph {
    /// Compute weighted `PageRank` using power iteration with Kahan summation.
    ///
    /// Transition probabilities are proportional to edge weights. Rank held by
    /// dangling nodes (no outgoing weight) is spread uniformly, so a graph
    /// without edges yields the uniform distribution.
    ///
    /// # Arguments
    /// * `damping` - Damping factor (typically 0.85)
    /// * `max_iter` - Maximum iterations (default 100)
    /// * `tol` - L1 convergence tolerance (default 1e-6)
    ///
    /// # Performance
    /// O(k * m) where k = iterations, m = edges
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], true);
    /// let pr = g.pagerank(0.85, 100, 1e-6);
    /// assert!(pr.converged);
    /// assert!((pr.scores.iter().sum::<f64>() - 1.0).abs() < 1e-10);
    /// ```
    #[must_use]
    pub fn pagerank(&self, damping: f64, max_iter: usize, tol: f64) -> Iterated {
        let n = self.num_nodes();
        if n == 0 {
            return Iterated {
                scores: Vec::new(),
                converged: true,
            };
        }

        let out_weight: Vec<f64> = (0..n).map(|v| self.weighted_degree(v)).collect();
        let mut ranks = vec![1.0 / n as f64; n];
        let mut new_ranks = vec![0.0; n];

        for _ in 0..max_iter {
            let dangling_sum: f64 = (0..n)
                .filter(|&v| out_weight[v] <= 0.0)
                .map(|v| ranks[v])
                .sum();
            let base = (1.0 - damping) / n as f64 + damping * dangling_sum / n as f64;

            #[allow(clippy::needless_range_loop)]
            for v in 0..n {
                let mut sum = 0.0;
                let mut c = 0.0; // Kahan compensation term

                for (&u, &w) in self.in_neighbors(v).iter().zip(self.in_neighbor_weights(v)) {
                    if out_weight[u] > 0.0 {
                        let y = ranks[u] * w / out_weight[u] - c;
                        let t = sum + y;
                        c = (t - sum) - y;
                        sum = t;
                    }
                }

                new_ranks[v] = base + damping * sum;
            }

            let diff = kahan_diff(&ranks, &new_ranks);
            std::mem::swap(&mut ranks, &mut new_ranks);
            if diff < tol {
                return Iterated {
                    scores: ranks,
                    converged: true,
                };
            }
        }

        Iterated {
            scores: ranks,
            converged: false,
        }
    }

    /// Compute normalized betweenness centrality using Brandes' algorithm.
    ///
    /// Shortest paths are unweighted. Scores are the fraction of shortest
    /// paths between other node pairs that pass through each node, scaled by
    /// `1 / ((n-1)(n-2))` when `n > 2`.
    ///
    /// # Performance
    /// O(nm); the outer loop over sources runs on Rayon with `parallel`.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (1, 2)], false);
    /// let bc = g.betweenness_centrality();
    /// assert!((bc[1] - 1.0).abs() < 1e-12);
    /// assert_eq!(bc[0], 0.0);
    /// ```
    #[must_use]
    pub fn betweenness_centrality(&self) -> Vec<f64> {
        let n = self.num_nodes();
        if n == 0 {
            return Vec::new();
        }

        #[cfg(feature = "parallel")]
        let partial_scores: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|source| self.brandes_bfs_from_source(source))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let partial_scores: Vec<Vec<f64>> = (0..n)
            .map(|source| self.brandes_bfs_from_source(source))
            .collect();

        let mut centrality = vec![0.0; n];
        for partial in partial_scores {
            for (i, &score) in partial.iter().enumerate() {
                centrality[i] += score;
            }
        }

        // Undirected pairs are counted from both ends; the pair-count
        // normalization for n > 2 absorbs that factor.
        let scale = if n > 2 {
            1.0 / ((n - 1) * (n - 2)) as f64
        } else if self.is_directed() {
            1.0
        } else {
            0.5
        };
        for score in &mut centrality {
            *score *= scale;
        }

        centrality
    }

    /// Brandes' BFS from a single source node.
    ///
    /// Returns the dependency of `source` on every node.
    fn brandes_bfs_from_source(&self, source: NodeId) -> Vec<f64> {
        let n = self.num_nodes();
        let mut stack = Vec::new(); // Nodes in order of non-increasing distance
        let mut paths = vec![0u64; n];
        let mut distance = vec![usize::MAX; n];
        let mut predecessors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut dependency = vec![0.0; n];

        paths[source] = 1;
        distance[source] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in self.neighbors(v) {
                if distance[w] == usize::MAX {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    paths[w] = paths[w].saturating_add(paths[v]);
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                let coeff = (paths[v] as f64 / paths[w] as f64) * (1.0 + dependency[w]);
                dependency[v] += coeff;
            }
        }
        dependency[source] = 0.0;

        dependency
    }

    /// Compute closeness centrality for all nodes.
    ///
    /// Inverse mean distance from the `r` nodes that can reach `v`, scaled
    /// by `r / (n - 1)` (Wasserman & Faust 1994) so that nodes in small
    /// components are not over-rated. Directed graphs use incoming
    /// distances. Isolated nodes score 0.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// let g = Graph::from_edges(&[(0, 1), (0, 2), (0, 3)], false);
    /// let cc = g.closeness_centrality();
    /// assert!((cc[0] - 1.0).abs() < 1e-12);
    /// assert!(cc[0] > cc[1]);
    /// ```
    #[must_use]
    pub fn closeness_centrality(&self) -> Vec<f64> {
        let n = self.num_nodes();
        if n == 0 {
            return Vec::new();
        }

        #[cfg(feature = "parallel")]
        let centrality: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|v| self.closeness_of(v))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let centrality: Vec<f64> = (0..n).map(|v| self.closeness_of(v)).collect();

        centrality
    }

    fn closeness_of(&self, v: NodeId) -> f64 {
        let n = self.num_nodes();
        if n <= 1 {
            return 0.0;
        }
        let distances = self.bfs_distances(v, true);
        let (reachable, total) = distances
            .iter()
            .filter(|&&d| d != usize::MAX && d > 0)
            .fold((0usize, 0usize), |(r, s), &d| (r + 1, s + d));

        if reachable == 0 || total == 0 {
            return 0.0;
        }
        let r = reachable as f64;
        (r / total as f64) * (r / (n - 1) as f64)
    }

    /// BFS hop distances from `source` (`usize::MAX` when unreachable).
    ///
    /// With `incoming` set, directed edges are followed backwards.
    pub(crate) fn bfs_distances(&self, source: NodeId, incoming: bool) -> Vec<usize> {
        let mut distances = vec![usize::MAX; self.num_nodes()];
        distances[source] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            let next = if incoming {
                self.in_neighbors(v)
            } else {
                self.neighbors(v)
            };
            for &w in next {
                if distances[w] == usize::MAX {
                    distances[w] = distances[v] + 1;
                    queue.push_back(w);
                }
            }
        }

        distances
    }

    /// Compute weighted HITS hub and authority scores.
    ///
    /// Iterates `a = Aᵀh`, `h = Aa` with max-normalization, then scales
    /// both vectors to sum 1. An edgeless graph yields uniform scores.
    ///
    /// # Examples
    /// ```
    /// use ppi_features::graph::Graph;
    ///
    /// // 0 and 1 both point at 2
    /// let g = Graph::from_edges(&[(0, 2), (1, 2)], true);
    /// let hits = g.hits(100, 1e-8);
    /// assert!(hits.authorities[2] > hits.authorities[0]);
    /// assert!(hits.hubs[0] > hits.hubs[2]);
    /// ```
    #[must_use]
    pub fn hits(&self, max_iter: usize, tol: f64) -> HitsScores {
        let n = self.num_nodes();
        if n == 0 {
            return HitsScores {
                hubs: Vec::new(),
                authorities: Vec::new(),
                converged: true,
            };
        }
        if self.num_edges() == 0 || self.edge_weights.iter().all(|&w| w <= 0.0) {
            let uniform = vec![1.0 / n as f64; n];
            return HitsScores {
                hubs: uniform.clone(),
                authorities: uniform,
                converged: true,
            };
        }

        let mut hubs = vec![1.0 / n as f64; n];
        let mut authorities = vec![0.0; n];
        let mut converged = false;

        for _ in 0..max_iter {
            let previous = hubs.clone();

            for (v, authority) in authorities.iter_mut().enumerate() {
                *authority = self
                    .in_neighbors(v)
                    .iter()
                    .zip(self.in_neighbor_weights(v))
                    .map(|(&u, &w)| hubs[u] * w)
                    .sum();
            }
            for (v, hub) in hubs.iter_mut().enumerate() {
                *hub = self
                    .neighbors(v)
                    .iter()
                    .zip(self.neighbor_weights(v))
                    .map(|(&u, &w)| authorities[u] * w)
                    .sum();
            }

            scale_by_max(&mut hubs);
            scale_by_max(&mut authorities);

            if kahan_diff(&previous, &hubs) < tol {
                converged = true;
                break;
            }
        }

        scale_to_unit_sum(&mut hubs);
        scale_to_unit_sum(&mut authorities);

        HitsScores {
            hubs,
            authorities,
            converged,
        }
    }
}

fn scale_by_max(values: &mut [f64]) {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for v in values.iter_mut() {
            *v /= max;
        }
    }
}

fn scale_to_unit_sum(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    } else if !values.is_empty() {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|v| *v = uniform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagerank_cycle_uniform() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], true);
        let pr = g.pagerank(0.85, 100, 1e-10);
        for score in &pr.scores {
            assert!((score - 1.0 / 3.0).abs() < 1e-8);
        }
    }

    #[test]
    fn test_pagerank_no_edges_is_uniform() {
        let g = Graph::builder(4, false).build();
        let pr = g.pagerank(0.85, 100, 1e-6);
        assert!(pr.converged);
        for score in &pr.scores {
            assert!((score - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pagerank_follows_weights() {
        // 0 sends almost all of its rank to 2
        let g = Graph::from_weighted_edges(&[(0, 1, 1.0), (0, 2, 99.0)], true);
        let pr = g.pagerank(0.85, 100, 1e-10);
        assert!(pr.scores[2] > pr.scores[1]);
    }

    #[test]
    fn test_pagerank_not_converged_flag() {
        let g = Graph::from_edges(&[(0, 1), (1, 2)], true);
        let pr = g.pagerank(0.85, 1, 0.0);
        assert!(!pr.converged);
        assert_eq!(pr.scores.len(), 3);
    }

    #[test]
    fn test_betweenness_star_normalized() {
        let g = Graph::from_edges(&[(0, 1), (0, 2), (0, 3)], false);
        let bc = g.betweenness_centrality();
        // Center lies on every leaf-leaf shortest path
        assert!((bc[0] - 1.0).abs() < 1e-12);
        assert_eq!(bc[1], 0.0);
    }

    #[test]
    fn test_betweenness_directed_path() {
        let g = Graph::from_edges(&[(0, 1), (1, 2)], true);
        let bc = g.betweenness_centrality();
        // One of the (n-1)(n-2) = 2 ordered pairs routes through 1
        assert!((bc[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closeness_path() {
        let g = Graph::from_edges(&[(0, 1), (1, 2)], false);
        let cc = g.closeness_centrality();
        assert!((cc[1] - 1.0).abs() < 1e-12);
        assert!((cc[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_closeness_isolated_zero() {
        let mut b = Graph::builder(3, false);
        b.add_edge(0, 1, 1.0).expect("valid edge");
        let cc = b.build().closeness_centrality();
        assert_eq!(cc[2], 0.0);
        // Component of size 2 out of 3 nodes is scaled down
        assert!((cc[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closeness_directed_uses_incoming() {
        let g = Graph::from_edges(&[(0, 1)], true);
        let cc = g.closeness_centrality();
        assert_eq!(cc[0], 0.0);
        assert!((cc[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hits_sums_to_one() {
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (0, 2)], true);
        let hits = g.hits(100, 1e-8);
        assert!((hits.hubs.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        assert!((hits.authorities.iter().sum::<f64>() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_hits_undirected_hub_equals_authority() {
        // Non-bipartite, so the dominant eigenvector is unique
        let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (2, 3)], false);
        let hits = g.hits(200, 1e-12);
        for (h, a) in hits.hubs.iter().zip(&hits.authorities) {
            assert!((h - a).abs() < 1e-6);
        }
    }

    #[test]
    fn test_hits_no_edges_uniform() {
        let g = Graph::builder(2, true).build();
        let hits = g.hits(100, 1e-8);
        assert_eq!(hits.hubs, vec![0.5, 0.5]);
    }
}
