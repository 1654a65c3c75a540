//! Per-node feature generators.
//!
//! A [`FeatureGenerator`] turns a [`Graph`] into a [`FeatureBlock`] of
//! shape `(n_nodes, n_feat)`. Generators compose in three ways:
//!
//! - wrapping: [`Wrapped`] applies a [`BlockTransform`] (`log10`,
//!   `normalize`, column selection) to another generator's output
//! - caching: [`Cached`] memoizes a generator in a [`FeatureCache`]
//! - pipelines: [`crate::pipeline::Pipeline`] concatenates generators
//!   column-wise
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use ppi_features::prelude::*;
//!
//! let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], false);
//! let cache = Arc::new(MemoryCache::new());
//!
//! let degree = Degree::new(false)
//!     .log10()
//!     .cached(cache, CachePolicy::new("demo").with_dump(true));
//!
//! assert_eq!(degree.name(), "log10-degree_undirected");
//! let block = degree.apply(&g).expect("non-empty graph");
//! assert!((block.get(0, 0) - 2f64.log10()).abs() < 1e-12);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheKey, FeatureCache};
use crate::error::{FeatureError, Result};
use crate::graph::Graph;
use crate::primitives::FeatureBlock;

mod centrality;
mod conductance;
mod structural;
mod wrappers;

pub use centrality::{BetweennessCentrality, ClosenessCentrality, Hits, PageRank};
pub use conductance::NeighbouringConductance;
pub use structural::{ClusteringCoefficient, Degree, ExpectedDegree, WEIGHT_SCALE};
pub use wrappers::{
    BlockTransform, ColumnSelection, FeatureSelector, Log10, Log10Wrapper, Normalize,
    NormalizeWrapper, Select, Wrapped,
};

/// A unit computing a fixed-width numeric block for every node.
///
/// Implementors provide [`name`](Self::name), [`n_feat`](Self::n_feat) and
/// [`compute`](Self::compute). [`apply`](Self::apply) is the public entry
/// point; it defaults to `compute` and is overridden by [`Cached`].
pub trait FeatureGenerator: Send + Sync {
    /// Stable identifier; also the cache key component.
    fn name(&self) -> String;

    /// Number of output columns, fixed at construction.
    fn n_feat(&self) -> usize;

    /// Column labels, `n_feat` long. Defaults to `name + index`.
    fn feature_names(&self) -> Vec<String> {
        indexed_names(&self.name(), self.n_feat())
    }

    /// Compute the block without consulting any cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph has no nodes or a parameter is invalid.
    fn compute(&self, graph: &Graph) -> Result<FeatureBlock>;

    /// Produce the block, using a cache where one is attached.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`compute`](Self::compute).
    fn apply(&self, graph: &Graph) -> Result<FeatureBlock> {
        self.compute(graph)
    }
}

impl<G: FeatureGenerator + ?Sized> FeatureGenerator for Box<G> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn n_feat(&self) -> usize {
        (**self).n_feat()
    }

    fn feature_names(&self) -> Vec<String> {
        (**self).feature_names()
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        (**self).compute(graph)
    }

    fn apply(&self, graph: &Graph) -> Result<FeatureBlock> {
        (**self).apply(graph)
    }
}

/// `name0, name1, ...`
#[must_use]
pub fn indexed_names(name: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{name}{i}")).collect()
}

/// Fail with [`FeatureError::EmptyGraph`] when `graph` has no nodes.
pub(crate) fn ensure_nonempty(graph: &Graph, generator: &str) -> Result<()> {
    if graph.is_empty() {
        return Err(FeatureError::empty_graph(generator));
    }
    Ok(())
}

/// Assemble per-node columns into a block.
pub(crate) fn block_from_columns(columns: &[Vec<f64>]) -> Result<FeatureBlock> {
    FeatureBlock::from_columns(columns).map_err(FeatureError::from)
}

/// Builder-style combinators available on every sized generator.
pub trait GeneratorExt: FeatureGenerator + Sized {
    /// Element-wise `log10` of this generator's output.
    fn log10(self) -> Log10Wrapper<Self> {
        Wrapped::new(self, Log10)
    }

    /// Column-wise z-score of this generator's output.
    fn normalized(self) -> NormalizeWrapper<Self> {
        Wrapped::new(self, Normalize::new())
    }

    /// Keep only `columns` of this generator's output.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is empty or an index is `>= n_feat`.
    fn select(self, columns: impl Into<ColumnSelection>) -> Result<FeatureSelector<Self>> {
        let select = Select::new(columns, self.n_feat())?;
        Ok(Wrapped::new(self, select))
    }

    /// Memoize this generator in `cache`.
    fn cached(self, cache: Arc<dyn FeatureCache>, policy: CachePolicy) -> Cached<Self> {
        Cached::new(self, cache, policy)
    }

    /// Erase the concrete type, for [`crate::pipeline::Pipeline`].
    fn boxed(self) -> Box<dyn FeatureGenerator>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<G: FeatureGenerator + Sized> GeneratorExt for G {}

/// How a [`Cached`] generator uses its cache when the caller does not say.
///
/// Defaults: prefix `"default"`, always recompute, never dump. Caching is
/// opt-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Cache namespace
    pub prefix: String,
    /// Skip the cache lookup
    pub default_recompute: bool,
    /// Store freshly computed blocks
    pub default_dump: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            prefix: "default".to_string(),
            default_recompute: true,
            default_dump: false,
        }
    }
}

impl CachePolicy {
    /// Default policy under `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Set the default for `recompute`.
    #[must_use]
    pub fn with_recompute(mut self, recompute: bool) -> Self {
        self.default_recompute = recompute;
        self
    }

    /// Set the default for `dump`.
    #[must_use]
    pub fn with_dump(mut self, dump: bool) -> Self {
        self.default_dump = dump;
        self
    }

    /// Read from the cache and write back misses.
    #[must_use]
    pub fn reuse(prefix: impl Into<String>) -> Self {
        Self::new(prefix).with_recompute(false).with_dump(true)
    }
}

/// A generator backed by a [`FeatureCache`].
///
/// The cache key is `(policy.prefix, inner.name())`, so a wrapped generator
/// and its inner generator never share an entry. Keys carry no fingerprint
/// of the graph: reusing a prefix across different graphs returns stale
/// blocks.
pub struct Cached<G> {
    inner: G,
    cache: Arc<dyn FeatureCache>,
    policy: CachePolicy,
}

impl<G: fmt::Debug> fmt::Debug for Cached<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cached")
            .field("inner", &self.inner)
            .field("cache", &self.cache)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<G: FeatureGenerator> Cached<G> {
    /// Attach `cache` to `inner`.
    pub fn new(inner: G, cache: Arc<dyn FeatureCache>, policy: CachePolicy) -> Self {
        Self {
            inner,
            cache,
            policy,
        }
    }

    /// The wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Current policy.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Key under which this generator's block is stored.
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.policy.prefix.clone(), self.inner.name())
    }

    /// Produce the block, overriding the policy defaults per call.
    ///
    /// Without `recompute`, a cached block of shape `(n_nodes, n_feat)` is
    /// returned as is. A missing, unreadable, empty or misshapen entry is a
    /// miss and falls back to computing. With `dump`, a computed block is
    /// stored.
    ///
    /// # Errors
    ///
    /// Propagates compute errors and cache write errors. Cache read errors
    /// are never returned.
    pub fn apply_with(
        &self,
        graph: &Graph,
        recompute: Option<bool>,
        dump: Option<bool>,
    ) -> Result<FeatureBlock> {
        let recompute = recompute.unwrap_or(self.policy.default_recompute);
        let dump = dump.unwrap_or(self.policy.default_dump);
        let key = self.key();

        if !recompute {
            if let Some(block) = self.lookup(&key, graph) {
                return Ok(block);
            }
        }

        let block = self.inner.compute(graph)?;
        if dump {
            self.cache.put(&key, &block)?;
        }
        Ok(block)
    }

    fn lookup(&self, key: &CacheKey, graph: &Graph) -> Option<FeatureBlock> {
        let expected = (graph.num_nodes(), self.inner.n_feat());
        match self.cache.get(key) {
            Ok(Some(block)) if block.is_empty() => {
                tracing::warn!(%key, "empty cache entry, recomputing");
                None
            }
            Ok(Some(block)) if block.shape() != expected => {
                tracing::warn!(
                    %key,
                    cached = ?block.shape(),
                    ?expected,
                    "cache entry has the wrong shape, recomputing"
                );
                None
            }
            Ok(Some(block)) => {
                tracing::debug!(%key, "cache hit");
                Some(block)
            }
            Ok(None) => {
                tracing::debug!(%key, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "unreadable cache entry, recomputing");
                None
            }
        }
    }
}

impl<G: FeatureGenerator> FeatureGenerator for Cached<G> {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn n_feat(&self) -> usize {
        self.inner.n_feat()
    }

    fn feature_names(&self) -> Vec<String> {
        self.inner.feature_names()
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        self.inner.compute(graph)
    }

    fn apply(&self, graph: &Graph) -> Result<FeatureBlock> {
        self.apply_with(graph, None, None)
    }
}

#[cfg(test)]
mod tests;
