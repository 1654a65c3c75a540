//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use ppi_features::prelude::*;
//! ```

pub use crate::cache::{CacheKey, DiskCache, FeatureCache, MemoryCache};
pub use crate::error::{FeatureError, Result};
pub use crate::features::{
    BetweennessCentrality, CachePolicy, Cached, ClosenessCentrality, ClusteringCoefficient,
    Degree, ExpectedDegree, FeatureGenerator, GeneratorExt, Hits, NeighbouringConductance,
    PageRank,
};
pub use crate::graph::{Graph, GraphBuilder, NodeId, PajekReader};
pub use crate::mapping::GeneMapping;
pub use crate::pipeline::{FeatureTable, Pipeline};
pub use crate::primitives::{FeatureBlock, Matrix};
