//! ppi-features: structural node features over protein-protein interaction
//! graphs.
//!
//! Feature generators turn a graph into a `(nodes x features)` block. They
//! compose through wrappers (`log10`, normalization, column selection),
//! gain a transparent on-disk cache, and are assembled by a [`Pipeline`]
//! into one labeled [`FeatureTable`].
//!
//! # Quick Start
//!
//! ```
//! use ppi_features::prelude::*;
//! use std::sync::Arc;
//!
//! let graph = Graph::from_edges(&[(0, 1), (1, 2), (2, 3)], false);
//! let cache: Arc<dyn FeatureCache> = Arc::new(MemoryCache::new());
//!
//! let pipeline = Pipeline::new(vec![
//!     Degree::new(false).boxed(),
//!     Hits::new()
//!         .select(1)
//!         .expect("column 1 exists")
//!         .cached(Arc::clone(&cache), CachePolicy::reuse("demo"))
//!         .boxed(),
//! ]);
//!
//! let (table, rows) = pipeline.apply(&graph, false).expect("non-empty graph");
//! assert_eq!(rows, vec!["0", "1", "2", "3"]);
//! assert_eq!(table.shape(), (4, 2));
//! assert_eq!(table.column_names()[1], "hits_authority");
//! ```
//!
//! # Modules
//!
//! - [`graph`]: Compressed graph storage, Pajek I/O, centrality kernels
//! - [`features`]: Generators, wrappers and the caching decorator
//! - [`cache`]: Feature block stores (disk, memory)
//! - [`pipeline`]: Generator composition into a labeled table
//! - [`mapping`]: Protein id to gene symbol mapping
//! - [`validation`]: Mann-Whitney and hypergeometric checks
//! - [`config`]: JSON run configuration
//! - [`primitives`]: Dense matrix type

pub mod cache;
pub mod config;
pub mod error;
pub mod features;
pub mod graph;
pub mod mapping;
pub mod pipeline;
pub mod prelude;
pub mod primitives;
pub mod validation;

pub use error::{FeatureError, Result};
pub use features::FeatureGenerator;
pub use graph::Graph;
pub use pipeline::{FeatureTable, Pipeline};
pub use primitives::{FeatureBlock, Matrix};
