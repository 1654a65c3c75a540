//! Run configuration.
//!
//! A run is described by a JSON document:
//!
//! ```json
//! {
//!   "graph": "data/9606.protein.links.v10.5.paj",
//!   "min_weight": 600,
//!   "prefix": "string_600",
//!   "recompute": false,
//!   "dump": true,
//!   "gene_mapping": "data/mapping.csv",
//!   "generators": [
//!     { "kind": "degree" },
//!     { "kind": "log10", "inner": { "kind": "expected_degree" } },
//!     { "kind": "select", "inner": { "kind": "hits" }, "columns": 1 },
//!     { "kind": "neighbouring_conductance", "range": 2 }
//!   ]
//! }
//! ```
//!
//! Every generator in the tree, wrappers included, is cached under the run's
//! prefix in the run's cache directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{DiskCache, FeatureCache};
use crate::error::{FeatureError, Result};
use crate::features::{
    BetweennessCentrality, CachePolicy, ClosenessCentrality, ClusteringCoefficient,
    ColumnSelection, Degree, ExpectedDegree, FeatureGenerator, GeneratorExt, Hits,
    NeighbouringConductance, PageRank,
};
use crate::graph::{Graph, PajekReader};
use crate::mapping::GeneMapping;
use crate::pipeline::Pipeline;

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_prefix() -> String {
    CachePolicy::default().prefix
}

fn default_true() -> bool {
    true
}

/// Everything needed to turn a graph file into a feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Pajek graph file
    pub graph: PathBuf,
    /// Keep arcs directed
    #[serde(default)]
    pub directed: bool,
    /// Drop edges with a weight below this
    #[serde(default)]
    pub min_weight: Option<f64>,
    /// Cache root directory
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Cache namespace
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Ignore cached blocks
    #[serde(default = "default_true")]
    pub recompute: bool,
    /// Store computed blocks
    #[serde(default)]
    pub dump: bool,
    /// Gene mapping CSV
    #[serde(default)]
    pub gene_mapping: Option<PathBuf>,
    /// Whether the mapping CSV starts with a header row
    #[serde(default = "default_true")]
    pub mapping_has_headers: bool,
    /// CSV output path (stdout when absent)
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Run generators concurrently
    #[serde(default)]
    pub parallel: bool,
    /// Generators, in column order
    pub generators: Vec<GeneratorSpec>,
}

impl RunConfig {
    /// Minimal configuration for `graph` with the given generators.
    #[must_use]
    pub fn new(graph: impl Into<PathBuf>, generators: Vec<GeneratorSpec>) -> Self {
        Self {
            graph: graph.into(),
            directed: false,
            min_weight: None,
            cache_dir: default_cache_dir(),
            prefix: default_prefix(),
            recompute: true,
            dump: false,
            gene_mapping: None,
            mapping_has_headers: true,
            output: None,
            parallel: false,
            generators,
        }
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Config`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.generators.is_empty() {
            return Err(FeatureError::Config("no generators configured".into()));
        }
        if let Some(w) = self.min_weight {
            if !w.is_finite() || w < 0.0 {
                return Err(FeatureError::Config(format!(
                    "min_weight must be a finite non-negative number, got {w}"
                )));
            }
        }
        if self.prefix.trim().is_empty() {
            return Err(FeatureError::Config("prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Cache policy implied by `prefix`, `recompute` and `dump`.
    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        CachePolicy::new(self.prefix.clone())
            .with_recompute(self.recompute)
            .with_dump(self.dump)
    }

    /// Read the graph file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load_graph(&self) -> Result<Graph> {
        let mut reader = PajekReader::new().directed(self.directed);
        if let Some(threshold) = self.min_weight {
            reader = reader.with_min_weight(threshold);
        }
        reader.parse_file(&self.graph)
    }

    /// Build the pipeline backed by a [`DiskCache`] at `cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a generator spec is invalid or the gene mapping
    /// cannot be read.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let cache: Arc<dyn FeatureCache> = Arc::new(DiskCache::new(&self.cache_dir));
        self.build_pipeline_with(&cache)
    }

    /// Build the pipeline backed by `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error if a generator spec is invalid or the gene mapping
    /// cannot be read.
    pub fn build_pipeline_with(&self, cache: &Arc<dyn FeatureCache>) -> Result<Pipeline> {
        let policy = self.policy();
        let generators = self
            .generators
            .iter()
            .map(|spec| spec.build(cache, &policy))
            .collect::<Result<Vec<_>>>()?;

        let mut pipeline = Pipeline::new(generators).with_parallel(self.parallel);
        if let Some(path) = &self.gene_mapping {
            pipeline =
                pipeline.with_gene_mapping(GeneMapping::from_csv(path, self.mapping_has_headers)?);
        }
        Ok(pipeline)
    }
}

/// Column indices in a config file: a single integer or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    /// One column
    One(usize),
    /// Several columns, in output order
    Many(Vec<usize>),
}

impl From<Columns> for ColumnSelection {
    fn from(columns: Columns) -> Self {
        match columns {
            Columns::One(c) => ColumnSelection::from(c),
            Columns::Many(cs) => ColumnSelection::from(cs),
        }
    }
}

/// Declarative description of a (possibly wrapped) generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSpec {
    /// [`Degree`]
    Degree {
        /// Two columns (out, in)
        #[serde(default)]
        directed: bool,
    },
    /// [`ExpectedDegree`]
    ExpectedDegree {
        /// Two columns (out, in)
        #[serde(default)]
        directed: bool,
    },
    /// [`PageRank`]
    Pagerank {
        /// Damping factor
        damping: Option<f64>,
        /// Iteration cap
        max_iter: Option<usize>,
        /// L1 tolerance
        tol: Option<f64>,
    },
    /// [`BetweennessCentrality`]
    Betweenness,
    /// [`ClosenessCentrality`]
    Closeness,
    /// [`ClusteringCoefficient`]
    Clustering,
    /// [`Hits`]
    Hits {
        /// Iteration cap
        max_iter: Option<usize>,
        /// Tolerance
        tol: Option<f64>,
    },
    /// [`NeighbouringConductance`]
    NeighbouringConductance {
        /// Hop radius
        range: usize,
        /// Use edge weights
        #[serde(default)]
        weighted: bool,
    },
    /// `log10` of the inner generator
    Log10 {
        /// Wrapped generator
        inner: Box<GeneratorSpec>,
    },
    /// z-score of the inner generator
    Normalize {
        /// Wrapped generator
        inner: Box<GeneratorSpec>,
    },
    /// Column subset of the inner generator
    Select {
        /// Wrapped generator
        inner: Box<GeneratorSpec>,
        /// Columns to keep
        columns: Columns,
    },
}

impl GeneratorSpec {
    /// Instantiate the generator tree, caching every node in `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid parameters (conductance range 0,
    /// out-of-range column selection).
    pub fn build(
        &self,
        cache: &Arc<dyn FeatureCache>,
        policy: &CachePolicy,
    ) -> Result<Box<dyn FeatureGenerator>> {
        let cached = |generator: Box<dyn FeatureGenerator>| {
            generator.cached(Arc::clone(cache), policy.clone()).boxed()
        };

        let generator = match self {
            Self::Degree { directed } => Degree::new(*directed).boxed(),
            Self::ExpectedDegree { directed } => ExpectedDegree::new(*directed).boxed(),
            Self::Pagerank {
                damping,
                max_iter,
                tol,
            } => {
                let mut pr = PageRank::new();
                if let Some(d) = damping {
                    pr = pr.with_damping(*d);
                }
                if let Some(m) = max_iter {
                    pr = pr.with_max_iter(*m);
                }
                if let Some(t) = tol {
                    pr = pr.with_tolerance(*t);
                }
                pr.boxed()
            }
            Self::Betweenness => BetweennessCentrality::new().boxed(),
            Self::Closeness => ClosenessCentrality::new().boxed(),
            Self::Clustering => ClusteringCoefficient::new().boxed(),
            Self::Hits { max_iter, tol } => {
                let mut hits = Hits::new();
                if let Some(m) = max_iter {
                    hits = hits.with_max_iter(*m);
                }
                if let Some(t) = tol {
                    hits = hits.with_tolerance(*t);
                }
                hits.boxed()
            }
            Self::NeighbouringConductance { range, weighted } => {
                NeighbouringConductance::new(*range)?
                    .weighted(*weighted)
                    .boxed()
            }
            Self::Log10 { inner } => inner.build(cache, policy)?.log10().boxed(),
            Self::Normalize { inner } => inner.build(cache, policy)?.normalized().boxed(),
            Self::Select { inner, columns } => inner
                .build(cache, policy)?
                .select(columns.clone())?
                .boxed(),
        };
        Ok(cached(generator))
    }
}

/// Parses generator names as produced by [`FeatureGenerator::name`], e.g.
/// `degree_directed`, `pagerank_d0.9`, `neighbouring_conductance_r2_weighted`,
/// `hits_i50_t1e-9`, `log10-expected_degree_undirected`, `select_1-hits`.
/// Bare kinds (`degree`, `pagerank`, `neighbouring_conductance`) use
/// defaults.
impl FromStr for GeneratorSpec {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            FeatureError::invalid_parameter(
                "generator",
                s,
                "a generator name such as `degree` or `log10-pagerank`",
            )
        };

        let wrapper = s.split_once('-').filter(|(label, _)| {
            matches!(*label, "log10" | "normalize") || label.starts_with("select_")
        });
        if let Some((label, inner)) = wrapper {
            let inner = Box::new(inner.parse::<GeneratorSpec>()?);
            return match label {
                "log10" => Ok(Self::Log10 { inner }),
                "normalize" => Ok(Self::Normalize { inner }),
                _ => {
                    let columns = label
                        .strip_prefix("select_")
                        .ok_or_else(invalid)?
                        .split('_')
                        .map(|c| c.parse::<usize>().map_err(|_| invalid()))
                        .collect::<Result<Vec<_>>>()?;
                    let columns = if columns.len() == 1 {
                        Columns::One(columns[0])
                    } else {
                        Columns::Many(columns)
                    };
                    Ok(Self::Select { inner, columns })
                }
            };
        }

        let spec = match s {
            "degree" | "degree_undirected" => Self::Degree { directed: false },
            "degree_directed" => Self::Degree { directed: true },
            "expected_degree" | "expected_degree_undirected" => {
                Self::ExpectedDegree { directed: false }
            }
            "expected_degree_directed" => Self::ExpectedDegree { directed: true },
            "pagerank" => Self::Pagerank {
                damping: None,
                max_iter: None,
                tol: None,
            },
            "betweenness" => Self::Betweenness,
            "closeness" => Self::Closeness,
            "clustering" => Self::Clustering,
            "hits" => Self::Hits {
                max_iter: None,
                tol: None,
            },
            "neighbouring_conductance" => Self::NeighbouringConductance {
                range: 1,
                weighted: false,
            },
            _ => {
                if let Some(rest) = s.strip_prefix("pagerank_d") {
                    let (d, settings) = rest.split_once('_').unwrap_or((rest, ""));
                    let damping = d.parse::<f64>().map_err(|_| invalid())?;
                    let (max_iter, tol) = parse_iteration_settings(settings).ok_or_else(invalid)?;
                    Self::Pagerank {
                        damping: Some(damping),
                        max_iter,
                        tol,
                    }
                } else if let Some(settings) = s.strip_prefix("hits_") {
                    let (max_iter, tol) = parse_iteration_settings(settings).ok_or_else(invalid)?;
                    Self::Hits { max_iter, tol }
                } else if let Some(rest) = s.strip_prefix("neighbouring_conductance_r") {
                    let (range, weighted) = match rest.strip_suffix("_weighted") {
                        Some(r) => (r, true),
                        None => (rest, false),
                    };
                    let range = range.parse::<usize>().map_err(|_| invalid())?;
                    Self::NeighbouringConductance { range, weighted }
                } else {
                    return Err(invalid());
                }
            }
        };
        Ok(spec)
    }
}

impl fmt::Display for GeneratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degree { directed } => {
                write!(f, "{}", Degree::new(*directed).name())
            }
            Self::ExpectedDegree { directed } => {
                write!(f, "{}", ExpectedDegree::new(*directed).name())
            }
            Self::Pagerank {
                damping,
                max_iter,
                tol,
            } => {
                let mut pr = PageRank::new();
                if let Some(d) = damping {
                    pr = pr.with_damping(*d);
                }
                if let Some(m) = max_iter {
                    pr = pr.with_max_iter(*m);
                }
                if let Some(t) = tol {
                    pr = pr.with_tolerance(*t);
                }
                write!(f, "{}", pr.name())
            }
            Self::Betweenness => write!(f, "betweenness"),
            Self::Closeness => write!(f, "closeness"),
            Self::Clustering => write!(f, "clustering"),
            Self::Hits { max_iter, tol } => {
                let mut hits = Hits::new();
                if let Some(m) = max_iter {
                    hits = hits.with_max_iter(*m);
                }
                if let Some(t) = tol {
                    hits = hits.with_tolerance(*t);
                }
                write!(f, "{}", hits.name())
            }
            Self::NeighbouringConductance { range, weighted } => {
                let suffix = if *weighted { "_weighted" } else { "" };
                write!(f, "neighbouring_conductance_r{range}{suffix}")
            }
            Self::Log10 { inner } => write!(f, "log10-{inner}"),
            Self::Normalize { inner } => write!(f, "normalize-{inner}"),
            Self::Select { inner, columns } => {
                write!(f, "select")?;
                match columns {
                    Columns::One(c) => write!(f, "_{c}")?,
                    Columns::Many(cs) => {
                        for c in cs {
                            write!(f, "_{c}")?;
                        }
                    }
                }
                write!(f, "-{inner}")
            }
        }
    }
}

/// `i50_t1e-8`, `i50` or `t1e-8` (empty for none) as `(max_iter, tol)`.
fn parse_iteration_settings(settings: &str) -> Option<(Option<usize>, Option<f64>)> {
    let (mut max_iter, mut tol) = (None, None);
    for part in settings.split('_').filter(|p| !p.is_empty()) {
        if let Some(m) = part.strip_prefix('i') {
            max_iter = Some(m.parse().ok()?);
        } else if let Some(t) = part.strip_prefix('t') {
            tol = Some(t.parse().ok()?);
        } else {
            return None;
        }
    }
    Some((max_iter, tol))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
