//! Composition of generators into one labeled feature table.
//!
//! # Examples
//!
//! ```
//! use ppi_features::prelude::*;
//!
//! let mut b = Graph::builder(4, false);
//! for i in 0..4 {
//!     b.set_name(i, format!("n{i}")).expect("in range");
//! }
//! b.add_edge(0, 1, 1000.0).expect("valid edge");
//! b.add_edge(1, 2, 500.0).expect("valid edge");
//! b.add_edge(2, 3, 1000.0).expect("valid edge");
//! let graph = b.build();
//!
//! let pipeline = Pipeline::new(vec![
//!     Degree::new(false).boxed(),
//!     ExpectedDegree::new(false).boxed(),
//! ]);
//! let (table, rows) = pipeline.apply(&graph, false).expect("non-empty graph");
//! assert_eq!(rows, vec!["n0", "n1", "n2", "n3"]);
//! assert_eq!(table.column("degree_undirected0"), Some(vec![1.0, 2.0, 2.0, 1.0]));
//! assert_eq!(table.column("expected_degree_undirected0"), Some(vec![1.0, 1.5, 1.5, 1.0]));
//! ```

use std::io::Write;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{FeatureError, Result};
use crate::features::FeatureGenerator;
use crate::graph::Graph;
use crate::mapping::GeneMapping;
use crate::primitives::FeatureBlock;

/// Ordered list of generators producing one column block each.
///
/// Columns appear in generator order and are never reordered or merged,
/// even when two generators share a name.
pub struct Pipeline {
    generators: Vec<Box<dyn FeatureGenerator>>,
    mapping: Option<GeneMapping>,
    parallel: bool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("generators", &self.generator_names())
            .field("mapping", &self.mapping.as_ref().map(GeneMapping::len))
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Pipeline {
    /// Compose `generators` in order.
    #[must_use]
    pub fn new(generators: Vec<Box<dyn FeatureGenerator>>) -> Self {
        Self {
            generators,
            mapping: None,
            parallel: false,
        }
    }

    /// Filter and rename rows through `mapping` after computing.
    #[must_use]
    pub fn with_gene_mapping(mut self, mapping: GeneMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Run generators concurrently (requires the `parallel` feature;
    /// otherwise ignored). Column order is unaffected.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Name of every generator, in order.
    #[must_use]
    pub fn generator_names(&self) -> Vec<String> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Flat list of column names.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.generators
            .iter()
            .flat_map(|g| g.feature_names())
            .collect()
    }

    /// Total width.
    #[must_use]
    pub fn n_feat(&self) -> usize {
        self.generators.iter().map(|g| g.n_feat()).sum()
    }

    /// Number of generators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// True when there are no generators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Compute every generator on `graph` and assemble the table.
    ///
    /// Rows are labeled with node names (decimal ids for unnamed nodes).
    /// With a gene mapping, unmapped rows are dropped and the rest renamed
    /// to their gene symbols. Returns the table and its final row labels.
    ///
    /// # Errors
    ///
    /// Returns the first generator error, or [`FeatureError::ShapeMismatch`]
    /// when a block's shape is not `(n_nodes, n_feat)`.
    pub fn apply(&self, graph: &Graph, verbose: bool) -> Result<(FeatureTable, Vec<String>)> {
        let n = graph.num_nodes();
        let labels: Vec<String> = (0..n).map(|v| graph.label(v)).collect();
        let mut values = FeatureBlock::zeros(n, self.n_feat());

        let blocks = self.compute_blocks(graph, verbose)?;
        let mut offset = 0;
        for (generator, block) in self.generators.iter().zip(blocks) {
            let n_feat = generator.n_feat();
            if block.shape() != (n, n_feat) {
                return Err(FeatureError::ShapeMismatch {
                    generator: generator.name(),
                    expected: (n, n_feat),
                    actual: block.shape(),
                });
            }
            values
                .write_columns(offset, &block)
                .map_err(FeatureError::from)?;
            offset += n_feat;
        }

        let table = FeatureTable {
            row_labels: labels,
            column_names: self.column_names(),
            values,
        };
        let table = match &self.mapping {
            Some(mapping) => table.rename_rows(mapping)?,
            None => table,
        };
        if verbose {
            tracing::info!(
                nodes = n,
                rows = table.row_labels.len(),
                columns = table.column_names.len(),
                "pipeline finished"
            );
        }

        let rows = table.row_labels.clone();
        Ok((table, rows))
    }

    fn compute_blocks(&self, graph: &Graph, verbose: bool) -> Result<Vec<FeatureBlock>> {
        let run = |generator: &Box<dyn FeatureGenerator>| -> Result<FeatureBlock> {
            let start = Instant::now();
            let block = generator.apply(graph)?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
            if verbose {
                tracing::info!(generator = %generator.name(), elapsed_ms, "computed");
            } else {
                tracing::debug!(generator = %generator.name(), elapsed_ms, "computed");
            }
            Ok(block)
        };

        #[cfg(feature = "parallel")]
        if self.parallel {
            return self.generators.par_iter().map(run).collect();
        }

        self.generators.iter().map(run).collect()
    }
}

/// Node-by-feature matrix with row labels and column names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    row_labels: Vec<String>,
    column_names: Vec<String>,
    values: FeatureBlock,
}

impl FeatureTable {
    /// Assemble a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the labels do not match the value shape.
    pub fn new(
        row_labels: Vec<String>,
        column_names: Vec<String>,
        values: FeatureBlock,
    ) -> Result<Self> {
        if values.shape() != (row_labels.len(), column_names.len()) {
            return Err(FeatureError::ShapeMismatch {
                generator: "feature table".to_string(),
                expected: (row_labels.len(), column_names.len()),
                actual: values.shape(),
            });
        }
        Ok(Self {
            row_labels,
            column_names,
            values,
        })
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Row labels (gene symbols after mapping).
    #[must_use]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column names in generator order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// The numeric values.
    #[must_use]
    pub fn values(&self) -> &FeatureBlock {
        &self.values
    }

    /// Values of the first column called `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.column_names.iter().position(|c| c == name)?;
        Some(self.values.column(j))
    }

    /// Values of the first row labeled `label`.
    #[must_use]
    pub fn row(&self, label: &str) -> Option<&[f64]> {
        let i = self.row_labels.iter().position(|r| r == label)?;
        Some(self.values.row(i))
    }

    /// `(row label, value)` pairs of a column, skipping NaN and infinities.
    #[must_use]
    pub fn finite_column(&self, name: &str) -> Option<Vec<(String, f64)>> {
        let column = self.column(name)?;
        Some(
            self.row_labels
                .iter()
                .zip(column)
                .filter(|(_, v)| v.is_finite())
                .map(|(label, v)| (label.clone(), v))
                .collect(),
        )
    }

    /// Write as CSV with a `gene` label column.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(
            std::iter::once("gene").chain(self.column_names.iter().map(String::as_str)),
        )?;
        for (i, label) in self.row_labels.iter().enumerate() {
            let mut record = Vec::with_capacity(self.column_names.len() + 1);
            record.push(label.clone());
            record.extend(self.values.row(i).iter().map(f64::to_string));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn rename_rows(self, mapping: &GeneMapping) -> Result<Self> {
        let kept = mapping.apply(&self.row_labels);
        let indices: Vec<usize> = kept.iter().map(|(i, _)| *i).collect();
        let values = self
            .values
            .select_rows(&indices)
            .map_err(FeatureError::from)?;
        let dropped = self.row_labels.len() - kept.len();
        if dropped > 0 {
            tracing::debug!(dropped, "rows without a gene symbol removed");
        }
        Ok(Self {
            row_labels: kept.into_iter().map(|(_, symbol)| symbol).collect(),
            column_names: self.column_names,
            values,
        })
    }
}
