//! Generators that transform another generator's output.

use std::fmt;
use std::sync::Mutex;

use super::{indexed_names, FeatureGenerator};
use crate::error::{FeatureError, Result};
use crate::graph::Graph;
use crate::primitives::FeatureBlock;

/// A block-to-block transformation applied by [`Wrapped`].
pub trait BlockTransform: Send + Sync {
    /// Prefix of the wrapper's name, e.g. `log10`.
    fn label(&self) -> String;

    /// Output width given the inner generator's width.
    fn n_feat(&self, inner_n_feat: usize) -> usize {
        inner_n_feat
    }

    /// Column labels given the wrapper's name and the inner labels.
    fn feature_names(&self, name: &str, inner: &[String]) -> Vec<String> {
        indexed_names(name, self.n_feat(inner.len()))
    }

    /// Transform the inner generator's block.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not fit the transform.
    fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock>;
}

/// A generator decorated with a [`BlockTransform`].
///
/// The wrapper's name is `{label}-{inner name}`, so it never shares a cache
/// entry with the inner generator. `compute` calls the inner generator's
/// `apply`, which uses the inner cache when there is one.
#[derive(Debug)]
pub struct Wrapped<G, T> {
    inner: G,
    transform: T,
}

/// `log10` of a generator.
pub type Log10Wrapper<G> = Wrapped<G, Log10>;
/// Column-wise z-score of a generator.
pub type NormalizeWrapper<G> = Wrapped<G, Normalize>;
/// Column projection of a generator.
pub type FeatureSelector<G> = Wrapped<G, Select>;

impl<G: FeatureGenerator, T: BlockTransform> Wrapped<G, T> {
    /// Decorate `inner` with `transform`.
    pub fn new(inner: G, transform: T) -> Self {
        Self { inner, transform }
    }

    /// The decorated generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// The transform.
    pub fn transformer(&self) -> &T {
        &self.transform
    }
}

impl<G: FeatureGenerator, T: BlockTransform> FeatureGenerator for Wrapped<G, T> {
    fn name(&self) -> String {
        format!("{}-{}", self.transform.label(), self.inner.name())
    }

    fn n_feat(&self) -> usize {
        self.transform.n_feat(self.inner.n_feat())
    }

    fn feature_names(&self) -> Vec<String> {
        self.transform
            .feature_names(&self.name(), &self.inner.feature_names())
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        let block = self.inner.apply(graph)?;
        self.transform.transform(block)
    }
}

/// Element-wise base-10 logarithm.
///
/// Zeros become `-inf` and negatives NaN; neither is special-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Log10;

impl BlockTransform for Log10 {
    fn label(&self) -> String {
        "log10".to_string()
    }

    fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        Ok(block.map(f64::log10))
    }
}

/// Per-column statistics from the last [`Normalize`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    /// Mean of the finite entries of each column
    pub mean: Vec<f64>,
    /// Population standard deviation of the finite entries of each column
    pub std: Vec<f64>,
}

/// Column-wise z-score: `(x - mean) / std`.
///
/// Statistics come from the finite entries of the current block and are
/// recomputed on every call; non-finite entries pass through as NaN/inf.
/// A column with zero spread is centred but not scaled.
#[derive(Debug, Default)]
pub struct Normalize {
    stats: Mutex<Option<ColumnStats>>,
}

impl Normalize {
    /// Create a normalizer with no statistics yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the most recent transform, if any.
    #[must_use]
    pub fn statistics(&self) -> Option<ColumnStats> {
        self.stats.lock().ok().and_then(|s| s.clone())
    }

    fn fit(block: &FeatureBlock) -> ColumnStats {
        let (n_rows, n_cols) = block.shape();
        let mut mean = vec![0.0; n_cols];
        let mut std = vec![0.0; n_cols];

        for j in 0..n_cols {
            let finite: Vec<f64> = (0..n_rows)
                .map(|i| block.get(i, j))
                .filter(|v| v.is_finite())
                .collect();
            if finite.is_empty() {
                mean[j] = f64::NAN;
                std[j] = f64::NAN;
                continue;
            }
            let count = finite.len() as f64;
            let mu = finite.iter().sum::<f64>() / count;
            let sum_sq: f64 = finite.iter().map(|v| (v - mu) * (v - mu)).sum();
            mean[j] = mu;
            // Population std (divide by n, not n-1)
            std[j] = (sum_sq / count).sqrt();
        }

        ColumnStats { mean, std }
    }
}

impl BlockTransform for Normalize {
    fn label(&self) -> String {
        "normalize".to_string()
    }

    fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        let stats = Self::fit(&block);
        let (n_rows, n_cols) = block.shape();

        let mut result = block;
        for i in 0..n_rows {
            for j in 0..n_cols {
                let mut val = result.get(i, j) - stats.mean[j];
                if stats.std[j] > 1e-10 {
                    val /= stats.std[j];
                }
                result.set(i, j, val);
            }
        }

        if let Ok(mut slot) = self.stats.lock() {
            *slot = Some(stats);
        }
        Ok(result)
    }
}

/// Column indices for [`Select`]. A single index is a one-element list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection(pub Vec<usize>);

impl From<usize> for ColumnSelection {
    fn from(column: usize) -> Self {
        Self(vec![column])
    }
}

impl From<Vec<usize>> for ColumnSelection {
    fn from(columns: Vec<usize>) -> Self {
        Self(columns)
    }
}

impl From<&[usize]> for ColumnSelection {
    fn from(columns: &[usize]) -> Self {
        Self(columns.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for ColumnSelection {
    fn from(columns: [usize; N]) -> Self {
        Self(columns.to_vec())
    }
}

/// Projection onto a subset of columns.
///
/// # Examples
///
/// ```
/// use ppi_features::prelude::*;
///
/// let authority = Hits::new().select(1).expect("hits has two columns");
/// assert_eq!(authority.n_feat(), 1);
/// assert_eq!(authority.feature_names(), vec!["hits_authority"]);
/// assert_eq!(authority.name(), "select_1-hits");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    columns: Vec<usize>,
}

impl Select {
    /// Select `columns` out of `inner_n_feat`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is empty or out of range.
    pub fn new(columns: impl Into<ColumnSelection>, inner_n_feat: usize) -> Result<Self> {
        let ColumnSelection(columns) = columns.into();
        if columns.is_empty() {
            return Err(FeatureError::invalid_parameter(
                "columns",
                "[]",
                "at least one column",
            ));
        }
        if let Some(&bad) = columns.iter().find(|&&c| c >= inner_n_feat) {
            return Err(FeatureError::invalid_parameter(
                "columns",
                bad,
                &format!("< {inner_n_feat}"),
            ));
        }
        Ok(Self { columns })
    }

    /// Selected column indices.
    #[must_use]
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "select")?;
        for c in &self.columns {
            write!(f, "_{c}")?;
        }
        Ok(())
    }
}

impl BlockTransform for Select {
    fn label(&self) -> String {
        self.to_string()
    }

    fn n_feat(&self, _inner_n_feat: usize) -> usize {
        self.columns.len()
    }

    fn feature_names(&self, _name: &str, inner: &[String]) -> Vec<String> {
        self.columns
            .iter()
            .map(|&c| inner.get(c).cloned().unwrap_or_default())
            .collect()
    }

    fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        block
            .select_columns(&self.columns)
            .map_err(FeatureError::from)
    }
}
