//! Mapping from graph node identifiers to canonical gene symbols.
//!
//! The mapping table is a CSV whose third column (index 2) holds a source
//! identifier (e.g. an Ensembl protein id) and whose fourth column (index 3)
//! holds the gene symbol. Other columns are ignored.
//!
//! STRING node names carry an NCBI taxon prefix (`9606.ENSP00000000233`).
//! A label that is not in the table is retried without that prefix.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use crate::error::Result;

const SOURCE_COLUMN: usize = 2;
const SYMBOL_COLUMN: usize = 3;

/// Source identifier to gene symbol lookup.
///
/// # Examples
///
/// ```
/// use ppi_features::mapping::GeneMapping;
///
/// let table = "a,b,ENSP1,TP53\na,b,ENSP2,BRCA1\n";
/// let mapping = GeneMapping::from_reader(table.as_bytes(), false).expect("valid csv");
/// assert_eq!(mapping.get("9606.ENSP1"), Some("TP53"));
/// assert_eq!(mapping.get("ENSP3"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneMapping {
    symbols: HashMap<String, String>,
}

impl GeneMapping {
    /// Load a mapping table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not valid CSV.
    pub fn from_csv<P: AsRef<Path>>(path: P, has_headers: bool) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let mapping = Self::from_reader(file, has_headers)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            entries = mapping.len(),
            "loaded gene mapping"
        );
        Ok(mapping)
    }

    /// Load a mapping table from any reader.
    ///
    /// Rows with fewer than four columns are skipped. The first mapping of a
    /// source identifier wins; empty fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid CSV.
    pub fn from_reader<R: Read>(reader: R, has_headers: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(reader);

        let mut symbols = HashMap::new();
        let mut short_rows = 0usize;
        for record in reader.records() {
            let record = record?;
            let (Some(source), Some(symbol)) = (record.get(SOURCE_COLUMN), record.get(SYMBOL_COLUMN))
            else {
                short_rows += 1;
                continue;
            };
            let (source, symbol) = (source.trim(), symbol.trim());
            if source.is_empty() || symbol.is_empty() {
                continue;
            }
            symbols
                .entry(source.to_string())
                .or_insert_with(|| symbol.to_string());
        }

        if short_rows > 0 {
            tracing::warn!(rows = short_rows, "skipped mapping rows with fewer than four columns");
        }
        Ok(Self { symbols })
    }

    /// Build a mapping from `(source, symbol)` pairs; first pair wins.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut symbols = HashMap::new();
        for (source, symbol) in pairs {
            symbols.entry(source.into()).or_insert_with(|| symbol.into());
        }
        Self { symbols }
    }

    /// Number of source identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol for `label`, retrying without a numeric taxon prefix.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.symbols
            .get(label)
            .or_else(|| strip_taxon(label).and_then(|id| self.symbols.get(id)))
            .map(String::as_str)
    }

    /// Surviving rows as `(row index, symbol)`, in row order.
    ///
    /// Unmapped labels are dropped. A symbol already taken by an earlier row
    /// is dropped too, so the result never repeats a symbol.
    #[must_use]
    pub fn apply(&self, labels: &[String]) -> Vec<(usize, String)> {
        let mut taken = HashSet::new();
        let mut kept = Vec::new();
        let mut duplicates = 0usize;

        for (row, label) in labels.iter().enumerate() {
            let Some(symbol) = self.get(label) else {
                continue;
            };
            if taken.insert(symbol) {
                kept.push((row, symbol.to_string()));
            } else {
                duplicates += 1;
            }
        }

        tracing::debug!(
            rows = labels.len(),
            kept = kept.len(),
            duplicates,
            "applied gene mapping"
        );
        kept
    }
}

/// `9606.ENSP1` -> `ENSP1`; `None` without a numeric prefix.
fn strip_taxon(label: &str) -> Option<&str> {
    let (taxon, id) = label.split_once('.')?;
    if !taxon.is_empty() && taxon.bytes().all(|b| b.is_ascii_digit()) && !id.is_empty() {
        Some(id)
    } else {
        None
    }
}
