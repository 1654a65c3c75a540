//! Statistical checks of features against reference gene sets.
//!
//! - Mann-Whitney U: does a feature rank reference genes higher?
//! - Hypergeometric enrichment: are reference genes over-represented in a
//!   selection?
//! - [`GeneListReader`]: reference gene lists from delimited files.
//!
//! # Example
//!
//! ```
//! use ppi_features::validation::{hypergeom_sf, mann_whitney_u};
//!
//! let in_set = [3.1, 2.8, 3.5, 4.0];
//! let rest = [1.0, 1.2, 0.8, 1.5, 1.1];
//! let result = mann_whitney_u(&in_set, &rest).expect("valid samples");
//! assert_eq!(result.statistic, 20.0);
//! assert!(result.pvalue < 0.05);
//!
//! // P(X >= 5) drawing 5 of 10 with 5 successes
//! assert!((hypergeom_sf(5, 10, 5, 5).expect("valid") - 1.0 / 252.0).abs() < 1e-10);
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use statrs::distribution::{ContinuousCDF, DiscreteCDF, Hypergeometric, Normal};

use crate::error::{FeatureError, Result};

/// Result of a Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    /// U statistic of the first sample
    pub statistic: f64,
    /// Two-sided p-value
    pub pvalue: f64,
}

/// Result of a hypergeometric enrichment test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichmentResult {
    /// Selected genes that are also reference genes
    pub overlap: usize,
    /// Overlap expected by chance
    pub expected: f64,
    /// `overlap / expected` (NaN when nothing is expected)
    pub fold: f64,
    /// P(overlap at least this large)
    pub pvalue: f64,
}

/// Two-sided Mann-Whitney U test (normal approximation).
///
/// Ties get average ranks and the variance is tie-corrected; a continuity
/// correction of 0.5 is applied.
///
/// # Errors
///
/// Returns an error if a sample is empty or contains NaN.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Result<TestResult> {
    if x.is_empty() || y.is_empty() {
        return Err(FeatureError::invalid_parameter(
            "samples",
            format!("{} and {} values", x.len(), y.len()),
            "two non-empty samples",
        ));
    }
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return Err(FeatureError::invalid_parameter(
            "samples",
            "NaN",
            "NaN-free values (filter undefined features first)",
        ));
    }

    let (n1, n2) = (x.len() as f64, y.len() as f64);
    let n = n1 + n2;

    let mut pooled: Vec<(f64, bool)> = x
        .iter()
        .map(|&v| (v, true))
        .chain(y.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Average ranks over tie groups
    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i + 1;
        while j < pooled.len() && pooled[j].0 == pooled[i].0 {
            j += 1;
        }
        let t = (j - i) as f64;
        let avg_rank = (i + j + 1) as f64 / 2.0;
        rank_sum_x += avg_rank * pooled[i..j].iter().filter(|(_, in_x)| *in_x).count() as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    let u = rank_sum_x - n1 * (n1 + 1.0) / 2.0;
    let mean = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 || !variance.is_finite() {
        return Ok(TestResult {
            statistic: u,
            pvalue: 1.0,
        });
    }

    let z = ((u - mean).abs() - 0.5).max(0.0) / variance.sqrt();
    let standard = Normal::new(0.0, 1.0).map_err(|e| FeatureError::Other(e.to_string()))?;
    let pvalue = (2.0 * standard.sf(z)).clamp(0.0, 1.0);
    Ok(TestResult {
        statistic: u,
        pvalue,
    })
}

/// `P(X >= k)` for `X ~ Hypergeometric(population, successes, draws)`.
///
/// # Errors
///
/// Returns an error if `successes` or `draws` exceed `population`.
pub fn hypergeom_sf(k: usize, population: usize, successes: usize, draws: usize) -> Result<f64> {
    if successes > population || draws > population {
        return Err(FeatureError::invalid_parameter(
            "hypergeometric",
            format!("N={population}, K={successes}, n={draws}"),
            "K <= N and n <= N",
        ));
    }

    if k == 0 {
        return Ok(1.0);
    }
    if k > successes.min(draws) {
        return Ok(0.0);
    }

    let dist = Hypergeometric::new(population as u64, successes as u64, draws as u64).map_err(
        |e| {
            FeatureError::invalid_parameter(
                "hypergeometric",
                format!("N={population}, K={successes}, n={draws}"),
                &e.to_string(),
            )
        },
    )?;
    Ok(dist.sf(k as u64 - 1).clamp(0.0, 1.0))
}

/// Over-representation of `reference` genes among `selected` genes.
///
/// Both lists are restricted to `universe` first; duplicates are ignored.
///
/// # Errors
///
/// Returns an error if the universe is empty.
pub fn enrichment(
    selected: &[String],
    reference: &[String],
    universe: &[String],
) -> Result<EnrichmentResult> {
    let universe: HashSet<&str> = universe.iter().map(String::as_str).collect();
    if universe.is_empty() {
        return Err(FeatureError::invalid_parameter(
            "universe",
            "[]",
            "at least one gene",
        ));
    }
    let selected = within(selected, &universe);
    let reference = within(reference, &universe);

    let overlap = selected.intersection(&reference).count();
    let expected = selected.len() as f64 * reference.len() as f64 / universe.len() as f64;
    let fold = if expected > 0.0 {
        overlap as f64 / expected
    } else {
        f64::NAN
    };
    let pvalue = hypergeom_sf(overlap, universe.len(), reference.len(), selected.len())?;

    Ok(EnrichmentResult {
        overlap,
        expected,
        fold,
        pvalue,
    })
}

/// Distinct `genes` that are members of `universe`.
fn within<'a>(genes: &'a [String], universe: &HashSet<&str>) -> HashSet<&'a str> {
    genes
        .iter()
        .map(String::as_str)
        .filter(|g| universe.contains(*g))
        .collect()
}

/// A CSV column addressed by header name or by 0-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Header name (requires a header row)
    Name(String),
    /// 0-based position
    Index(usize),
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::Name(name.to_string())
    }
}

impl From<usize> for Column {
    fn from(index: usize) -> Self {
        Column::Index(index)
    }
}

/// Reader for reference gene lists in delimited text files.
///
/// Covers the usual reference sources: a headed CSV (Cancer Gene Census
/// `Gene Symbol`), a headed CSV restricted to some rows (DrugBank
/// `Species == Human`), or a tab-separated file with `#` comments and
/// positional columns (OMIM `mim2gene.txt`, type `gene`).
///
/// # Examples
///
/// ```
/// use ppi_features::validation::GeneListReader;
///
/// let mim2gene = "# MIM Number\tType\tEntrez\tSymbol\n\
///                 100050\tphenotype\t\t\n\
///                 100640\tgene\t216\tALDH1A1\n";
/// let genes = GeneListReader::new(3)
///     .delimiter(b'\t')
///     .has_headers(false)
///     .comment(b'#')
///     .filter(1, "gene")
///     .read(mim2gene.as_bytes())
///     .expect("valid input");
/// assert_eq!(genes, vec!["ALDH1A1"]);
/// ```
#[derive(Debug, Clone)]
pub struct GeneListReader {
    column: Column,
    delimiter: u8,
    has_headers: bool,
    comment: Option<u8>,
    filters: Vec<(Column, String)>,
}

impl GeneListReader {
    /// Read `column` of a headed, comma-separated file.
    #[must_use]
    pub fn new(column: impl Into<Column>) -> Self {
        Self {
            column: column.into(),
            delimiter: b',',
            has_headers: true,
            comment: None,
            filters: Vec::new(),
        }
    }

    /// Field delimiter (default `,`).
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Whether the first record is a header row (default `true`).
    #[must_use]
    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Skip lines starting with `comment`.
    #[must_use]
    pub fn comment(mut self, comment: u8) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Keep only rows whose `column` equals `value` (after trimming).
    /// Several filters must all match.
    #[must_use]
    pub fn filter(mut self, column: impl Into<Column>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Read a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or a named
    /// column is missing from the header.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let file = std::fs::File::open(path.as_ref())?;
        self.read(file)
    }

    /// Read from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed or a named column is
    /// missing from the header.
    pub fn read<R: Read>(&self, input: R) -> Result<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .comment(self.comment)
            .flexible(true)
            .from_reader(input);
        let headers = if self.has_headers {
            Some(reader.headers()?.clone())
        } else {
            None
        };

        let idx = resolve(&self.column, headers.as_ref())?;
        let filters = self
            .filters
            .iter()
            .map(|(column, value)| Ok((resolve(column, headers.as_ref())?, value.as_str())))
            .collect::<Result<Vec<_>>>()?;

        let mut genes = Vec::new();
        for record in reader.records() {
            let record = record?;
            let keep = filters
                .iter()
                .all(|(i, value)| record.get(*i).map(str::trim) == Some(*value));
            if !keep {
                continue;
            }
            if let Some(value) = record.get(idx).map(str::trim).filter(|v| !v.is_empty()) {
                genes.push(value.to_string());
            }
        }
        Ok(genes)
    }
}

fn resolve(column: &Column, headers: Option<&csv::StringRecord>) -> Result<usize> {
    match column {
        Column::Index(i) => Ok(*i),
        Column::Name(name) => {
            let headers = headers.ok_or_else(|| {
                FeatureError::invalid_parameter(
                    "column",
                    name,
                    "a column index (the input has no header row)",
                )
            })?;
            headers.iter().position(|h| h == name).ok_or_else(|| {
                FeatureError::invalid_parameter(
                    "column",
                    name,
                    &format!("one of {:?}", headers.iter().collect::<Vec<_>>()),
                )
            })
        }
    }
}

/// Non-empty values of the column named `column` in a headed CSV file,
/// e.g. `Gene Symbol` of the Cancer Gene Census.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no such column.
pub fn read_gene_list<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<String>> {
    GeneListReader::new(column).read_file(path)
}
