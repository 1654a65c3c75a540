//! Pajek network format reader/writer and STRING conversion.
//!
//! ```text
//! *Vertices 3
//! 0 9606.ENSP00000000233
//! 1 9606.ENSP00000000412
//! 2 9606.ENSP00000001008
//! *arcs
//! 0 1 900
//! 1 2 455
//! ```
//!
//! Vertex ids are dense and start at 0. Weights are STRING combined scores
//! (confidence × 1000); a missing weight defaults to 1.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::{Graph, GraphBuilder, NodeId};
use crate::error::{FeatureError, Result};

/// Configurable Pajek reader.
///
/// # Examples
///
/// ```
/// use ppi_features::graph::PajekReader;
///
/// let text = "*Vertices 2\n0 A\n1 B\n*edges\n0 1 700\n";
/// let g = PajekReader::new().parse_str(text).expect("valid pajek");
/// assert_eq!(g.num_edges(), 1);
/// assert_eq!(g.name(1), Some("B"));
///
/// let thresholded = PajekReader::new().with_min_weight(800.0).parse_str(text).expect("valid pajek");
/// assert_eq!(thresholded.num_edges(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PajekReader {
    directed: bool,
    min_weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Vertices,
    Edges,
}

impl PajekReader {
    /// Reader producing undirected graphs with no weight threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directed graph instead of collapsing arcs into edges.
    #[must_use]
    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Drop edges whose weight is strictly below `threshold`.
    #[must_use]
    pub fn with_min_weight(mut self, threshold: f64) -> Self {
        self.min_weight = Some(threshold);
        self
    }

    /// Parse a Pajek file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is malformed.
    pub fn parse_file(&self, path: &Path) -> Result<Graph> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file), path)
    }

    /// Parse Pajek text held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed.
    pub fn parse_str(&self, content: &str) -> Result<Graph> {
        self.parse(content.as_bytes(), Path::new("<memory>"))
    }

    /// Parse Pajek text from any buffered reader; `path` labels errors.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or malformed content.
    #[allow(clippy::too_many_lines)]
    pub fn parse<R: BufRead>(&self, reader: R, path: &Path) -> Result<Graph> {
        let parse_error = |line: usize, cause: String| FeatureError::Parse {
            path: path.to_path_buf(),
            line: Some(line),
            cause,
        };

        let mut section = Section::Header;
        let mut builder: Option<GraphBuilder> = None;
        let mut n_nodes = 0;
        let mut vertices_seen = 0;
        let mut skipped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line_num = idx + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            if let Some(directive) = line.strip_prefix('*') {
                let mut parts = directive.split_whitespace();
                let keyword = parts.next().unwrap_or_default().to_ascii_lowercase();
                match keyword.as_str() {
                    "vertices" if section == Section::Header => {
                        let count = parts.next().ok_or_else(|| {
                            parse_error(line_num, "*Vertices without a node count".into())
                        })?;
                        n_nodes = count.parse().map_err(|_| {
                            parse_error(line_num, format!("Invalid node count: {count}"))
                        })?;
                        builder = Some(GraphBuilder::new(n_nodes, self.directed));
                        section = Section::Vertices;
                    }
                    "arcs" | "edges" | "arcslist" | "edgeslist" if section != Section::Header => {
                        section = Section::Edges;
                    }
                    _ => {
                        return Err(parse_error(
                            line_num,
                            format!("Unexpected section header: {line}"),
                        ));
                    }
                }
                continue;
            }

            let graph = builder.as_mut().ok_or_else(|| {
                parse_error(line_num, "Data before *Vertices header".into())
            })?;
            let parts: Vec<&str> = line.split_whitespace().collect();

            match section {
                Section::Header => {
                    return Err(parse_error(line_num, "Data before *Vertices header".into()));
                }
                Section::Vertices => {
                    let id = parse_node(parts[0], n_nodes)
                        .map_err(|cause| parse_error(line_num, cause))?;
                    if parts.len() > 1 {
                        let name = parts[1..].join(" ");
                        graph.set_name(id, name.trim_matches('"'))?;
                    }
                    vertices_seen += 1;
                }
                Section::Edges => {
                    if parts.len() < 2 {
                        return Err(parse_error(
                            line_num,
                            format!("Expected '<src> <dst> [weight]', got: {line}"),
                        ));
                    }
                    let source = parse_node(parts[0], n_nodes)
                        .map_err(|cause| parse_error(line_num, cause))?;
                    let target = parse_node(parts[1], n_nodes)
                        .map_err(|cause| parse_error(line_num, cause))?;
                    let weight = match parts.get(2) {
                        Some(token) => token
                            .parse::<f64>()
                            .ok()
                            .filter(|w| w.is_finite() && *w >= 0.0)
                            .ok_or_else(|| {
                                parse_error(line_num, format!("Invalid edge weight: {token}"))
                            })?,
                        None => 1.0,
                    };
                    if self.min_weight.is_some_and(|t| weight < t) {
                        skipped += 1;
                        continue;
                    }
                    graph.add_edge(source, target, weight)?;
                }
            }
        }

        let builder = builder.ok_or_else(|| FeatureError::Parse {
            path: path.to_path_buf(),
            line: None,
            cause: "Missing *Vertices header".into(),
        })?;
        if vertices_seen > n_nodes {
            return Err(FeatureError::Parse {
                path: path.to_path_buf(),
                line: None,
                cause: format!("Declared {n_nodes} vertices but listed {vertices_seen}"),
            });
        }

        let graph = builder.build();
        tracing::debug!(
            path = %path.display(),
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            below_threshold = skipped,
            "parsed pajek graph"
        );
        Ok(graph)
    }
}

fn parse_node(token: &str, n_nodes: usize) -> std::result::Result<NodeId, String> {
    let id: NodeId = token
        .parse()
        .map_err(|_| format!("Invalid node id: {token}"))?;
    if id >= n_nodes {
        return Err(format!("Node id {id} outside 0..{n_nodes}"));
    }
    Ok(id)
}

/// Serialize `graph` in Pajek format.
///
/// Directed graphs use `*arcs`; undirected graphs use `*edges` and list
/// each edge once.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_pajek<W: Write>(graph: &Graph, mut writer: W) -> Result<()> {
    writeln!(writer, "*Vertices {}", graph.num_nodes())?;
    for v in 0..graph.num_nodes() {
        writeln!(writer, "{v} {}", graph.label(v))?;
    }
    writeln!(writer, "{}", if graph.is_directed() { "*arcs" } else { "*edges" })?;
    for (u, v, w) in graph.edges() {
        writeln!(writer, "{u} {v} {w}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Counts reported by [`convert_string_links`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Distinct proteins
    pub nodes: usize,
    /// Interaction lines written
    pub arcs: usize,
}

/// Convert a STRING `protein1 protein2 combined_score` table to Pajek.
///
/// The first line is a header. Node ids are assigned in order of first
/// appearance; every interaction line becomes one arc.
///
/// # Errors
///
/// Returns an error on I/O failure or a line with fewer than three fields.
pub fn convert_string_links<R: BufRead, W: Write>(
    input: R,
    mut output: W,
) -> Result<ConversionSummary> {
    let mut ids: HashMap<String, NodeId> = HashMap::new();
    let mut names: Vec<String> = Vec::new();
    let mut arcs: Vec<(NodeId, NodeId, String)> = Vec::new();

    let mut intern = |name: &str| -> NodeId {
        if let Some(&id) = ids.get(name) {
            return id;
        }
        let id = names.len();
        ids.insert(name.to_string(), id);
        names.push(name.to_string());
        id
    };

    for (idx, line) in input.lines().enumerate().skip(1) {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 3 {
            return Err(FeatureError::Parse {
                path: PathBuf::from("<string-links>"),
                line: Some(idx + 1),
                cause: format!("Expected 'protein1 protein2 score', got: {line}"),
            });
        }
        let source = intern(parts[0]);
        let target = intern(parts[1]);
        arcs.push((source, target, parts[2].to_string()));
    }

    writeln!(output, "*Vertices {}", names.len())?;
    for (id, name) in names.iter().enumerate() {
        writeln!(output, "{id} {name}")?;
    }
    writeln!(output, "*arcs")?;
    for (source, target, score) in &arcs {
        writeln!(output, "{source} {target} {score}")?;
    }
    output.flush()?;

    Ok(ConversionSummary {
        nodes: names.len(),
        arcs: arcs.len(),
    })
}
