//! ppi-features CLI: structural node features for PPI graphs.

use clap::{Parser, Subcommand};
use ppi_features::config::{GeneratorSpec, RunConfig};
use ppi_features::graph::{convert_string_links, PajekReader};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "ppi-features")]
#[command(about = "Structural node features over protein-protein interaction graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a feature table and write it as CSV
    Features {
        /// JSON run configuration
        #[arg(short, long, conflicts_with = "graph")]
        config: Option<PathBuf>,

        /// Pajek graph file (when no configuration is given)
        #[arg(short, long, required_unless_present = "config")]
        graph: Option<PathBuf>,

        /// Keep arcs directed
        #[arg(long)]
        directed: bool,

        /// Drop edges with a weight below this
        #[arg(long)]
        min_weight: Option<f64>,

        /// Generator names, e.g. degree, pagerank_d0.9, log10-expected_degree
        #[arg(short = 'f', long = "generator", requires = "graph")]
        generators: Vec<GeneratorSpec>,

        /// Output CSV file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cache root directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Cache namespace
        #[arg(long)]
        prefix: Option<String>,

        /// Ignore cached blocks
        #[arg(long, conflicts_with = "reuse")]
        recompute: bool,

        /// Use cached blocks when present
        #[arg(long)]
        reuse: bool,

        /// Store computed blocks
        #[arg(long)]
        dump: bool,

        /// Gene mapping CSV (protein id, gene symbol in columns 3 and 4)
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Run generators concurrently
        #[arg(long)]
        parallel: bool,

        /// Log per-generator progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert a STRING protein links table to Pajek
    Convert {
        /// STRING links file (`protein1 protein2 combined_score`)
        links: PathBuf,

        /// Output Pajek file
        output: PathBuf,
    },

    /// Display graph statistics
    Info {
        /// Pajek graph file
        graph: PathBuf,

        /// Keep arcs directed
        #[arg(long)]
        directed: bool,

        /// Drop edges with a weight below this
        #[arg(long)]
        min_weight: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Features {
            config,
            graph,
            directed,
            min_weight,
            generators,
            output,
            cache_dir,
            prefix,
            recompute,
            reuse,
            dump,
            mapping,
            parallel,
            verbose,
        } => load_config(config.as_deref(), graph, directed, min_weight, generators).and_then(
            |mut run| {
                if let Some(path) = output {
                    run.output = Some(path);
                }
                if let Some(dir) = cache_dir {
                    run.cache_dir = dir;
                }
                if let Some(prefix) = prefix {
                    run.prefix = prefix;
                }
                if recompute {
                    run.recompute = true;
                }
                if reuse {
                    run.recompute = false;
                }
                if dump {
                    run.dump = true;
                }
                if let Some(path) = mapping {
                    run.gene_mapping = Some(path);
                }
                if parallel {
                    run.parallel = true;
                }
                cmd_features(&run, verbose)
            },
        ),
        Commands::Convert { links, output } => cmd_convert(&links, &output),
        Commands::Info {
            graph,
            directed,
            min_weight,
        } => cmd_info(&graph, directed, min_weight),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing subscriber (`RUST_LOG` overrides the default filter)
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ppi_features=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn load_config(
    config: Option<&Path>,
    graph: Option<PathBuf>,
    directed: bool,
    min_weight: Option<f64>,
    generators: Vec<GeneratorSpec>,
) -> Result<RunConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config {
        return Ok(RunConfig::from_file(path)?);
    }
    let graph = graph.ok_or("either --config or --graph is required")?;
    let mut run = RunConfig::new(graph, generators);
    run.directed = directed;
    run.min_weight = min_weight;
    Ok(run)
}

fn cmd_features(run: &RunConfig, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    run.validate()?;

    let start = Instant::now();
    let graph = run.load_graph()?;
    tracing::info!(
        path = %run.graph.display(),
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "graph loaded"
    );

    let pipeline = run.build_pipeline()?;
    let (table, rows) = pipeline.apply(&graph, verbose)?;

    match &run.output {
        Some(path) => {
            table.write_csv(BufWriter::new(File::create(path)?))?;
            tracing::info!(
                path = %path.display(),
                rows = rows.len(),
                columns = table.column_names().len(),
                "feature table written"
            );
        }
        None => table.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

fn cmd_convert(links: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let input = BufReader::new(File::open(links)?);
    let writer = BufWriter::new(File::create(output)?);
    let summary = convert_string_links(input, writer)?;

    println!("Converted STRING Links");
    println!("======================");
    println!("Input:    {}", links.display());
    println!("Output:   {}", output.display());
    println!("Nodes:    {}", summary.nodes);
    println!("Arcs:     {}", summary.arcs);
    Ok(())
}

fn cmd_info(
    path: &Path,
    directed: bool,
    min_weight: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = PajekReader::new().directed(directed);
    if let Some(threshold) = min_weight {
        reader = reader.with_min_weight(threshold);
    }
    let graph = reader.parse_file(path)?;
    let stats = graph.stats();

    println!("Graph Information");
    println!("=================");
    println!("File:      {}", path.display());
    println!("Directed:  {}", stats.directed);
    println!("Nodes:     {}", stats.nodes);
    println!("Edges:     {}", stats.edges);
    println!("Isolated:  {}", stats.isolated);
    Ok(())
}
