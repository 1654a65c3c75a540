//! Integration tests driving the public API end to end.

use ppi_features::config::RunConfig;
use ppi_features::graph::{convert_string_links, write_pajek};
use ppi_features::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

const PATH4: &str = "\
*Vertices 4
0 9606.ENSP1
1 9606.ENSP2
2 9606.ENSP3
3 9606.ENSP4
*edges
0 1 1000
1 2 500
2 3 1000
";

fn path4() -> Graph {
    PajekReader::new().parse_str(PATH4).expect("valid pajek")
}

#[test]
fn test_pajek_to_feature_table() {
    let graph = path4();
    let pipeline = Pipeline::new(vec![
        Degree::new(false).boxed(),
        ExpectedDegree::new(false).boxed(),
    ]);

    let (table, rows) = pipeline.apply(&graph, false).expect("non-empty graph");
    assert_eq!(rows, vec!["9606.ENSP1", "9606.ENSP2", "9606.ENSP3", "9606.ENSP4"]);
    assert_eq!(table.shape(), (4, 2));
    assert_eq!(
        table.column("degree_undirected0"),
        Some(vec![1.0, 2.0, 2.0, 1.0])
    );
    assert_eq!(
        table.column("expected_degree_undirected0"),
        Some(vec![1.0, 1.5, 1.5, 1.0])
    );
}

#[test]
fn test_disk_cache_idempotent_and_transparent() {
    let dir = TempDir::new().expect("tempdir");
    let cache: Arc<dyn FeatureCache> = Arc::new(DiskCache::new(dir.path()));
    let graph = path4();

    let dumping = PageRank::new().cached(Arc::clone(&cache), CachePolicy::new("run").with_dump(true));
    let computed = dumping.apply(&graph).expect("non-empty graph");
    assert!(dir.path().join("run").join("pagerank_d0.85.bin").exists());

    // Same name, same prefix: a fresh decorator reads the stored block back
    let reusing = PageRank::new().cached(Arc::clone(&cache), CachePolicy::reuse("run"));
    let first = reusing.apply(&graph).expect("cached");
    let second = reusing.apply(&graph).expect("cached");
    assert!(first.bit_eq(&computed));
    assert!(second.bit_eq(&first));
}

#[test]
fn test_disk_cache_is_read_without_recompute() {
    let dir = TempDir::new().expect("tempdir");
    let disk = DiskCache::new(dir.path());
    let graph = path4();

    let planted = FeatureBlock::from_vec(4, 1, vec![9.0, 8.0, 7.0, 6.0]).expect("4x1");
    disk.put(&CacheKey::new("run", "degree_undirected"), &planted)
        .expect("writable");

    let cache: Arc<dyn FeatureCache> = Arc::new(disk);
    let generator = Degree::new(false).cached(Arc::clone(&cache), CachePolicy::reuse("run"));
    assert!(generator.apply(&graph).expect("cached").bit_eq(&planted));

    let fresh = generator
        .apply_with(&graph, Some(true), Some(false))
        .expect("computed");
    assert_eq!(fresh.column(0), vec![1.0, 2.0, 2.0, 1.0]);

    // Another prefix is another namespace
    let other = Degree::new(false).cached(cache, CachePolicy::reuse("other"));
    assert_eq!(other.apply(&graph).expect("computed").column(0), vec![1.0, 2.0, 2.0, 1.0]);
}

#[test]
fn test_feature_selector_keeps_authority_column() {
    let graph = Graph::from_edges(&[(0, 1), (0, 2), (1, 2), (3, 2)], true);
    let hits = Hits::new().apply(&graph).expect("non-empty graph");

    let selector = Hits::new().select(1).expect("column 1 exists");
    assert_eq!(selector.name(), "select_1-hits");
    assert_eq!(selector.feature_names(), vec!["hits_authority"]);

    let block = selector.apply(&graph).expect("non-empty graph");
    assert_eq!(block.shape(), (4, 1));
    assert_eq!(block.column(0), hits.column(1));
}

#[test]
fn test_config_driven_run() {
    let dir = TempDir::new().expect("tempdir");
    let graph_path = dir.path().join("path4.paj");
    std::fs::write(&graph_path, PATH4).expect("write graph");
    let mapping_path = dir.path().join("mapping.csv");
    std::fs::write(
        &mapping_path,
        "taxon,alias,protein,symbol\n9606,x,ENSP1,TP53\n9606,x,ENSP3,BRCA1\n9606,x,ENSP4,BRCA1\n",
    )
    .expect("write mapping");

    let json = serde_json::json!({
        "graph": graph_path,
        "cache_dir": dir.path().join("cache"),
        "prefix": "string_600",
        "dump": true,
        "gene_mapping": mapping_path,
        "generators": [
            { "kind": "degree" },
            { "kind": "log10", "inner": { "kind": "expected_degree" } }
        ]
    });
    let config = RunConfig::from_json(&json.to_string()).expect("valid config");
    let graph = config.load_graph().expect("valid graph");
    let pipeline = config.build_pipeline().expect("valid generators");
    let (table, rows) = pipeline.apply(&graph, false).expect("non-empty graph");

    assert_eq!(rows, vec!["TP53", "BRCA1"]);
    assert_eq!(
        table.column_names(),
        ["degree_undirected0", "log10-expected_degree_undirected0"]
    );
    assert_eq!(table.row("BRCA1").map(|r| r[0]), Some(2.0));
    let log_expected = table.row("TP53").map(|r| r[1]).expect("row");
    assert!(log_expected.abs() < 1e-12);

    let stored = dir.path().join("cache").join("string_600");
    assert!(stored.join("degree_undirected.bin").exists());
    assert!(stored.join("expected_degree_undirected.bin").exists());
    assert!(stored.join("log10-expected_degree_undirected.bin").exists());

    let mut csv = Vec::new();
    table.write_csv(&mut csv).expect("write");
    let csv = String::from_utf8(csv).expect("utf8");
    assert!(csv.starts_with("gene,degree_undirected0,log10-expected_degree_undirected0\nTP53,1,"));
}

#[test]
fn test_string_links_round_trip() {
    let links = "protein1 protein2 combined_score\n\
                 9606.A 9606.B 900\n\
                 9606.B 9606.C 300\n\
                 9606.B 9606.A 900\n";
    let mut paj = Vec::new();
    let summary = convert_string_links(links.as_bytes(), &mut paj).expect("valid links");
    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.arcs, 3);

    let text = String::from_utf8(paj).expect("utf8");
    let strong = PajekReader::new()
        .with_min_weight(600.0)
        .parse_str(&text)
        .expect("valid pajek");
    assert_eq!(strong.num_nodes(), 3);
    assert_eq!(strong.num_edges(), 1);
    assert_eq!(strong.degree(2), 0);

    let mut rewritten = Vec::new();
    write_pajek(&strong, &mut rewritten).expect("write");
    let reparsed = PajekReader::new()
        .parse_str(&String::from_utf8(rewritten).expect("utf8"))
        .expect("valid pajek");
    assert_eq!(reparsed.edges().collect::<Vec<_>>(), strong.edges().collect::<Vec<_>>());
}
