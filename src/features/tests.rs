use super::*;
use crate::cache::MemoryCache;
use std::sync::atomic::{AtomicUsize, Ordering};

fn triangle() -> Graph {
    Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], false)
}

fn path4() -> Graph {
    let mut b = Graph::builder(4, false);
    for (i, name) in ["n0", "n1", "n2", "n3"].iter().enumerate() {
        b.set_name(i, *name).expect("in range");
    }
    b.add_edge(0, 1, 1000.0).expect("valid edge");
    b.add_edge(1, 2, 500.0).expect("valid edge");
    b.add_edge(2, 3, 1000.0).expect("valid edge");
    b.build()
}

/// Counts `compute` calls so tests can tell hits from recomputation.
#[derive(Debug, Default)]
struct Counting {
    calls: AtomicUsize,
}

impl FeatureGenerator for Counting {
    fn name(&self) -> String {
        "counting".to_string()
    }

    fn n_feat(&self) -> usize {
        1
    }

    fn compute(&self, graph: &Graph) -> Result<FeatureBlock> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        block_from_columns(&[vec![call as f64; graph.num_nodes()]])
    }
}

/// A cache whose reads always fail.
#[derive(Debug)]
struct BrokenCache;

impl FeatureCache for BrokenCache {
    fn get(&self, _key: &CacheKey) -> Result<Option<FeatureBlock>> {
        Err(FeatureError::Serialization("corrupt".into()))
    }

    fn put(&self, _key: &CacheKey, _block: &FeatureBlock) -> Result<()> {
        Err(FeatureError::Other("read-only".into()))
    }
}

fn all_generators() -> Vec<Box<dyn FeatureGenerator>> {
    vec![
        Degree::new(false).boxed(),
        Degree::new(true).boxed(),
        ExpectedDegree::new(false).boxed(),
        ExpectedDegree::new(true).boxed(),
        PageRank::new().boxed(),
        BetweennessCentrality::new().boxed(),
        ClosenessCentrality::new().boxed(),
        ClusteringCoefficient::new().boxed(),
        Hits::new().boxed(),
        NeighbouringConductance::new(2).expect("valid range").boxed(),
    ]
}

#[test]
fn test_every_generator_has_declared_shape() {
    let g = path4();
    for generator in all_generators() {
        let block = generator.compute(&g).expect("non-empty graph");
        assert_eq!(block.shape(), (4, generator.n_feat()), "{}", generator.name());
        assert_eq!(generator.feature_names().len(), generator.n_feat(), "{}", generator.name());
    }
}

#[test]
fn test_every_generator_rejects_empty_graph() {
    let g = Graph::new(false);
    for generator in all_generators() {
        let err = generator.compute(&g).unwrap_err();
        assert!(matches!(err, FeatureError::EmptyGraph { .. }), "{}", generator.name());
    }
}

#[test]
fn test_generator_names() {
    assert_eq!(Degree::new(false).name(), "degree_undirected");
    assert_eq!(Degree::new(true).name(), "degree_directed");
    assert_eq!(ExpectedDegree::new(false).name(), "expected_degree_undirected");
    assert_eq!(PageRank::new().name(), "pagerank_d0.85");
    assert_eq!(
        NeighbouringConductance::new(3).expect("valid").name(),
        "neighbouring_conductance_r3"
    );
    assert_eq!(
        NeighbouringConductance::new(1)
            .expect("valid")
            .weighted(true)
            .name(),
        "neighbouring_conductance_r1_weighted"
    );
}

#[test]
fn test_default_feature_names() {
    assert_eq!(Degree::new(false).feature_names(), vec!["degree_undirected0"]);
    assert_eq!(
        Degree::new(true).feature_names(),
        vec!["degree_directed_out", "degree_directed_in"]
    );
    assert_eq!(indexed_names("x", 3), vec!["x0", "x1", "x2"]);
}

#[test]
fn test_degree_triangle() {
    let block = Degree::new(false).compute(&triangle()).expect("non-empty");
    assert_eq!(block.column(0), vec![2.0, 2.0, 2.0]);
}

#[test]
fn test_degree_directed_columns() {
    let g = Graph::from_edges(&[(0, 1), (0, 2), (1, 2)], true);
    let block = Degree::new(true).compute(&g).expect("non-empty");
    assert_eq!(block.column(0), vec![2.0, 1.0, 0.0]);
    assert_eq!(block.column(1), vec![0.0, 1.0, 2.0]);

    let total = Degree::new(false).compute(&g).expect("non-empty");
    assert_eq!(total.column(0), vec![2.0, 2.0, 2.0]);
}

#[test]
fn test_expected_degree_scales_weights() {
    let block = ExpectedDegree::new(false).compute(&path4()).expect("non-empty");
    assert_eq!(block.column(0), vec![1.0, 1.5, 1.5, 1.0]);
}

#[test]
fn test_self_loop_counts_at_both_ends() {
    let g = Graph::from_weighted_edges(&[(0, 0, 500.0), (0, 1, 1000.0)], false);
    let degree = Degree::new(false).compute(&g).expect("non-empty");
    assert_eq!(degree.column(0), vec![3.0, 1.0]);
    let expected = ExpectedDegree::new(false).compute(&g).expect("non-empty");
    assert_eq!(expected.column(0), vec![2.0, 1.0]);

    let arcs = Graph::from_edges(&[(0, 0), (0, 1)], true);
    let total = Degree::new(false).compute(&arcs).expect("non-empty");
    assert_eq!(total.column(0), vec![3.0, 1.0]);
    let split = Degree::new(true).compute(&arcs).expect("non-empty");
    assert_eq!(split.column(0), vec![2.0, 0.0]);
    assert_eq!(split.column(1), vec![1.0, 1.0]);
}

#[test]
fn test_pagerank_invalid_damping() {
    let err = PageRank::new()
        .with_damping(1.5)
        .compute(&triangle())
        .unwrap_err();
    assert!(matches!(err, FeatureError::InvalidParameter { .. }));
}

#[test]
fn test_pagerank_without_edges_is_uniform() {
    let g = Graph::builder(4, false).build();
    let block = PageRank::new().compute(&g).expect("non-empty");
    for v in block.column(0) {
        assert!((v - 0.25).abs() < 1e-12);
    }
}

#[test]
fn test_conductance_rejects_zero_range() {
    assert!(NeighbouringConductance::new(0).is_err());
}

#[test]
fn test_log10_wrapper() {
    let generator = Degree::new(false).log10();
    assert_eq!(generator.name(), "log10-degree_undirected");
    assert_eq!(generator.n_feat(), 1);
    assert_eq!(generator.feature_names(), vec!["log10-degree_undirected0"]);

    let block = generator.compute(&path4()).expect("non-empty");
    assert_eq!(block.get(0, 0), 0.0);
    assert!((block.get(1, 0) - 2f64.log10()).abs() < 1e-12);
}

#[test]
fn test_log10_propagates_negative_infinity() {
    let g = Graph::builder(2, false).build();
    let block = Degree::new(false).log10().compute(&g).expect("non-empty");
    assert_eq!(block.get(0, 0), f64::NEG_INFINITY);
}

#[test]
fn test_normalize_wrapper() {
    let generator = Degree::new(false).normalized();
    assert_eq!(generator.name(), "normalize-degree_undirected");
    assert!(generator.transformer().statistics().is_none());

    let block = generator.compute(&path4()).expect("non-empty");
    // degrees [1, 2, 2, 1]: mean 1.5, population std 0.5
    assert_eq!(block.column(0), vec![-1.0, 1.0, 1.0, -1.0]);

    let stats = generator.transformer().statistics().expect("fitted");
    assert_eq!(stats.mean, vec![1.5]);
    assert_eq!(stats.std, vec![0.5]);
}

#[test]
fn test_normalize_constant_column_is_centred_only() {
    let block = Degree::new(false)
        .normalized()
        .compute(&triangle())
        .expect("non-empty");
    assert_eq!(block.column(0), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_normalize_ignores_nan_in_statistics() {
    let star = Graph::from_edges(&[(0, 1), (0, 2), (0, 3)], false);
    let generator = NeighbouringConductance::new(1).expect("valid").normalized();
    let block = generator.compute(&star).expect("non-empty");
    assert!(block.get(0, 0).is_nan());
    // every leaf has conductance 1: centred, not scaled
    assert_eq!(block.get(1, 0), 0.0);
    assert_eq!(generator.transformer().statistics().expect("fitted").mean, vec![1.0]);
}

#[test]
fn test_select_hits_authority() {
    let g = Graph::from_edges(&[(0, 2), (1, 2), (2, 3), (3, 0)], true);
    let full = Hits::new().compute(&g).expect("non-empty");
    let generator = Hits::new().select(1).expect("valid column");

    assert_eq!(generator.n_feat(), 1);
    assert_eq!(generator.feature_names(), vec![Hits::new().feature_names()[1].clone()]);
    let block = generator.compute(&g).expect("non-empty");
    assert_eq!(block.column(0), full.column(1));
}

#[test]
fn test_select_multiple_and_reordered() {
    let generator = Degree::new(true).select(vec![1, 0]).expect("valid columns");
    assert_eq!(generator.name(), "select_1_0-degree_directed");
    assert_eq!(
        generator.feature_names(),
        vec!["degree_directed_in", "degree_directed_out"]
    );
}

#[test]
fn test_select_validates_columns() {
    assert!(Hits::new().select(2).is_err());
    assert!(Hits::new().select(Vec::new()).is_err());
}

#[test]
fn test_cache_policy_defaults() {
    let policy = CachePolicy::default();
    assert_eq!(policy.prefix, "default");
    assert!(policy.default_recompute);
    assert!(!policy.default_dump);

    let reuse = CachePolicy::reuse("run");
    assert!(!reuse.default_recompute);
    assert!(reuse.default_dump);
}

#[test]
fn test_cached_defaults_never_touch_cache() {
    let cache = Arc::new(MemoryCache::new());
    let generator = Counting::default().cached(cache.clone(), CachePolicy::default());
    generator.apply(&triangle()).expect("compute");
    generator.apply(&triangle()).expect("compute");
    assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_cached_second_apply_hits() {
    let cache = Arc::new(MemoryCache::new());
    let generator = Counting::default().cached(cache.clone(), CachePolicy::new("exp"));
    let g = triangle();

    let first = generator.apply_with(&g, Some(true), Some(true)).expect("compute");
    let second = generator.apply_with(&g, Some(false), None).expect("cached");
    assert!(first.bit_eq(&second));
    assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 1);
    assert!(cache.contains(&CacheKey::new("exp", "counting")));
}

#[test]
fn test_iteration_settings_are_part_of_the_name() {
    assert_eq!(PageRank::new().with_max_iter(1).name(), "pagerank_d0.85_i1");
    assert_eq!(PageRank::new().with_tolerance(1e-9).name(), "pagerank_d0.85_t1e-9");
    assert_eq!(PageRank::new().with_max_iter(100).name(), "pagerank_d0.85");
    assert_eq!(Hits::new().name(), "hits");
    assert_eq!(
        Hits::new().with_max_iter(5).with_tolerance(1e-4).name(),
        "hits_i5_t1e-4"
    );
}

#[test]
fn test_truncated_pagerank_does_not_shadow_full_run() {
    let cache = Arc::new(MemoryCache::new());
    let g = path4();

    let truncated = PageRank::new()
        .with_max_iter(1)
        .cached(cache.clone(), CachePolicy::reuse("run"));
    let short = truncated.apply(&g).expect("non-empty graph");

    let full = PageRank::new().cached(cache.clone(), CachePolicy::reuse("run"));
    let block = full.apply(&g).expect("non-empty graph");

    assert_ne!(truncated.key(), full.key());
    assert!(block.bit_eq(&PageRank::new().compute(&g).expect("non-empty graph")));
    assert!(!block.bit_eq(&short));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cached_miss_falls_back_to_compute() {
    let cache = Arc::new(MemoryCache::new());
    let generator = Counting::default().cached(cache.clone(), CachePolicy::new("exp"));
    let block = generator.apply_with(&triangle(), Some(false), Some(false)).expect("compute");
    assert_eq!(block.shape(), (3, 1));
    assert!(cache.is_empty());
}

#[test]
fn test_cached_recompute_ignores_entry() {
    let cache = Arc::new(MemoryCache::new());
    let generator = Counting::default().cached(cache, CachePolicy::reuse("exp"));
    let g = triangle();
    generator.apply(&g).expect("compute");
    let again = generator.apply_with(&g, Some(true), None).expect("recompute");
    assert_eq!(again.get(0, 0), 2.0);
}

#[test]
fn test_cached_wrong_shape_is_miss() {
    let cache = Arc::new(MemoryCache::new());
    let key = CacheKey::new("exp", "counting");
    cache
        .put(&key, &FeatureBlock::zeros(2, 1))
        .expect("memory put");
    let generator = Counting::default().cached(cache, CachePolicy::new("exp"));
    let block = generator.apply_with(&triangle(), Some(false), None).expect("compute");
    assert_eq!(block.shape(), (3, 1));
    assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cached_empty_entry_is_miss() {
    let cache = Arc::new(MemoryCache::new());
    cache
        .put(&CacheKey::new("exp", "counting"), &FeatureBlock::zeros(0, 0))
        .expect("memory put");
    let generator = Counting::default().cached(cache, CachePolicy::new("exp"));
    generator.apply_with(&triangle(), Some(false), None).expect("compute");
    assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cached_read_error_is_miss_write_error_propagates() {
    let generator = Counting::default().cached(Arc::new(BrokenCache), CachePolicy::new("exp"));
    let g = triangle();
    assert!(generator.apply_with(&g, Some(false), Some(false)).is_ok());
    assert!(generator.apply_with(&g, Some(false), Some(true)).is_err());
}

#[test]
fn test_cached_compute_error_propagates() {
    let cache = Arc::new(MemoryCache::new());
    let generator = Degree::new(false).cached(cache, CachePolicy::reuse("exp"));
    let err = generator.apply(&Graph::new(false)).unwrap_err();
    assert!(matches!(err, FeatureError::EmptyGraph { .. }));
}

#[test]
fn test_wrapper_and_inner_use_distinct_keys() {
    let cache = Arc::new(MemoryCache::new());
    let shared: Arc<dyn FeatureCache> = cache.clone();
    let policy = CachePolicy::reuse("exp");
    let generator = Degree::new(false)
        .cached(shared.clone(), policy.clone())
        .log10()
        .cached(shared, policy);

    assert_eq!(generator.name(), "log10-degree_undirected");
    generator.apply(&path4()).expect("compute");
    assert!(cache.contains(&CacheKey::new("exp", "degree_undirected")));
    assert!(cache.contains(&CacheKey::new("exp", "log10-degree_undirected")));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_boxed_generator_delegates() {
    let generator: Box<dyn FeatureGenerator> = Hits::new().boxed();
    assert_eq!(generator.name(), "hits");
    assert_eq!(generator.feature_names(), vec!["hits_hub", "hits_authority"]);
}
