use minhash_lsh::{
    BandBucket, BandingParams, CandidatePairGenerator, EmptySetPolicy, HashFunctionFamily,
    LshConfig, LshFileConfig, LshPipeline, PipelineError, ProjectionTable, band_signatures,
    candidate_probability, find_candidate_pairs, generate_candidate_pairs, hash_band,
};

#[test]
fn near_duplicate_pair_is_found_end_to_end() -> Result<(), PipelineError> {
    let cfg = LshConfig::new()
        .with_hashfun_number(4)
        .with_seed(42)
        .with_bands(2, 2);
    let items = vec![vec![1u32, 2, 3], vec![1, 2, 9]];

    let report = find_candidate_pairs(10, &items, &cfg)?;
    let pair = report
        .candidate_pairs()
        .find(|p| (p.first, p.second) == (0, 1))
        .expect("items 0 and 1 should be candidates");
    assert!(pair.collision_count >= 1);
    assert!(pair.collision_count <= 2);

    Ok(())
}

#[test]
fn stages_compose_by_hand() -> Result<(), PipelineError> {
    let family = HashFunctionFamily::generate(4, 42)?;
    let table = ProjectionTable::build(10, &family, false)?;

    // table entries are the hash functions evaluated directly
    for (i, f) in family.iter().enumerate() {
        for x in 0..10u32 {
            assert_eq!(table.get(i, x), f.hash(x));
        }
    }

    let signatures = table.signature_matrix(
        &[vec![1u32, 2, 3], vec![1, 2, 9]],
        EmptySetPolicy::Reject,
        false,
    )?;
    let codes = band_signatures(&signatures, 2, 2)?;
    let pairs = generate_candidate_pairs(&codes);

    let cfg = LshConfig::new()
        .with_hashfun_number(4)
        .with_seed(42)
        .with_bands(2, 2);
    let report = find_candidate_pairs(10, &[vec![1u32, 2, 3], vec![1, 2, 9]], &cfg)?;
    let via_pipeline: Vec<_> = report.candidate_pairs().cloned().collect();
    assert_eq!(pairs, via_pipeline);

    Ok(())
}

#[test]
fn union_signature_is_rowwise_minimum() -> Result<(), PipelineError> {
    let cfg = LshConfig::new().with_hashfun_number(64).with_bands(16, 4);
    let pipeline = LshPipeline::new(500, &cfg)?;
    let projector = pipeline.projector();

    let a: Vec<u32> = vec![3, 50, 77, 401];
    let b: Vec<u32> = vec![9, 50, 250];
    let union: Vec<u32> = a.iter().chain(b.iter()).copied().collect();

    let sa = projector.signature(&a)?;
    let sb = projector.signature(&b)?;
    let su = projector.signature(&union)?;
    for i in 0..64 {
        assert_eq!(su[i], sa[i].min(sb[i]));
    }
    Ok(())
}

#[test]
fn dedup_example_from_buckets() {
    // items 0, 1 and 2 share a bucket in band 0 and band 1
    let buckets = vec![
        BandBucket { band: 0, items: vec![0, 1, 2] },
        BandBucket { band: 1, items: vec![0, 1, 2] },
        BandBucket { band: 2, items: vec![0, 1] },
    ];
    let pairs = CandidatePairGenerator::new().pairs_from_buckets(&buckets);

    let summary: Vec<(usize, usize, u32)> = pairs
        .iter()
        .map(|p| (p.first, p.second, p.collision_count))
        .collect();
    assert_eq!(summary, vec![(0, 1, 3), (0, 2, 2), (1, 2, 2)]);
}

#[test]
fn pair_invariants_hold_on_a_clustered_corpus() -> Result<(), PipelineError> {
    let items: Vec<Vec<u32>> = (0..60u32)
        .map(|doc| {
            let cluster = doc / 5;
            let mut s: Vec<u32> = (cluster * 30..cluster * 30 + 28).collect();
            s.push(1000 + doc);
            s
        })
        .collect();
    let cfg = LshConfig::for_threshold(64, 0.5)?.with_seed(17);
    let report = find_candidate_pairs(2000, &items, &cfg)?;

    assert!(!report.pairs.is_empty());
    for scored in &report.pairs {
        let p = &scored.pair;
        assert!(p.first < p.second);
        assert!(p.collision_count >= 1 && p.collision_count <= report.bands_number);
        assert!((0.0..=1.0).contains(&scored.estimated_similarity));
    }
    for w in report.pairs.windows(2) {
        assert!((w[0].pair.first, w[0].pair.second) < (w[1].pair.first, w[1].pair.second));
    }

    // members of one cluster share 28 of 30 shingles
    let same_cluster = report
        .candidate_pairs()
        .filter(|p| p.first / 5 == p.second / 5)
        .count();
    assert!(same_cluster >= 100, "only {same_cluster} of 120 cluster pairs found");
    Ok(())
}

#[test]
fn yaml_config_drives_the_pipeline() {
    let yaml = r#"
version: "1.0"
name: "integration"
minhash:
  hashfun_number: 4
  seed: 42
banding:
  bands_number: 2
  rows_per_band: 2
"#;
    let file_cfg = LshFileConfig::from_yaml(yaml).expect("valid yaml");
    let cfg = file_cfg.to_lsh_config();

    let report = find_candidate_pairs(10, &[vec![1u32, 2, 3], vec![1, 2, 9]], &cfg)
        .expect("pipeline run");
    assert_eq!(report.hashfun_number, 4);
    assert_eq!((report.bands_number, report.rows_per_band), (2, 2));
}

#[test]
fn tuning_helpers_describe_the_split() {
    let params = BandingParams::for_threshold(128, 0.7).expect("split");
    assert_eq!(params.signature_len(), 128);
    assert!(params.candidate_probability(0.95) > 0.99);
    assert!(candidate_probability(0.1, params.bands_number, params.rows_per_band) < 0.5);
}

#[test]
fn band_hash_depends_on_order_and_values() {
    assert_eq!(hash_band(&[1, 2, 3]), hash_band(&[1, 2, 3]));
    assert_ne!(hash_band(&[1, 2, 3]), hash_band(&[3, 2, 1]));
    assert_ne!(hash_band(&[1, 2, 3]), hash_band(&[1, 2, 4]));
}

#[test]
fn report_serializes_to_json() -> Result<(), PipelineError> {
    let cfg = LshConfig::new()
        .with_hashfun_number(4)
        .with_seed(42)
        .with_bands(2, 2)
        .with_band_tracking(true);
    let report = find_candidate_pairs(10, &[vec![1u32, 2, 3], vec![1, 2, 3]], &cfg)?;

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["num_items"], 2);
    assert_eq!(json["pairs"][0]["first"], 0);
    assert_eq!(json["pairs"][0]["second"], 1);
    assert_eq!(json["pairs"][0]["collision_count"], 2);
    assert_eq!(json["pairs"][0]["bands"], serde_json::json!([0, 1]));
    assert_eq!(json["pairs"][0]["estimated_similarity"], 1.0);
    Ok(())
}
