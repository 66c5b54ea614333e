//! Concurrency and thread safety tests for the LSH pipeline

use std::sync::Arc;
use std::thread;

use minhash_lsh::{
    CandidatePairGenerator, EmptySetPolicy, HashFunctionFamily, LshConfig, LshPipeline,
    ProjectionTable, SignatureBander, SignatureMatrix,
};

fn shingle_sets(count: u32) -> Vec<Vec<u32>> {
    (0..count)
        .map(|doc| (0..25u32).map(|i| (doc * 7 + i * 3) % 2000).collect())
        .collect()
}

#[test]
fn shared_projection_table_across_threads() {
    let family = HashFunctionFamily::generate(32, 11).expect("family");
    let table = Arc::new(ProjectionTable::build(2000, &family, false).expect("table"));
    let items = Arc::new(shingle_sets(200));

    let expected = table
        .signature_matrix(&items[..], EmptySetPolicy::Reject, false)
        .expect("reference signatures");

    // every thread computes a disjoint slice against the same table
    let handles: Vec<_> = (0..4usize)
        .map(|worker| {
            let table = Arc::clone(&table);
            let items = Arc::clone(&items);
            thread::spawn(move || {
                let start = worker * 50;
                let slice = &items[start..start + 50];
                let sigs = table
                    .signature_matrix(slice, EmptySetPolicy::Reject, false)
                    .expect("slice signatures");
                (start, sigs)
            })
        })
        .collect();

    for handle in handles {
        let (start, sigs) = handle.join().expect("worker panicked");
        for item in 0..sigs.num_items() {
            assert_eq!(
                sigs.column(item),
                expected.column(start + item),
                "item {} differs when computed on another thread",
                start + item
            );
        }
    }
}

#[test]
fn shared_pipeline_gives_same_report_on_every_thread() {
    let cfg = LshConfig::new()
        .with_hashfun_number(16)
        .with_seed(3)
        .with_bands(8, 2);
    let pipeline = Arc::new(LshPipeline::new(2000, &cfg).expect("pipeline"));
    let items = Arc::new(shingle_sets(120));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let items = Arc::clone(&items);
            thread::spawn(move || pipeline.candidate_pairs(&items[..]).expect("pairs"))
        })
        .collect();

    let reports: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect();
    let first = &reports[0];
    for (i, report) in reports.iter().enumerate().skip(1) {
        assert_eq!(first, report, "thread {i} produced a different report");
    }
}

#[test]
fn parallel_stages_match_sequential_stages() {
    let family = HashFunctionFamily::generate(24, 5).expect("family");
    let seq_table = ProjectionTable::build(2000, &family, false).expect("table");
    let par_table = ProjectionTable::build(2000, &family, true).expect("table");
    assert_eq!(seq_table, par_table);

    let items = shingle_sets(300);
    let seq_sigs = seq_table
        .signature_matrix(&items, EmptySetPolicy::Reject, false)
        .expect("sequential signatures");
    let par_sigs = par_table
        .signature_matrix(&items, EmptySetPolicy::Reject, true)
        .expect("parallel signatures");
    assert_eq!(seq_sigs, par_sigs);

    let seq_codes = SignatureBander::new(6, 4)
        .band(&seq_sigs)
        .expect("sequential codes");
    let par_codes = SignatureBander::new(6, 4)
        .with_parallel(true)
        .band(&par_sigs)
        .expect("parallel codes");
    assert_eq!(seq_codes, par_codes);

    let seq_pairs = CandidatePairGenerator::new()
        .with_band_tracking(true)
        .generate(&seq_codes);
    let par_pairs = CandidatePairGenerator::new()
        .with_band_tracking(true)
        .with_parallel(true)
        .generate(&par_codes);
    assert_eq!(seq_pairs, par_pairs);
}

#[test]
fn parallel_errors_report_the_first_bad_item() {
    let family = HashFunctionFamily::generate(8, 5).expect("family");
    let table = ProjectionTable::build(100, &family, true).expect("table");

    let mut items = shingle_sets(64)
        .into_iter()
        .map(|s| s.into_iter().map(|x| x % 100).collect::<Vec<u32>>())
        .collect::<Vec<_>>();
    items[40] = vec![];
    items[17] = vec![];

    let err = table
        .signature_matrix(&items, EmptySetPolicy::Reject, true)
        .unwrap_err();
    assert_eq!(err, minhash_lsh::MinHashError::EmptyInput { item: 17 });
}

#[test]
fn signature_matrix_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ProjectionTable>();
    assert_send_sync::<SignatureMatrix>();
    assert_send_sync::<LshPipeline>();
}
