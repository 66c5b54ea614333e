//! Candidate pair generation from shared band codes.
//!
//! For every band, items with the same code form a bucket; every bucket of
//! two or more items contributes all of its unordered pairs. A pair's
//! `collision_count` is the number of *distinct* bands in which it shares a
//! bucket, and the pair is emitted once.
//!
//! Grouping costs `O(bands × items)`. Enumeration costs `O(Σ C(|bucket|, 2))`,
//! which is small when near-duplicates are rare but degrades to
//! `O(items²)` for a band in which everything collides. That worst case is
//! accepted.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::band::BandCodeMatrix;
use crate::config::BandingConfig;

/// Items that share one band code in one band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BandBucket {
    pub band: u32,
    pub items: Vec<usize>,
}

/// Unordered item pair that collided in at least one band.
///
/// Invariants: `first < second` and `collision_count >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidatePair {
    pub first: usize,
    pub second: usize,
    /// Number of distinct bands in which both items shared a code.
    pub collision_count: u32,
    /// Sorted indices of those bands; empty unless band tracking is on.
    pub bands: Vec<u32>,
}

/// Groups band codes into buckets and aggregates colliding pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidatePairGenerator {
    track_bands: bool,
    parallel: bool,
}

impl CandidatePairGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &BandingConfig) -> Self {
        Self {
            track_bands: cfg.track_bands,
            parallel: cfg.use_parallel,
        }
    }

    /// Record which bands each pair collided in.
    pub fn with_band_tracking(mut self, track_bands: bool) -> Self {
        self.track_bands = track_bands;
        self
    }

    /// Group bands concurrently. Partial results are merged by a single
    /// writer, so the output is identical either way.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Buckets of size >= 2 for every band, ordered by band and then by the
    /// smallest item of each bucket. Items inside a bucket are ascending.
    pub fn buckets(&self, codes: &BandCodeMatrix) -> Vec<BandBucket> {
        let per_band: Vec<Vec<BandBucket>> = if self.parallel {
            (0..codes.num_bands())
                .into_par_iter()
                .map(|band| band_buckets(band as u32, codes.band(band)))
                .collect()
        } else {
            (0..codes.num_bands())
                .map(|band| band_buckets(band as u32, codes.band(band)))
                .collect()
        };
        per_band.into_iter().flatten().collect()
    }

    /// Candidate pairs of a full band-code matrix, sorted by
    /// `(first, second)`. Empty when nothing collides.
    pub fn generate(&self, codes: &BandCodeMatrix) -> Vec<CandidatePair> {
        let pairs = self.pairs_from_buckets(&self.buckets(codes));
        debug!(
            num_bands = codes.num_bands(),
            num_items = codes.num_items(),
            num_pairs = pairs.len(),
            "candidate_pairs_generated"
        );
        pairs
    }

    /// Candidate pairs from explicit buckets.
    ///
    /// Duplicate item indices inside a bucket are collapsed, so a bucket can
    /// never produce a self-pair, and a band listed twice for the same pair
    /// is counted once.
    pub fn pairs_from_buckets(&self, buckets: &[BandBucket]) -> Vec<CandidatePair> {
        let partials: Vec<Vec<((usize, usize), u32)>> = if self.parallel {
            buckets.par_iter().map(bucket_pairs).collect()
        } else {
            buckets.iter().map(bucket_pairs).collect()
        };

        let mut merged: HashMap<(usize, usize), Vec<u32>> = HashMap::new();
        for (key, band) in partials.into_iter().flatten() {
            merged.entry(key).or_default().push(band);
        }

        let mut pairs: Vec<CandidatePair> = merged
            .into_iter()
            .map(|((first, second), mut bands)| {
                bands.sort_unstable();
                bands.dedup();
                let collision_count = bands.len() as u32;
                if !self.track_bands {
                    bands = Vec::new();
                }
                CandidatePair {
                    first,
                    second,
                    collision_count,
                    bands,
                }
            })
            .collect();
        pairs.sort_unstable_by_key(|p| (p.first, p.second));
        pairs
    }
}

/// Candidate pairs of `codes` with default settings.
pub fn generate_candidate_pairs(codes: &BandCodeMatrix) -> Vec<CandidatePair> {
    CandidatePairGenerator::new().generate(codes)
}

fn band_buckets(band: u32, codes: &[u64]) -> Vec<BandBucket> {
    let mut groups: HashMap<u64, Vec<usize>> = HashMap::new();
    for (item, &code) in codes.iter().enumerate() {
        groups.entry(code).or_default().push(item);
    }
    let mut buckets: Vec<BandBucket> = groups
        .into_values()
        .filter(|items| items.len() >= 2)
        .map(|items| BandBucket { band, items })
        .collect();
    buckets.sort_unstable_by_key(|b| b.items[0]);
    buckets
}

fn bucket_pairs(bucket: &BandBucket) -> Vec<((usize, usize), u32)> {
    let mut items = bucket.items.clone();
    items.sort_unstable();
    items.dedup();

    let n = items.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for (i, &a) in items.iter().enumerate() {
        for &b in &items[i + 1..] {
            out.push(((a, b), bucket.band));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(rows: Vec<Vec<u64>>) -> BandCodeMatrix {
        BandCodeMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn pair_colliding_in_two_bands_is_reported_once() {
        // items 0 and 1 share codes in bands 0 and 2 only
        let m = codes(vec![vec![7, 7, 1], vec![1, 2, 3], vec![9, 9, 4]]);
        let pairs = CandidatePairGenerator::new()
            .with_band_tracking(true)
            .generate(&m);

        assert_eq!(
            pairs,
            vec![CandidatePair {
                first: 0,
                second: 1,
                collision_count: 2,
                bands: vec![0, 2],
            }]
        );
    }

    #[test]
    fn no_collisions_gives_empty_result() {
        let m = codes(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert!(generate_candidate_pairs(&m).is_empty());

        let none = codes(vec![Vec::new()]);
        assert!(generate_candidate_pairs(&none).is_empty());
    }

    #[test]
    fn bucket_of_n_items_yields_all_pairs() {
        let m = codes(vec![vec![5, 5, 5, 5]]);
        let pairs = generate_candidate_pairs(&m);
        let keys: Vec<(usize, usize)> = pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(keys, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert!(pairs.iter().all(|p| p.collision_count == 1 && p.bands.is_empty()));
    }

    #[test]
    fn pair_invariants_hold() {
        let rows: Vec<Vec<u64>> = (0..6u64)
            .map(|band| (0..40u64).map(|item| (item * (band + 3)) % 5).collect())
            .collect();
        let m = codes(rows);
        let pairs = generate_candidate_pairs(&m);

        assert!(!pairs.is_empty());
        for w in pairs.windows(2) {
            assert!((w[0].first, w[0].second) < (w[1].first, w[1].second));
        }
        for p in &pairs {
            assert!(p.first < p.second);
            assert!(p.collision_count >= 1 && p.collision_count as usize <= m.num_bands());
        }
    }

    #[test]
    fn buckets_group_identical_codes() {
        let m = codes(vec![vec![3, 1, 3, 1, 2], vec![8, 8, 8, 0, 1]]);
        let buckets = CandidatePairGenerator::new().buckets(&m);
        assert_eq!(
            buckets,
            vec![
                BandBucket { band: 0, items: vec![0, 2] },
                BandBucket { band: 0, items: vec![1, 3] },
                BandBucket { band: 1, items: vec![0, 1, 2] },
            ]
        );
    }

    #[test]
    fn explicit_buckets_collapse_duplicates() {
        let buckets = vec![
            BandBucket { band: 1, items: vec![4, 2, 4] },
            BandBucket { band: 1, items: vec![2, 4] },
            BandBucket { band: 3, items: vec![2, 4, 6] },
            BandBucket { band: 0, items: vec![9] },
        ];
        let pairs = CandidatePairGenerator::new()
            .with_band_tracking(true)
            .pairs_from_buckets(&buckets);

        assert_eq!(
            pairs,
            vec![
                CandidatePair { first: 2, second: 4, collision_count: 2, bands: vec![1, 3] },
                CandidatePair { first: 2, second: 6, collision_count: 1, bands: vec![3] },
                CandidatePair { first: 4, second: 6, collision_count: 1, bands: vec![3] },
            ]
        );
    }

    #[test]
    fn parallel_generation_equals_sequential() {
        let rows: Vec<Vec<u64>> = (0..16u64)
            .map(|band| (0..300u64).map(|item| (item ^ band) % 37).collect())
            .collect();
        let m = codes(rows);
        let seq = CandidatePairGenerator::new()
            .with_band_tracking(true)
            .generate(&m);
        let par = CandidatePairGenerator::new()
            .with_band_tracking(true)
            .with_parallel(true)
            .generate(&m);
        assert_eq!(seq, par);
    }

    #[test]
    fn matrix_and_bucket_paths_agree() {
        let m = codes(vec![vec![1, 1, 2, 2], vec![3, 4, 3, 4], vec![5, 5, 5, 6]]);
        let generator = CandidatePairGenerator::new().with_band_tracking(true);
        let direct = generator.generate(&m);
        let via_buckets = generator.pairs_from_buckets(&generator.buckets(&m));
        assert_eq!(direct, via_buckets);
    }
}
