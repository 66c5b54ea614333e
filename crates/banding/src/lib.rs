//! # LSH banding and candidate pairs
//!
//! Second half of the near-duplicate pipeline. Takes a [`SignatureMatrix`]
//! from the `minhash` crate and surfaces pairs of items whose signatures
//! agree on at least one whole band.
//!
//! ## Stages
//!
//! 1.  **Banding**: [`SignatureBander`] splits the `k` signature rows into
//!     `bands_number` contiguous bands of `rows_per_band` rows and hashes each
//!     band of each item into a code, yielding a [`BandCodeMatrix`].
//! 2.  **Bucketing**: [`CandidatePairGenerator`] groups items by code within
//!     each band and enumerates the pairs inside every bucket.
//! 3.  **Aggregation**: pairs are deduplicated across bands; the collision
//!     count is the number of distinct bands a pair collided in.
//!
//! Optional extras: [`score_pairs`] attaches the signature-estimated
//! similarity, and [`BandingParams::for_threshold`] picks a split for a target
//! similarity threshold.
//!
//! ## Example Usage
//!
//! ```
//! use banding::{band_signatures, generate_candidate_pairs};
//! use minhash::SignatureMatrix;
//!
//! let signatures = SignatureMatrix::from_columns(vec![
//!     vec![1, 2, 3, 4],
//!     vec![1, 2, 8, 9],
//!     vec![5, 6, 7, 8],
//! ])
//! .unwrap();
//!
//! let codes = band_signatures(&signatures, 2, 2).unwrap();
//! let pairs = generate_candidate_pairs(&codes);
//!
//! assert_eq!(pairs.len(), 1);
//! assert_eq!((pairs[0].first, pairs[0].second, pairs[0].collision_count), (0, 1, 1));
//! ```
pub mod band;
pub mod config;
pub mod pairs;
pub mod scoring;
pub mod tuning;

pub use minhash::SignatureMatrix;

pub use crate::band::{band_signatures, hash_band, BandCodeMatrix, SignatureBander};
pub use crate::config::{BandingConfig, BandingError};
pub use crate::pairs::{generate_candidate_pairs, BandBucket, CandidatePair, CandidatePairGenerator};
pub use crate::scoring::{score_pairs, ScoredPair};
pub use crate::tuning::{candidate_probability, similarity_threshold, BandingParams};
