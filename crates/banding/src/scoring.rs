//! Attach signature-estimated similarity to candidate pairs.
//!
//! The estimate is the fraction of agreeing signature rows. It is not an
//! exact Jaccard similarity and never replaces verification downstream.

use minhash::SignatureMatrix;
use serde::{Deserialize, Serialize};

use crate::config::BandingError;
use crate::pairs::CandidatePair;

/// Candidate pair plus its estimated Jaccard similarity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPair {
    #[serde(flatten)]
    pub pair: CandidatePair,
    pub estimated_similarity: f64,
}

/// Score every pair against the signature matrix it was derived from.
///
/// Fails if a pair references an item the matrix does not have, or if it is
/// not ordered as `first < second`.
pub fn score_pairs(
    pairs: Vec<CandidatePair>,
    signatures: &SignatureMatrix,
) -> Result<Vec<ScoredPair>, BandingError> {
    let num_items = signatures.num_items();
    pairs
        .into_iter()
        .map(|pair| {
            if pair.first >= pair.second {
                return Err(BandingError::InvalidArgument {
                    name: "pairs",
                    reason: format!(
                        "pair ({}, {}) must satisfy first < second",
                        pair.first, pair.second
                    ),
                });
            }
            if pair.first.max(pair.second) >= num_items {
                return Err(BandingError::InvalidArgument {
                    name: "pairs",
                    reason: format!(
                        "pair ({}, {}) references an item outside the {num_items}-item matrix",
                        pair.first, pair.second
                    ),
                });
            }
            let estimated_similarity = signatures.estimated_jaccard(pair.first, pair.second);
            Ok(ScoredPair {
                pair,
                estimated_similarity,
            })
        })
        .collect()
}
