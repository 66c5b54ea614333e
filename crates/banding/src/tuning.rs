//! S-curve helpers for choosing a band split.
//!
//! With `b` bands of `r` rows, two items of Jaccard similarity `s` become
//! candidates with probability `1 - (1 - s^r)^b`. The curve is steepest near
//! `(1/b)^(1/r)`, the usual rough threshold.

use serde::{Deserialize, Serialize};

use crate::config::BandingError;

/// Probability that two items of Jaccard similarity `similarity` share at
/// least one band.
pub fn candidate_probability(similarity: f64, bands_number: u32, rows_per_band: u32) -> f64 {
    let s = similarity.clamp(0.0, 1.0);
    let rows = i32::try_from(rows_per_band).unwrap_or(i32::MAX);
    let bands = i32::try_from(bands_number).unwrap_or(i32::MAX);
    1.0 - (1.0 - s.powi(rows)).powi(bands)
}

/// Approximate similarity at which the candidate probability crosses 1/2.
pub fn similarity_threshold(bands_number: u32, rows_per_band: u32) -> f64 {
    (1.0 / bands_number as f64).powf(1.0 / rows_per_band as f64)
}

/// A `(bands_number, rows_per_band)` split of a signature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BandingParams {
    pub bands_number: u32,
    pub rows_per_band: u32,
}

impl BandingParams {
    /// Pick the exact split of `hashfun_number` rows whose threshold is
    /// closest to `threshold`. Ties go to fewer rows per band.
    pub fn for_threshold(hashfun_number: u32, threshold: f64) -> Result<Self, BandingError> {
        if hashfun_number == 0 {
            return Err(BandingError::InvalidArgument {
                name: "hashfun_number",
                reason: "must be >= 1".into(),
            });
        }
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(BandingError::InvalidArgument {
                name: "threshold",
                reason: format!("must be in (0, 1], got {threshold}"),
            });
        }

        let mut best: Option<(f64, Self)> = None;
        for rows_per_band in (1..=hashfun_number).filter(|r| hashfun_number % r == 0) {
            let params = Self {
                bands_number: hashfun_number / rows_per_band,
                rows_per_band,
            };
            let distance = (params.threshold() - threshold).abs();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, params));
            }
        }
        // hashfun_number >= 1 always has the divisor 1
        best.map(|(_, params)| params)
            .ok_or(BandingError::InvalidArgument {
                name: "hashfun_number",
                reason: "no band split found".into(),
            })
    }

    pub fn signature_len(&self) -> u32 {
        self.bands_number * self.rows_per_band
    }

    pub fn threshold(&self) -> f64 {
        similarity_threshold(self.bands_number, self.rows_per_band)
    }

    pub fn candidate_probability(&self, similarity: f64) -> f64 {
        candidate_probability(similarity, self.bands_number, self.rows_per_band)
    }
}
