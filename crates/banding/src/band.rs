//! Banding of MinHash signature matrices into band codes.

use minhash::SignatureMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::Xxh3;

use crate::config::{BandingConfig, BandingError};

/// Hash a band sub-vector into a single band code.
///
/// The code is `xxh3_64` over the little-endian bytes of the values, so it
/// depends only on the values and their order inside the band.
#[inline]
pub fn hash_band(values: &[u64]) -> u64 {
    let mut hasher = Xxh3::new();
    for v in values {
        hasher.update(&v.to_le_bytes());
    }
    hasher.digest()
}

/// Dense `bands × items` matrix of band codes, stored row-major so that all
/// codes of one band are contiguous.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawBandCodeMatrix")]
pub struct BandCodeMatrix {
    num_bands: usize,
    num_items: usize,
    codes: Vec<u64>,
}

/// Unchecked wire form; deserialization goes through
/// [`BandCodeMatrix::from_row_major`].
#[derive(Deserialize)]
struct RawBandCodeMatrix {
    num_bands: usize,
    num_items: usize,
    codes: Vec<u64>,
}

impl TryFrom<RawBandCodeMatrix> for BandCodeMatrix {
    type Error = BandingError;

    fn try_from(raw: RawBandCodeMatrix) -> Result<Self, Self::Error> {
        Self::from_row_major(raw.num_bands, raw.num_items, raw.codes)
    }
}

impl BandCodeMatrix {
    /// Build from row-major codes (`codes[band * num_items + item]`).
    pub fn from_row_major(
        num_bands: usize,
        num_items: usize,
        codes: Vec<u64>,
    ) -> Result<Self, BandingError> {
        if num_bands == 0 {
            return Err(BandingError::InvalidArgument {
                name: "num_bands",
                reason: "band code matrix needs at least one band".into(),
            });
        }
        let expected = num_bands.checked_mul(num_items);
        if expected != Some(codes.len()) {
            return Err(BandingError::InvalidArgument {
                name: "codes",
                reason: format!(
                    "expected {num_bands} x {num_items} codes, got {}",
                    codes.len()
                ),
            });
        }
        Ok(Self {
            num_bands,
            num_items,
            codes,
        })
    }

    /// Build from one vector of item codes per band. Jagged input is rejected
    /// here rather than discovered during grouping.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, BandingError> {
        let Some(first) = rows.first() else {
            return Err(BandingError::InvalidArgument {
                name: "rows",
                reason: "band code matrix needs at least one band".into(),
            });
        };
        let num_items = first.len();
        if let Some((band, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_items) {
            return Err(BandingError::InvalidArgument {
                name: "rows",
                reason: format!(
                    "band {band} has {} items, expected {num_items}",
                    row.len()
                ),
            });
        }
        let num_bands = rows.len();
        let codes = rows.into_iter().flatten().collect();
        Self::from_row_major(num_bands, num_items, codes)
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Codes of every item in `band`.
    #[inline]
    pub fn band(&self, band: usize) -> &[u64] {
        let start = band * self.num_items;
        &self.codes[start..start + self.num_items]
    }

    #[inline]
    pub fn get(&self, band: usize, item: usize) -> u64 {
        assert!(item < self.num_items, "item {item} out of bounds");
        self.band(band)[item]
    }

    pub fn bands(&self) -> impl ExactSizeIterator<Item = &[u64]> + '_ {
        (0..self.num_bands).map(move |b| self.band(b))
    }
}

/// Splits signature matrices into `bands_number` bands of `rows_per_band`
/// contiguous rows and hashes each band of each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureBander {
    bands_number: u32,
    rows_per_band: u32,
    parallel: bool,
}

impl SignatureBander {
    /// A zero split is accepted here and reported by [`SignatureBander::band`]
    /// as a [`BandingError::DimensionMismatch`], since no signature has zero rows.
    pub fn new(bands_number: u32, rows_per_band: u32) -> Self {
        Self {
            bands_number,
            rows_per_band,
            parallel: false,
        }
    }

    pub fn from_config(cfg: &BandingConfig) -> Result<Self, BandingError> {
        cfg.validate()?;
        Ok(Self::new(cfg.bands_number, cfg.rows_per_band).with_parallel(cfg.use_parallel))
    }

    /// Band items with rayon. Output is identical either way.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn bands_number(&self) -> u32 {
        self.bands_number
    }

    pub fn rows_per_band(&self) -> u32 {
        self.rows_per_band
    }

    /// Reduce a `k × items` signature matrix to `bands_number × items` codes.
    ///
    /// Fails with [`BandingError::DimensionMismatch`] unless
    /// `bands_number * rows_per_band == k`; nothing is banded in that case.
    pub fn band(&self, signatures: &SignatureMatrix) -> Result<BandCodeMatrix, BandingError> {
        let k = signatures.num_rows();
        let expected = (self.bands_number as usize).checked_mul(self.rows_per_band as usize);
        if expected != Some(k) {
            return Err(BandingError::DimensionMismatch {
                bands_number: self.bands_number,
                rows_per_band: self.rows_per_band,
                signature_len: k,
            });
        }

        let rows = self.rows_per_band as usize;
        let num_bands = self.bands_number as usize;
        let num_items = signatures.num_items();

        let band_item = |column: &[u64]| -> Vec<u64> {
            column.chunks_exact(rows).map(hash_band).collect()
        };
        let per_item: Vec<Vec<u64>> = if self.parallel {
            signatures
                .as_column_major()
                .par_chunks_exact(k)
                .map(band_item)
                .collect()
        } else {
            signatures.columns().map(band_item).collect()
        };

        let mut codes = vec![0u64; num_bands * num_items];
        for (item, item_codes) in per_item.iter().enumerate() {
            for (band, &code) in item_codes.iter().enumerate() {
                codes[band * num_items + item] = code;
            }
        }

        debug!(num_bands, rows_per_band = rows, num_items, "signatures_banded");

        BandCodeMatrix::from_row_major(num_bands, num_items, codes)
    }
}

/// One-shot form of [`SignatureBander::band`].
pub fn band_signatures(
    signatures: &SignatureMatrix,
    bands_number: u32,
    rows_per_band: u32,
) -> Result<BandCodeMatrix, BandingError> {
    SignatureBander::new(bands_number, rows_per_band).band(signatures)
}
