//! MinHash projection table.
//!
//! The table stores `h_i(s)` for every hash function `i` and every shingle ID
//! `s` of the universe, so a signature costs `O(|item| * k)` lookups and no
//! hashing. It is built once per run and then only read, which makes sharing
//! it between worker threads (`&ProjectionTable` or `Arc<ProjectionTable>`)
//! lock-free.

use rayon::prelude::*;
use tracing::debug;

use crate::config::{EmptySetPolicy, MinHashError};
use crate::family::{HashFunction, HashFunctionFamily, MERSENNE_PRIME_61};
use crate::signature::SignatureMatrix;

/// Value of every entry of an empty item's signature under
/// [`EmptySetPolicy::Sentinel`]. Real hash values are always `< p`.
pub const EMPTY_SIGNATURE_SENTINEL: u64 = MERSENNE_PRIME_61;

/// Dense row-major `k × universe_size` table of hash values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionTable {
    num_rows: usize,
    universe_size: u32,
    values: Vec<u64>,
}

impl ProjectionTable {
    /// Hash every shingle ID in `[0, universe_size)` with every function of
    /// `family`. Rows are independent; `parallel` builds them with rayon.
    pub fn build(
        universe_size: u32,
        family: &HashFunctionFamily,
        parallel: bool,
    ) -> Result<Self, MinHashError> {
        if universe_size == 0 {
            return Err(MinHashError::InvalidArgument {
                name: "universe_size",
                reason: "shingle universe must contain at least one shingle".into(),
            });
        }
        if family.is_empty() {
            return Err(MinHashError::InvalidArgument {
                name: "family",
                reason: "hash family must contain at least one function".into(),
            });
        }

        let width = universe_size as usize;
        let num_rows = family.len();
        let len = num_rows
            .checked_mul(width)
            .ok_or_else(|| MinHashError::InvalidArgument {
                name: "universe_size",
                reason: format!("{num_rows} x {universe_size} table does not fit in memory"),
            })?;
        let mut values = vec![0u64; len];

        if parallel {
            values
                .par_chunks_mut(width)
                .zip(family.functions().par_iter())
                .for_each(|(row, f)| fill_row(row, f));
        } else {
            values
                .chunks_mut(width)
                .zip(family.functions().iter())
                .for_each(|(row, f)| fill_row(row, f));
        }

        debug!(num_rows, universe_size, parallel, "projection_table_built");

        Ok(Self {
            num_rows,
            universe_size,
            values,
        })
    }

    /// Number of hash functions `k`.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn universe_size(&self) -> u32 {
        self.universe_size
    }

    /// `h_row(shingle)`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= num_rows()` or `shingle >= universe_size()`.
    #[inline]
    pub fn get(&self, row: usize, shingle: u32) -> u64 {
        assert!(shingle < self.universe_size, "shingle {shingle} outside universe");
        self.values[row * self.universe_size as usize + shingle as usize]
    }

    /// All hash values of one function, indexed by shingle ID.
    #[inline]
    pub fn row(&self, row: usize) -> &[u64] {
        let width = self.universe_size as usize;
        &self.values[row * width..(row + 1) * width]
    }

    /// MinHash signature of a single shingle set.
    ///
    /// Duplicate IDs are harmless. Errors report the item as index `0`; use
    /// [`ProjectionTable::signature_matrix`] to get collection indices.
    pub fn signature(
        &self,
        shingles: &[u32],
        policy: EmptySetPolicy,
    ) -> Result<Vec<u64>, MinHashError> {
        self.item_signature(0, shingles, policy)
    }

    fn item_signature(
        &self,
        item: usize,
        shingles: &[u32],
        policy: EmptySetPolicy,
    ) -> Result<Vec<u64>, MinHashError> {
        if shingles.is_empty() {
            return match policy {
                EmptySetPolicy::Reject => Err(MinHashError::EmptyInput { item }),
                EmptySetPolicy::Sentinel => Ok(vec![EMPTY_SIGNATURE_SENTINEL; self.num_rows]),
            };
        }
        if let Some(&shingle) = shingles.iter().find(|&&s| s >= self.universe_size) {
            return Err(MinHashError::ShingleOutOfRange {
                item,
                shingle,
                universe_size: self.universe_size,
            });
        }

        let mut signature = Vec::with_capacity(self.num_rows);
        for i in 0..self.num_rows {
            let row = self.row(i);
            let mut minv = u64::MAX;
            for &s in shingles {
                let h = row[s as usize];
                if h < minv {
                    minv = h;
                }
            }
            signature.push(minv);
        }
        Ok(signature)
    }

    /// Signatures of a whole collection, one column per item.
    ///
    /// Items are independent and may be processed in parallel; the result is
    /// identical either way. On failure the lowest failing item index is
    /// reported and no matrix is returned.
    pub fn signature_matrix<S>(
        &self,
        items: &[S],
        policy: EmptySetPolicy,
        parallel: bool,
    ) -> Result<SignatureMatrix, MinHashError>
    where
        S: AsRef<[u32]> + Sync,
    {
        let columns: Vec<Result<Vec<u64>, MinHashError>> = if parallel {
            items
                .par_iter()
                .enumerate()
                .map(|(item, shingles)| self.item_signature(item, shingles.as_ref(), policy))
                .collect()
        } else {
            items
                .iter()
                .enumerate()
                .map(|(item, shingles)| self.item_signature(item, shingles.as_ref(), policy))
                .collect()
        };

        let mut values = Vec::with_capacity(self.num_rows * items.len());
        for column in columns {
            values.extend(column?);
        }

        debug!(
            num_rows = self.num_rows,
            num_items = items.len(),
            parallel,
            "signature_matrix_built"
        );

        SignatureMatrix::from_column_major(self.num_rows, items.len(), values)
    }
}

fn fill_row(row: &mut [u64], f: &HashFunction) {
    for (x, slot) in row.iter_mut().enumerate() {
        *slot = f.hash(x as u32);
    }
}
