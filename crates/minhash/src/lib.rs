//! # MinHash signatures over integer shingle sets
//!
//! This crate is the first half of the near-duplicate pipeline. It turns sets
//! of shingle IDs from a fixed universe `[0, N)` into fixed-length MinHash
//! signatures whose per-row agreement rate estimates Jaccard similarity.
//!
//! ## Contract
//!
//! - Shingling happens upstream; items arrive as `u32` shingle IDs.
//! - Everything is a pure function of `(universe_size, items, config)`: no
//!   I/O, no clocks, no global state.
//!
//! Invariant: the same [`MinHashConfig`] and universe size give bit-identical
//! signatures on every machine, so workers can compute disjoint slices of a
//! collection independently.
//!
//! ## Pipeline
//!
//! 1.  **Hash family**: [`HashFunctionFamily::generate`] draws `k` universal
//!     hash functions `(a*x + b) mod (2^61 - 1)` from a seed.
//! 2.  **Projection table**: [`ProjectionTable::build`] evaluates every
//!     function on every shingle ID once.
//! 3.  **Signatures**: each item's signature is the per-row minimum of the
//!     table over its shingles, collected into a [`SignatureMatrix`].
//!
//! ## Example Usage
//!
//! ```
//! use minhash::{MinHashConfig, MinHashProjector};
//!
//! let cfg = MinHashConfig::new().with_hashfun_number(16).with_seed(42);
//! let projector = MinHashProjector::new(100, &cfg).unwrap();
//!
//! let items = vec![vec![1u32, 2, 3, 4], vec![1, 2, 3, 5], vec![60, 70, 80]];
//! let signatures = projector.signature_matrix(&items).unwrap();
//!
//! assert_eq!(signatures.num_rows(), 16);
//! assert_eq!(signatures.num_items(), 3);
//! ```
pub mod config;
pub mod family;
pub mod projection;
pub mod signature;

pub use crate::config::{EmptySetPolicy, MinHashConfig, MinHashError};
pub use crate::family::{HashFunction, HashFunctionFamily, MERSENNE_PRIME_61};
pub use crate::projection::{ProjectionTable, EMPTY_SIGNATURE_SENTINEL};
pub use crate::signature::SignatureMatrix;

/// Current MinHash algorithm version for this crate.
pub const MINHASH_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const MINHASH_ALGORITHM: &str = "splitmix_universal_minhash_v1";

/// Hash family plus its projection table, bound to one configuration.
///
/// Built once per run and shared read-only by every signature computation.
#[derive(Debug, Clone)]
pub struct MinHashProjector {
    config: MinHashConfig,
    family: HashFunctionFamily,
    table: ProjectionTable,
}

impl MinHashProjector {
    /// Validate `cfg`, generate the family and build the table for
    /// `universe_size` shingle IDs.
    pub fn new(universe_size: u32, cfg: &MinHashConfig) -> Result<Self, MinHashError> {
        cfg.validate()?;
        let family = HashFunctionFamily::generate(cfg.hashfun_number, cfg.seed)?;
        let table = ProjectionTable::build(universe_size, &family, cfg.use_parallel)?;
        Ok(Self {
            config: cfg.clone(),
            family,
            table,
        })
    }

    pub fn config(&self) -> &MinHashConfig {
        &self.config
    }

    pub fn family(&self) -> &HashFunctionFamily {
        &self.family
    }

    pub fn table(&self) -> &ProjectionTable {
        &self.table
    }

    /// Signature of one item under the configured empty-set policy.
    pub fn signature(&self, shingles: &[u32]) -> Result<Vec<u64>, MinHashError> {
        self.table.signature(shingles, self.config.empty_set_policy)
    }

    /// Signature matrix of a collection under the configured policy and
    /// parallelism.
    pub fn signature_matrix<S>(&self, items: &[S]) -> Result<SignatureMatrix, MinHashError>
    where
        S: AsRef<[u32]> + Sync,
    {
        self.table.signature_matrix(
            items,
            self.config.empty_set_policy,
            self.config.use_parallel,
        )
    }
}
