//! Configuration and error types for the MinHash stage.
//!
//! Everything here is free of I/O so that a signature matrix is a pure
//! function of `(universe_size, items, config)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with an item whose shingle set is empty.
///
/// The policy must be the same for every item of a run, otherwise signatures
/// stop being comparable. It therefore lives on [`MinHashConfig`] rather than
/// being chosen per call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptySetPolicy {
    /// Fail with [`MinHashError::EmptyInput`].
    #[default]
    Reject,
    /// Emit a signature whose every entry is [`crate::EMPTY_SIGNATURE_SENTINEL`].
    ///
    /// No real hash value can equal the sentinel, so an empty item only ever
    /// collides with other empty items.
    Sentinel,
}

/// Configuration for hash family generation and signature computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinHashConfig {
    /// Configuration schema version.
    ///
    /// Any change that can alter signatures for the same input must bump it.
    pub version: u32,
    /// Number of hash functions `k` (signature length).
    pub hashfun_number: u32,
    /// Seed for the hash family. Same seed and `hashfun_number` give the
    /// same family on every machine.
    pub seed: u32,
    /// Handling of items without shingles.
    pub empty_set_policy: EmptySetPolicy,
    /// Build projection rows and signatures with rayon.
    pub use_parallel: bool,
}

impl MinHashConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of hash functions. Typical values: 64-256.
    pub fn with_hashfun_number(mut self, hashfun_number: u32) -> Self {
        self.hashfun_number = hashfun_number;
        self
    }

    /// Set the family seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Set the empty-set policy.
    pub fn with_empty_set_policy(mut self, policy: EmptySetPolicy) -> Self {
        self.empty_set_policy = policy;
        self
    }

    /// Enable or disable rayon parallelism.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), MinHashError> {
        if self.version < 1 {
            return Err(MinHashError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.hashfun_number == 0 {
            return Err(MinHashError::InvalidArgument {
                name: "hashfun_number",
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for MinHashConfig {
    fn default() -> Self {
        Self {
            version: 1,
            hashfun_number: 128,
            seed: 0x5EED_F00D,
            empty_set_policy: EmptySetPolicy::Reject,
            use_parallel: false,
        }
    }
}

/// Errors returned by the MinHash stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinHashError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("item {item} references shingle {shingle} outside universe [0, {universe_size})")]
    ShingleOutOfRange {
        item: usize,
        shingle: u32,
        universe_size: u32,
    },

    #[error("item {item} has an empty shingle set")]
    EmptyInput { item: usize },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },
}
