//! Seeded universal hash family.
//!
//! True MinHash needs one random permutation of the shingle universe per
//! signature row. We approximate each permutation with a universal hash
//! `h(x) = (a * x + b) mod p` over the Mersenne prime `p = 2^61 - 1`, which
//! is larger than any `u32` shingle ID. Products are taken in `u128`, so no
//! coefficient/ID combination can overflow.

use rand_xoshiro::rand_core::{RngCore, SeedableRng};
use rand_xoshiro::SplitMix64;
use serde::{Deserialize, Serialize};

use crate::config::MinHashError;

/// Modulus shared by every function of a family.
pub const MERSENNE_PRIME_61: u64 = (1 << 61) - 1;

/// One member of the family: `h(x) = (a * x + b) mod p`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashFunction {
    /// Multiplier, in `[1, p - 1]`.
    pub a: u64,
    /// Offset, in `[0, p - 1]`.
    pub b: u64,
}

impl HashFunction {
    /// Evaluate the function for a shingle ID. The result is always `< p`.
    #[inline]
    pub fn hash(&self, x: u32) -> u64 {
        let v = (self.a as u128) * (x as u128) + self.b as u128;
        (v % MERSENNE_PRIME_61 as u128) as u64
    }
}

/// Ordered sequence of hash functions. Row `i` of every derived matrix
/// corresponds to `functions()[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashFunctionFamily {
    seed: u32,
    functions: Vec<HashFunction>,
}

impl HashFunctionFamily {
    /// Generate `count` functions from `seed`.
    ///
    /// The generator is SplitMix64 seeded with the little-endian seed bytes.
    /// All `a` coefficients are drawn first, then all `b` coefficients, so
    /// the family for `(count, seed)` is fixed across platforms and releases.
    pub fn generate(count: u32, seed: u32) -> Result<Self, MinHashError> {
        if count == 0 {
            return Err(MinHashError::InvalidArgument {
                name: "count",
                reason: "hash family must contain at least one function".into(),
            });
        }

        let mut rng = SplitMix64::from_seed(u64::from(seed).to_le_bytes());
        let n = count as usize;
        let multipliers: Vec<u64> = (0..n)
            .map(|_| 1 + rng.next_u64() % (MERSENNE_PRIME_61 - 1))
            .collect();
        let offsets: Vec<u64> = (0..n)
            .map(|_| rng.next_u64() % MERSENNE_PRIME_61)
            .collect();

        let functions = multipliers
            .into_iter()
            .zip(offsets)
            .map(|(a, b)| HashFunction { a, b })
            .collect();

        Ok(Self { seed, functions })
    }

    /// Build a family from explicit coefficients, e.g. ones shared by another
    /// worker. Every `a` must be in `[1, p-1]` and every `b` in `[0, p-1]`.
    pub fn from_functions(seed: u32, functions: Vec<HashFunction>) -> Result<Self, MinHashError> {
        if functions.is_empty() {
            return Err(MinHashError::InvalidArgument {
                name: "functions",
                reason: "hash family must contain at least one function".into(),
            });
        }
        if let Some((idx, f)) = functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.a == 0 || f.a >= MERSENNE_PRIME_61 || f.b >= MERSENNE_PRIME_61)
        {
            return Err(MinHashError::InvalidArgument {
                name: "functions",
                reason: format!(
                    "coefficients of function {idx} out of range (a={}, b={})",
                    f.a, f.b
                ),
            });
        }
        Ok(Self { seed, functions })
    }

    /// Seed the family was derived from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of functions `k`.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Always `false` for a constructed family; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn functions(&self) -> &[HashFunction] {
        &self.functions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HashFunction> {
        self.functions.iter()
    }
}

impl<'a> IntoIterator for &'a HashFunctionFamily {
    type Item = &'a HashFunction;
    type IntoIter = std::slice::Iter<'a, HashFunction>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}
