//! Workspace umbrella crate for MinHash/LSH near-duplicate candidate search.
//!
//! This crate stitches the `minhash` and `banding` stages together so callers
//! can go from shingle sets to candidate pairs with a single API entry point.
//!
//! ```
//! use minhash_lsh::{find_candidate_pairs, LshConfig};
//!
//! let cfg = LshConfig::new()
//!     .with_hashfun_number(4)
//!     .with_seed(42)
//!     .with_bands(2, 2);
//! let items = vec![vec![1u32, 2, 3], vec![1, 2, 9]];
//!
//! let report = find_candidate_pairs(10, &items, &cfg).unwrap();
//! assert_eq!(report.num_items, 2);
//! ```

pub mod config;

pub use banding::{
    BandBucket, BandCodeMatrix, BandingConfig, BandingError, BandingParams, CandidatePair,
    CandidatePairGenerator, ScoredPair, SignatureBander, band_signatures, candidate_probability,
    generate_candidate_pairs, hash_band, score_pairs, similarity_threshold,
};
pub use config::{BandingYamlConfig, ConfigLoadError, LshConfig, LshFileConfig, MinHashYamlConfig};
pub use minhash::{
    EMPTY_SIGNATURE_SENTINEL, EmptySetPolicy, HashFunction, HashFunctionFamily, MERSENNE_PRIME_61,
    MinHashConfig, MinHashError, MinHashProjector, ProjectionTable, SignatureMatrix,
};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};
use tracing::{Level, info, warn};

/// Errors that can occur while running shingle sets through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    MinHash(MinHashError),
    Banding(BandingError),
    InvalidConfig(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MinHash(err) => write!(f, "minhash stage failed: {err}"),
            PipelineError::Banding(err) => write!(f, "banding stage failed: {err}"),
            PipelineError::InvalidConfig(msg) => write!(f, "invalid pipeline configuration: {msg}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::MinHash(err) => Some(err),
            PipelineError::Banding(err) => Some(err),
            PipelineError::InvalidConfig(_) => None,
        }
    }
}

impl From<MinHashError> for PipelineError {
    fn from(value: MinHashError) -> Self {
        PipelineError::MinHash(value)
    }
}

impl From<BandingError> for PipelineError {
    fn from(value: BandingError) -> Self {
        PipelineError::Banding(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_signatures(&self, latency: Duration, result: Result<(), MinHashError>);
    fn record_banding(&self, latency: Duration, result: Result<(), BandingError>);
    /// `Ok` carries the number of pairs reported.
    fn record_pairs(&self, latency: Duration, result: Result<usize, BandingError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_signatures(self, result: Result<(), MinHashError>) {
        self.recorder
            .record_signatures(self.start.elapsed(), result);
    }

    fn record_banding(self, result: Result<(), BandingError>) {
        self.recorder.record_banding(self.start.elapsed(), result);
    }

    fn record_pairs(self, result: Result<usize, BandingError>) {
        self.recorder.record_pairs(self.start.elapsed(), result);
    }
}

/// Outcome of one candidate search over a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairReport {
    pub num_items: usize,
    pub hashfun_number: u32,
    pub bands_number: u32,
    pub rows_per_band: u32,
    /// Candidates sorted by `(first, second)`, each with its
    /// signature-estimated similarity.
    pub pairs: Vec<ScoredPair>,
}

impl PairReport {
    /// Candidate pairs without their scores.
    pub fn candidate_pairs(&self) -> impl Iterator<Item = &CandidatePair> + '_ {
        self.pairs.iter().map(|scored| &scored.pair)
    }
}

/// Projector, bander and pair generator bound to one universe and config.
///
/// Building the projection table dominates setup, so reuse a pipeline across
/// collections that share a universe.
#[derive(Debug, Clone)]
pub struct LshPipeline {
    config: LshConfig,
    projector: MinHashProjector,
    bander: SignatureBander,
    generator: CandidatePairGenerator,
}

impl LshPipeline {
    pub fn new(universe_size: u32, cfg: &LshConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let projector = MinHashProjector::new(universe_size, &cfg.minhash)?;
        let bander = SignatureBander::from_config(&cfg.banding)?;
        let generator = CandidatePairGenerator::from_config(&cfg.banding);
        Ok(Self {
            config: cfg.clone(),
            projector,
            bander,
            generator,
        })
    }

    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    pub fn projector(&self) -> &MinHashProjector {
        &self.projector
    }

    pub fn universe_size(&self) -> u32 {
        self.projector.table().universe_size()
    }

    /// Signature matrix of `items`.
    pub fn signatures<S>(&self, items: &[S]) -> Result<SignatureMatrix, PipelineError>
    where
        S: AsRef<[u32]> + Sync,
    {
        let metrics = MetricsSpan::start();
        let result = self.projector.signature_matrix(items);
        if let Some(span) = metrics {
            span.record_signatures(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        Ok(result?)
    }

    /// Band codes of a signature matrix produced by this pipeline.
    pub fn band_codes(&self, signatures: &SignatureMatrix) -> Result<BandCodeMatrix, PipelineError> {
        let metrics = MetricsSpan::start();
        let result = self.bander.band(signatures);
        if let Some(span) = metrics {
            span.record_banding(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        Ok(result?)
    }

    /// Scored candidate pairs of precomputed signatures, filtered by
    /// `min_estimated_similarity` when set.
    pub fn pairs_for_signatures(
        &self,
        signatures: &SignatureMatrix,
    ) -> Result<Vec<ScoredPair>, PipelineError> {
        let codes = self.band_codes(signatures)?;

        let metrics = MetricsSpan::start();
        let result = score_pairs(self.generator.generate(&codes), signatures).map(|scored| {
            match self.config.min_estimated_similarity {
                Some(min) => scored
                    .into_iter()
                    .filter(|p| p.estimated_similarity >= min)
                    .collect(),
                None => scored,
            }
        });
        if let Some(span) = metrics {
            span.record_pairs(result.as_ref().map(Vec::len).map_err(Clone::clone));
        }
        Ok(result?)
    }

    /// Run the whole pipeline over `items`.
    pub fn candidate_pairs<S>(&self, items: &[S]) -> Result<PairReport, PipelineError>
    where
        S: AsRef<[u32]> + Sync,
    {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "lsh.find_candidate_pairs",
            num_items = items.len(),
            universe_size = self.universe_size(),
            hashfun_number = self.config.minhash.hashfun_number,
            bands_number = self.config.banding.bands_number,
            rows_per_band = self.config.banding.rows_per_band
        );
        let _guard = span.enter();

        let result = self
            .signatures(items)
            .and_then(|signatures| self.pairs_for_signatures(&signatures));

        match result {
            Ok(pairs) => {
                let elapsed_micros = start.elapsed().as_micros();
                info!(
                    num_pairs = pairs.len(),
                    elapsed_micros,
                    "candidate_pairs_success"
                );
                Ok(PairReport {
                    num_items: items.len(),
                    hashfun_number: self.config.minhash.hashfun_number,
                    bands_number: self.config.banding.bands_number,
                    rows_per_band: self.config.banding.rows_per_band,
                    pairs,
                })
            }
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                warn!(error = %err, elapsed_micros, "candidate_pairs_failure");
                Err(err)
            }
        }
    }
}

/// Find candidate near-duplicate pairs in `items` end to end.
///
/// Generates the hash family, builds the projection table for
/// `universe_size` shingle IDs, computes signatures, bands them and
/// aggregates colliding pairs. Use [`LshPipeline`] to reuse the table.
pub fn find_candidate_pairs<S>(
    universe_size: u32,
    items: &[S],
    cfg: &LshConfig,
) -> Result<PairReport, PipelineError>
where
    S: AsRef<[u32]> + Sync,
{
    let start = Instant::now();
    let pipeline = match LshPipeline::new(universe_size, cfg) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, universe_size, elapsed_micros, "pipeline_setup_failure");
            return Err(err);
        }
    };
    pipeline.candidate_pairs(items)
}
