//! Pipeline configuration and YAML configuration file support.
//!
//! [`LshConfig`] is the runtime configuration of one pipeline run. Hosts that
//! keep their tuning in files can load an [`LshFileConfig`] instead and turn
//! it into an [`LshConfig`].
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "news near-duplicates"
//!
//! minhash:
//!   version: 1
//!   hashfun_number: 128
//!   seed: 42
//!   empty_set_policy: "reject"
//!   use_parallel: true
//!
//! banding:
//!   version: 1
//!   bands_number: 32
//!   rows_per_band: 4
//!   track_bands: false
//!   use_parallel: true
//!
//! min_estimated_similarity: 0.5
//! ```

use std::fs;
use std::path::Path;

use banding::{BandingConfig, BandingError, BandingParams};
use minhash::{EmptySetPolicy, MinHashConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PipelineError;

/// Runtime configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LshConfig {
    pub minhash: MinHashConfig,
    pub banding: BandingConfig,
    /// Drop candidates whose signature-estimated similarity is below this
    /// value. `None` keeps every candidate.
    #[serde(default)]
    pub min_estimated_similarity: Option<f64>,
}

impl LshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration whose band split targets `threshold` with
    /// `hashfun_number` hash functions.
    pub fn for_threshold(hashfun_number: u32, threshold: f64) -> Result<Self, PipelineError> {
        let params = BandingParams::for_threshold(hashfun_number, threshold)?;
        Ok(Self::new()
            .with_hashfun_number(hashfun_number)
            .with_bands(params.bands_number, params.rows_per_band))
    }

    pub fn with_hashfun_number(mut self, hashfun_number: u32) -> Self {
        self.minhash.hashfun_number = hashfun_number;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.minhash.seed = seed;
        self
    }

    /// Set the band split. Keep `bands_number * rows_per_band` equal to the
    /// number of hash functions.
    pub fn with_bands(mut self, bands_number: u32, rows_per_band: u32) -> Self {
        self.banding.bands_number = bands_number;
        self.banding.rows_per_band = rows_per_band;
        self
    }

    pub fn with_empty_set_policy(mut self, policy: EmptySetPolicy) -> Self {
        self.minhash.empty_set_policy = policy;
        self
    }

    pub fn with_band_tracking(mut self, track_bands: bool) -> Self {
        self.banding.track_bands = track_bands;
        self
    }

    /// Enable rayon in every stage.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.minhash.use_parallel = use_parallel;
        self.banding.use_parallel = use_parallel;
        self
    }

    pub fn with_min_estimated_similarity(mut self, min: Option<f64>) -> Self {
        self.min_estimated_similarity = min;
        self
    }

    /// Validate both stages and their agreement on the signature length.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.minhash.validate()?;
        self.banding.validate()?;

        let k = self.minhash.hashfun_number as usize;
        if self.banding.signature_len() != Some(k) {
            return Err(BandingError::DimensionMismatch {
                bands_number: self.banding.bands_number,
                rows_per_band: self.banding.rows_per_band,
                signature_len: k,
            }
            .into());
        }

        if let Some(min) = self.min_estimated_similarity {
            if !(0.0..=1.0).contains(&min) {
                return Err(PipelineError::InvalidConfig(format!(
                    "min_estimated_similarity must be in [0, 1], got {min}"
                )));
            }
        }
        Ok(())
    }
}

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LshFileConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub minhash: MinHashYamlConfig,

    #[serde(default)]
    pub banding: BandingYamlConfig,

    #[serde(default)]
    pub min_estimated_similarity: Option<f64>,
}

impl LshFileConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: LshFileConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.minhash.validate()?;
        self.banding.validate()?;

        let k = u64::from(self.minhash.hashfun_number);
        let split = u64::from(self.banding.bands_number) * u64::from(self.banding.rows_per_band);
        if split != k {
            return Err(ConfigLoadError::Validation(format!(
                "banding.bands_number * banding.rows_per_band ({split}) must equal \
                 minhash.hashfun_number ({k})"
            )));
        }

        if let Some(min) = self.min_estimated_similarity {
            if !(0.0..=1.0).contains(&min) {
                return Err(ConfigLoadError::Validation(
                    "min_estimated_similarity must be in [0, 1]".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Runtime configuration described by this file.
    pub fn to_lsh_config(&self) -> LshConfig {
        LshConfig {
            minhash: MinHashConfig {
                version: self.minhash.version,
                hashfun_number: self.minhash.hashfun_number,
                seed: self.minhash.seed,
                empty_set_policy: self.minhash.empty_set_policy,
                use_parallel: self.minhash.use_parallel,
            },
            banding: BandingConfig {
                version: self.banding.version,
                bands_number: self.banding.bands_number,
                rows_per_band: self.banding.rows_per_band,
                track_bands: self.banding.track_bands,
                use_parallel: self.banding.use_parallel,
            },
            min_estimated_similarity: self.min_estimated_similarity,
        }
    }
}

impl Default for LshFileConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            minhash: MinHashYamlConfig::default(),
            banding: BandingYamlConfig::default(),
            min_estimated_similarity: None,
        }
    }
}

/// MinHash stage YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinHashYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_hashfun_number")]
    pub hashfun_number: u32,

    #[serde(default = "default_seed")]
    pub seed: u32,

    #[serde(default)]
    pub empty_set_policy: EmptySetPolicy,

    #[serde(default)]
    pub use_parallel: bool,
}

impl MinHashYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "minhash.version must be >= 1".to_string(),
            ));
        }
        if self.hashfun_number == 0 {
            return Err(ConfigLoadError::Validation(
                "minhash.hashfun_number must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MinHashYamlConfig {
    fn default() -> Self {
        let defaults = MinHashConfig::default();
        Self {
            version: defaults.version,
            hashfun_number: defaults.hashfun_number,
            seed: defaults.seed,
            empty_set_policy: defaults.empty_set_policy,
            use_parallel: defaults.use_parallel,
        }
    }
}

/// Banding stage YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandingYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_bands_number")]
    pub bands_number: u32,

    #[serde(default = "default_rows_per_band")]
    pub rows_per_band: u32,

    #[serde(default)]
    pub track_bands: bool,

    #[serde(default)]
    pub use_parallel: bool,
}

impl BandingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "banding.version must be >= 1".to_string(),
            ));
        }
        if self.bands_number == 0 {
            return Err(ConfigLoadError::Validation(
                "banding.bands_number must be >= 1".to_string(),
            ));
        }
        if self.rows_per_band == 0 {
            return Err(ConfigLoadError::Validation(
                "banding.rows_per_band must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BandingYamlConfig {
    fn default() -> Self {
        let defaults = BandingConfig::default();
        Self {
            version: defaults.version,
            bands_number: defaults.bands_number,
            rows_per_band: defaults.rows_per_band,
            track_bands: defaults.track_bands,
            use_parallel: defaults.use_parallel,
        }
    }
}

fn default_version() -> u32 {
    1
}
fn default_hashfun_number() -> u32 {
    MinHashConfig::default().hashfun_number
}
fn default_seed() -> u32 {
    MinHashConfig::default().seed
}
fn default_bands_number() -> u32 {
    BandingConfig::default().bands_number
}
fn default_rows_per_band() -> u32 {
    BandingConfig::default().rows_per_band
}
