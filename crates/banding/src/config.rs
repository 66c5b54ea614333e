//! Configuration and error types for the banding stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for banding and candidate pair generation.
///
/// `bands_number * rows_per_band` must equal the signature length of the
/// matrix being banded. More rows per band make matches stricter (fewer false
/// positives, more false negatives); more bands do the opposite. The bander
/// itself applies no policy beyond the split it is given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BandingConfig {
    /// Configuration schema version.
    pub version: u32,
    /// Number of bands `b`.
    pub bands_number: u32,
    /// Rows per band `r`.
    pub rows_per_band: u32,
    /// Keep the list of colliding band indices on every candidate pair.
    pub track_bands: bool,
    /// Band items and group bands with rayon.
    pub use_parallel: bool,
}

impl BandingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of bands. Typical values: 8-64.
    pub fn with_bands_number(mut self, bands_number: u32) -> Self {
        self.bands_number = bands_number;
        self
    }

    /// Set the number of rows per band. Typical values: 2-16.
    pub fn with_rows_per_band(mut self, rows_per_band: u32) -> Self {
        self.rows_per_band = rows_per_band;
        self
    }

    pub fn with_band_tracking(mut self, track_bands: bool) -> Self {
        self.track_bands = track_bands;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Total signature length this configuration expects, if it fits.
    pub fn signature_len(&self) -> Option<usize> {
        (self.bands_number as usize).checked_mul(self.rows_per_band as usize)
    }

    /// Validate configuration parameters on their own.
    ///
    /// Agreement with a concrete signature length is checked when banding.
    pub fn validate(&self) -> Result<(), BandingError> {
        if self.version < 1 {
            return Err(BandingError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.bands_number == 0 {
            return Err(BandingError::InvalidArgument {
                name: "bands_number",
                reason: "must be >= 1".into(),
            });
        }
        if self.rows_per_band == 0 {
            return Err(BandingError::InvalidArgument {
                name: "rows_per_band",
                reason: "must be >= 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for BandingConfig {
    fn default() -> Self {
        Self {
            version: 1,
            bands_number: 32,
            rows_per_band: 4,
            track_bands: false,
            use_parallel: false,
        }
    }
}

/// Errors returned by banding and pair generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BandingError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error(
        "dimension mismatch: bands_number={bands_number} x rows_per_band={rows_per_band} \
         does not equal signature length {signature_len}"
    )]
    DimensionMismatch {
        bands_number: u32,
        rows_per_band: u32,
        signature_len: usize,
    },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },
}
