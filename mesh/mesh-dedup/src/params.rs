//! Parameters for point deduplication.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DedupError, DedupResult};

/// Configuration for [`remove_doubles`](crate::remove_doubles).
///
/// The threshold is in the same units as the mesh coordinates.
///
/// # Example
///
/// ```
/// use mesh_dedup::DedupParams;
///
/// let params = DedupParams::default().with_threshold(0.01);
/// assert!(params.validate().is_ok());
///
/// let bad = DedupParams::default().with_threshold(-1.0);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DedupParams {
    /// Points at most this far apart are merged.
    ///
    /// Default: `1e-4`
    pub threshold: f64,

    /// Re-check the merge mapping and the compacted faces before writing the
    /// output, failing with [`DedupError::BrokenInvariant`] on a violation.
    ///
    /// Default: `false`
    pub verify: bool,
}

impl Default for DedupParams {
    fn default() -> Self {
        Self {
            threshold: 1e-4,
            verify: false,
        }
    }
}

impl DedupParams {
    /// Merge only points with identical coordinates.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            threshold: 0.0,
            ..Default::default()
        }
    }

    /// Looser threshold for noisy scan data.
    #[must_use]
    pub fn for_scans() -> Self {
        Self {
            threshold: 1e-3,
            ..Default::default()
        }
    }

    /// Tight threshold that leaves intentional geometry alone.
    #[must_use]
    pub fn for_cad() -> Self {
        Self {
            threshold: 1e-9,
            ..Default::default()
        }
    }

    /// Set the merge threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable or disable invariant verification.
    #[must_use]
    pub const fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Check the parameters before running.
    ///
    /// # Errors
    ///
    /// Returns [`DedupError::InvalidThreshold`] for a negative, infinite or
    /// NaN threshold.
    pub fn validate(&self) -> DedupResult<()> {
        if self.threshold.is_finite() && self.threshold >= 0.0 {
            Ok(())
        } else {
            Err(DedupError::InvalidThreshold(self.threshold))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = DedupParams::default();
        assert!((params.threshold - 1e-4).abs() < 1e-12);
        assert!(!params.verify);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(DedupParams::exact().threshold.abs() < f64::EPSILON);
        assert!(DedupParams::for_scans().threshold > DedupParams::default().threshold);
        assert!(DedupParams::for_cad().threshold < DedupParams::default().threshold);
    }

    #[test]
    fn test_builder() {
        let params = DedupParams::default().with_threshold(0.5).with_verify(true);
        assert!((params.threshold - 0.5).abs() < 1e-12);
        assert!(params.verify);
    }

    #[test]
    fn test_zero_threshold_is_valid() {
        assert!(DedupParams::exact().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        for threshold in [-1e-9, -1.0, f64::NAN, f64::INFINITY] {
            let params = DedupParams::default().with_threshold(threshold);
            assert!(matches!(
                params.validate(),
                Err(DedupError::InvalidThreshold(_))
            ));
        }
    }
}
