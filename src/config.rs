//! Analysis Configuration & Thresholds
//!
//! Every tunable the passes consume, threaded explicitly through the pipeline.
//! Nothing in this crate reads or rewrites configuration mid-run; a value is
//! decided here once and used as-is by every pass.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// DEFAULTS (constants, fixed at build time)
// ============================================================================

/// Cluster-count hint handed to the external color-clustering stage.
pub const KMEANS_CLUSTER_HINT: usize = 3;

/// SSIM drop from the previous frame treated as a discontinuity.
pub const SSIM_DISCONTINUITY_DROP: f64 = 0.30;

/// Absolute SSIM below this fires "SSIM very low" on its own.
pub const SSIM_ABSOLUTE_FLOOR: f64 = 0.7;

/// Modified Z-score threshold for optical-flow spikes.
pub const OPTICAL_FLOW_Z_THRESH: f64 = 5.0;

/// Pairwise SSIM required before a hash collision counts as a duplicate.
pub const DUPLICATION_SSIM_CONFIRM: f64 = 0.80;

/// Minimum RANSAC inliers required to confirm a duplicate.
pub const SIFT_MIN_MATCH_COUNT: usize = 10;

/// Edge length of the square cells the difference map is partitioned into.
pub const ELA_GRID_SIZE: usize = 50;

/// Cell mean difference above this marks the cell suspicious.
pub const ELA_CELL_MEAN_THRESH: f32 = 30.0;

/// Cell mean difference above this upgrades the cell to "high".
pub const ELA_CELL_HIGH_MEAN_THRESH: f32 = 50.0;

/// Cell max difference above this marks the cell suspicious.
pub const ELA_CELL_MAX_THRESH: f32 = 100.0;

/// More suspicious cells than this escalates frame confidence one tier.
pub const ELA_ESCALATION_REGIONS: usize = 5;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Full configuration surface of the analysis core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Passed through to the external clustering stage; recorded here so the
    /// whole run is reproducible from one value set.
    pub cluster_hint: usize,
    pub ssim_drop_threshold: f64,
    pub ssim_low_floor: f64,
    pub flow_z_threshold: f64,
    pub duplication_ssim_confirm: f64,
    pub min_match_count: usize,
    pub ela_grid_size: usize,
    pub ela_cell_mean: f32,
    pub ela_cell_high_mean: f32,
    pub ela_cell_max: f32,
    pub ela_escalation_regions: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cluster_hint: KMEANS_CLUSTER_HINT,
            ssim_drop_threshold: SSIM_DISCONTINUITY_DROP,
            ssim_low_floor: SSIM_ABSOLUTE_FLOOR,
            flow_z_threshold: OPTICAL_FLOW_Z_THRESH,
            duplication_ssim_confirm: DUPLICATION_SSIM_CONFIRM,
            min_match_count: SIFT_MIN_MATCH_COUNT,
            ela_grid_size: ELA_GRID_SIZE,
            ela_cell_mean: ELA_CELL_MEAN_THRESH,
            ela_cell_high_mean: ELA_CELL_HIGH_MEAN_THRESH,
            ela_cell_max: ELA_CELL_MAX_THRESH,
            ela_escalation_regions: ELA_ESCALATION_REGIONS,
        }
    }
}

impl AnalysisConfig {
    /// High sensitivity - lower thresholds, more detections.
    pub fn high_sensitivity() -> Self {
        Self {
            ssim_drop_threshold: 0.20,
            flow_z_threshold: 4.0,
            duplication_ssim_confirm: 0.75,
            ..Default::default()
        }
    }

    /// Low sensitivity - higher thresholds, fewer detections.
    pub fn low_sensitivity() -> Self {
        Self {
            ssim_drop_threshold: 0.40,
            flow_z_threshold: 6.0,
            duplication_ssim_confirm: 0.85,
            min_match_count: 15,
            ..Default::default()
        }
    }

    /// Reject invalid values before any frame is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_hint == 0 {
            return Err(ConfigError::ZeroCount("cluster_hint"));
        }
        if self.ssim_drop_threshold <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("ssim_drop_threshold"));
        }
        if self.ssim_low_floor <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("ssim_low_floor"));
        }
        if self.flow_z_threshold <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("flow_z_threshold"));
        }
        if self.duplication_ssim_confirm <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("duplication_ssim_confirm"));
        }
        if self.min_match_count == 0 {
            return Err(ConfigError::ZeroCount("min_match_count"));
        }
        if self.ela_grid_size == 0 {
            return Err(ConfigError::ZeroCount("ela_grid_size"));
        }
        if self.ela_cell_mean <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("ela_cell_mean"));
        }
        if self.ela_cell_high_mean <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("ela_cell_high_mean"));
        }
        if self.ela_cell_max <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold("ela_cell_max"));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(AnalysisConfig::high_sensitivity().validate().is_ok());
        assert!(AnalysisConfig::low_sensitivity().validate().is_ok());
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let cfg = AnalysisConfig {
            ssim_drop_threshold: 0.0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositiveThreshold("ssim_drop_threshold"))
        );
    }

    #[test]
    fn zero_match_count_is_rejected() {
        let cfg = AnalysisConfig {
            min_match_count: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroCount("min_match_count")));
    }
}
