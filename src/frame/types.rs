//! Frame Types
//!
//! Core types for the per-frame feature stream. No logic here, only data
//! structures; the detection passes in `crate::detect` do the mutating.

use serde::{Deserialize, Serialize};

use super::evidence::Evidence;

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Per-frame classification resolved by the evidence passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrameClass {
    /// No evidence of tampering
    #[serde(rename = "original")]
    Original,
    /// Confirmed copy of an earlier frame
    #[serde(rename = "anomaly_duplication")]
    Duplication,
    /// Frame absent from the baseline recording
    #[serde(rename = "anomaly_insertion")]
    Insertion,
    /// Temporal break between consecutive frames
    #[serde(rename = "anomaly_discontinuity")]
    Discontinuity,
}

impl FrameClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameClass::Original => "original",
            FrameClass::Duplication => "anomaly_duplication",
            FrameClass::Insertion => "anomaly_insertion",
            FrameClass::Discontinuity => "anomaly_discontinuity",
        }
    }

    /// Short name without the anomaly prefix, for report grouping.
    pub fn short_name(&self) -> &'static str {
        match self {
            FrameClass::Original => "original",
            FrameClass::Duplication => "duplication",
            FrameClass::Insertion => "insertion",
            FrameClass::Discontinuity => "discontinuity",
        }
    }

    pub fn is_anomaly(&self) -> bool {
        !matches!(self, FrameClass::Original)
    }
}

impl std::fmt::Display for FrameClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONFIDENCE
// ============================================================================

/// Evidence confidence tier, totally ordered from `None` to `VeryHigh`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ConfidenceLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::None => "none",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::VeryHigh => "very_high",
        }
    }

    /// One tier up, saturating at `VeryHigh`.
    pub fn escalated(&self) -> ConfidenceLevel {
        match self {
            ConfidenceLevel::None => ConfidenceLevel::Low,
            ConfidenceLevel::Low => ConfidenceLevel::Medium,
            ConfidenceLevel::Medium => ConfidenceLevel::High,
            ConfidenceLevel::High | ConfidenceLevel::VeryHigh => ConfidenceLevel::VeryHigh,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// FRAME
// ============================================================================

/// Opaque reference to a frame's full-resolution raster. The extraction layer
/// owns the actual pixels; collaborators resolve the handle on their side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn new(key: impl Into<String>) -> Self {
        ImageHandle(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One frame of the feature stream, as delivered by the extractor.
///
/// `ssim_to_prev` and `optical_flow_mag` are `None` only for index 0 (no
/// predecessor) or where extraction produced nothing for that frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    /// Position in the video, seconds.
    pub timestamp: f64,
    /// Perceptual identity hash, hex string.
    pub hash: Option<String>,
    pub image: ImageHandle,
    pub ssim_to_prev: Option<f64>,
    pub optical_flow_mag: Option<f64>,
    pub color_cluster: Option<u32>,
    pub class: FrameClass,
    pub evidence: Evidence,
}

impl Frame {
    pub fn new(index: usize, timestamp: f64, image: ImageHandle) -> Self {
        Frame {
            index,
            timestamp,
            hash: None,
            image,
            ssim_to_prev: None,
            optical_flow_mag: None,
            color_cluster: None,
            class: FrameClass::Original,
            evidence: Evidence::default(),
        }
    }

    pub fn is_anomaly(&self) -> bool {
        self.class.is_anomaly()
    }
}

// ============================================================================
// VIDEO METADATA
// ============================================================================

/// Container-level facts extracted alongside the frames. Consumed by the
/// FERM risk-factor and alternative-explanation assessments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub codec: Option<String>,
    pub bitrate_kbps: Option<f64>,
    pub nominal_fps: Option<f64>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_tiers_are_ordered() {
        assert!(ConfidenceLevel::None < ConfidenceLevel::Low);
        assert!(ConfidenceLevel::Low < ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium < ConfidenceLevel::High);
        assert!(ConfidenceLevel::High < ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn escalation_is_a_single_saturating_step() {
        assert_eq!(ConfidenceLevel::Medium.escalated(), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::High.escalated(), ConfidenceLevel::VeryHigh);
        assert_eq!(
            ConfidenceLevel::VeryHigh.escalated(),
            ConfidenceLevel::VeryHigh
        );
    }

    #[test]
    fn anomaly_classes_exclude_original() {
        assert!(!FrameClass::Original.is_anomaly());
        assert!(FrameClass::Duplication.is_anomaly());
        assert!(FrameClass::Insertion.is_anomaly());
        assert!(FrameClass::Discontinuity.is_anomaly());
    }
}
