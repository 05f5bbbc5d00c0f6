//! Evidence Strength Dimension
//!
//! Multi-method confirmation, the confidence-tier histogram and the weighted
//! false-positive assessment. Risk factors are reported alongside the number
//! but stay qualitative; they never move the weighted risk itself.

use std::collections::BTreeMap;

use crate::detect::stats;
use crate::frame::{ConfidenceLevel, Frame, VideoMetadata};

use super::types::{
    EvidenceStrength, FalsePositiveAssessment, MultiMethodConfirmation, RiskFactor,
};

/// Estimated false-positive probability per confidence tier.
fn tier_risk(level: ConfidenceLevel) -> f64 {
    match level {
        ConfidenceLevel::VeryHigh => 0.05,
        ConfidenceLevel::High => 0.15,
        ConfidenceLevel::Medium => 0.30,
        ConfidenceLevel::Low => 0.50,
        ConfidenceLevel::None => 0.50,
    }
}

/// Weighted risk when no anomaly carries a tier at all.
const DEFAULT_WEIGHTED_RISK: f64 = 0.25;

/// Bitrate below this is a compression-artifact risk, kb/s.
const LOW_BITRATE_KBPS: f64 = 500.0;

/// Sample sizes under this raise statistical uncertainty.
const SHORT_VIDEO_FRAMES: usize = 30;

/// More than this share of frames flagged suggests over-detection.
const EXCESSIVE_FLAG_SHARE: f64 = 0.30;

/// Inter-frame interval variation above this counts as inconsistent timing.
const FRAME_INTERVAL_CV_LIMIT: f64 = 0.1;

pub fn build(frames: &[Frame], metadata: &VideoMetadata) -> EvidenceStrength {
    EvidenceStrength {
        multi_method_confirmation: multi_method_confirmation(frames),
        confidence_distribution: confidence_distribution(frames),
        false_positive_assessment: false_positive_assessment(frames, metadata),
    }
}

/// Tabulates frames confirmed by at least one of the five methods; baseline
/// absence maps to no method, so insertion-only frames do not appear here.
fn multi_method_confirmation(frames: &[Frame]) -> MultiMethodConfirmation {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for frame in frames.iter().filter(|f| f.is_anomaly()) {
        let methods = frame.evidence.methods();
        if !methods.is_empty() {
            *counts.entry(methods.len()).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    let weighted: usize = counts.iter().map(|(k, v)| k * v).sum();
    let multiple: usize = counts.iter().filter(|(k, _)| **k > 1).map(|(_, v)| v).sum();

    MultiMethodConfirmation {
        average_methods_per_anomaly: if total > 0 {
            weighted as f64 / total as f64
        } else {
            0.0
        },
        max_methods: counts.keys().max().copied().unwrap_or(0),
        multiple_method_share: if total > 0 {
            multiple as f64 / total as f64
        } else {
            0.0
        },
        counts,
    }
}

pub(super) fn confidence_distribution(frames: &[Frame]) -> BTreeMap<ConfidenceLevel, usize> {
    let mut distribution: BTreeMap<ConfidenceLevel, usize> = BTreeMap::new();
    for frame in frames.iter().filter(|f| f.is_anomaly()) {
        *distribution.entry(frame.evidence.confidence).or_default() += 1;
    }
    distribution
}

fn false_positive_assessment(frames: &[Frame], metadata: &VideoMetadata) -> FalsePositiveAssessment {
    let distribution = confidence_distribution(frames);
    let total: usize = distribution.values().sum();
    let weighted_risk = if total > 0 {
        distribution
            .iter()
            .map(|(level, count)| tier_risk(*level) * *count as f64)
            .sum::<f64>()
            / total as f64
    } else {
        DEFAULT_WEIGHTED_RISK
    };

    FalsePositiveAssessment {
        weighted_risk,
        reliability_score: 1.0 - weighted_risk,
        risk_factors: identify_risk_factors(frames, metadata),
    }
}

fn identify_risk_factors(frames: &[Frame], metadata: &VideoMetadata) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    let mut low_bitrate = false;
    if let Some(bitrate) = metadata.bitrate_kbps {
        if bitrate < LOW_BITRATE_KBPS {
            low_bitrate = true;
            factors.push(RiskFactor {
                factor: "Low bitrate".to_string(),
                value: format!("{bitrate:.0} kb/s"),
                impact: "Heavy compression can produce artifacts that resemble manipulation"
                    .to_string(),
            });
        }
    }

    if let Some(codec) = &metadata.codec {
        if low_bitrate && matches!(codec.as_str(), "H.264" | "MPEG-4") {
            factors.push(RiskFactor {
                factor: "High-compression format".to_string(),
                value: codec.clone(),
                impact: "Compression artifacts may be misidentified as tampering".to_string(),
            });
        }
    }

    if frames.len() < SHORT_VIDEO_FRAMES {
        factors.push(RiskFactor {
            factor: "Short video".to_string(),
            value: format!("{} frames", frames.len()),
            impact: "A limited sample size raises statistical uncertainty".to_string(),
        });
    }

    if let Some(cv) = frame_interval_variation(frames) {
        if cv > FRAME_INTERVAL_CV_LIMIT {
            factors.push(RiskFactor {
                factor: "Inconsistent frame rate".to_string(),
                value: format!("{cv:.2} interval variation"),
                impact: "Irregular timing can cause false positives in temporal analysis"
                    .to_string(),
            });
        }
    }

    let anomaly_count = frames.iter().filter(|f| f.is_anomaly()).count();
    if !frames.is_empty() && anomaly_count as f64 > frames.len() as f64 * EXCESSIVE_FLAG_SHARE {
        let pct = anomaly_count as f64 / frames.len() as f64 * 100.0;
        factors.push(RiskFactor {
            factor: "Excessive anomaly detections".to_string(),
            value: format!("{anomaly_count}/{} frames ({pct:.1}%)", frames.len()),
            impact: "A high share of flagged frames suggests possible false positives".to_string(),
        });
    }

    factors
}

/// Coefficient of variation of the inter-frame timestamp deltas; needs at
/// least three frames to say anything.
fn frame_interval_variation(frames: &[Frame]) -> Option<f64> {
    if frames.len() < 3 {
        return None;
    }
    let deltas: Vec<f64> = frames.windows(2).map(|w| w[1].timestamp - w[0].timestamp).collect();
    stats::coefficient_of_variation(&deltas)
}

// ============================================================================
// TESTS
// ============================================================================
