//! Causality Analysis Dimension
//!
//! Fixed per-type cause catalogue, the compression-vs-manipulation verdict
//! and the alternative-explanation ranking. Catalogue texts are static; only
//! the probabilities and likelihoods move with the data.

use once_cell::sync::Lazy;

use crate::frame::{Frame, FrameClass, ReasonTag, VideoMetadata};

use super::types::{
    AlternativeCandidate, AlternativeExplanations, AlternativeKind, CausalityAnalysis,
    CauseAssessment, CompressionAssessment, CompressionVerdict, ElaPattern, Likelihood,
    Probability,
};

/// Bitrate under this upgrades the compression-artifact alternative, kb/s.
const COMPRESSION_UPGRADE_BITRATE: f64 = 1000.0;

/// Flow magnitude above this counts as strong motion for the camera-movement
/// upgrade.
const HIGH_FLOW_MAGNITUDE: f64 = 1.0;

/// Share of high-flow frames that upgrades the camera-movement alternative.
const HIGH_FLOW_SHARE: f64 = 0.1;

/// ELA evidence on under this share of frames reads as uniform compression.
const ELA_CONSISTENT_SHARE: f64 = 0.1;

pub fn build(frames: &[Frame], metadata: &VideoMetadata) -> CausalityAnalysis {
    CausalityAnalysis {
        technical_causes: technical_causes(frames),
        compression_vs_manipulation: compression_assessment(frames, metadata),
        alternative_explanations: alternative_explanations(frames, metadata),
    }
}

// ============================================================================
// TECHNICAL CAUSES
// ============================================================================

struct CauseTemplate {
    anomaly_type: FrameClass,
    cause: &'static str,
    indicators: [&'static str; 3],
}

static CAUSE_CATALOGUE: [CauseTemplate; 3] = [
    CauseTemplate {
        anomaly_type: FrameClass::Duplication,
        cause: "Frame duplication",
        indicators: [
            "Identical hash values",
            "High SIFT match count",
            "SSIM approaching 1.0",
        ],
    },
    CauseTemplate {
        anomaly_type: FrameClass::Discontinuity,
        cause: "Frame deletion or insertion",
        indicators: [
            "SSIM drop",
            "Optical flow spike",
            "Abrupt scene change",
        ],
    },
    CauseTemplate {
        anomaly_type: FrameClass::Insertion,
        cause: "Content splicing",
        indicators: [
            "ELA anomalies",
            "Inconsistent compression artifacts",
            "Baseline mismatch",
        ],
    },
];

fn technical_causes(frames: &[Frame]) -> Vec<CauseAssessment> {
    CAUSE_CATALOGUE
        .iter()
        .map(|template| {
            let count = frames
                .iter()
                .filter(|f| f.class == template.anomaly_type)
                .count();
            CauseAssessment {
                anomaly_type: template.anomaly_type,
                cause: template.cause.to_string(),
                technical_indicators: template
                    .indicators
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                probability: if count > 0 {
                    Probability::High
                } else {
                    Probability::Low
                },
                count,
                percentage: if frames.is_empty() {
                    0.0
                } else {
                    count as f64 / frames.len() as f64 * 100.0
                },
            }
        })
        .collect()
}

// ============================================================================
// COMPRESSION VS MANIPULATION
// ============================================================================

fn compression_assessment(frames: &[Frame], metadata: &VideoMetadata) -> CompressionAssessment {
    let ela_count = frames
        .iter()
        .filter(|f| f.is_anomaly() && f.evidence.has_reason(ReasonTag::CompressionAnomaly))
        .count();

    let pattern = if (ela_count as f64) < frames.len() as f64 * ELA_CONSISTENT_SHARE {
        ElaPattern::Consistent
    } else {
        ElaPattern::Variable
    };

    let assessment = if ela_count > 10 && pattern == ElaPattern::Variable {
        CompressionVerdict::LikelyManipulation
    } else if ela_count > 5 {
        CompressionVerdict::PossibleManipulation
    } else {
        CompressionVerdict::LikelyNormalCompression
    };

    let compression_info = match (&metadata.codec, metadata.bitrate_kbps) {
        (Some(codec), Some(bitrate)) => format!("{codec} at {bitrate:.0} kb/s"),
        (Some(codec), None) => codec.clone(),
        (None, Some(bitrate)) => format!("{bitrate:.0} kb/s"),
        (None, None) => "unknown".to_string(),
    };

    CompressionAssessment {
        compression_info,
        ela_evidence_pattern: pattern,
        ela_evidence_count: ela_count,
        assessment,
    }
}

// ============================================================================
// ALTERNATIVE EXPLANATIONS
// ============================================================================

struct AlternativeTemplate {
    kind: AlternativeKind,
    explanation: &'static str,
    affected_methods: &'static [&'static str],
    likelihood: Likelihood,
    distinguishing_factors: &'static str,
}

/// Fixed candidate order; likelihood ties resolve to the earlier entry.
static ALTERNATIVE_CATALOGUE: Lazy<Vec<AlternativeTemplate>> = Lazy::new(|| {
    vec![
        AlternativeTemplate {
            kind: AlternativeKind::CompressionArtifacts,
            explanation: "Normal compression artifacts can trigger ELA anomalies",
            affected_methods: &["ELA"],
            likelihood: Likelihood::Medium,
            distinguishing_factors: "A uniform ELA pattern across the whole video points to \
                                     compression rather than targeted manipulation",
        },
        AlternativeTemplate {
            kind: AlternativeKind::SceneTransitions,
            explanation: "Normal scene changes can trigger SSIM drops and optical-flow spikes",
            affected_methods: &["SSIM", "Optical Flow"],
            likelihood: Likelihood::MediumHigh,
            distinguishing_factors: "Scene changes usually shift color and motion at the same \
                                     time",
        },
        AlternativeTemplate {
            kind: AlternativeKind::CameraMovement,
            explanation: "Fast camera movement can cause optical-flow anomalies",
            affected_methods: &["Optical Flow"],
            likelihood: Likelihood::Medium,
            distinguishing_factors: "Camera movement usually affects the whole frame \
                                     consistently",
        },
        AlternativeTemplate {
            kind: AlternativeKind::LightingChanges,
            explanation: "Sudden lighting changes can shift color clusters",
            affected_methods: &["K-means"],
            likelihood: Likelihood::Medium,
            distinguishing_factors: "Lighting changes alter overall brightness without changing \
                                     content structure",
        },
        AlternativeTemplate {
            kind: AlternativeKind::RepeatedContent,
            explanation: "Naturally repeated content can trigger duplicate detection",
            affected_methods: &["pHash", "SIFT"],
            likelihood: Likelihood::Low,
            distinguishing_factors: "Natural repetition usually shows small pixel-level \
                                     variation",
        },
    ]
});

fn alternative_explanations(
    frames: &[Frame],
    metadata: &VideoMetadata,
) -> AlternativeExplanations {
    let low_bitrate = metadata
        .bitrate_kbps
        .map(|b| b < COMPRESSION_UPGRADE_BITRATE)
        .unwrap_or(false);

    let cluster_transitions = frames
        .windows(2)
        .filter(|w| match (w[0].color_cluster, w[1].color_cluster) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        })
        .count();

    let high_flow_frames = frames
        .iter()
        .filter(|f| f.optical_flow_mag.map(|m| m > HIGH_FLOW_MAGNITUDE).unwrap_or(false))
        .count();
    let frequent_high_flow =
        !frames.is_empty() && high_flow_frames as f64 > frames.len() as f64 * HIGH_FLOW_SHARE;

    let candidates: Vec<AlternativeCandidate> = ALTERNATIVE_CATALOGUE
        .iter()
        .map(|template| {
            let upgraded = match template.kind {
                AlternativeKind::CompressionArtifacts => low_bitrate,
                AlternativeKind::SceneTransitions => cluster_transitions > 0,
                AlternativeKind::CameraMovement => frequent_high_flow,
                _ => false,
            };
            let likelihood = if upgraded {
                Likelihood::High
            } else {
                template.likelihood
            };
            AlternativeCandidate {
                kind: template.kind,
                explanation: template.explanation.to_string(),
                affected_methods: template
                    .affected_methods
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                likelihood,
                distinguishing_factors: template.distinguishing_factors.to_string(),
                relevant: upgraded || template.likelihood >= Likelihood::Medium,
            }
        })
        .collect();

    // Strict comparison keeps the earlier catalogue entry on ties.
    let mut most_likely = None;
    let mut best: Option<Likelihood> = None;
    for candidate in candidates.iter().filter(|c| c.relevant) {
        if best.map_or(true, |b| candidate.likelihood > b) {
            best = Some(candidate.likelihood);
            most_likely = Some(candidate.kind);
        }
    }

    AlternativeExplanations {
        candidates,
        most_likely,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ConfidenceLevel, ImageHandle};

    fn plain_frame(index: usize) -> Frame {
        Frame::new(index, index as f64, ImageHandle::new(format!("i{index}")))
    }

    fn ela_anomaly(index: usize) -> Frame {
        let mut f = plain_frame(index);
        f.class = FrameClass::Discontinuity;
        f.evidence.confidence = ConfidenceLevel::Medium;
        f.evidence.add_reason(ReasonTag::SsimDrasticDrop);
        f.evidence.add_reason(ReasonTag::CompressionAnomaly);
        f
    }

    #[test]
    fn cause_probability_is_gated_on_type_presence() {
        let mut frames: Vec<Frame> = (0..10).map(plain_frame).collect();
        frames[3].class = FrameClass::Duplication;

        let causes = technical_causes(&frames);
        let duplication = causes
            .iter()
            .find(|c| c.anomaly_type == FrameClass::Duplication)
            .unwrap();
        let insertion = causes
            .iter()
            .find(|c| c.anomaly_type == FrameClass::Insertion)
            .unwrap();
        assert_eq!(duplication.probability, Probability::High);
        assert_eq!(duplication.count, 1);
        assert!((duplication.percentage - 10.0).abs() < 1e-9);
        assert_eq!(insertion.probability, Probability::Low);
    }

    #[test]
    fn widespread_variable_ela_reads_as_likely_manipulation() {
        let mut frames: Vec<Frame> = (0..50).map(plain_frame).collect();
        for i in 0..12 {
            frames[i] = ela_anomaly(i);
        }
        let assessment = compression_assessment(&frames, &VideoMetadata::default());
        assert_eq!(assessment.ela_evidence_count, 12);
        assert_eq!(assessment.ela_evidence_pattern, ElaPattern::Variable);
        assert_eq!(assessment.assessment, CompressionVerdict::LikelyManipulation);
    }

    #[test]
    fn sparse_ela_reads_as_normal_compression() {
        let mut frames: Vec<Frame> = (0..100).map(plain_frame).collect();
        for i in 0..4 {
            frames[i] = ela_anomaly(i);
        }
        let assessment = compression_assessment(&frames, &VideoMetadata::default());
        assert_eq!(assessment.ela_evidence_pattern, ElaPattern::Consistent);
        assert_eq!(
            assessment.assessment,
            CompressionVerdict::LikelyNormalCompression
        );
    }

    #[test]
    fn mid_range_ela_count_reads_as_possible_manipulation() {
        // 8 evidenced frames out of 40: over 5, but pattern still matters for
        // the strongest verdict; 8/40 = 20% -> variable yet count <= 10.
        let mut frames: Vec<Frame> = (0..40).map(plain_frame).collect();
        for i in 0..8 {
            frames[i] = ela_anomaly(i);
        }
        let assessment = compression_assessment(&frames, &VideoMetadata::default());
        assert_eq!(assessment.assessment, CompressionVerdict::PossibleManipulation);
    }

    #[test]
    fn low_bitrate_upgrades_compression_artifacts_to_most_likely() {
        let frames: Vec<Frame> = (0..10).map(plain_frame).collect();
        let metadata = VideoMetadata {
            codec: Some("H.264".to_string()),
            bitrate_kbps: Some(600.0),
            nominal_fps: None,
        };
        let alternatives = alternative_explanations(&frames, &metadata);
        // Compression artifacts is the only High and sits first in the
        // catalogue order.
        assert_eq!(alternatives.most_likely, Some(AlternativeKind::CompressionArtifacts));
        let compression = alternatives
            .candidates
            .iter()
            .find(|c| c.kind == AlternativeKind::CompressionArtifacts)
            .unwrap();
        assert_eq!(compression.likelihood, Likelihood::High);
        assert!(compression.relevant);
    }

    #[test]
    fn cluster_transition_upgrades_scene_transitions() {
        let mut frames: Vec<Frame> = (0..10).map(plain_frame).collect();
        for (i, frame) in frames.iter_mut().enumerate() {
            frame.color_cluster = Some(if i < 5 { 0 } else { 1 });
        }
        let alternatives = alternative_explanations(&frames, &VideoMetadata::default());
        assert_eq!(alternatives.most_likely, Some(AlternativeKind::SceneTransitions));
    }

    #[test]
    fn defaults_rank_scene_transitions_highest() {
        let frames: Vec<Frame> = (0..10).map(plain_frame).collect();
        let alternatives = alternative_explanations(&frames, &VideoMetadata::default());
        assert_eq!(alternatives.most_likely, Some(AlternativeKind::SceneTransitions));
        let repeated = alternatives
            .candidates
            .iter()
            .find(|c| c.kind == AlternativeKind::RepeatedContent)
            .unwrap();
        assert!(!repeated.relevant);
    }
}
