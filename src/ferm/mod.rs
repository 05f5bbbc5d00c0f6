//! FERM Builder - Forensic Evidence Reliability Matrix
//!
//! Aggregates the final frame and event collections into the four-dimension
//! reliability matrix: evidence strength, anomaly characterization, causality
//! analysis and the conclusion. Pure function of its inputs; building it
//! twice from the same data yields the same matrix.

pub mod causality;
pub mod characterization;
pub mod conclusion;
pub mod strength;
pub mod types;

pub use types::{
    AlternativeCandidate, AlternativeExplanations, AlternativeKind, AnomalyCharacterization,
    CausalityAnalysis, CauseAssessment, CompressionAssessment, CompressionVerdict, Conclusion,
    DescriptiveConfidence, DistributionPattern, ElaPattern, EvidenceStrength,
    FalsePositiveAssessment, Ferm, Finding, Impact, Likelihood, MultiMethodConfirmation,
    Probability, ReliabilityFactor, ReliabilityVerdict, RiskFactor, SemanticContext,
    SeverityBucket, TechnicalSeverity, TemporalDistribution, TypeSeverity,
};

use crate::event::AnomalyEvent;
use crate::frame::{Frame, VideoMetadata};

pub fn build(frames: &[Frame], events: &[AnomalyEvent], metadata: &VideoMetadata) -> Ferm {
    let evidence_strength = strength::build(frames, metadata);
    let anomaly_characterization = characterization::build(frames, events);
    let causality_analysis = causality::build(frames, metadata);
    let conclusion = conclusion::build(
        frames,
        &evidence_strength,
        &anomaly_characterization,
        &causality_analysis,
    );

    Ferm {
        evidence_strength,
        anomaly_characterization,
        causality_analysis,
        conclusion,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::localize;
    use crate::frame::{
        metric_keys, ConfidenceLevel, FrameClass, ImageHandle, MetricValue, ReasonTag,
    };

    fn original(index: usize) -> Frame {
        Frame::new(index, index as f64 / 30.0, ImageHandle::new(format!("i{index}")))
    }

    fn strong_anomaly(index: usize) -> Frame {
        let mut f = original(index);
        f.class = FrameClass::Discontinuity;
        f.evidence.confidence = ConfidenceLevel::High;
        f.evidence.add_reason(ReasonTag::SsimDrasticDrop);
        f.evidence.add_reason(ReasonTag::OpticalFlowSpike);
        f.evidence.add_reason(ReasonTag::SceneChange);
        f.evidence
            .record_metric(metric_keys::SSIM_DROP, MetricValue::Number(0.55));
        f.evidence
            .record_metric(metric_keys::OPTICAL_FLOW_Z_SCORE, MetricValue::Number(9.5));
        f
    }

    /// A well-evidenced clustered tampering case over 60 frames.
    fn strong_case() -> Vec<Frame> {
        let mut frames: Vec<Frame> = (0..60).map(original).collect();
        for i in 20..24 {
            frames[i] = strong_anomaly(i);
        }
        for i in 40..43 {
            frames[i] = strong_anomaly(i);
        }
        frames
    }

    #[test]
    fn zero_anomalies_produce_an_empty_but_valid_matrix() {
        let frames: Vec<Frame> = (0..40).map(original).collect();
        let events = localize(&frames);
        let ferm = build(&frames, &events, &VideoMetadata::default());

        assert!(events.is_empty());
        assert!(ferm.conclusion.primary_findings.is_empty());
        assert_eq!(
            ferm.anomaly_characterization.temporal_distribution.pattern,
            DistributionPattern::None
        );
        assert!((ferm.evidence_strength.false_positive_assessment.weighted_risk - 0.25).abs()
            < 1e-9);
        // Scores stay bounded even on empty input.
        let fp = &ferm.evidence_strength.false_positive_assessment;
        assert!((0.0..=1.0).contains(&fp.weighted_risk));
        assert!((0.0..=1.0).contains(&fp.reliability_score));
    }

    #[test]
    fn strong_clustered_evidence_reaches_a_high_verdict() {
        let frames = strong_case();
        let events = localize(&frames);
        let ferm = build(&frames, &events, &VideoMetadata::default());

        // Two clusters of multi-method anomalies.
        assert_eq!(
            ferm.anomaly_characterization.temporal_distribution.pattern,
            DistributionPattern::Clustered
        );
        assert!(
            ferm.evidence_strength
                .multi_method_confirmation
                .average_methods_per_anomaly
                >= 2.0
        );
        assert_eq!(ferm.conclusion.reliability, ReliabilityVerdict::High);
        assert_eq!(ferm.conclusion.primary_findings.len(), 1);
        assert!(!ferm.conclusion.recommended_actions.is_empty());
    }

    #[test]
    fn weak_scattered_evidence_stays_low_or_limited() {
        let mut frames: Vec<Frame> = (0..60).map(original).collect();
        for i in [5, 15, 25, 35, 45] {
            let mut f = original(i);
            f.class = FrameClass::Discontinuity;
            f.evidence.confidence = ConfidenceLevel::Low;
            f.evidence.add_reason(ReasonTag::SceneChange);
            frames[i] = f;
        }
        let events = localize(&frames);
        let ferm = build(&frames, &events, &VideoMetadata::default());

        assert_eq!(
            ferm.anomaly_characterization.temporal_distribution.pattern,
            DistributionPattern::Isolated
        );
        assert!(matches!(
            ferm.conclusion.reliability,
            ReliabilityVerdict::Limited | ReliabilityVerdict::Low
        ));
    }

    #[test]
    fn rebuilding_from_unchanged_inputs_is_identical() {
        let frames = strong_case();
        let events = localize(&frames);
        let metadata = VideoMetadata {
            codec: Some("H.264".to_string()),
            bitrate_kbps: Some(2500.0),
            nominal_fps: Some(30.0),
        };

        let first = build(&frames, &events, &metadata);
        let second = build(&frames, &events, &metadata);
        assert_eq!(first, second);
    }

    #[test]
    fn duplication_findings_carry_the_follow_up_action() {
        let mut frames: Vec<Frame> = (0..40).map(original).collect();
        let mut dup = original(10);
        dup.class = FrameClass::Duplication;
        dup.evidence.confidence = ConfidenceLevel::VeryHigh;
        dup.evidence.add_reason(ReasonTag::DuplicateOf(3));
        dup.evidence
            .record_metric(metric_keys::SIFT_INLIER_RATIO, MetricValue::Number(0.9));
        frames[10] = dup;

        let events = localize(&frames);
        let ferm = build(&frames, &events, &VideoMetadata::default());

        assert!(ferm
            .conclusion
            .primary_findings
            .iter()
            .any(|f| f.anomaly_type == FrameClass::Duplication));
        assert!(ferm
            .conclusion
            .recommended_actions
            .iter()
            .any(|a| a.contains("duplicated segments")));
    }
}
