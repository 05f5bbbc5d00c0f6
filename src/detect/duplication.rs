//! Duplicate Frame Verifier
//!
//! Second evidence pass. Hash collisions only nominate candidates; a later
//! frame is flagged as a duplicate of the group's first frame only when both
//! full-resolution SSIM and the geometric match confirm it independently.
//! Hash aliasing alone never produces a finding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::temporal::round_to;
use crate::bridge::{GeometricMatcher, StructuralComparer};
use crate::config::AnalysisConfig;
use crate::frame::{
    metric_keys, ConfidenceLevel, DetectorKind, Explanation, Frame, FrameClass, MetricValue,
    ReasonTag, SeverityLabel,
};

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationReport {
    pub candidate_groups: usize,
    pub comparisons: usize,
    pub confirmed: usize,
    /// Pairs dropped because a collaborator reported failure.
    pub collaborator_failures: usize,
}

// ============================================================================
// PASS
// ============================================================================

pub fn run(
    frames: &mut [Frame],
    comparer: &dyn StructuralComparer,
    matcher: &dyn GeometricMatcher,
    config: &AnalysisConfig,
) -> DuplicationReport {
    let mut report = DuplicationReport::default();

    // Group frame positions by exact hash. Frames the extractor failed to
    // hash cannot nominate candidates and are skipped here.
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (pos, frame) in frames.iter().enumerate() {
        if let Some(hash) = &frame.hash {
            groups.entry(hash.clone()).or_default().push(pos);
        }
    }
    groups.retain(|_, positions| positions.len() > 1);
    report.candidate_groups = groups.len();
    if groups.is_empty() {
        return report;
    }
    log::info!("verifying {} duplicate candidate group(s)", groups.len());

    for positions in groups.values() {
        let source_pos = positions[0];
        let source_index = frames[source_pos].index;
        let source_ts = frames[source_pos].timestamp;
        let source_image = frames[source_pos].image.clone();

        for &candidate_pos in &positions[1..] {
            report.comparisons += 1;

            let ssim = match comparer.ssim(&source_image, &frames[candidate_pos].image) {
                Ok(v) => v,
                Err(err) => {
                    log::warn!(
                        "duplicate check frame {} vs {}: SSIM unavailable ({err}); \
                         candidate stays unconfirmed",
                        source_index,
                        frames[candidate_pos].index
                    );
                    report.collaborator_failures += 1;
                    continue;
                }
            };
            if ssim < config.duplication_ssim_confirm {
                continue;
            }

            let matched = match matcher.compare(&source_image, &frames[candidate_pos].image) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!(
                        "duplicate check frame {} vs {}: geometric match failed ({err}); \
                         candidate stays unconfirmed",
                        source_index,
                        frames[candidate_pos].index
                    );
                    report.collaborator_failures += 1;
                    continue;
                }
            };
            if matched.inliers < config.min_match_count {
                continue;
            }

            let frame = &mut frames[candidate_pos];
            frame.class = FrameClass::Duplication;
            // Two independent confirmations; treated as certain.
            frame.evidence.confidence = ConfidenceLevel::VeryHigh;
            frame.evidence.add_reason(ReasonTag::DuplicateOf(source_index));
            frame.evidence.record_metric(
                metric_keys::SOURCE_FRAME,
                MetricValue::Number(source_index as f64),
            );
            frame.evidence.record_metric(
                metric_keys::SSIM_TO_SOURCE,
                MetricValue::Number(round_to(ssim, 4)),
            );
            frame.evidence.record_metric(
                metric_keys::SIFT_INLIERS,
                MetricValue::Number(matched.inliers as f64),
            );
            frame.evidence.record_metric(
                metric_keys::SIFT_GOOD_MATCHES,
                MetricValue::Number(matched.good_matches as f64),
            );
            frame.evidence.record_metric(
                metric_keys::SIFT_INLIER_RATIO,
                MetricValue::Number(round_to(matched.inlier_ratio, 3)),
            );

            let mut explanation = Explanation {
                detector: DetectorKind::Duplication,
                frame_index: frame.index,
                timestamp: frame.timestamp,
                severity: Some(if matched.inlier_ratio > 0.8 {
                    SeverityLabel::High
                } else {
                    SeverityLabel::Medium
                }),
                technical: format!(
                    "{} keypoints match frame {} exactly ({:.1}% inliers) with SSIM {:.3} \
                     to the source.",
                    matched.inliers,
                    source_index,
                    matched.inlier_ratio * 100.0,
                    ssim
                ),
                plain: format!(
                    "This frame is a copy of the frame at {:.2}s. Repeating a frame is a \
                     common way to stretch duration or cover a deletion.",
                    source_ts
                ),
                context: Default::default(),
            };
            explanation
                .context
                .insert("time_gap".into(), MetricValue::Number(frame.timestamp - source_ts));
            explanation.context.insert(
                "good_matches".into(),
                MetricValue::Number(matched.good_matches as f64),
            );
            frame.evidence.set_explanation(explanation);

            report.confirmed += 1;
        }
    }

    log::info!(
        "duplicate verification: {} confirmed out of {} comparison(s)",
        report.confirmed,
        report.comparisons
    );
    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::GeometricMatch;
    use crate::error::CollaboratorError;
    use crate::frame::ImageHandle;

    struct FixedComparer(f64);

    impl StructuralComparer for FixedComparer {
        fn ssim(&self, _: &ImageHandle, _: &ImageHandle) -> Result<f64, CollaboratorError> {
            Ok(self.0)
        }
    }

    struct FixedMatcher(usize);

    impl GeometricMatcher for FixedMatcher {
        fn compare(
            &self,
            _: &ImageHandle,
            _: &ImageHandle,
        ) -> Result<GeometricMatch, CollaboratorError> {
            Ok(GeometricMatch {
                keypoints_source: 200,
                keypoints_candidate: 200,
                good_matches: 40,
                inliers: self.0,
                inlier_ratio: self.0 as f64 / 40.0,
            })
        }
    }

    struct FailingMatcher;

    impl GeometricMatcher for FailingMatcher {
        fn compare(
            &self,
            _: &ImageHandle,
            _: &ImageHandle,
        ) -> Result<GeometricMatch, CollaboratorError> {
            Err(CollaboratorError::Failed("insufficient keypoints".into()))
        }
    }

    fn frames_with_shared_hash() -> Vec<Frame> {
        (0..12)
            .map(|i| {
                let mut f = Frame::new(i, i as f64 * 0.5, ImageHandle::new(format!("img-{i}")));
                f.hash = Some(if i == 5 || i == 10 {
                    "abcd".to_string()
                } else {
                    format!("hash-{i}")
                });
                f
            })
            .collect()
    }

    #[test]
    fn confirmed_duplicate_gets_very_high_confidence_and_source_metric() {
        let mut frames = frames_with_shared_hash();
        let report = run(
            &mut frames,
            &FixedComparer(0.95),
            &FixedMatcher(15),
            &AnalysisConfig::default(),
        );

        assert_eq!(report.confirmed, 1);
        let dup = &frames[10];
        assert_eq!(dup.class, FrameClass::Duplication);
        assert_eq!(dup.evidence.confidence, ConfidenceLevel::VeryHigh);
        assert_eq!(dup.evidence.numeric_metric(metric_keys::SOURCE_FRAME), Some(5.0));
        assert_eq!(dup.evidence.numeric_metric(metric_keys::SIFT_INLIERS), Some(15.0));
        // The group's first member is the source, never flagged.
        assert_eq!(frames[5].class, FrameClass::Original);
    }

    #[test]
    fn too_few_inliers_leaves_the_candidate_unflagged() {
        let mut frames = frames_with_shared_hash();
        let report = run(
            &mut frames,
            &FixedComparer(0.95),
            &FixedMatcher(3),
            &AnalysisConfig::default(),
        );

        assert_eq!(report.confirmed, 0);
        assert_eq!(frames[10].class, FrameClass::Original);
        assert!(frames[10].evidence.reasons().is_empty());
    }

    #[test]
    fn low_pairwise_ssim_skips_geometric_matching() {
        let mut frames = frames_with_shared_hash();
        let report = run(
            &mut frames,
            &FixedComparer(0.5),
            &FixedMatcher(100),
            &AnalysisConfig::default(),
        );
        assert_eq!(report.confirmed, 0);
        assert_eq!(frames[10].class, FrameClass::Original);
    }

    #[test]
    fn collaborator_failure_is_recorded_not_flagged() {
        let mut frames = frames_with_shared_hash();
        let report = run(
            &mut frames,
            &FixedComparer(0.95),
            &FailingMatcher,
            &AnalysisConfig::default(),
        );
        assert_eq!(report.confirmed, 0);
        assert_eq!(report.collaborator_failures, 1);
        assert_eq!(frames[10].class, FrameClass::Original);
    }
}
