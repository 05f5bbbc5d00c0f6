//! Anomaly Characterization Dimension
//!
//! Temporal clustering of the anomalous indices, per-frame technical
//! severity, and the semantic roll-up over the localized events.

use std::collections::BTreeMap;

use crate::detect::stats;
use crate::event::AnomalyEvent;
use crate::frame::{metric_keys, ConfidenceLevel, Frame};

use super::types::{
    AnomalyCharacterization, DistributionPattern, SemanticContext, SeverityBucket,
    TechnicalSeverity, TemporalDistribution, TypeSeverity,
};

/// Anomalies this many indices apart or closer belong to one cluster.
const CLUSTER_GAP: usize = 3;

pub fn build(frames: &[Frame], events: &[AnomalyEvent]) -> AnomalyCharacterization {
    AnomalyCharacterization {
        temporal_distribution: temporal_distribution(frames),
        technical_severity: technical_severity(frames),
        semantic_context: semantic_context(events),
    }
}

// ============================================================================
// TEMPORAL DISTRIBUTION
// ============================================================================

fn temporal_clusters(anomaly_indices: &[usize]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for &index in anomaly_indices {
        match clusters.last_mut() {
            Some(cluster) if index - cluster[cluster.len() - 1] <= CLUSTER_GAP => {
                cluster.push(index);
            }
            _ => clusters.push(vec![index]),
        }
    }
    clusters
}

fn temporal_distribution(frames: &[Frame]) -> TemporalDistribution {
    let anomaly_indices: Vec<usize> = frames
        .iter()
        .filter(|f| f.is_anomaly())
        .map(|f| f.index)
        .collect();
    let clusters = temporal_clusters(&anomaly_indices);

    let pattern = if clusters.len() as f64 > anomaly_indices.len() as f64 * 0.7
        && !anomaly_indices.is_empty()
    {
        DistributionPattern::Isolated
    } else if clusters.len() > 1 {
        DistributionPattern::Clustered
    } else if !anomaly_indices.is_empty() {
        DistributionPattern::Systematic
    } else {
        DistributionPattern::None
    };

    let sizes: Vec<f64> = clusters.iter().map(|c| c.len() as f64).collect();
    TemporalDistribution {
        total_anomalies: anomaly_indices.len(),
        anomaly_density: if frames.is_empty() {
            0.0
        } else {
            anomaly_indices.len() as f64 / frames.len() as f64
        },
        cluster_count: clusters.len(),
        average_cluster_size: stats::mean(&sizes),
        largest_cluster: clusters.iter().map(Vec::len).max().unwrap_or(0),
        pattern,
    }
}

// ============================================================================
// TECHNICAL SEVERITY
// ============================================================================

/// Normalized severity of one anomalous frame from whichever of the four
/// recognized metrics it carries; falls back to a per-tier constant when none
/// are present.
pub(super) fn frame_severity(frame: &Frame) -> f64 {
    let mut total = 0.0;
    let mut present = 0usize;

    if let Some(drop) = frame.evidence.numeric_metric(metric_keys::SSIM_DROP) {
        total += (drop * 2.0).min(1.0);
        present += 1;
    }
    if let Some(z) = frame.evidence.numeric_metric(metric_keys::OPTICAL_FLOW_Z_SCORE) {
        total += (z.abs() / 10.0).min(1.0);
        present += 1;
    }
    if let Some(ratio) = frame.evidence.numeric_metric(metric_keys::SIFT_INLIER_RATIO) {
        total += ratio.min(1.0);
        present += 1;
    }
    if let Some(diff) = frame.evidence.numeric_metric(metric_keys::ELA_MAX_DIFFERENCE) {
        total += (diff / 200.0).min(1.0);
        present += 1;
    }

    if present == 0 {
        return match frame.evidence.confidence {
            ConfidenceLevel::VeryHigh => 0.9,
            ConfidenceLevel::High => 0.7,
            ConfidenceLevel::Medium => 0.5,
            ConfidenceLevel::Low => 0.3,
            ConfidenceLevel::None => 0.1,
        };
    }
    (total / present as f64).min(1.0)
}

fn severity_bucket(severity: f64) -> SeverityBucket {
    if severity > 0.7 {
        SeverityBucket::High
    } else if severity > 0.4 {
        SeverityBucket::Medium
    } else {
        SeverityBucket::Low
    }
}

fn technical_severity(frames: &[Frame]) -> TechnicalSeverity {
    let mut by_type: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for frame in frames.iter().filter(|f| f.is_anomaly()) {
        by_type
            .entry(frame.class.short_name().to_string())
            .or_default()
            .push(frame_severity(frame));
    }

    let all: Vec<f64> = by_type.values().flatten().copied().collect();
    let mut distribution: BTreeMap<SeverityBucket, usize> = BTreeMap::new();
    for severity in &all {
        *distribution.entry(severity_bucket(*severity)).or_default() += 1;
    }

    TechnicalSeverity {
        by_type: by_type
            .into_iter()
            .map(|(name, severities)| {
                let summary = TypeSeverity {
                    mean: stats::mean(&severities),
                    max: severities.iter().copied().fold(0.0, f64::max),
                    count: severities.len(),
                };
                (name, summary)
            })
            .collect(),
        overall_mean: stats::mean(&all),
        high_severity_count: all.iter().filter(|s| **s > 0.7).count(),
        distribution,
    }
}

// ============================================================================
// SEMANTIC CONTEXT
// ============================================================================

fn semantic_context(events: &[AnomalyEvent]) -> SemanticContext {
    let mut event_types: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        *event_types
            .entry(event.event_type.short_name().to_string())
            .or_default() += 1;
    }
    SemanticContext {
        event_types,
        significant_events: events.iter().filter(|e| e.severity_score > 0.7).count(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameClass, ImageHandle, MetricValue, ReasonTag};

    fn anomaly_at(index: usize) -> Frame {
        let mut f = Frame::new(index, index as f64, ImageHandle::new(format!("i{index}")));
        f.class = FrameClass::Discontinuity;
        f.evidence.confidence = ConfidenceLevel::Medium;
        f.evidence.add_reason(ReasonTag::SsimDrasticDrop);
        f
    }

    #[test]
    fn clusters_split_on_gaps_wider_than_three() {
        let clusters = temporal_clusters(&[1, 2, 4, 7, 12, 13]);
        assert_eq!(clusters, vec![vec![1, 2, 4, 7], vec![12, 13]]);
    }

    #[test]
    fn single_cluster_reads_as_systematic() {
        let mut frames: Vec<Frame> = (0..20)
            .map(|i| Frame::new(i, i as f64, ImageHandle::new(format!("i{i}"))))
            .collect();
        for i in 5..9 {
            frames[i] = anomaly_at(i);
        }
        let td = temporal_distribution(&frames);
        assert_eq!(td.cluster_count, 1);
        assert_eq!(td.pattern, DistributionPattern::Systematic);
        assert_eq!(td.largest_cluster, 4);
    }

    #[test]
    fn scattered_singletons_read_as_isolated() {
        let mut frames: Vec<Frame> = (0..40)
            .map(|i| Frame::new(i, i as f64, ImageHandle::new(format!("i{i}"))))
            .collect();
        for i in [0, 10, 20, 30] {
            frames[i] = anomaly_at(i);
        }
        let td = temporal_distribution(&frames);
        assert_eq!(td.cluster_count, 4);
        assert_eq!(td.pattern, DistributionPattern::Isolated);
    }

    #[test]
    fn no_anomalies_read_as_none() {
        let frames: Vec<Frame> = (0..10)
            .map(|i| Frame::new(i, i as f64, ImageHandle::new(format!("i{i}"))))
            .collect();
        let td = temporal_distribution(&frames);
        assert_eq!(td.pattern, DistributionPattern::None);
        assert_eq!(td.total_anomalies, 0);
    }

    #[test]
    fn severity_averages_the_recognized_metrics_only() {
        let mut frame = anomaly_at(0);
        frame
            .evidence
            .record_metric(metric_keys::SSIM_DROP, MetricValue::Number(0.4));
        frame
            .evidence
            .record_metric(metric_keys::OPTICAL_FLOW_Z_SCORE, MetricValue::Number(-5.0));
        // Bookkeeping metric; must not dilute the score.
        frame
            .evidence
            .record_metric(metric_keys::SSIM_ABSOLUTE_LOW, MetricValue::Number(0.3));

        // (0.4*2 + 5/10) / 2 = 0.65
        assert!((frame_severity(&frame) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn severity_falls_back_to_the_tier_constant() {
        let mut frame = anomaly_at(0);
        frame.evidence.confidence = ConfidenceLevel::VeryHigh;
        assert!((frame_severity(&frame) - 0.9).abs() < 1e-9);
        frame.evidence.confidence = ConfidenceLevel::Low;
        assert!((frame_severity(&frame) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn severity_is_clamped_to_one() {
        let mut frame = anomaly_at(0);
        frame
            .evidence
            .record_metric(metric_keys::SSIM_DROP, MetricValue::Number(0.9));
        frame
            .evidence
            .record_metric(metric_keys::ELA_MAX_DIFFERENCE, MetricValue::Number(5000.0));
        let severity = frame_severity(&frame);
        assert!(severity <= 1.0 && severity > 0.0);
    }
}
