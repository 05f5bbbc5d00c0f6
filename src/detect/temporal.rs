//! Robust Temporal Discontinuity Detector
//!
//! First evidence pass. Flags optical-flow spikes against a median/MAD
//! baseline, drastic or absolutely-low SSIM, and color-cluster transitions.
//! Flow magnitude is heavy-tailed (cuts produce extreme outliers), so the
//! baseline uses median/MAD rather than mean/std.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::stats;
use crate::config::AnalysisConfig;
use crate::frame::{
    metric_keys, DetectorKind, Explanation, Frame, MetricValue, ReasonTag, SeverityLabel,
};

/// MAD substitute when every qualifying sample equals the median.
const MAD_EPSILON: f64 = 1e-9;

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStats {
    pub median: f64,
    pub mad: f64,
    pub samples: usize,
}

/// What the pass did, for the run's pass report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalReport {
    pub flow_stats: Option<FlowStats>,
    /// True when fewer than 2 qualifying flow samples existed and the
    /// flow-spike sub-pass was skipped for the whole run.
    pub flow_skipped: bool,
    pub frames_flagged: usize,
    pub scene_changes: usize,
    pub mean_scene_duration: Option<f64>,
}

// ============================================================================
// PASS
// ============================================================================

pub fn run(frames: &mut [Frame], config: &AnalysisConfig) -> TemporalReport {
    let mut flagged: BTreeSet<usize> = BTreeSet::new();

    let (flow_stats, flow_skipped) = detect_flow_spikes(frames, config, &mut flagged);
    detect_ssim_anomalies(frames, config, &mut flagged);
    let (scene_changes, mean_scene_duration) = detect_scene_changes(frames, &mut flagged);

    TemporalReport {
        flow_stats,
        flow_skipped,
        frames_flagged: flagged.len(),
        scene_changes,
        mean_scene_duration,
    }
}

/// Zero flow denotes "no signal" from the extractor, not "no motion", so zero
/// and absent samples are excluded before computing the baseline.
fn detect_flow_spikes(
    frames: &mut [Frame],
    config: &AnalysisConfig,
    flagged: &mut BTreeSet<usize>,
) -> (Option<FlowStats>, bool) {
    let samples: Vec<f64> = frames
        .iter()
        .filter_map(|f| f.optical_flow_mag)
        .filter(|m| *m > 0.0)
        .collect();

    if samples.len() < 2 {
        log::warn!(
            "optical flow spike detection skipped: {} qualifying sample(s), need 2",
            samples.len()
        );
        return (None, true);
    }

    let median = stats::median(&samples).unwrap_or(0.0);
    let mut mad = stats::mad(&samples, median).unwrap_or(0.0);
    if mad == 0.0 {
        mad = MAD_EPSILON;
    }
    log::debug!(
        "optical flow baseline: median={:.3} mad={:.3} over {} samples",
        median,
        mad,
        samples.len()
    );

    for frame in frames.iter_mut() {
        let Some(magnitude) = frame.optical_flow_mag else {
            continue;
        };
        if magnitude <= 0.0 {
            continue;
        }
        let z = stats::modified_z(magnitude, median, mad);
        if z.abs() <= config.flow_z_threshold {
            continue;
        }

        frame.evidence.add_reason(ReasonTag::OpticalFlowSpike);
        frame.evidence.record_metric(
            metric_keys::OPTICAL_FLOW_Z_SCORE,
            MetricValue::Number(round_to(z, 2)),
        );

        let deviation_pct = if median > 0.0 {
            (magnitude - median) / median * 100.0
        } else {
            0.0
        };
        let mut explanation = Explanation {
            detector: DetectorKind::OpticalFlow,
            frame_index: frame.index,
            timestamp: frame.timestamp,
            severity: Some(if z.abs() > 6.0 {
                SeverityLabel::High
            } else {
                SeverityLabel::Medium
            }),
            technical: format!(
                "Optical flow magnitude {magnitude:.3} deviates from the run median \
                 {median:.3} with modified z-score {z:.2}."
            ),
            plain: "The picture moves far more abruptly here than anywhere typical in this \
                    video, like a hard cut or a rough camera jump."
                .to_string(),
            context: Default::default(),
        };
        explanation
            .context
            .insert("flow_magnitude".into(), MetricValue::Number(magnitude));
        explanation
            .context
            .insert("median_flow".into(), MetricValue::Number(median));
        explanation
            .context
            .insert("deviation_percentage".into(), MetricValue::Number(deviation_pct));
        frame.evidence.set_explanation(explanation);
        flagged.insert(frame.index);
    }

    (
        Some(FlowStats {
            median,
            mad,
            samples: samples.len(),
        }),
        false,
    )
}

fn detect_ssim_anomalies(
    frames: &mut [Frame],
    config: &AnalysisConfig,
    flagged: &mut BTreeSet<usize>,
) {
    for i in 1..frames.len() {
        let Some(current) = frames[i].ssim_to_prev else {
            continue;
        };
        // Frame 0 has no predecessor; its SSIM defaults to 1.0.
        let previous = match frames[i - 1].ssim_to_prev {
            Some(v) => Some(v),
            None if frames[i - 1].index == 0 => Some(1.0),
            None => None,
        };

        if let Some(previous) = previous {
            let drop = previous - current;
            if drop > config.ssim_drop_threshold {
                let frame = &mut frames[i];
                frame.evidence.add_reason(ReasonTag::SsimDrasticDrop);
                frame.evidence.record_metric(
                    metric_keys::SSIM_DROP,
                    MetricValue::Number(round_to(drop, 4)),
                );
                let mut explanation = Explanation {
                    detector: DetectorKind::SsimDrop,
                    frame_index: frame.index,
                    timestamp: frame.timestamp,
                    severity: Some(if drop > 0.5 {
                        SeverityLabel::High
                    } else {
                        SeverityLabel::Medium
                    }),
                    technical: format!(
                        "SSIM fell {drop:.3} against the previous frame \
                         ({previous:.3} -> {current:.3})."
                    ),
                    plain: "This frame is very different from the one before it; content may \
                            have been cut or spliced at this point."
                        .to_string(),
                    context: Default::default(),
                };
                explanation
                    .context
                    .insert("ssim_previous".into(), MetricValue::Number(previous));
                explanation
                    .context
                    .insert("ssim_current".into(), MetricValue::Number(current));
                if previous > 0.0 {
                    explanation.context.insert(
                        "drop_percentage".into(),
                        MetricValue::Number(drop / previous * 100.0),
                    );
                }
                frame.evidence.set_explanation(explanation);
                flagged.insert(frame.index);
            }
        }

        // Fires independently of the drop check.
        if current < config.ssim_low_floor {
            let floor = config.ssim_low_floor;
            let frame = &mut frames[i];
            frame.evidence.add_reason(ReasonTag::SsimVeryLow);
            frame.evidence.record_metric(
                metric_keys::SSIM_ABSOLUTE_LOW,
                MetricValue::Number(round_to(current, 4)),
            );
            let mut explanation = Explanation {
                detector: DetectorKind::SsimLow,
                frame_index: frame.index,
                timestamp: frame.timestamp,
                severity: Some(SeverityLabel::Medium),
                technical: format!(
                    "SSIM to the previous frame is only {current:.3}, below the {floor:.2} floor."
                ),
                plain: "The visual structure of this frame barely matches the previous one."
                    .to_string(),
                context: Default::default(),
            };
            explanation
                .context
                .insert("ssim_value".into(), MetricValue::Number(current));
            explanation
                .context
                .insert("threshold".into(), MetricValue::Number(floor));
            explanation
                .context
                .insert("below_threshold_by".into(), MetricValue::Number(floor - current));
            frame.evidence.set_explanation(explanation);
            flagged.insert(frame.index);
        }
    }
}

fn detect_scene_changes(
    frames: &mut [Frame],
    flagged: &mut BTreeSet<usize>,
) -> (usize, Option<f64>) {
    let mut change_timestamps: Vec<f64> = Vec::new();

    for i in 1..frames.len() {
        let (Some(prev_cluster), Some(curr_cluster)) =
            (frames[i - 1].color_cluster, frames[i].color_cluster)
        else {
            continue;
        };
        if prev_cluster == curr_cluster {
            continue;
        }

        let frame = &mut frames[i];
        frame.evidence.add_reason(ReasonTag::SceneChange);
        frame.evidence.record_metric(
            metric_keys::COLOR_CLUSTER_JUMP,
            MetricValue::Text(format!("{prev_cluster} -> {curr_cluster}")),
        );
        let mut explanation = Explanation {
            detector: DetectorKind::SceneChange,
            frame_index: frame.index,
            timestamp: frame.timestamp,
            severity: None,
            technical: format!(
                "Dominant color palette moved from cluster {prev_cluster} to cluster \
                 {curr_cluster}."
            ),
            plain: "The scene or camera angle changes at this frame.".to_string(),
            context: Default::default(),
        };
        explanation
            .context
            .insert("from_cluster".into(), MetricValue::Number(prev_cluster as f64));
        explanation
            .context
            .insert("to_cluster".into(), MetricValue::Number(curr_cluster as f64));
        frame.evidence.set_explanation(explanation);

        change_timestamps.push(frame.timestamp);
        flagged.insert(frame.index);
    }

    let mean_duration = if change_timestamps.len() >= 2 {
        let gaps: Vec<f64> = change_timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        Some(stats::mean(&gaps))
    } else {
        None
    };

    (change_timestamps.len(), mean_duration)
}

pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

// ============================================================================
// TESTS
// ============================================================================
