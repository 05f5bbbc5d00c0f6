//! Evidence Classifier
//!
//! Resolves the final per-frame classification and confidence tier after all
//! evidence passes have run. Insertion and duplication findings are facts
//! confirmed by independent methods and stay VERY_HIGH; everything else is a
//! discontinuity whose tier follows the distinct-reason count, with at most
//! one escalation step from concentrated ELA evidence.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::frame::{metric_keys, ConfidenceLevel, Frame, FrameClass};

/// Tier implied by the number of distinct reasons on a frame.
///
/// Also used by the compression analyzer to gate its own pass before the
/// final classification exists.
pub fn provisional_tier(reason_count: usize) -> ConfidenceLevel {
    match reason_count {
        0 => ConfidenceLevel::None,
        1 => ConfidenceLevel::Low,
        2 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::High,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyReport {
    pub anomalies: usize,
    pub escalated: usize,
}

pub fn run(frames: &mut [Frame], config: &AnalysisConfig) -> ClassifyReport {
    let mut report = ClassifyReport::default();

    for frame in frames.iter_mut() {
        match frame.class {
            // Already-final findings keep their unconditional tier.
            FrameClass::Insertion | FrameClass::Duplication => {
                frame.evidence.confidence = ConfidenceLevel::VeryHigh;
                report.anomalies += 1;
            }
            _ if frame.evidence.reason_count() > 0 => {
                frame.class = FrameClass::Discontinuity;
                let mut tier = provisional_tier(frame.evidence.reason_count());

                // Single-step ELA escalation: MEDIUM -> HIGH -> VERY_HIGH,
                // never further regardless of the region count.
                let regions = frame
                    .evidence
                    .numeric_metric(metric_keys::ELA_SUSPICIOUS_REGIONS)
                    .unwrap_or(0.0);
                if regions > config.ela_escalation_regions as f64
                    && matches!(tier, ConfidenceLevel::Medium | ConfidenceLevel::High)
                {
                    tier = tier.escalated();
                    report.escalated += 1;
                }

                frame.evidence.confidence = tier;
                report.anomalies += 1;
            }
            _ => {
                // No evidence at all: the frame stays original.
            }
        }
    }

    log::info!(
        "classification: {} anomalous frame(s), {} escalated by ELA",
        report.anomalies,
        report.escalated
    );
    report
}

// ============================================================================
// TESTS
// ============================================================================
