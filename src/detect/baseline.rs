//! Baseline Comparison
//!
//! Optional fourth evidence pass. Any frame whose identity hash is absent
//! from the baseline recording's hash set is an insertion. This is a
//! presence/absence fact rather than a statistical inference, so the finding
//! is final and carries VERY_HIGH confidence unconditionally.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::frame::{ConfidenceLevel, Frame, FrameClass, ReasonTag};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineReport {
    pub flagged: usize,
    /// Frames the extractor failed to hash; skipped for this pass.
    pub missing_hash: usize,
}

pub fn run(frames: &mut [Frame], baseline_hashes: &HashSet<String>) -> BaselineReport {
    let mut report = BaselineReport::default();

    for frame in frames.iter_mut() {
        let Some(hash) = &frame.hash else {
            report.missing_hash += 1;
            continue;
        };
        if baseline_hashes.contains(hash) {
            continue;
        }
        frame.class = FrameClass::Insertion;
        frame.evidence.confidence = ConfidenceLevel::VeryHigh;
        frame.evidence.add_reason(ReasonTag::AbsentFromBaseline);
        report.flagged += 1;
    }

    log::info!("baseline comparison: {} potential insertion(s)", report.flagged);
    report
}

// ============================================================================
// TESTS
// ============================================================================
