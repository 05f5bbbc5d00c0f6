//! Event Severity Scoring
//!
//! Severity = base(type) x confidence multiplier x duration bonus x frame
//! count bonus, clamped to [0, 1].

use crate::frame::{ConfidenceLevel, FrameClass};

fn base_severity(event_type: FrameClass) -> f64 {
    match event_type {
        FrameClass::Insertion => 0.8,
        FrameClass::Duplication => 0.6,
        FrameClass::Discontinuity => 0.5,
        _ => 0.3,
    }
}

fn confidence_multiplier(confidence: ConfidenceLevel) -> f64 {
    match confidence {
        ConfidenceLevel::VeryHigh => 1.2,
        ConfidenceLevel::High => 1.0,
        ConfidenceLevel::Medium => 0.8,
        ConfidenceLevel::Low => 0.6,
        ConfidenceLevel::None => 0.5,
    }
}

pub fn event_severity(
    event_type: FrameClass,
    confidence: ConfidenceLevel,
    duration: f64,
    frame_count: usize,
) -> f64 {
    let mut severity = base_severity(event_type) * confidence_multiplier(confidence);

    // Longer events are more severe.
    if duration > 5.0 {
        severity *= 1.2;
    } else if duration > 2.0 {
        severity *= 1.1;
    }

    if frame_count > 10 {
        severity *= 1.1;
    }

    severity.clamp(0.0, 1.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_at_very_high_confidence_scores_near_the_top() {
        let s = event_severity(FrameClass::Insertion, ConfidenceLevel::VeryHigh, 1.0, 2);
        assert!((s - 0.96).abs() < 1e-9);
    }

    #[test]
    fn long_large_events_clamp_to_one() {
        let s = event_severity(FrameClass::Insertion, ConfidenceLevel::VeryHigh, 10.0, 20);
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn duration_bonuses_are_tiered() {
        let short = event_severity(FrameClass::Discontinuity, ConfidenceLevel::High, 1.0, 2);
        let mid = event_severity(FrameClass::Discontinuity, ConfidenceLevel::High, 3.0, 2);
        let long = event_severity(FrameClass::Discontinuity, ConfidenceLevel::High, 6.0, 2);
        assert!((short - 0.5).abs() < 1e-9);
        assert!((mid - 0.55).abs() < 1e-9);
        assert!((long - 0.6).abs() < 1e-9);
    }

    #[test]
    fn severity_always_in_unit_interval() {
        for event_type in [
            FrameClass::Original,
            FrameClass::Duplication,
            FrameClass::Insertion,
            FrameClass::Discontinuity,
        ] {
            for confidence in [
                ConfidenceLevel::None,
                ConfidenceLevel::Low,
                ConfidenceLevel::Medium,
                ConfidenceLevel::High,
                ConfidenceLevel::VeryHigh,
            ] {
                for duration in [0.0, 2.5, 100.0] {
                    for count in [1, 11, 500] {
                        let s = event_severity(event_type, confidence, duration, count);
                        assert!((0.0..=1.0).contains(&s));
                    }
                }
            }
        }
    }
}
