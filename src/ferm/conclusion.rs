//! Conclusion Dimension
//!
//! One structured finding per anomaly type present, five independently-scored
//! reliability factors, the verdict from the positive/negative tally and the
//! recommended-action checklist.

use std::collections::BTreeMap;

use crate::frame::{ConfidenceLevel, Frame, FrameClass};

use super::types::{
    AnomalyCharacterization, CausalityAnalysis, Conclusion, DescriptiveConfidence,
    DistributionPattern, EvidenceStrength, Finding, Impact, Likelihood, ReliabilityFactor,
    ReliabilityVerdict,
};

fn tier_weight(level: ConfidenceLevel) -> f64 {
    match level {
        ConfidenceLevel::VeryHigh => 4.0,
        ConfidenceLevel::High => 3.0,
        ConfidenceLevel::Medium => 2.0,
        ConfidenceLevel::Low => 1.0,
        ConfidenceLevel::None => 0.0,
    }
}

/// Tier-weighted mean over the anomalous frames; 0 with no anomalies.
fn average_confidence(distribution: &BTreeMap<ConfidenceLevel, usize>) -> f64 {
    let total: usize = distribution.values().sum();
    if total == 0 {
        return 0.0;
    }
    distribution
        .iter()
        .map(|(level, count)| tier_weight(*level) * *count as f64)
        .sum::<f64>()
        / total as f64
}

fn descriptive_confidence(average: f64) -> DescriptiveConfidence {
    if average > 3.0 {
        DescriptiveConfidence::High
    } else if average > 2.0 {
        DescriptiveConfidence::Medium
    } else {
        DescriptiveConfidence::Low
    }
}

pub fn build(
    frames: &[Frame],
    strength: &EvidenceStrength,
    characterization: &AnomalyCharacterization,
    causality: &CausalityAnalysis,
) -> Conclusion {
    let average = average_confidence(&strength.confidence_distribution);
    let primary_findings = primary_findings(frames, average);
    let reliability_factors = reliability_factors(strength, characterization, causality);

    let positive = reliability_factors
        .iter()
        .filter(|f| f.impact == Impact::Positive)
        .count();
    let negative = reliability_factors
        .iter()
        .filter(|f| f.impact == Impact::Negative)
        .count();

    let reliability = if positive >= 3 && negative <= 1 {
        ReliabilityVerdict::High
    } else if positive >= 2 && negative <= 2 {
        ReliabilityVerdict::Medium
    } else if positive >= negative {
        ReliabilityVerdict::Limited
    } else {
        ReliabilityVerdict::Low
    };

    let recommended_actions = recommended_actions(
        &primary_findings,
        strength,
        causality,
        reliability,
        frames,
    );

    Conclusion {
        primary_findings,
        reliability_factors,
        reliability,
        reliability_statement: reliability.statement().to_string(),
        recommended_actions,
    }
}

// ============================================================================
// FINDINGS
// ============================================================================

fn primary_findings(frames: &[Frame], average_confidence: f64) -> Vec<Finding> {
    let mut findings = Vec::new();
    let confidence = descriptive_confidence(average_confidence);

    let duplication_count = frames
        .iter()
        .filter(|f| f.class == FrameClass::Duplication)
        .count();
    if duplication_count > 0 {
        findings.push(Finding {
            anomaly_type: FrameClass::Duplication,
            finding: format!("Detected {duplication_count} duplicated frame(s)"),
            count: duplication_count,
            confidence,
            evidence: "Hash matches, SIFT confirmation, high SSIM scores".to_string(),
            interpretation: "Suggests possible manipulation to extend duration or mask removed \
                             content"
                .to_string(),
        });
    }

    let discontinuity_count = frames
        .iter()
        .filter(|f| f.class == FrameClass::Discontinuity)
        .count();
    if discontinuity_count > 0 {
        findings.push(Finding {
            anomaly_type: FrameClass::Discontinuity,
            finding: format!("Detected {discontinuity_count} frame(s) with temporal discontinuities"),
            count: discontinuity_count,
            confidence,
            evidence: "SSIM drops, optical-flow spikes, color-cluster changes".to_string(),
            interpretation: "Suggests possible deletion, insertion, or rough editing".to_string(),
        });
    }

    let insertion_count = frames
        .iter()
        .filter(|f| f.class == FrameClass::Insertion)
        .count();
    if insertion_count > 0 {
        findings.push(Finding {
            anomaly_type: FrameClass::Insertion,
            finding: format!("Detected {insertion_count} potentially inserted frame(s)"),
            count: insertion_count,
            confidence,
            evidence: "Absent from baseline, ELA anomalies, inconsistent features".to_string(),
            interpretation: "Indicates content that may have been added to the original video"
                .to_string(),
        });
    }

    findings
}

// ============================================================================
// RELIABILITY FACTORS
// ============================================================================

fn reliability_factors(
    strength: &EvidenceStrength,
    characterization: &AnomalyCharacterization,
    causality: &CausalityAnalysis,
) -> Vec<ReliabilityFactor> {
    let mut factors = Vec::new();

    let avg_methods = strength.multi_method_confirmation.average_methods_per_anomaly;
    factors.push(ReliabilityFactor {
        factor: "Multi-method confirmation".to_string(),
        assessment: format!("An average of {avg_methods:.1} methods confirm each anomaly"),
        impact: if avg_methods >= 2.0 {
            Impact::Positive
        } else {
            Impact::Negative
        },
    });

    let fp_risk = strength.false_positive_assessment.weighted_risk;
    factors.push(ReliabilityFactor {
        factor: "False-positive risk".to_string(),
        assessment: format!("Estimated false-positive risk of {:.1}%", fp_risk * 100.0),
        impact: if fp_risk < 0.2 {
            Impact::Positive
        } else if fp_risk < 0.4 {
            Impact::Neutral
        } else {
            Impact::Negative
        },
    });

    let pattern = characterization.temporal_distribution.pattern;
    factors.push(ReliabilityFactor {
        factor: "Temporal distribution".to_string(),
        assessment: format!("Anomalies show a {} distribution pattern", pattern.as_str()),
        impact: match pattern {
            DistributionPattern::Clustered => Impact::Positive,
            DistributionPattern::Systematic => Impact::Neutral,
            _ => Impact::Negative,
        },
    });

    let mean_severity = characterization.technical_severity.overall_mean;
    factors.push(ReliabilityFactor {
        factor: "Technical severity".to_string(),
        assessment: format!("Mean anomaly severity of {mean_severity:.2} on a 0-1 scale"),
        impact: if mean_severity > 0.7 {
            Impact::Positive
        } else if mean_severity > 0.4 {
            Impact::Neutral
        } else {
            Impact::Negative
        },
    });

    if let Some(alternative) = causality.alternative_explanations.most_likely_candidate() {
        factors.push(ReliabilityFactor {
            factor: "Alternative explanations".to_string(),
            assessment: format!(
                "{} is the most likely alternative at {} likelihood",
                alternative.kind.as_str(),
                alternative.likelihood.as_str()
            ),
            impact: match alternative.likelihood {
                Likelihood::High => Impact::Negative,
                Likelihood::MediumHigh => Impact::Neutral,
                _ => Impact::Positive,
            },
        });
    }

    factors
}

// ============================================================================
// RECOMMENDED ACTIONS
// ============================================================================

fn recommended_actions(
    findings: &[Finding],
    strength: &EvidenceStrength,
    causality: &CausalityAnalysis,
    reliability: ReliabilityVerdict,
    frames: &[Frame],
) -> Vec<String> {
    let mut actions = Vec::new();

    if !findings.is_empty() {
        actions.push(
            "Investigate the specific anomalous segments identified in this analysis".to_string(),
        );
    }

    if strength.false_positive_assessment.weighted_risk > 0.3 {
        actions.push(
            "Obtain higher-quality source material if possible to reduce compression artifacts"
                .to_string(),
        );
    }

    if matches!(reliability, ReliabilityVerdict::Limited | ReliabilityVerdict::Low) {
        actions.push(
            "Apply additional forensic methods beyond those used in this analysis".to_string(),
        );
    }

    if let Some(alternative) = causality.alternative_explanations.most_likely_candidate() {
        if alternative.likelihood >= Likelihood::MediumHigh {
            actions.push(format!(
                "Examine the original recording conditions to rule out {} as an explanation",
                alternative.kind.as_str()
            ));
        }
    }

    if frames.iter().any(|f| f.class == FrameClass::Duplication) {
        actions.push(
            "Compare duplicated segments with their surrounding context to determine the \
             purpose of the manipulation"
                .to_string(),
        );
    }

    actions
}

// ============================================================================
// TESTS
// ============================================================================
