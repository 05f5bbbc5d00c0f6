//! FERM Types
//!
//! The Forensic Evidence Reliability Matrix as explicit records, one per
//! dimension. The matrix is derived read-only from the final frame/event
//! collections; rebuilding it from unchanged inputs yields an identical value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::frame::{ConfidenceLevel, FrameClass};

// ============================================================================
// EVIDENCE STRENGTH
// ============================================================================

/// How many independent methods confirm each anomalous frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiMethodConfirmation {
    /// Histogram: distinct-method count -> number of frames.
    pub counts: BTreeMap<usize, usize>,
    pub average_methods_per_anomaly: f64,
    pub max_methods: usize,
    /// Share of tabulated frames confirmed by more than one method.
    pub multiple_method_share: f64,
}

/// A qualitative condition that raises false-positive risk. Reported, never
/// folded into the numeric risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub value: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsePositiveAssessment {
    pub weighted_risk: f64,
    /// 1 - weighted_risk.
    pub reliability_score: f64,
    pub risk_factors: Vec<RiskFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceStrength {
    pub multi_method_confirmation: MultiMethodConfirmation,
    pub confidence_distribution: BTreeMap<ConfidenceLevel, usize>,
    pub false_positive_assessment: FalsePositiveAssessment,
}

// ============================================================================
// ANOMALY CHARACTERIZATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionPattern {
    /// More clusters than 70% of the anomaly count: scattered singletons.
    Isolated,
    /// Several distinct clusters.
    Clustered,
    /// One cluster covering everything.
    Systematic,
    /// No anomalies at all.
    None,
}

impl DistributionPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionPattern::Isolated => "isolated",
            DistributionPattern::Clustered => "clustered",
            DistributionPattern::Systematic => "systematic",
            DistributionPattern::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalDistribution {
    pub total_anomalies: usize,
    /// Anomalous share of all analyzed frames.
    pub anomaly_density: f64,
    pub cluster_count: usize,
    pub average_cluster_size: f64,
    pub largest_cluster: usize,
    pub pattern: DistributionPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityBucket {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSeverity {
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSeverity {
    pub by_type: BTreeMap<String, TypeSeverity>,
    pub overall_mean: f64,
    pub high_severity_count: usize,
    pub distribution: BTreeMap<SeverityBucket, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticContext {
    /// Event counts per anomaly type.
    pub event_types: BTreeMap<String, usize>,
    /// Events whose severity score exceeds 0.7.
    pub significant_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCharacterization {
    pub temporal_distribution: TemporalDistribution,
    pub technical_severity: TechnicalSeverity,
    pub semantic_context: SemanticContext,
}

// ============================================================================
// CAUSALITY ANALYSIS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Probability {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseAssessment {
    pub anomaly_type: FrameClass,
    pub cause: String,
    pub technical_indicators: Vec<String>,
    pub probability: Probability,
    pub count: usize,
    /// Share of all frames carrying this anomaly type, percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElaPattern {
    /// ELA evidence on under 10% of frames; looks like ordinary compression.
    Consistent,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionVerdict {
    LikelyManipulation,
    PossibleManipulation,
    LikelyNormalCompression,
}

impl CompressionVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionVerdict::LikelyManipulation => "likely manipulation",
            CompressionVerdict::PossibleManipulation => "possible manipulation",
            CompressionVerdict::LikelyNormalCompression => "likely normal compression",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionAssessment {
    pub compression_info: String,
    pub ela_evidence_pattern: ElaPattern,
    pub ela_evidence_count: usize,
    pub assessment: CompressionVerdict,
}

/// Likelihood scale for alternative explanations, ordered by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Likelihood {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl Likelihood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::Low => "low",
            Likelihood::Medium => "medium",
            Likelihood::MediumHigh => "medium-high",
            Likelihood::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlternativeKind {
    CompressionArtifacts,
    SceneTransitions,
    CameraMovement,
    LightingChanges,
    RepeatedContent,
}

impl AlternativeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlternativeKind::CompressionArtifacts => "compression artifacts",
            AlternativeKind::SceneTransitions => "scene transitions",
            AlternativeKind::CameraMovement => "camera movement",
            AlternativeKind::LightingChanges => "lighting changes",
            AlternativeKind::RepeatedContent => "repeated content",
        }
    }
}

/// One candidate alternative explanation with its (possibly upgraded)
/// likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeCandidate {
    pub kind: AlternativeKind,
    pub explanation: String,
    pub affected_methods: Vec<String>,
    pub likelihood: Likelihood,
    pub distinguishing_factors: String,
    /// Whether the candidate is relevant for this video (upgraded by the data
    /// or at default Medium-plus likelihood).
    pub relevant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeExplanations {
    /// Catalogue order is fixed; ties on likelihood resolve to the earlier
    /// entry.
    pub candidates: Vec<AlternativeCandidate>,
    pub most_likely: Option<AlternativeKind>,
}

impl AlternativeExplanations {
    pub fn most_likely_candidate(&self) -> Option<&AlternativeCandidate> {
        let kind = self.most_likely?;
        self.candidates.iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalityAnalysis {
    pub technical_causes: Vec<CauseAssessment>,
    pub compression_vs_manipulation: CompressionAssessment,
    pub alternative_explanations: AlternativeExplanations,
}

// ============================================================================
// CONCLUSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptiveConfidence {
    Low,
    Medium,
    High,
}

impl DescriptiveConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptiveConfidence::Low => "low",
            DescriptiveConfidence::Medium => "medium",
            DescriptiveConfidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub anomaly_type: FrameClass,
    pub finding: String,
    pub count: usize,
    pub confidence: DescriptiveConfidence,
    pub evidence: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityFactor {
    pub factor: String,
    pub assessment: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReliabilityVerdict {
    High,
    Medium,
    Limited,
    Low,
}

impl ReliabilityVerdict {
    pub fn statement(&self) -> &'static str {
        match self {
            ReliabilityVerdict::High => {
                "High reliability: the evidence strongly supports video manipulation"
            }
            ReliabilityVerdict::Medium => {
                "Medium reliability: the evidence points to likely video manipulation"
            }
            ReliabilityVerdict::Limited => {
                "Limited reliability: the evidence suggests possible video manipulation"
            }
            ReliabilityVerdict::Low => {
                "Low reliability: the evidence is inconclusive or vulnerable to \
                 alternative explanations"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub primary_findings: Vec<Finding>,
    pub reliability_factors: Vec<ReliabilityFactor>,
    pub reliability: ReliabilityVerdict,
    pub reliability_statement: String,
    pub recommended_actions: Vec<String>,
}

// ============================================================================
// MATRIX
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ferm {
    pub evidence_strength: EvidenceStrength,
    pub anomaly_characterization: AnomalyCharacterization,
    pub causality_analysis: CausalityAnalysis,
    pub conclusion: Conclusion,
}
