//! Evidence Record
//!
//! Accumulated per-frame findings: reason tags, named metrics, confidence and
//! per-detector explanations. Evidence only ever grows within a run; nothing
//! here removes a reason or a metric once recorded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::ConfidenceLevel;

// ============================================================================
// REASON TAGS
// ============================================================================

/// One independent piece of evidence against a frame.
///
/// Tags are held as an ordered set: insertion order is preserved for display,
/// but two evidence records with the same tags in a different order compare
/// equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReasonTag {
    OpticalFlowSpike,
    SsimDrasticDrop,
    SsimVeryLow,
    SceneChange,
    CompressionAnomaly,
    DuplicateOf(usize),
    AbsentFromBaseline,
}

impl ReasonTag {
    /// Presentation label. Joining labels into a single string is left to the
    /// report renderer.
    pub fn label(&self) -> String {
        match self {
            ReasonTag::OpticalFlowSpike => "optical flow spike".to_string(),
            ReasonTag::SsimDrasticDrop => "SSIM drastic drop".to_string(),
            ReasonTag::SsimVeryLow => "SSIM very low".to_string(),
            ReasonTag::SceneChange => "scene change (clustering)".to_string(),
            ReasonTag::CompressionAnomaly => "compression anomaly (ELA)".to_string(),
            ReasonTag::DuplicateOf(src) => format!("duplicate of frame {src}"),
            ReasonTag::AbsentFromBaseline => "absent from baseline".to_string(),
        }
    }

    /// The detection methods this tag testifies for. Baseline absence is a
    /// presence/absence fact and maps to none of them.
    pub fn methods(&self) -> &'static [EvidenceMethod] {
        match self {
            ReasonTag::SsimDrasticDrop | ReasonTag::SsimVeryLow => &[EvidenceMethod::Ssim],
            ReasonTag::OpticalFlowSpike => &[EvidenceMethod::OpticalFlow],
            ReasonTag::SceneChange => &[EvidenceMethod::Kmeans],
            ReasonTag::CompressionAnomaly => &[EvidenceMethod::Ela],
            ReasonTag::DuplicateOf(_) => &[EvidenceMethod::Sift],
            ReasonTag::AbsentFromBaseline => &[],
        }
    }
}

/// The fixed method set the FERM evidence-strength dimension tabulates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EvidenceMethod {
    Ssim,
    OpticalFlow,
    Kmeans,
    Ela,
    Sift,
}

// ============================================================================
// METRICS
// ============================================================================

/// A named measurement attached to a frame's evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            MetricValue::Text(_) => None,
        }
    }
}

/// Well-known metric keys written by the detection passes.
pub mod metric_keys {
    pub const OPTICAL_FLOW_Z_SCORE: &str = "optical_flow_z_score";
    pub const SSIM_DROP: &str = "ssim_drop";
    pub const SSIM_ABSOLUTE_LOW: &str = "ssim_absolute_low";
    pub const COLOR_CLUSTER_JUMP: &str = "color_cluster_jump";
    pub const SOURCE_FRAME: &str = "source_frame";
    pub const SSIM_TO_SOURCE: &str = "ssim_to_source";
    pub const SIFT_INLIERS: &str = "sift_inliers";
    pub const SIFT_GOOD_MATCHES: &str = "sift_good_matches";
    pub const SIFT_INLIER_RATIO: &str = "sift_inlier_ratio";
    pub const ELA_MAX_DIFFERENCE: &str = "ela_max_difference";
    pub const ELA_SUSPICIOUS_REGIONS: &str = "ela_suspicious_regions";
}

// ============================================================================
// EXPLANATIONS
// ============================================================================

/// Which detector wrote an explanation. One explanation per detector; within
/// an event the later writer wins on merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectorKind {
    OpticalFlow,
    SsimDrop,
    SsimLow,
    SceneChange,
    Duplication,
    Ela,
}

/// Coarse severity label attached to an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLabel {
    Medium,
    High,
}

/// Human-readable account of one detection, in both a technical and a
/// plain-language register, with the supporting numbers alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub detector: DetectorKind,
    pub frame_index: usize,
    pub timestamp: f64,
    pub severity: Option<SeverityLabel>,
    pub technical: String,
    pub plain: String,
    /// Supporting context values (thresholds, baselines, coordinates).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, MetricValue>,
}

// ============================================================================
// EVIDENCE
// ============================================================================

/// Everything the passes have recorded against one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    reasons: Vec<ReasonTag>,
    pub metrics: BTreeMap<String, MetricValue>,
    pub confidence: ConfidenceLevel,
    pub explanations: BTreeMap<DetectorKind, Explanation>,
}

impl Evidence {
    /// Append a reason if not already present. Insertion order is kept.
    pub fn add_reason(&mut self, tag: ReasonTag) {
        if !self.reasons.contains(&tag) {
            self.reasons.push(tag);
        }
    }

    pub fn reasons(&self) -> &[ReasonTag] {
        &self.reasons
    }

    pub fn reason_count(&self) -> usize {
        self.reasons.len()
    }

    pub fn has_reason(&self, tag: ReasonTag) -> bool {
        self.reasons.contains(&tag)
    }

    pub fn has_compression_anomaly(&self) -> bool {
        self.has_reason(ReasonTag::CompressionAnomaly)
    }

    pub fn record_metric(&mut self, key: &str, value: MetricValue) {
        self.metrics.insert(key.to_string(), value);
    }

    pub fn numeric_metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(MetricValue::as_number)
    }

    pub fn set_explanation(&mut self, explanation: Explanation) {
        self.explanations.insert(explanation.detector, explanation);
    }

    /// The distinct detection methods the recorded reasons testify for.
    pub fn methods(&self) -> Vec<EvidenceMethod> {
        let mut methods: Vec<EvidenceMethod> = Vec::new();
        for tag in &self.reasons {
            for m in tag.methods() {
                if !methods.contains(m) {
                    methods.push(*m);
                }
            }
        }
        methods.sort();
        methods
    }
}

impl PartialEq for Evidence {
    fn eq(&self, other: &Self) -> bool {
        // Reason order is display-only; compare tags as a set.
        let mut a = self.reasons.clone();
        let mut b = other.reasons.clone();
        a.sort();
        b.sort();
        a == b
            && self.metrics == other.metrics
            && self.confidence == other.confidence
            && self.explanations == other.explanations
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_unique_and_ordered() {
        let mut ev = Evidence::default();
        ev.add_reason(ReasonTag::SsimDrasticDrop);
        ev.add_reason(ReasonTag::OpticalFlowSpike);
        ev.add_reason(ReasonTag::SsimDrasticDrop);
        assert_eq!(
            ev.reasons(),
            &[ReasonTag::SsimDrasticDrop, ReasonTag::OpticalFlowSpike]
        );
    }

    #[test]
    fn equality_ignores_reason_order() {
        let mut a = Evidence::default();
        a.add_reason(ReasonTag::SsimDrasticDrop);
        a.add_reason(ReasonTag::OpticalFlowSpike);

        let mut b = Evidence::default();
        b.add_reason(ReasonTag::OpticalFlowSpike);
        b.add_reason(ReasonTag::SsimDrasticDrop);

        assert_eq!(a, b);
    }

    #[test]
    fn methods_deduplicate_across_tags() {
        let mut ev = Evidence::default();
        ev.add_reason(ReasonTag::SsimDrasticDrop);
        ev.add_reason(ReasonTag::SsimVeryLow);
        ev.add_reason(ReasonTag::SceneChange);
        assert_eq!(ev.methods(), vec![EvidenceMethod::Ssim, EvidenceMethod::Kmeans]);
    }

    #[test]
    fn baseline_absence_maps_to_no_method() {
        let mut ev = Evidence::default();
        ev.add_reason(ReasonTag::AbsentFromBaseline);
        assert!(ev.methods().is_empty());
    }
}
