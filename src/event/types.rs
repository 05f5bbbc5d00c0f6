//! Tampering Event Types
//!
//! A tampering event is one contiguous run of same-type anomalous frames,
//! treated as a single forensic finding. Events are immutable once the
//! localization pass has produced them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::frame::{ConfidenceLevel, DetectorKind, Explanation, FrameClass, ReasonTag};

/// Summary statistics for one metric across the member frames that reported
/// it. Members without the metric do not contribute (no imputation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    #[serde(rename = "event")]
    pub event_type: FrameClass,
    pub start_frame: usize,
    pub end_frame: usize,
    pub start_ts: f64,
    pub end_ts: f64,
    pub frame_count: usize,
    /// Highest tier among the member frames.
    pub confidence: ConfidenceLevel,
    /// Seconds between first and last member.
    pub duration: f64,
    pub severity_score: f64,
    /// Union of member reasons in first-appearance order.
    pub reasons: Vec<ReasonTag>,
    /// Merged per-detector explanations; the last member to write a detector
    /// key wins.
    pub explanations: BTreeMap<DetectorKind, Explanation>,
    pub aggregated_metrics: BTreeMap<String, MetricAggregate>,
}

/// Roll-up over the whole event list for the report envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub total_anomalous_frames: usize,
    pub average_event_duration: f64,
    pub max_event_duration: f64,
    /// Events scoring above 0.7.
    pub high_severity_events: usize,
}
