//! Frame Module - Feature Stream Data Model
//!
//! The `Frame`/`Evidence` pair every pass reads and annotates, plus the
//! classification and confidence enums they resolve into.

pub mod evidence;
pub mod types;

pub use evidence::{
    metric_keys, DetectorKind, Evidence, EvidenceMethod, Explanation, MetricValue, ReasonTag,
    SeverityLabel,
};
pub use types::{ConfidenceLevel, Frame, FrameClass, ImageHandle, VideoMetadata};
