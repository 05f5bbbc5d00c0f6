//! Video Forensics - Analysis Core
//!
//! Ingests a per-frame feature stream (identity hash, SSIM-to-previous,
//! optical-flow magnitude, color-cluster id) extracted from a video and
//! produces per-frame anomaly classifications with evidence, temporally
//! merged tampering events, and the Forensic Evidence Reliability Matrix
//! (FERM) with a final reliability verdict.
//!
//! ## Architecture
//! - `frame/` - the feature-stream data model (Frame, Evidence, tiers)
//! - `bridge` - trait seams to the image-level collaborators (SSIM, SIFT, ELA)
//! - `detect/` - the evidence passes: temporal, duplication, compression,
//!   baseline
//! - `classify` - final per-frame type and confidence resolution
//! - `event/` - contiguity-based tampering-event localization and severity
//! - `ferm/` - the four-dimension reliability matrix
//! - `pipeline` - the batch orchestrator tying it all together
//!
//! Decoding, hashing, plotting and report rendering are out of scope; this
//! crate turns measurements into structured, reproducible findings. It does
//! not decide legal validity.

pub mod bridge;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod event;
pub mod ferm;
pub mod frame;
pub mod pipeline;

pub use bridge::{
    DifferenceAnalyzer, DifferenceMap, GeometricMatch, GeometricMatcher, StructuralComparer,
};
pub use config::AnalysisConfig;
pub use error::{CollaboratorError, ConfigError};
pub use event::{AnomalyEvent, EventSummary};
pub use ferm::{Ferm, ReliabilityVerdict};
pub use frame::{ConfidenceLevel, Evidence, Frame, FrameClass, ImageHandle, VideoMetadata};
pub use pipeline::{AnalysisReport, AnalysisSummary, PassId, PassReport, VideoAnalyzer};
