//! Analysis Pipeline
//!
//! Runs the evidence passes in their fixed order over one frame batch, then
//! classification, localization and the FERM build. Configuration and the
//! collaborator seams are threaded through explicitly; there is no shared
//! state between runs.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bridge::{DifferenceAnalyzer, GeometricMatcher, StructuralComparer};
use crate::classify;
use crate::config::AnalysisConfig;
use crate::detect::{baseline, compression, duplication, temporal};
use crate::error::AnalysisResult;
use crate::event::{self, AnomalyEvent, EventSummary};
use crate::ferm::{self, Ferm};
use crate::frame::{Frame, VideoMetadata};

// ============================================================================
// PASS REPORTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassId {
    TemporalDiscontinuity,
    DuplicationCheck,
    CompressionAnalysis,
    BaselineComparison,
    Classification,
}

/// What one pass did, including anything it had to skip. Failures surface
/// here and in the log; they never abort the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass: PassId,
    pub completed: bool,
    pub frames_flagged: usize,
    pub notes: Vec<String>,
}

// ============================================================================
// REPORT ENVELOPE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_frames: usize,
    pub total_anomalies: usize,
    pub anomaly_percentage: f64,
    pub anomaly_density: f64,
    pub total_events: usize,
}

/// Everything one run produces. Plain data for the out-of-scope renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub config: AnalysisConfig,
    pub metadata: VideoMetadata,
    pub frames: Vec<Frame>,
    pub events: Vec<AnomalyEvent>,
    pub event_summary: EventSummary,
    pub ferm: Ferm,
    pub summary: AnalysisSummary,
    pub passes: Vec<PassReport>,
}

// ============================================================================
// ANALYZER
// ============================================================================

/// The analysis core. Holds the validated configuration and the collaborator
/// seams for one or more runs.
pub struct VideoAnalyzer<'a> {
    config: AnalysisConfig,
    comparer: &'a dyn StructuralComparer,
    matcher: &'a dyn GeometricMatcher,
    differ: &'a dyn DifferenceAnalyzer,
}

impl<'a> VideoAnalyzer<'a> {
    /// Validates the configuration before any frame is accepted.
    pub fn new(
        config: AnalysisConfig,
        comparer: &'a dyn StructuralComparer,
        matcher: &'a dyn GeometricMatcher,
        differ: &'a dyn DifferenceAnalyzer,
    ) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            comparer,
            matcher,
            differ,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full batch: evidence passes, classification, localization,
    /// FERM. The baseline hash set is optional; without it the insertion
    /// pass is skipped and reported as such.
    pub fn analyze(
        &self,
        mut frames: Vec<Frame>,
        metadata: VideoMetadata,
        baseline_hashes: Option<&HashSet<String>>,
    ) -> AnalysisReport {
        // Phase A may have run in parallel upstream; re-establish index order
        // before anything sequential happens.
        frames.sort_by_key(|f| f.index);
        normalize_first_frame(&mut frames);

        log::info!("analyzing {} frame(s)", frames.len());
        let mut passes = Vec::new();

        // Pass 1: temporal discontinuities.
        let temporal_report = temporal::run(&mut frames, &self.config);
        let mut notes = Vec::new();
        if temporal_report.flow_skipped {
            notes.push(
                "optical flow spike detection skipped: fewer than 2 qualifying samples"
                    .to_string(),
            );
        }
        if let Some(stats) = &temporal_report.flow_stats {
            notes.push(format!(
                "flow baseline: median {:.3}, MAD {:.3}, {} samples",
                stats.median, stats.mad, stats.samples
            ));
        }
        if temporal_report.scene_changes > 0 {
            let mean = temporal_report
                .mean_scene_duration
                .map(|d| format!(", mean scene duration {d:.2}s"))
                .unwrap_or_default();
            notes.push(format!(
                "{} scene change(s){mean}",
                temporal_report.scene_changes
            ));
        }
        passes.push(PassReport {
            pass: PassId::TemporalDiscontinuity,
            completed: true,
            frames_flagged: temporal_report.frames_flagged,
            notes,
        });

        // Pass 2: duplicate verification.
        let dup_report = duplication::run(&mut frames, self.comparer, self.matcher, &self.config);
        let mut notes = vec![format!(
            "{} candidate group(s), {} comparison(s)",
            dup_report.candidate_groups, dup_report.comparisons
        )];
        if dup_report.collaborator_failures > 0 {
            notes.push(format!(
                "{} comparison(s) dropped on collaborator failure",
                dup_report.collaborator_failures
            ));
        }
        passes.push(PassReport {
            pass: PassId::DuplicationCheck,
            completed: true,
            frames_flagged: dup_report.confirmed,
            notes,
        });

        // Pass 3: regional compression.
        let ela_report = compression::run(&mut frames, self.differ, &self.config);
        let mut notes = vec![format!("{} frame(s) examined", ela_report.frames_examined)];
        if ela_report.collaborator_failures > 0 {
            notes.push(format!(
                "{} frame(s) skipped on collaborator failure",
                ela_report.collaborator_failures
            ));
        }
        passes.push(PassReport {
            pass: PassId::CompressionAnalysis,
            completed: true,
            frames_flagged: ela_report.frames_flagged,
            notes,
        });

        // Pass 4: baseline comparison, when a baseline exists.
        match baseline_hashes {
            Some(hashes) => {
                let baseline_report = baseline::run(&mut frames, hashes);
                let mut notes = Vec::new();
                if baseline_report.missing_hash > 0 {
                    notes.push(format!(
                        "{} frame(s) without a hash skipped",
                        baseline_report.missing_hash
                    ));
                }
                passes.push(PassReport {
                    pass: PassId::BaselineComparison,
                    completed: true,
                    frames_flagged: baseline_report.flagged,
                    notes,
                });
            }
            None => {
                passes.push(PassReport {
                    pass: PassId::BaselineComparison,
                    completed: false,
                    frames_flagged: 0,
                    notes: vec!["no baseline supplied".to_string()],
                });
            }
        }

        // Resolve final classification and tiers.
        let classify_report = classify::run(&mut frames, &self.config);
        let mut notes = Vec::new();
        if classify_report.escalated > 0 {
            notes.push(format!(
                "{} frame(s) escalated one tier by concentrated ELA evidence",
                classify_report.escalated
            ));
        }
        passes.push(PassReport {
            pass: PassId::Classification,
            completed: true,
            frames_flagged: classify_report.anomalies,
            notes,
        });

        // Localize events and build the matrix.
        let events = event::localize(&frames);
        let event_summary = event::summarize(&events);
        let ferm = ferm::build(&frames, &events, &metadata);

        let total_anomalies = frames.iter().filter(|f| f.is_anomaly()).count();
        let summary = AnalysisSummary {
            total_frames: frames.len(),
            total_anomalies,
            anomaly_percentage: if frames.is_empty() {
                0.0
            } else {
                total_anomalies as f64 * 100.0 / frames.len() as f64
            },
            anomaly_density: if frames.is_empty() {
                0.0
            } else {
                total_anomalies as f64 / frames.len() as f64
            },
            total_events: events.len(),
        };
        log::info!(
            "{} of {} frame(s) anomalous ({:.1}%), {} event(s)",
            summary.total_anomalies,
            summary.total_frames,
            summary.anomaly_percentage,
            summary.total_events
        );

        AnalysisReport {
            generated_at: Utc::now(),
            config: self.config.clone(),
            metadata,
            frames,
            events,
            event_summary,
            ferm,
            summary,
            passes,
        }
    }
}

/// The first frame has no predecessor: SSIM defaults to 1.0 and flow to 0,
/// which the detectors treat as "cannot fire".
fn normalize_first_frame(frames: &mut [Frame]) {
    if let Some(first) = frames.first_mut() {
        if first.index == 0 {
            first.ssim_to_prev.get_or_insert(1.0);
            first.optical_flow_mag.get_or_insert(0.0);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
