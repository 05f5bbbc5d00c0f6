//! Regional Compression Analyzer
//!
//! Third evidence pass. Partitions the externally-supplied ELA difference map
//! into fixed-size grid cells and scores each one. Uniform global compression
//! noise is expected; spatially concentrated high-error cells correlate with
//! localized edits, so only cells over the thresholds count.

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::bridge::DifferenceAnalyzer;
use crate::classify::provisional_tier;
use crate::config::AnalysisConfig;
use crate::frame::{
    metric_keys, ConfidenceLevel, DetectorKind, Explanation, Frame, FrameClass, MetricValue,
    ReasonTag, SeverityLabel,
};

// ============================================================================
// REGIONAL ANALYSIS
// ============================================================================

/// One suspicious grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub mean: f32,
    pub std: f32,
    pub max: f32,
    pub level: SeverityLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalAnalysis {
    pub total_regions: usize,
    pub suspicious: Vec<RegionReport>,
    pub grid_size: usize,
}

impl RegionalAnalysis {
    pub fn suspicious_count(&self) -> usize {
        self.suspicious.len()
    }

    /// The cell with the highest mean error, if any cell is suspicious.
    pub fn strongest(&self) -> Option<&RegionReport> {
        self.suspicious.iter().max_by(|a, b| {
            a.mean
                .partial_cmp(&b.mean)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Score every grid cell of a difference map.
pub fn analyze_regions(map: &Array2<f32>, config: &AnalysisConfig) -> RegionalAnalysis {
    let (height, width) = map.dim();
    let grid = config.ela_grid_size;
    let mut suspicious = Vec::new();

    let mut y = 0;
    while y < height {
        let y_end = (y + grid).min(height);
        let mut x = 0;
        while x < width {
            let x_end = (x + grid).min(width);
            let cell = map.slice(s![y..y_end, x..x_end]);
            let mean = cell.mean().unwrap_or(0.0);
            let std = cell.std(0.0);
            let max = cell.iter().copied().fold(0.0f32, f32::max);

            if mean > config.ela_cell_mean || max > config.ela_cell_max {
                suspicious.push(RegionReport {
                    x,
                    y,
                    width: x_end - x,
                    height: y_end - y,
                    mean,
                    std,
                    max,
                    level: if mean > config.ela_cell_high_mean {
                        SeverityLabel::High
                    } else {
                        SeverityLabel::Medium
                    },
                });
            }
            x += grid;
        }
        y += grid;
    }

    RegionalAnalysis {
        // Partial edge cells count too.
        total_regions: height.div_ceil(grid) * width.div_ceil(grid),
        suspicious,
        grid_size: grid,
    }
}

// ============================================================================
// PASS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub frames_examined: usize,
    pub frames_flagged: usize,
    pub collaborator_failures: usize,
}

/// Runs only where earlier passes already produced enough evidence: at least
/// one reason and a provisional tier of MEDIUM or better, and never on frames
/// already resolved as duplication or insertion.
pub fn run(
    frames: &mut [Frame],
    differ: &dyn DifferenceAnalyzer,
    config: &AnalysisConfig,
) -> CompressionReport {
    let mut report = CompressionReport::default();

    for frame in frames.iter_mut() {
        if matches!(frame.class, FrameClass::Duplication | FrameClass::Insertion) {
            continue;
        }
        if frame.evidence.reason_count() == 0
            || provisional_tier(frame.evidence.reason_count()) < ConfidenceLevel::Medium
        {
            continue;
        }
        report.frames_examined += 1;

        let map = match differ.difference_map(&frame.image) {
            Ok(m) => m,
            Err(err) => {
                log::warn!(
                    "ELA unavailable for frame {} ({err}); compression check skipped",
                    frame.index
                );
                report.collaborator_failures += 1;
                continue;
            }
        };

        let regions = analyze_regions(&map.values, config);
        if regions.suspicious_count() == 0 {
            continue;
        }

        frame.evidence.add_reason(ReasonTag::CompressionAnomaly);
        frame.evidence.record_metric(
            metric_keys::ELA_MAX_DIFFERENCE,
            MetricValue::Number(map.max_difference as f64),
        );
        frame.evidence.record_metric(
            metric_keys::ELA_SUSPICIOUS_REGIONS,
            MetricValue::Number(regions.suspicious_count() as f64),
        );

        let mut explanation = Explanation {
            detector: DetectorKind::Ela,
            frame_index: frame.index,
            timestamp: frame.timestamp,
            severity: Some(if map.max_difference > config.ela_cell_max {
                SeverityLabel::High
            } else {
                SeverityLabel::Medium
            }),
            technical: format!(
                "{} of {} grid cells show concentrated recompression error \
                 (max difference {}).",
                regions.suspicious_count(),
                regions.total_regions,
                map.max_difference
            ),
            plain: "Parts of this frame carry editing fingerprints: small areas respond to \
                    recompression differently from the rest of the image."
                .to_string(),
            context: Default::default(),
        };
        explanation.context.insert(
            "suspicious_region_count".into(),
            MetricValue::Number(regions.suspicious_count() as f64),
        );
        if let Some(strongest) = regions.strongest() {
            explanation.context.insert(
                "strongest_cell".into(),
                MetricValue::Text(format!(
                    "{}x{} cell at ({}, {}), mean {:.1}, max {:.1}",
                    strongest.width, strongest.height, strongest.x, strongest.y, strongest.mean,
                    strongest.max
                )),
            );
        }
        frame.evidence.set_explanation(explanation);

        report.frames_flagged += 1;
    }

    report
}

// ============================================================================
// TESTS
// ============================================================================
