//! Collaborator Bridge
//!
//! Trait seams to the image-level collaborators this core depends on but does
//! not implement: pairwise structural similarity, SIFT/RANSAC geometric
//! matching and ELA difference-map generation. Implementations live with the
//! extraction layer; the core only sees their measurements.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::frame::ImageHandle;

// ============================================================================
// GEOMETRIC MATCHING
// ============================================================================

/// Outcome of a successful keypoint match between two frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometricMatch {
    pub keypoints_source: usize,
    pub keypoints_candidate: usize,
    pub good_matches: usize,
    /// Matches surviving the RANSAC homography fit.
    pub inliers: usize,
    pub inlier_ratio: f64,
}

/// SIFT/RANSAC collaborator. A returned error means the candidate stays
/// unconfirmed; it is never treated as positive evidence.
pub trait GeometricMatcher {
    fn compare(
        &self,
        source: &ImageHandle,
        candidate: &ImageHandle,
    ) -> Result<GeometricMatch, CollaboratorError>;
}

// ============================================================================
// DIFFERENCE MAPS
// ============================================================================

/// Externally-computed ELA difference data for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceMap {
    /// Per-pixel recompression error, row-major.
    pub values: Array2<f32>,
    pub max_difference: f32,
}

/// ELA collaborator: resaves the frame at a known quality and returns the
/// per-pixel difference against the original.
pub trait DifferenceAnalyzer {
    fn difference_map(&self, image: &ImageHandle) -> Result<DifferenceMap, CollaboratorError>;
}

// ============================================================================
// STRUCTURAL SIMILARITY
// ============================================================================

/// Pairwise SSIM on the full-resolution originals, used to confirm duplicate
/// candidates (the per-frame `ssim_to_prev` stream is computed upstream on
/// normalized frames and is not suitable for that).
pub trait StructuralComparer {
    fn ssim(&self, a: &ImageHandle, b: &ImageHandle) -> Result<f64, CollaboratorError>;
}
