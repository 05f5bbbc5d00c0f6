//! Error handling
//!
//! Two failure families exist in this core. Configuration problems are
//! rejected up front, before any frame is touched. Collaborator problems are
//! scoped to a single pass: the affected candidate or frame is skipped and the
//! failure is recorded, never silently swallowed and never fatal to the batch.

use thiserror::Error;

pub type AnalysisResult<T> = Result<T, ConfigError>;

/// Setup-time rejection of an invalid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NonPositiveThreshold(&'static str),

    #[error("{0} must be nonzero")]
    ZeroCount(&'static str),
}

/// Failure reported by an external collaborator for one frame or frame pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    /// The collaborator returned nothing for the request.
    #[error("no data for {0}")]
    NoData(String),

    /// The collaborator ran but reported a failure (e.g. insufficient
    /// keypoints, unreadable image).
    #[error("{0}")]
    Failed(String),
}
