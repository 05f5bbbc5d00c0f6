//! Event Module - Tampering Event Localization
//!
//! Turns the classified frame sequence into contiguous tampering events with
//! severity scores and per-metric aggregates.

pub mod localizer;
pub mod severity;
pub mod types;

pub use localizer::{localize, summarize};
pub use severity::event_severity;
pub use types::{AnomalyEvent, EventSummary, MetricAggregate};
