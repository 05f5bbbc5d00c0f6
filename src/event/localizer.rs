//! Event Localizer
//!
//! Single forward scan over the classified frames with at most one open
//! event. A frame extends the open event only when its type matches and its
//! index is exactly end + 1; any gap or type change closes the event and a
//! new anomalous frame opens a fresh one.

use std::collections::BTreeMap;

use crate::detect::stats;
use crate::frame::{ConfidenceLevel, DetectorKind, Explanation, Frame, FrameClass, ReasonTag};

use super::severity::event_severity;
use super::types::{AnomalyEvent, EventSummary, MetricAggregate};

// ============================================================================
// LOCALIZATION
// ============================================================================

struct OpenEvent {
    event_type: FrameClass,
    start_frame: usize,
    end_frame: usize,
    start_ts: f64,
    end_ts: f64,
    frame_count: usize,
    confidence: ConfidenceLevel,
    reasons: Vec<ReasonTag>,
    explanations: BTreeMap<DetectorKind, Explanation>,
    metric_series: BTreeMap<String, Vec<f64>>,
}

impl OpenEvent {
    fn start(frame: &Frame) -> Self {
        let mut event = OpenEvent {
            event_type: frame.class,
            start_frame: frame.index,
            end_frame: frame.index,
            start_ts: frame.timestamp,
            end_ts: frame.timestamp,
            frame_count: 1,
            confidence: frame.evidence.confidence,
            reasons: Vec::new(),
            explanations: BTreeMap::new(),
            metric_series: BTreeMap::new(),
        };
        event.absorb(frame);
        event
    }

    fn extend(&mut self, frame: &Frame) {
        self.end_frame = frame.index;
        self.end_ts = frame.timestamp;
        self.frame_count += 1;
        self.confidence = self.confidence.max(frame.evidence.confidence);
        self.absorb(frame);
    }

    fn absorb(&mut self, frame: &Frame) {
        for tag in frame.evidence.reasons() {
            if !self.reasons.contains(tag) {
                self.reasons.push(*tag);
            }
        }
        // Later writers win per detector key.
        for (kind, explanation) in &frame.evidence.explanations {
            self.explanations.insert(*kind, explanation.clone());
        }
        for (key, value) in &frame.evidence.metrics {
            if let Some(v) = value.as_number() {
                self.metric_series.entry(key.clone()).or_default().push(v);
            }
        }
    }

    fn close(self) -> AnomalyEvent {
        let duration = self.end_ts - self.start_ts;
        let aggregated_metrics = self
            .metric_series
            .into_iter()
            .map(|(key, values)| {
                let aggregate = MetricAggregate {
                    mean: stats::mean(&values),
                    min: values.iter().copied().fold(f64::INFINITY, f64::min),
                    max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    std: stats::std_dev(&values),
                };
                (key, aggregate)
            })
            .collect();

        AnomalyEvent {
            event_type: self.event_type,
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            start_ts: self.start_ts,
            end_ts: self.end_ts,
            frame_count: self.frame_count,
            confidence: self.confidence,
            duration,
            severity_score: event_severity(
                self.event_type,
                self.confidence,
                duration,
                self.frame_count,
            ),
            reasons: self.reasons,
            explanations: self.explanations,
            aggregated_metrics,
        }
    }
}

/// Merge contiguous same-type anomalous frames into tampering events.
pub fn localize(frames: &[Frame]) -> Vec<AnomalyEvent> {
    let mut events = Vec::new();
    let mut open: Option<OpenEvent> = None;

    for frame in frames {
        if frame.is_anomaly() {
            match open.as_mut() {
                Some(event)
                    if event.event_type == frame.class && frame.index == event.end_frame + 1 =>
                {
                    event.extend(frame);
                }
                _ => {
                    if let Some(event) = open.take() {
                        events.push(event.close());
                    }
                    open = Some(OpenEvent::start(frame));
                }
            }
        } else if let Some(event) = open.take() {
            events.push(event.close());
        }
    }
    if let Some(event) = open {
        events.push(event.close());
    }

    log::info!("localized {} tampering event(s)", events.len());
    events
}

// ============================================================================
// SUMMARY
// ============================================================================

pub fn summarize(events: &[AnomalyEvent]) -> EventSummary {
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        *by_type.entry(event.event_type.short_name().to_string()).or_default() += 1;
    }
    let durations: Vec<f64> = events.iter().map(|e| e.duration).collect();

    EventSummary {
        total_events: events.len(),
        events_by_type: by_type,
        total_anomalous_frames: events.iter().map(|e| e.frame_count).sum(),
        average_event_duration: stats::mean(&durations),
        max_event_duration: durations.iter().copied().fold(0.0, f64::max),
        high_severity_events: events.iter().filter(|e| e.severity_score > 0.7).count(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{metric_keys, ImageHandle, MetricValue};

    fn anomalous_frame(index: usize, class: FrameClass, confidence: ConfidenceLevel) -> Frame {
        let mut f = Frame::new(index, index as f64 * 0.5, ImageHandle::new(format!("i{index}")));
        f.class = class;
        f.evidence.confidence = confidence;
        f.evidence.add_reason(ReasonTag::SsimDrasticDrop);
        f
    }

    fn original_frame(index: usize) -> Frame {
        Frame::new(index, index as f64 * 0.5, ImageHandle::new(format!("i{index}")))
    }

    #[test]
    fn contiguous_same_type_frames_form_one_event() {
        // Frames 7, 8 contiguous; frame 10 separated by an original frame 9.
        let frames = vec![
            original_frame(6),
            anomalous_frame(7, FrameClass::Discontinuity, ConfidenceLevel::Low),
            anomalous_frame(8, FrameClass::Discontinuity, ConfidenceLevel::High),
            original_frame(9),
            anomalous_frame(10, FrameClass::Discontinuity, ConfidenceLevel::Low),
        ];

        let events = localize(&frames);
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].start_frame, events[0].end_frame), (7, 8));
        assert_eq!(events[0].frame_count, 2);
        assert_eq!(events[0].confidence, ConfidenceLevel::High);
        assert_eq!((events[1].start_frame, events[1].end_frame), (10, 10));
    }

    #[test]
    fn type_change_closes_the_open_event() {
        let frames = vec![
            anomalous_frame(3, FrameClass::Discontinuity, ConfidenceLevel::Medium),
            anomalous_frame(4, FrameClass::Duplication, ConfidenceLevel::VeryHigh),
        ];
        let events = localize(&frames);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, FrameClass::Discontinuity);
        assert_eq!(events[1].event_type, FrameClass::Duplication);
    }

    #[test]
    fn index_gap_closes_even_with_matching_type() {
        // 5 and 7 share a type but are not contiguous.
        let frames = vec![
            anomalous_frame(5, FrameClass::Discontinuity, ConfidenceLevel::Low),
            anomalous_frame(7, FrameClass::Discontinuity, ConfidenceLevel::Low),
        ];
        let events = localize(&frames);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn events_never_mix_types_and_stay_contiguous() {
        let frames = vec![
            anomalous_frame(0, FrameClass::Insertion, ConfidenceLevel::VeryHigh),
            anomalous_frame(1, FrameClass::Insertion, ConfidenceLevel::VeryHigh),
            anomalous_frame(2, FrameClass::Discontinuity, ConfidenceLevel::Low),
            original_frame(3),
            anomalous_frame(4, FrameClass::Insertion, ConfidenceLevel::VeryHigh),
        ];
        let events = localize(&frames);
        for event in &events {
            assert_eq!(event.frame_count, event.end_frame - event.start_frame + 1);
        }
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn metric_aggregates_cover_only_reporting_members() {
        let mut a = anomalous_frame(0, FrameClass::Discontinuity, ConfidenceLevel::Medium);
        a.evidence
            .record_metric(metric_keys::SSIM_DROP, MetricValue::Number(0.4));
        let mut b = anomalous_frame(1, FrameClass::Discontinuity, ConfidenceLevel::Medium);
        b.evidence
            .record_metric(metric_keys::SSIM_DROP, MetricValue::Number(0.6));
        // c never reported ssim_drop; it must not dilute the aggregate.
        let c = anomalous_frame(2, FrameClass::Discontinuity, ConfidenceLevel::Medium);

        let events = localize(&[a, b, c]);
        assert_eq!(events.len(), 1);
        let agg = &events[0].aggregated_metrics[metric_keys::SSIM_DROP];
        assert!((agg.mean - 0.5).abs() < 1e-9);
        assert!((agg.min - 0.4).abs() < 1e-9);
        assert!((agg.max - 0.6).abs() < 1e-9);
        assert!((agg.std - 0.1).abs() < 1e-9);
    }

    #[test]
    fn explanations_merge_with_last_writer_winning() {
        let mut a = anomalous_frame(0, FrameClass::Discontinuity, ConfidenceLevel::Medium);
        a.evidence.set_explanation(Explanation {
            detector: DetectorKind::SsimDrop,
            frame_index: 0,
            timestamp: 0.0,
            severity: None,
            technical: "first".into(),
            plain: "first".into(),
            context: Default::default(),
        });
        let mut b = anomalous_frame(1, FrameClass::Discontinuity, ConfidenceLevel::Medium);
        b.evidence.set_explanation(Explanation {
            detector: DetectorKind::SsimDrop,
            frame_index: 1,
            timestamp: 0.5,
            severity: None,
            technical: "second".into(),
            plain: "second".into(),
            context: Default::default(),
        });

        let events = localize(&[a, b]);
        assert_eq!(events[0].explanations[&DetectorKind::SsimDrop].technical, "second");
    }

    #[test]
    fn summary_rolls_up_durations_and_severity() {
        let frames = vec![
            anomalous_frame(0, FrameClass::Insertion, ConfidenceLevel::VeryHigh),
            anomalous_frame(1, FrameClass::Insertion, ConfidenceLevel::VeryHigh),
            original_frame(2),
            anomalous_frame(3, FrameClass::Discontinuity, ConfidenceLevel::Low),
        ];
        let events = localize(&frames);
        let summary = summarize(&events);
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.total_anomalous_frames, 3);
        assert_eq!(summary.events_by_type["insertion"], 1);
        assert_eq!(summary.events_by_type["discontinuity"], 1);
        assert_eq!(summary.high_severity_events, 1);
    }
}
