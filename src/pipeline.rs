// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

//! Per-frame processing pipeline: detector, classifier, track lifecycle and
//! action dispatch wired together. One `process` call per captured frame;
//! the engine is strictly frame-driven and never overlaps frames.

use ndarray::ArrayView3;

use crate::config::EngineConfig;
use crate::dispatch::{ActionBus, ActionPublisher, ActionSubscriber};
use crate::error::{Error, Result};
use handwave_gesture::Gesture;
use handwave_tracker::{Associator, DetectionBox, HandTracker, MotionFilter, TrackOutput};

/// One hand detection in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Detection {
    /// corner-form box `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    /// detector confidence, higher implies more confidence
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: [f32; 4], score: f32) -> Self {
        Self { bbox, score }
    }
}

impl DetectionBox for Detection {
    fn bbox(&self) -> [f32; 4] {
        self.bbox
    }

    fn score(&self) -> f32 {
        self.score
    }
}

/// Hand detection inference: raw HWC frame in, scored boxes out.
pub trait HandDetector {
    fn detect(&mut self, frame: &ArrayView3<u8>) -> Result<Vec<Detection>>;
}

/// Gesture classification inference: one label per provided box.
pub trait GestureClassifier {
    fn classify(&mut self, frame: &ArrayView3<u8>, boxes: &[[f32; 4]]) -> Result<Vec<Gesture>>;
}

/// The full engine: detector and classifier feed the lifecycle manager, and
/// recognized actions are published on the dispatch bus.
///
/// The track working set is owned exclusively by the pipeline's tracker;
/// renderers and command sinks consume the returned [`TrackOutput`]s and the
/// [`ActionSubscriber`] handed out at construction.
pub struct Pipeline<D, C, M, A> {
    detector: D,
    classifier: C,
    tracker: HandTracker<M, A>,
    publisher: ActionPublisher,
}

impl<D, C, M, A> Pipeline<D, C, M, A>
where
    D: HandDetector,
    C: GestureClassifier,
    M: MotionFilter,
    A: Associator,
{
    /// Assembles a pipeline and returns it along with the subscriber side of
    /// its action bus.
    pub fn new(
        detector: D,
        classifier: C,
        associator: A,
        config: &EngineConfig,
    ) -> (Self, ActionSubscriber) {
        let (publisher, subscriber) = ActionBus::with_capacity(config.channel_capacity).split();
        let pipeline = Self {
            detector,
            classifier,
            tracker: HandTracker::new(config.tracker_config(), associator),
            publisher,
        };
        (pipeline, subscriber)
    }

    /// Processes one captured frame and returns the confirmed tracks'
    /// outputs. Actions recognized this frame are published on the bus;
    /// transient actions are consumed once dispatched while drags stay
    /// pending until their drop rule releases them.
    pub fn process(&mut self, frame: &ArrayView3<u8>) -> Result<Vec<TrackOutput>> {
        let detections = self.detector.detect(frame)?;

        let labels = if detections.is_empty() {
            None
        } else {
            let boxes: Vec<[f32; 4]> = detections.iter().map(|d| d.bbox).collect();
            let labels = self.classifier.classify(frame, &boxes)?;
            if labels.len() != detections.len() {
                return Err(Error::Inference(format!(
                    "classifier returned {} labels for {} boxes",
                    labels.len(),
                    detections.len()
                )));
            }
            Some(labels)
        };

        let outputs = self.tracker.update(&detections, labels.as_deref());

        for event in self.tracker.take_fired() {
            self.publisher.publish(event);
            if !event.action.is_drag() {
                self.tracker.take_action(event.track_id);
            }
        }

        Ok(outputs)
    }

    /// Read-only view of the track working set.
    pub fn tracker(&self) -> &HandTracker<M, A> {
        &self.tracker
    }
}
