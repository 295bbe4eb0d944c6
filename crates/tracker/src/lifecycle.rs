// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use crate::{Associations, Associator, DetectionBox, MotionFilter, TrackMotion, TrackOutput};
use handwave_gesture::{
    Action, ActionEvent, BufferConfig, Gesture, HandObservation, ObservationBuffer,
};
use lapjv::{lapjv, Matrix};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

const INVALID_MATCH: f32 = 1000000.0;
const EPSILON: f32 = 0.00001;

/// Lifecycle tunables. `max_age` is the number of consecutive missed frames
/// a track survives, `min_hits` the hit streak required for confirmation,
/// `iou_threshold` gates the fallback re-association round and `delta_t` is
/// the lookback horizon handed to the associator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub max_age: u32,
    pub min_hits: u32,
    pub iou_threshold: f32,
    pub delta_t: u32,
    pub buffer: BufferConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            min_hits: 3,
            iou_threshold: 0.3,
            delta_t: 3,
            buffer: BufferConfig::default(),
        }
    }
}

/// One tracked hand: a persistent identity, its motion filter and its
/// temporal observation buffer.
#[derive(Debug)]
pub struct Track<M> {
    id: u32,
    filter: M,
    hands: ObservationBuffer,
}

impl<M> Track<M> {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn hands(&self) -> &ObservationBuffer {
        &self.hands
    }

    pub fn filter(&self) -> &M {
        &self.filter
    }
}

/// The track lifecycle manager. Owns the working set of tracks exclusively;
/// collaborators only see it through `update`, the read-only accessors and
/// the action consumption calls.
pub struct HandTracker<M, A> {
    config: TrackerConfig,
    associator: A,
    tracks: Vec<Track<M>>,
    frame_count: u64,
    next_id: u32,
    fired: Vec<ActionEvent>,
}

impl<M: MotionFilter, A: Associator> HandTracker<M, A> {
    pub fn new(config: TrackerConfig, associator: A) -> Self {
        Self {
            config,
            associator,
            tracks: Vec::new(),
            frame_count: 0,
            next_id: 1,
            fired: Vec::new(),
        }
    }

    /// Processes one frame. Must be called once per frame even with an empty
    /// detection list, so occlusion bookkeeping and buffer durations keep
    /// advancing. Returns the confirmed tracks' output tuples, newest track
    /// first.
    pub fn update<T: DetectionBox>(
        &mut self,
        detections: &[T],
        labels: Option<&[Gesture]>,
    ) -> Vec<TrackOutput> {
        self.frame_count += 1;

        // advance every filter; a non-finite prediction is a transient
        // predictor failure and the track silently leaves the working set
        let mut predictions: Vec<[f32; 4]> = Vec::with_capacity(self.tracks.len());
        for track in &mut self.tracks {
            predictions.push(track.filter.predict());
        }
        for i in (0..self.tracks.len()).rev() {
            if predictions[i].iter().any(|v| !v.is_finite()) {
                debug!("track {} dropped on non-finite prediction", self.tracks[i].id);
                self.tracks.remove(i);
                predictions.remove(i);
            }
        }

        let snapshots: Vec<TrackMotion> = self
            .tracks
            .iter()
            .zip(&predictions)
            .map(|(track, &prediction)| TrackMotion {
                prediction,
                velocity: track.filter.velocity().unwrap_or([0.0, 0.0]),
                reference: track.filter.previous_observation(self.config.delta_t),
            })
            .collect();

        let dets: Vec<[f32; 5]> = detections
            .iter()
            .map(|d| {
                let b = d.bbox();
                [b[0], b[1], b[2], b[3], d.score()]
            })
            .collect();

        // first round through the external association contract
        let mut assoc = self.associator.associate(&dets, &snapshots);
        let matched = std::mem::take(&mut assoc.matched);
        for &(det_index, track_index) in &matched {
            if det_index >= detections.len() || track_index >= self.tracks.len() {
                continue;
            }
            let gesture = labels.and_then(|l| l.get(det_index)).copied();
            self.apply_match(track_index, detections[det_index].bbox(), gesture);
        }

        // second round rescues leftovers on plain geometric overlap
        if !assoc.unmatched_detections.is_empty() && !assoc.unmatched_tracks.is_empty() {
            self.rematch_leftovers(detections, labels, &dets, &mut assoc);
        }

        // unmatched tracks advance through the miss path; an empty
        // observation still counts toward gesture durations
        for &track_index in &assoc.unmatched_tracks {
            if track_index >= self.tracks.len() {
                continue;
            }
            let track = &mut self.tracks[track_index];
            track.filter.update(None);
            track.hands.append(HandObservation::miss());
        }

        // unmatched detections spawn tentative tracks; their first
        // observation lands on the first matched frame
        for &det_index in &assoc.unmatched_detections {
            if det_index >= detections.len() {
                continue;
            }
            let track = Track {
                id: self.next_id,
                filter: M::from_detection(detections[det_index].bbox()),
                hands: ObservationBuffer::new(&self.config.buffer),
            };
            debug!("track {} created", track.id);
            self.next_id += 1;
            self.tracks.push(track);
        }

        // report confirmed tracks and retire the expired, newest first
        let mut outputs = Vec::new();
        for i in (0..self.tracks.len()).rev() {
            let track = &self.tracks[i];
            let confirmed = track.filter.hit_streak() >= self.config.min_hits
                || self.frame_count <= u64::from(self.config.min_hits);
            if track.filter.time_since_update() < 1 && confirmed {
                let bbox = track
                    .filter
                    .last_observation()
                    .unwrap_or_else(|| track.filter.state());
                outputs.push(TrackOutput {
                    bbox,
                    track_id: track.id,
                    gesture: track.hands.last().and_then(|h| h.gesture()),
                    action: track.hands.pending_action(),
                });
            }
            if track.filter.time_since_update() > self.config.max_age {
                debug!("track {} removed", track.id);
                self.tracks.remove(i);
            }
        }
        outputs
    }

    fn apply_match(&mut self, track_index: usize, bbox: [f32; 4], gesture: Option<Gesture>) {
        let track = &mut self.tracks[track_index];
        track.filter.update(Some(bbox));
        let id = track.id;
        let fired = track
            .hands
            .append(HandObservation::new(Some(bbox.into()), gesture));
        if let Some(action) = fired {
            debug!("track {} fired {:?}", id, action);
            self.fired.push(ActionEvent {
                track_id: id,
                frame: self.frame_count,
                action,
            });
        }
    }

    fn rematch_leftovers<T: DetectionBox>(
        &mut self,
        detections: &[T],
        labels: Option<&[Gesture]>,
        dets: &[[f32; 5]],
        assoc: &mut Associations,
    ) {
        let det_ids = assoc.unmatched_detections.clone();
        let trk_ids = assoc.unmatched_tracks.clone();
        let threshold = self.config.iou_threshold;

        // costs matrix must be square
        let dims = det_ids.len().max(trk_ids.len());
        let costs = Matrix::from_shape_fn((dims, dims), |(x, y)| {
            if x < det_ids.len() && y < trk_ids.len() {
                let last = self.tracks[trk_ids[y]].filter.last_observation();
                rematch_cost(&dets[det_ids[x]], last, threshold)
            } else {
                0.0
            }
        });

        let ans = lapjv(&costs).unwrap();
        let mut rescued_dets = Vec::new();
        let mut rescued_trks = Vec::new();
        for (i, &x) in ans.0.iter().enumerate() {
            if i >= det_ids.len() || x >= trk_ids.len() {
                continue;
            }
            if costs[(i, x)] >= INVALID_MATCH {
                continue;
            }
            let det_index = det_ids[i];
            let track_index = trk_ids[x];
            trace!(
                "rematched detection {} to track {}",
                det_index,
                self.tracks[track_index].id
            );
            let gesture = labels.and_then(|l| l.get(det_index)).copied();
            self.apply_match(track_index, detections[det_index].bbox(), gesture);
            rescued_dets.push(det_index);
            rescued_trks.push(track_index);
        }
        assoc
            .unmatched_detections
            .retain(|d| !rescued_dets.contains(d));
        assoc.unmatched_tracks.retain(|t| !rescued_trks.contains(t));
    }

    /// Actions recognized since the last drain, in firing order. Intended to
    /// be drained once per `update`.
    pub fn take_fired(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.fired)
    }

    /// Reads and resets a track's pending action.
    pub fn take_action(&mut self, track_id: u32) -> Option<Action> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .and_then(|t| t.hands.take_action())
    }

    pub fn tracks(&self) -> &[Track<M>] {
        &self.tracks
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Generalized IoU between two corner-form boxes, in `[-1, 1]`.
fn giou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let intersection = (box1[2].min(box2[2]) - box1[0].max(box2[0])).max(0.0)
        * (box1[3].min(box2[3]) - box1[1].max(box2[1])).max(0.0);

    let union = (box1[2] - box1[0]) * (box1[3] - box1[1])
        + (box2[2] - box2[0]) * (box2[3] - box2[1])
        - intersection;

    if union <= EPSILON {
        return 0.0;
    }
    let iou = intersection / union;

    let enclosure = (box1[2].max(box2[2]) - box1[0].min(box2[0]))
        * (box1[3].max(box2[3]) - box1[1].min(box2[1]));
    if enclosure <= EPSILON {
        return iou;
    }
    iou - (enclosure - union) / enclosure
}

fn rematch_cost(det: &[f32; 5], last_observation: Option<[f32; 4]>, threshold: f32) -> f32 {
    let last = match last_observation {
        Some(last) => last,
        None => return INVALID_MATCH,
    };
    let overlap = giou(&[det[0], det[1], det[2], det[3]], &last);
    if overlap < threshold {
        return INVALID_MATCH;
    }
    1.0 - overlap
}

#[cfg(test)]
mod tests {
    use super::{giou, HandTracker, TrackerConfig};
    use crate::{Associations, Associator, DetectionBox, MotionFilter, TrackMotion};
    use handwave_gesture::{Action, Gesture};
    use std::cell::Cell;

    #[derive(Debug, Clone)]
    struct MockDetection {
        bbox: [f32; 4],
        score: f32,
    }

    impl MockDetection {
        fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
            Self {
                bbox: [x1, y1, x2, y2],
                score,
            }
        }
    }

    impl DetectionBox for MockDetection {
        fn bbox(&self) -> [f32; 4] {
            self.bbox
        }

        fn score(&self) -> f32 {
            self.score
        }
    }

    /// Follows the occlusion bookkeeping contract with a frozen state.
    #[derive(Debug)]
    struct StaticFilter {
        state: [f32; 4],
        last: Option<[f32; 4]>,
        time_since_update: u32,
        hit_streak: u32,
        age: u32,
    }

    impl MotionFilter for StaticFilter {
        fn from_detection(bbox: [f32; 4]) -> Self {
            Self {
                state: bbox,
                last: None,
                time_since_update: 0,
                hit_streak: 0,
                age: 0,
            }
        }

        fn predict(&mut self) -> [f32; 4] {
            self.age += 1;
            if self.time_since_update > 0 {
                self.hit_streak = 0;
            }
            self.time_since_update += 1;
            self.state
        }

        fn update(&mut self, bbox: Option<[f32; 4]>) {
            if let Some(b) = bbox {
                self.time_since_update = 0;
                self.hit_streak += 1;
                self.last = Some(b);
                self.state = b;
            }
        }

        fn state(&self) -> [f32; 4] {
            self.state
        }

        fn velocity(&self) -> Option<[f32; 2]> {
            None
        }

        fn last_observation(&self) -> Option<[f32; 4]> {
            self.last
        }

        fn previous_observation(&self, _horizon: u32) -> Option<[f32; 4]> {
            self.last
        }

        fn time_since_update(&self) -> u32 {
            self.time_since_update
        }

        fn hit_streak(&self) -> u32 {
            self.hit_streak
        }

        fn age(&self) -> u32 {
            self.age
        }
    }

    /// Turns poisonous after two frames to exercise the non-finite drop path.
    #[derive(Debug)]
    struct NanFilter(StaticFilter);

    impl MotionFilter for NanFilter {
        fn from_detection(bbox: [f32; 4]) -> Self {
            Self(StaticFilter::from_detection(bbox))
        }

        fn predict(&mut self) -> [f32; 4] {
            let p = self.0.predict();
            if self.0.age >= 2 { [f32::NAN; 4] } else { p }
        }

        fn update(&mut self, bbox: Option<[f32; 4]>) {
            self.0.update(bbox)
        }

        fn state(&self) -> [f32; 4] {
            self.0.state()
        }

        fn velocity(&self) -> Option<[f32; 2]> {
            None
        }

        fn last_observation(&self) -> Option<[f32; 4]> {
            self.0.last_observation()
        }

        fn previous_observation(&self, horizon: u32) -> Option<[f32; 4]> {
            self.0.previous_observation(horizon)
        }

        fn time_since_update(&self) -> u32 {
            self.0.time_since_update()
        }

        fn hit_streak(&self) -> u32 {
            self.0.hit_streak()
        }

        fn age(&self) -> u32 {
            self.0.age()
        }
    }

    /// Greedy overlap matcher standing in for the external association
    /// algorithm.
    struct GreedyIou {
        threshold: f32,
    }

    impl Associator for GreedyIou {
        fn associate(&self, detections: &[[f32; 5]], tracks: &[TrackMotion]) -> Associations {
            let mut result = Associations::default();
            let mut used = vec![false; tracks.len()];
            for (di, det) in detections.iter().enumerate() {
                let mut best: Option<(usize, f32)> = None;
                for (ti, track) in tracks.iter().enumerate() {
                    if used[ti] {
                        continue;
                    }
                    let overlap = giou(&[det[0], det[1], det[2], det[3]], &track.prediction);
                    if overlap >= self.threshold && best.map_or(true, |(_, b)| overlap > b) {
                        best = Some((ti, overlap));
                    }
                }
                match best {
                    Some((ti, _)) => {
                        used[ti] = true;
                        result.matched.push((di, ti));
                    }
                    None => result.unmatched_detections.push(di),
                }
            }
            for (ti, u) in used.iter().enumerate() {
                if !u {
                    result.unmatched_tracks.push(ti);
                }
            }
            result
        }
    }

    /// Matches greedily for the first `good_calls` frames, then reports
    /// everything unmatched so the fallback round has to do the work.
    struct FlakyAssociator {
        inner: GreedyIou,
        good_calls: usize,
        calls: Cell<usize>,
    }

    impl Associator for FlakyAssociator {
        fn associate(&self, detections: &[[f32; 5]], tracks: &[TrackMotion]) -> Associations {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call < self.good_calls {
                self.inner.associate(detections, tracks)
            } else {
                Associations {
                    matched: Vec::new(),
                    unmatched_detections: (0..detections.len()).collect(),
                    unmatched_tracks: (0..tracks.len()).collect(),
                }
            }
        }
    }

    fn tracker(config: TrackerConfig) -> HandTracker<StaticFilter, GreedyIou> {
        HandTracker::new(config, GreedyIou { threshold: 0.3 })
    }

    #[test]
    fn test_giou_identical_boxes() {
        let b = [0.1, 0.1, 0.5, 0.5];
        assert!((giou(&b, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_giou_disjoint_boxes_negative() {
        let b1 = [0.0, 0.0, 0.2, 0.2];
        let b2 = [0.8, 0.8, 1.0, 1.0];
        assert!(giou(&b1, &b2) < 0.0);
    }

    #[test]
    fn test_empty_frame_is_valid() {
        let mut tracker = tracker(TrackerConfig::default());
        let empty: Vec<MockDetection> = Vec::new();
        let outputs = tracker.update(&empty, None);
        assert!(outputs.is_empty());
        assert_eq!(tracker.frame_count(), 1);
    }

    #[test]
    fn test_bootstrap_grace_reports_fresh_track() {
        let mut tracker = tracker(TrackerConfig::default());
        let dets = vec![MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)];
        let outputs = tracker.update(&dets, None);
        // frame_count <= min_hits: reported despite zero hit streak
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].track_id, 1);
        assert_eq!(tracker.tracks().len(), 1);
    }

    #[test]
    fn test_confirmation_requires_min_hits_after_bootstrap() {
        let mut tracker = tracker(TrackerConfig::default());
        let empty: Vec<MockDetection> = Vec::new();
        for _ in 0..3 {
            tracker.update(&empty, None);
        }

        let dets = vec![MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)];
        // spawn frame and the first two matched frames stay unreported
        assert!(tracker.update(&dets, None).is_empty());
        assert!(tracker.update(&dets, None).is_empty());
        assert!(tracker.update(&dets, None).is_empty());
        // hit streak reaches min_hits on the third consecutive match
        let outputs = tracker.update(&dets, None);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].track_id, 1);
    }

    #[test]
    fn test_track_removed_past_max_age() {
        let config = TrackerConfig {
            max_age: 2,
            ..TrackerConfig::default()
        };
        let mut tracker = tracker(config);
        let dets = vec![MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)];
        tracker.update(&dets, None);
        assert_eq!(tracker.tracks().len(), 1);

        let empty: Vec<MockDetection> = Vec::new();
        tracker.update(&empty, None); // time_since_update 1
        tracker.update(&empty, None); // 2
        assert_eq!(tracker.tracks().len(), 1);
        tracker.update(&empty, None); // 3 > max_age: removed
        assert!(tracker.tracks().is_empty());

        // the identity is gone for good; a reappearing hand gets a new id
        tracker.update(&dets, None);
        assert_eq!(tracker.tracks()[0].id(), 2);
    }

    #[test]
    fn test_miss_path_appends_empty_observation() {
        let mut tracker = tracker(TrackerConfig::default());
        let dets = vec![MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)];
        tracker.update(&dets, None);
        // spawn frame does not append; first matched frame does
        assert_eq!(tracker.tracks()[0].hands().len(), 0);
        tracker.update(&dets, None);
        assert_eq!(tracker.tracks()[0].hands().len(), 1);

        let empty: Vec<MockDetection> = Vec::new();
        tracker.update(&empty, None);
        assert_eq!(tracker.tracks()[0].hands().len(), 2);
        assert!(tracker.tracks()[0].hands().last().unwrap().is_miss());
    }

    #[test]
    fn test_fallback_round_rescues_unmatched_track() {
        let associator = FlakyAssociator {
            inner: GreedyIou { threshold: 0.3 },
            good_calls: 2,
            calls: Cell::new(0),
        };
        let mut tracker: HandTracker<StaticFilter, _> =
            HandTracker::new(TrackerConfig::default(), associator);
        let dets = vec![MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)];
        tracker.update(&dets, None); // spawn
        tracker.update(&dets, None); // primary match records an observation

        // primary association now fails; overlap with the last observation
        // must rescue the pair instead of spawning a duplicate track
        tracker.update(&dets, None);
        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.tracks()[0].hands().len(), 2);
        assert_eq!(tracker.tracks()[0].filter().hit_streak(), 2);
    }

    #[test]
    fn test_non_finite_prediction_drops_track() {
        let mut tracker: HandTracker<NanFilter, GreedyIou> =
            HandTracker::new(TrackerConfig::default(), GreedyIou { threshold: 0.3 });
        let dets = vec![MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)];
        tracker.update(&dets, None);
        tracker.update(&dets, None);
        assert_eq!(tracker.tracks()[0].id(), 1);

        // third frame's prediction is NaN: the track vanishes and the
        // detection spawns a replacement under a fresh id
        tracker.update(&dets, None);
        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.tracks()[0].id(), 2);
    }

    #[test]
    fn test_reported_box_is_last_observation() {
        let mut tracker = tracker(TrackerConfig::default());
        tracker.update(&[MockDetection::new(0.1, 0.1, 0.3, 0.3, 0.9)], None);
        let moved = MockDetection::new(0.12, 0.1, 0.32, 0.3, 0.9);
        let outputs = tracker.update(&[moved.clone()], None);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].bbox, moved.bbox);
    }

    #[test]
    fn test_swipe_fires_through_update() {
        let mut tracker = tracker(TrackerConfig::default());
        // the hand drifts right one unit per frame on a ten-unit box, so
        // association holds while displacement accumulates
        for frame in 0..21 {
            let x = frame as f32;
            let det = vec![MockDetection::new(x, 0.0, x + 10.0, 10.0, 0.9)];
            let label = match frame {
                0 | 1 => vec![Gesture::HandRight],
                20 => vec![Gesture::HandLeft],
                _ => Vec::new(),
            };
            let labels = if label.is_empty() { None } else { Some(&label[..]) };
            tracker.update(&det, labels);
        }
        let fired = tracker.take_fired();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, Action::SwipeLeft);
        assert_eq!(fired[0].track_id, 1);
        assert_eq!(fired[0].frame, 21);
        // history consumed by the recognized gesture
        assert!(tracker.tracks()[0].hands().is_empty());
        // pending until explicitly taken
        assert_eq!(tracker.take_action(1), Some(Action::SwipeLeft));
        assert_eq!(tracker.take_action(1), None);
    }
}
