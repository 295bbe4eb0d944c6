// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

//! Handwave - Track Lifecycle
//!
//! Owns the per-frame working set of hand tracks: matching detections to
//! tracks through the external motion/association contracts, advancing each
//! track's observation buffer, and deciding which tracks are confirmed and
//! reported. Motion filtering and the primary assignment algorithm are
//! collaborators behind the [`MotionFilter`] and [`Associator`] traits.

use std::fmt::Debug;

use handwave_gesture::{Action, Gesture};

pub mod lifecycle;

pub use lifecycle::{HandTracker, Track, TrackerConfig};

/// A detection candidate for one frame, as produced by the hand detector.
pub trait DetectionBox: Debug {
    /// Corner-form box `[x0, y0, x1, y1]`.
    fn bbox(&self) -> [f32; 4];
    fn score(&self) -> f32;
}

/// Per-track motion estimation contract (the external object-motion filter).
///
/// The lifecycle manager calls `predict` exactly once per frame for every
/// live track before association, then `update` exactly once with the
/// matched detection or `None` on a miss. Implementations own the occlusion
/// bookkeeping the manager reads back:
///
/// - `predict` advances `age`, increments `time_since_update`, and resets an
///   interrupted `hit_streak` to zero;
/// - `update(Some(_))` resets `time_since_update` and extends `hit_streak`.
pub trait MotionFilter {
    /// Bootstraps a filter from the first detection of a new track.
    fn from_detection(bbox: [f32; 4]) -> Self
    where
        Self: Sized;

    /// Advances the filter one frame and returns the predicted box.
    fn predict(&mut self) -> [f32; 4];

    /// Folds in this frame's matched detection, or `None` on a miss.
    fn update(&mut self, bbox: Option<[f32; 4]>);

    /// Current state estimate, the reported position for tracks with no
    /// recorded observation.
    fn state(&self) -> [f32; 4];

    /// Estimated image-plane velocity, when the filter has one.
    fn velocity(&self) -> Option<[f32; 2]>;

    /// The most recent real observation folded into the filter.
    fn last_observation(&self) -> Option<[f32; 4]>;

    /// The observation recorded `horizon` frames back, falling back to the
    /// most recent one. Feeds the associator's direction-consistency input.
    fn previous_observation(&self, horizon: u32) -> Option<[f32; 4]>;

    fn time_since_update(&self) -> u32;

    fn hit_streak(&self) -> u32;

    fn age(&self) -> u32;
}

/// Per-track inputs handed to the associator for one frame.
#[derive(Debug, Clone, Copy)]
pub struct TrackMotion {
    /// Predicted box for this frame.
    pub prediction: [f32; 4],
    /// Image-plane velocity estimate, zero when unknown.
    pub velocity: [f32; 2],
    /// A recent recorded observation for direction consistency, if any.
    pub reference: Option<[f32; 4]>,
}

/// Result of one association round. Indices refer to the detection and track
/// slices passed to [`Associator::associate`].
#[derive(Debug, Clone, Default)]
pub struct Associations {
    /// `(detection index, track index)` pairs.
    pub matched: Vec<(usize, usize)>,
    pub unmatched_detections: Vec<usize>,
    pub unmatched_tracks: Vec<usize>,
}

/// Primary frame-to-frame association contract. Given the frame's detections
/// (`[x0, y0, x1, y1, score]`) and the live tracks' motion snapshots, returns
/// matched pairs and the unmatched leftovers on both sides.
pub trait Associator {
    fn associate(&self, detections: &[[f32; 5]], tracks: &[TrackMotion]) -> Associations;
}

/// One confirmed track's per-frame output tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackOutput {
    /// Reported box: the last real observation when available, else the
    /// motion state estimate.
    pub bbox: [f32; 4],
    pub track_id: u32,
    /// The gesture of the track's newest observation.
    pub gesture: Option<Gesture>,
    /// The track's pending (unconsumed) action.
    pub action: Option<Action>,
}
