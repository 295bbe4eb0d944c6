// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{position, rules, Action, Gesture, HandObservation, PositionTag};

/// Capacity of the ring of recently fired candidate actions, used only for
/// debounce logic such as double-tap composition.
const CANDIDATE_CAPACITY: usize = 5;

/// Per-buffer tunables. `maxlen` bounds the temporal history, `min_frames`
/// is the default duration floor for compound gestures and `swipe_ratio` the
/// minimum center displacement in units of mean hand size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub maxlen: usize,
    pub min_frames: usize,
    pub swipe_ratio: f32,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            maxlen: 30,
            min_frames: 20,
            swipe_ratio: 1.5,
        }
    }
}

/// Bounded temporal history of one track's hand observations.
///
/// Exactly one observation is appended per frame the track is alive, misses
/// included, so buffer-relative indices double as frame counts for duration
/// checks. The history is cleared whenever a compound gesture completes or a
/// candidate pattern is invalidated, so it never straddles two events.
#[derive(Debug, Clone)]
pub struct ObservationBuffer {
    observations: VecDeque<HandObservation>,
    maxlen: usize,
    min_frames: usize,
    swipe_ratio: f32,
    pending: Option<Action>,
    candidates: VecDeque<Action>,
}

impl ObservationBuffer {
    pub fn new(config: &BufferConfig) -> Self {
        debug_assert!(config.maxlen > 0, "observation buffer capacity must be positive");
        Self {
            observations: VecDeque::with_capacity(config.maxlen),
            maxlen: config.maxlen,
            min_frames: config.min_frames,
            swipe_ratio: config.swipe_ratio,
            pending: None,
            candidates: VecDeque::with_capacity(CANDIDATE_CAPACITY),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HandObservation> {
        self.observations.get(index)
    }

    pub fn last(&self) -> Option<&HandObservation> {
        self.observations.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandObservation> {
        self.observations.iter()
    }

    /// Appends one frame's observation: evicts the oldest entry at capacity,
    /// stamps the observation's position tag against the pre-append history,
    /// then runs the gesture rule machine over the updated buffer. Returns
    /// the action fired by this append, if any; the action also stays
    /// pending on the buffer until taken.
    pub fn append(&mut self, mut obs: HandObservation) -> Option<Action> {
        if self.observations.len() >= self.maxlen {
            self.observations.pop_front();
        }
        obs.set_position(position::classify(obs.gesture(), self));
        self.observations.push_back(obs);
        rules::evaluate(self)
    }

    pub fn contains_position(&self, tag: PositionTag) -> bool {
        self.observations.iter().any(|o| o.position() == tag)
    }

    /// Index of the oldest observation carrying `tag`, if any.
    pub fn index_of_position(&self, tag: PositionTag) -> Option<usize> {
        self.observations.iter().position(|o| o.position() == tag)
    }

    /// Index of the oldest observation carrying `gesture`, if any.
    pub fn index_of_gesture(&self, gesture: Gesture) -> Option<usize> {
        self.observations
            .iter()
            .position(|o| o.gesture() == Some(gesture))
    }

    /// Drops the buffered history. The pending action and the candidate ring
    /// are untouched; a completed drag must survive the clear that ends its
    /// initiating pattern.
    pub fn clear(&mut self) {
        self.observations.clear();
    }

    pub fn pending_action(&self) -> Option<Action> {
        self.pending
    }

    /// Reads and resets the pending action.
    pub fn take_action(&mut self) -> Option<Action> {
        self.pending.take()
    }

    /// True when at least `floor` frames have elapsed since `start_index`
    /// (buffer-relative; misses count toward the duration). `None` uses the
    /// configured default floor.
    pub fn min_duration(&self, start_index: usize, floor: Option<usize>) -> bool {
        self.len() - start_index >= floor.unwrap_or(self.min_frames)
    }

    /// True when at most `ceiling` frames have elapsed since `start_index`.
    pub fn max_duration(&self, start_index: usize, ceiling: usize) -> bool {
        self.len() - start_index <= ceiling
    }

    pub(crate) fn swipe_ratio(&self) -> f32 {
        self.swipe_ratio
    }

    pub(crate) fn set_pending(&mut self, action: Action) {
        self.pending = Some(action);
    }

    pub(crate) fn push_candidate(&mut self, action: Action) {
        if self.candidates.len() >= CANDIDATE_CAPACITY {
            self.candidates.pop_front();
        }
        self.candidates.push_back(action);
    }

    /// Pops the two most recent candidates when both equal `action`.
    pub(crate) fn consume_candidate_pair(&mut self, action: Action) -> bool {
        let n = self.candidates.len();
        if n >= 2 && self.candidates[n - 1] == action && self.candidates[n - 2] == action {
            self.candidates.pop_back();
            self.candidates.pop_back();
            true
        } else {
            false
        }
    }
}
