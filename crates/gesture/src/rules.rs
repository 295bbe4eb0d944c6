// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

//! Priority-ordered gesture rules evaluated once per appended observation.
//!
//! The chain is a single top-to-bottom pass with first-match-wins semantics:
//! at most one rule reacts per append and at most one action fires. A rule
//! whose trigger matches but whose qualifiers fail invalidates the pattern
//! according to its `OnFail` policy. Three rules keep the history on failure
//! where their siblings clear it (`SwipeLeft`, `FastSwipeDown`, `ZoomIn`);
//! this asymmetry is inherited from the tuned heuristic and kept as-is.

use log::{debug, trace};

use crate::{Action, Gesture, HandObservation, ObservationBuffer, PositionTag};

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
    Both,
}

#[derive(Debug, Clone, Copy)]
enum Duration {
    /// buffer's configured `min_frames`
    Default,
    AtLeast(usize),
    Unchecked,
}

#[derive(Debug, Clone, Copy)]
enum OnFail {
    Clear,
    Keep,
}

/// Motion-phase rule: fires `action` when the new observation carries `end`
/// while `start` is somewhere in the history and the qualifiers pass.
struct SwipeRule {
    end: PositionTag,
    start: PositionTag,
    action: Action,
    duration: Duration,
    check_distance: bool,
    axis: Axis,
    on_fail: OnFail,
}

/// Hold-to-drag rule: a sustained `trigger` pose enters the continuous
/// `action` state. The history is left intact while dragging.
struct DragHoldRule {
    trigger: Gesture,
    action: Action,
}

/// Release rule: the matching drag must be pending and the new observation
/// must show one of the release poses.
struct DropRule {
    pending: Action,
    releases: &'static [Gesture],
    action: Action,
}

enum Rule {
    Swipe(SwipeRule),
    DragHold(DragHoldRule),
    /// grabbing-then-fist drag entry (short 3-frame hold)
    DragGrab,
    Drop(DropRule),
    /// tap / double-tap out of an open zoom-in phase plus a point pose
    Tap,
}

/// The rule chain in evaluation order. Reordering entries changes observable
/// behavior; the order mirrors the tuned recognizer.
const RULES: &[Rule] = &[
    Rule::Swipe(SwipeRule {
        end: PositionTag::LeftEnd,
        start: PositionTag::RightStart,
        action: Action::SwipeLeft,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Horizontal,
        on_fail: OnFail::Keep,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::RightEnd,
        start: PositionTag::LeftStart,
        action: Action::SwipeRight,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Horizontal,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::UpEnd,
        start: PositionTag::DownStart,
        action: Action::SwipeUp,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::DownEnd,
        start: PositionTag::UpStart,
        action: Action::SwipeDown,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::DragHold(DragHoldRule {
        trigger: Gesture::Grip,
        action: Action::Drag2,
    }),
    Rule::Drop(DropRule {
        pending: Action::Drag2,
        releases: &[Gesture::PartHandHeart, Gesture::PartHandHeart2],
        action: Action::Drop2,
    }),
    Rule::DragHold(DragHoldRule {
        trigger: Gesture::Ok,
        action: Action::Drag3,
    }),
    Rule::Drop(DropRule {
        pending: Action::Drag3,
        releases: &[Gesture::PartHandHeart, Gesture::PartHandHeart2],
        action: Action::Drop3,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::FastSwipeUpEnd,
        start: PositionTag::FastSwipeUpStart,
        action: Action::FastSwipeUp,
        duration: Duration::AtLeast(20),
        check_distance: false,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::FastSwipeDownEnd,
        start: PositionTag::FastSwipeDownStart,
        action: Action::FastSwipeDown,
        duration: Duration::AtLeast(20),
        check_distance: false,
        axis: Axis::Vertical,
        on_fail: OnFail::Keep,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::ZoomInEnd,
        start: PositionTag::ZoomInStart,
        action: Action::ZoomIn,
        duration: Duration::AtLeast(20),
        check_distance: false,
        axis: Axis::Both,
        on_fail: OnFail::Keep,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::ZoomOutEnd,
        start: PositionTag::ZoomOutStart,
        action: Action::ZoomOut,
        duration: Duration::AtLeast(20),
        check_distance: false,
        axis: Axis::Both,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::LeftEnd2,
        start: PositionTag::RightStart2,
        action: Action::SwipeLeft2,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Horizontal,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::RightEnd2,
        start: PositionTag::LeftStart2,
        action: Action::SwipeRight2,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Horizontal,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::UpEnd2,
        start: PositionTag::DownStart2,
        action: Action::SwipeUp2,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::LeftEnd3,
        start: PositionTag::RightStart3,
        action: Action::SwipeLeft3,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Horizontal,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::RightEnd3,
        start: PositionTag::LeftStart3,
        action: Action::SwipeRight3,
        duration: Duration::Default,
        check_distance: true,
        axis: Axis::Horizontal,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::UpEnd3,
        start: PositionTag::DownStart3,
        action: Action::SwipeUp3,
        duration: Duration::AtLeast(15),
        check_distance: false,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::DownEnd3,
        start: PositionTag::UpStart3,
        action: Action::SwipeDown3,
        duration: Duration::AtLeast(15),
        check_distance: false,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::DragGrab,
    Rule::Tap,
    // late vertical swipes keyed off an open zoom-out phase; no duration
    // floor, distance only
    Rule::Swipe(SwipeRule {
        end: PositionTag::DownEnd2,
        start: PositionTag::ZoomOutStart,
        action: Action::SwipeDown2,
        duration: Duration::Unchecked,
        check_distance: true,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::Swipe(SwipeRule {
        end: PositionTag::ZoomOutStart,
        start: PositionTag::UpStart2,
        action: Action::SwipeUp2,
        duration: Duration::Unchecked,
        check_distance: true,
        axis: Axis::Vertical,
        on_fail: OnFail::Clear,
    }),
    Rule::Drop(DropRule {
        pending: Action::Drag,
        releases: &[
            Gesture::Stop,
            Gesture::Palm,
            Gesture::StopInverted,
            Gesture::Grabbing,
        ],
        action: Action::Drop,
    }),
];

/// Runs the rule chain against the buffer's current contents. The newest
/// observation is the one appended by the caller. Returns the action fired
/// by this evaluation, if any.
pub(crate) fn evaluate(buffer: &mut ObservationBuffer) -> Option<Action> {
    let obs = *buffer.last()?;
    for rule in RULES {
        if let Some(fired) = rule.apply(buffer, &obs) {
            if let Some(action) = fired {
                debug!("recognized {:?}", action);
            }
            return fired;
        }
    }
    None
}

impl Rule {
    /// `None` when the trigger does not match (chain continues); `Some(fired)`
    /// when it does (chain stops), with the action fired if qualifiers passed.
    fn apply(
        &self,
        buffer: &mut ObservationBuffer,
        obs: &HandObservation,
    ) -> Option<Option<Action>> {
        match self {
            Rule::Swipe(rule) => rule.apply(buffer, obs),
            Rule::DragHold(rule) => rule.apply(buffer, obs),
            Rule::DragGrab => apply_drag_grab(buffer, obs),
            Rule::Drop(rule) => rule.apply(buffer, obs),
            Rule::Tap => apply_tap(buffer, obs),
        }
    }
}

impl SwipeRule {
    fn apply(
        &self,
        buffer: &mut ObservationBuffer,
        obs: &HandObservation,
    ) -> Option<Option<Action>> {
        if obs.position() != self.end {
            return None;
        }
        let start_index = buffer.index_of_position(self.start)?;
        let start = *buffer.get(start_index)?;

        let duration_ok = match self.duration {
            Duration::Default => buffer.min_duration(start_index, None),
            Duration::AtLeast(floor) => buffer.min_duration(start_index, Some(floor)),
            Duration::Unchecked => true,
        };
        let distance_ok =
            !self.check_distance || swipe_distance(buffer.swipe_ratio(), &start, obs);
        let axis_ok = match self.axis {
            Axis::Horizontal => horizontal_swipe(&start, obs),
            Axis::Vertical => vertical_swipe(&start, obs),
            Axis::Both => vertical_swipe(&start, obs) && horizontal_swipe(&start, obs),
        };

        if distance_ok && duration_ok && axis_ok {
            buffer.set_pending(self.action);
            buffer.clear();
            Some(Some(self.action))
        } else {
            trace!("{:?} qualifiers failed", self.action);
            if matches!(self.on_fail, OnFail::Clear) {
                buffer.clear();
            }
            Some(None)
        }
    }
}

impl DragHoldRule {
    fn apply(
        &self,
        buffer: &mut ObservationBuffer,
        obs: &HandObservation,
    ) -> Option<Option<Action>> {
        if obs.gesture() != Some(self.trigger) {
            return None;
        }
        if buffer.pending_action().is_none() {
            let start_index = buffer.index_of_gesture(self.trigger)?;
            if buffer.min_duration(start_index, None) {
                buffer.set_pending(self.action);
                return Some(Some(self.action));
            }
        }
        Some(None)
    }
}

fn apply_drag_grab(
    buffer: &mut ObservationBuffer,
    obs: &HandObservation,
) -> Option<Option<Action>> {
    if !buffer.contains_position(PositionTag::DragStart) || obs.gesture() != Some(Gesture::Fist)
    {
        return None;
    }
    if buffer.pending_action().is_none() {
        match buffer.index_of_gesture(Gesture::Grabbing) {
            Some(start_index) if buffer.min_duration(start_index, Some(3)) => {
                buffer.set_pending(Action::Drag);
                return Some(Some(Action::Drag));
            }
            _ => buffer.clear(),
        }
    }
    Some(None)
}

impl DropRule {
    fn apply(
        &self,
        buffer: &mut ObservationBuffer,
        obs: &HandObservation,
    ) -> Option<Option<Action>> {
        let gesture = obs.gesture()?;
        if buffer.pending_action() != Some(self.pending) || !self.releases.contains(&gesture) {
            return None;
        }
        buffer.set_pending(self.action);
        buffer.clear();
        Some(Some(self.action))
    }
}

fn apply_tap(buffer: &mut ObservationBuffer, obs: &HandObservation) -> Option<Option<Action>> {
    if obs.gesture() != Some(Gesture::Point) {
        return None;
    }
    let start_index = buffer.index_of_position(PositionTag::ZoomInStart)?;
    let start = *buffer.get(start_index)?;
    let axes_ok = vertical_swipe(&start, obs) && horizontal_swipe(&start, obs);

    if buffer.min_duration(start_index, Some(8)) && axes_ok {
        buffer.set_pending(Action::Tap);
        buffer.clear();
        Some(Some(Action::Tap))
    } else if buffer.min_duration(start_index, Some(2))
        && buffer.max_duration(start_index, 8)
        && axes_ok
    {
        buffer.push_candidate(Action::Tap);
        if buffer.consume_candidate_pair(Action::Tap) {
            buffer.set_pending(Action::DoubleTap);
            buffer.clear();
            Some(Some(Action::DoubleTap))
        } else {
            Some(None)
        }
    } else {
        buffer.clear();
        Some(None)
    }
}

/// Center displacement between the phase start and the new observation,
/// normalized by mean hand size so the check is invariant to distance from
/// the camera. Missing geometry fails the check.
fn swipe_distance(ratio: f32, start: &HandObservation, end: &HandObservation) -> bool {
    let (Some(c0), Some(c1), Some(s0), Some(s1)) =
        (start.center(), end.center(), start.size(), end.size())
    else {
        return false;
    };
    let distance = (c1[0] - c0[0]).hypot(c1[1] - c0[1]);
    let size = (s0 + s1) / 2.0;
    size > 0.0 && distance / size > ratio
}

/// The end center stayed strictly within the start box's vertical span.
fn horizontal_swipe(start: &HandObservation, end: &HandObservation) -> bool {
    let (Some(bbox), Some(center)) = (start.bbox(), end.center()) else {
        return false;
    };
    bbox.ymin < center[1] && center[1] < bbox.ymax
}

/// The end center stayed strictly within the start box's horizontal span.
fn vertical_swipe(start: &HandObservation, end: &HandObservation) -> bool {
    let (Some(bbox), Some(center)) = (start.bbox(), end.center()) else {
        return false;
    };
    bbox.xmin < center[0] && center[0] < bbox.xmax
}

#[cfg(test)]
mod tests {
    use crate::{Action, BBox, BufferConfig, Gesture, HandObservation, ObservationBuffer};

    fn buffer() -> ObservationBuffer {
        ObservationBuffer::new(&BufferConfig::default())
    }

    fn obs(gesture: Gesture, xmin: f32) -> HandObservation {
        HandObservation::new(Some(BBox::new(xmin, 0.0, xmin + 10.0, 10.0)), Some(gesture))
    }

    fn advance(buf: &mut ObservationBuffer, misses: usize) {
        for _ in 0..misses {
            assert_eq!(buf.append(HandObservation::miss()), None);
        }
    }

    #[test]
    fn test_swipe_left_roundtrip() {
        let mut buf = buffer();
        // hand_right opens the phase at x=0, hand_left closes it 20 frames
        // later at x=20: displacement 20 over mean size 10 beats the 1.5
        // ratio, and y stays on the start row
        assert_eq!(buf.append(obs(Gesture::HandRight, 0.0)), None);
        advance(&mut buf, 19);
        assert_eq!(buf.append(obs(Gesture::HandLeft, 20.0)), Some(Action::SwipeLeft));
        assert_eq!(buf.pending_action(), Some(Action::SwipeLeft));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_swipe_duration_floor() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::HandRight, 0.0)), None);
        advance(&mut buf, 17);
        // one frame short of the 20-frame floor
        assert_eq!(buf.append(obs(Gesture::HandLeft, 20.0)), None);
        assert_eq!(buf.pending_action(), None);
    }

    #[test]
    fn test_swipe_left_failure_keeps_history() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::HandRight, 0.0)), None);
        advance(&mut buf, 17);
        assert_eq!(buf.append(obs(Gesture::HandLeft, 20.0)), None);
        // the first left/right variant does not clear on failed qualifiers
        assert_eq!(buf.len(), 19);
    }

    #[test]
    fn test_swipe_right_failure_clears_history() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::HandLeft, 20.0)), None);
        advance(&mut buf, 17);
        assert_eq!(buf.append(obs(Gesture::HandRight, 0.0)), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_swipe_rejects_off_axis_motion() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::HandRight, 0.0)), None);
        advance(&mut buf, 19);
        // far enough and long enough, but the end center leaves the start
        // box's vertical span
        let end = HandObservation::new(
            Some(BBox::new(20.0, 30.0, 30.0, 40.0)),
            Some(Gesture::HandLeft),
        );
        assert_eq!(buf.append(end), None);
    }

    #[test]
    fn test_zoom_in_same_spot() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), None);
        advance(&mut buf, 19);
        // pinch stays centered: both axis checks must pass, no distance check
        assert_eq!(buf.append(obs(Gesture::ThumbIndex, 0.0)), Some(Action::ZoomIn));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fast_swipe_up() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::Point, 0.0)), None);
        advance(&mut buf, 19);
        assert_eq!(buf.append(obs(Gesture::One, 0.0)), Some(Action::FastSwipeUp));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_grab_drag_then_drop() {
        let mut buf = buffer();
        for _ in 0..3 {
            assert_eq!(buf.append(obs(Gesture::Grabbing, 0.0)), None);
        }
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), Some(Action::Drag));
        // drag is continuous: history survives and the action stays pending
        assert!(!buf.is_empty());
        assert_eq!(buf.pending_action(), Some(Action::Drag));
        // holding the fist does not re-fire
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), None);
        assert_eq!(buf.append(obs(Gesture::Stop, 0.0)), Some(Action::Drop));
        assert!(buf.is_empty());
        assert_eq!(buf.pending_action(), Some(Action::Drop));
    }

    #[test]
    fn test_grab_too_short_clears() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::Grabbing, 0.0)), None);
        // fist after a single grabbing frame: 2 < 3 frame hold
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_grip_hold_enters_drag2() {
        let mut buf = buffer();
        for _ in 0..19 {
            assert_eq!(buf.append(obs(Gesture::Grip, 0.0)), None);
        }
        assert_eq!(buf.append(obs(Gesture::Grip, 0.0)), Some(Action::Drag2));
        assert_eq!(buf.pending_action(), Some(Action::Drag2));
        assert_eq!(
            buf.append(obs(Gesture::PartHandHeart, 0.0)),
            Some(Action::Drop2)
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_tap_long_window() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), None);
        advance(&mut buf, 7);
        assert_eq!(buf.append(obs(Gesture::Point, 0.0)), Some(Action::Tap));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_double_tap_composition() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), None);
        advance(&mut buf, 2);
        // two short-window taps in succession compose into one double tap
        assert_eq!(buf.append(obs(Gesture::Point, 0.0)), None);
        assert_eq!(buf.append(obs(Gesture::Point, 0.0)), Some(Action::DoubleTap));
        assert_eq!(buf.pending_action(), Some(Action::DoubleTap));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_tap_outside_windows_clears() {
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::Fist, 0.0)), None);
        // point drifts far off the start box: axis checks fail both windows
        let far = HandObservation::new(
            Some(BBox::new(100.0, 100.0, 110.0, 110.0)),
            Some(Gesture::Point),
        );
        assert_eq!(buf.append(far), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_swipe_never_fires_through_occlusion_gap_alone() {
        // misses extend duration but carry no geometry, so no rule can match
        // on them
        let mut buf = buffer();
        assert_eq!(buf.append(obs(Gesture::HandRight, 0.0)), None);
        advance(&mut buf, 25);
        assert_eq!(buf.pending_action(), None);
        assert!(!buf.is_empty());
    }
}
