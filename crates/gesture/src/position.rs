// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{Gesture, ObservationBuffer};

/// Directional-phase label derived from the current gesture and the track's
/// buffered history. The first occurrence of a directional hand pose opens a
/// phase (`*Start`); the opposite pose while that phase is open closes it
/// (`*End`). The numbered variants belong to the alternate pose alphabets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionTag {
    Unknown,
    LeftStart,
    RightStart,
    LeftEnd,
    RightEnd,
    UpStart,
    UpEnd,
    DownStart,
    DownEnd,
    FastSwipeUpStart,
    FastSwipeUpEnd,
    FastSwipeDownStart,
    FastSwipeDownEnd,
    ZoomInStart,
    ZoomInEnd,
    ZoomOutStart,
    ZoomOutEnd,
    LeftStart2,
    RightStart2,
    LeftEnd2,
    RightEnd2,
    UpStart2,
    UpEnd2,
    DownStart2,
    DownEnd2,
    DragStart,
    DragEnd,
    LeftStart3,
    RightStart3,
    LeftEnd3,
    RightEnd3,
    DownStart3,
    DownEnd3,
    UpStart3,
    UpEnd3,
}

/// One row of the phase mapping: the listed gestures stamp `closes` when
/// `closes_when` is already present in the buffer, else `opens`.
///
/// Several rows are deliberately asymmetric (fist opens a zoom-in phase but
/// closes a zoom-out one, point opens a fast-swipe-up phase but closes a
/// fast-swipe-down one); the pairings come straight from the tuned heuristic
/// and must not be "normalized".
struct PhasePair {
    gestures: &'static [Gesture],
    opens: PositionTag,
    closes: PositionTag,
    closes_when: PositionTag,
}

const PHASE_TABLE: &[PhasePair] = &[
    PhasePair {
        gestures: &[Gesture::Palm, Gesture::Stop, Gesture::StopInverted],
        opens: PositionTag::UpStart,
        closes: PositionTag::UpEnd,
        closes_when: PositionTag::DownStart,
    },
    PhasePair {
        gestures: &[Gesture::HandDown],
        opens: PositionTag::DownStart,
        closes: PositionTag::DownEnd,
        closes_when: PositionTag::UpStart,
    },
    PhasePair {
        gestures: &[Gesture::HandRight],
        opens: PositionTag::RightStart,
        closes: PositionTag::RightEnd,
        closes_when: PositionTag::LeftStart,
    },
    PhasePair {
        gestures: &[Gesture::HandLeft],
        opens: PositionTag::LeftStart,
        closes: PositionTag::LeftEnd,
        closes_when: PositionTag::RightStart,
    },
    PhasePair {
        gestures: &[Gesture::One],
        opens: PositionTag::FastSwipeDownStart,
        closes: PositionTag::FastSwipeUpEnd,
        closes_when: PositionTag::FastSwipeUpStart,
    },
    PhasePair {
        gestures: &[Gesture::Point],
        opens: PositionTag::FastSwipeUpStart,
        closes: PositionTag::FastSwipeDownEnd,
        closes_when: PositionTag::FastSwipeDownStart,
    },
    PhasePair {
        gestures: &[Gesture::Fist],
        opens: PositionTag::ZoomInStart,
        closes: PositionTag::ZoomOutEnd,
        closes_when: PositionTag::ZoomOutStart,
    },
    PhasePair {
        gestures: &[Gesture::ThumbIndex, Gesture::Three2],
        opens: PositionTag::ZoomOutStart,
        closes: PositionTag::ZoomInEnd,
        closes_when: PositionTag::ZoomInStart,
    },
    PhasePair {
        gestures: &[Gesture::ThumbRight],
        opens: PositionTag::RightStart2,
        closes: PositionTag::RightEnd2,
        closes_when: PositionTag::LeftStart2,
    },
    PhasePair {
        gestures: &[Gesture::ThumbLeft],
        opens: PositionTag::LeftStart2,
        closes: PositionTag::LeftEnd2,
        closes_when: PositionTag::RightStart2,
    },
    PhasePair {
        gestures: &[Gesture::TwoRight],
        opens: PositionTag::RightStart3,
        closes: PositionTag::RightEnd3,
        closes_when: PositionTag::LeftStart3,
    },
    PhasePair {
        gestures: &[Gesture::TwoLeft],
        opens: PositionTag::LeftStart3,
        closes: PositionTag::LeftEnd3,
        closes_when: PositionTag::RightStart3,
    },
    PhasePair {
        gestures: &[Gesture::TwoUp],
        opens: PositionTag::UpStart3,
        closes: PositionTag::UpEnd3,
        closes_when: PositionTag::DownStart3,
    },
    PhasePair {
        gestures: &[Gesture::TwoDown],
        opens: PositionTag::DownStart3,
        closes: PositionTag::DownEnd3,
        closes_when: PositionTag::UpStart3,
    },
    PhasePair {
        gestures: &[Gesture::ThumbDown],
        opens: PositionTag::UpStart2,
        closes: PositionTag::DownEnd2,
        closes_when: PositionTag::ZoomOutStart,
    },
];

/// Tags the incoming observation's directional phase from its gesture and
/// the buffer's pre-append contents. Gestures with no mapping yield
/// `Unknown`; a grabbing pose always marks a drag start.
pub(crate) fn classify(gesture: Option<Gesture>, buffer: &ObservationBuffer) -> PositionTag {
    let gesture = match gesture {
        Some(g) => g,
        None => return PositionTag::Unknown,
    };
    if gesture == Gesture::Grabbing {
        return PositionTag::DragStart;
    }
    for pair in PHASE_TABLE {
        if pair.gestures.contains(&gesture) {
            return if buffer.contains_position(pair.closes_when) {
                pair.closes
            } else {
                pair.opens
            };
        }
    }
    PositionTag::Unknown
}

#[cfg(test)]
mod tests {
    use super::{classify, PositionTag};
    use crate::{BBox, BufferConfig, Gesture, HandObservation, ObservationBuffer};

    fn buffer() -> ObservationBuffer {
        ObservationBuffer::new(&BufferConfig::default())
    }

    fn obs(gesture: Gesture) -> HandObservation {
        HandObservation::new(Some(BBox::new(0.0, 0.0, 10.0, 10.0)), Some(gesture))
    }

    #[test]
    fn test_first_occurrence_opens_phase() {
        let buf = buffer();
        assert_eq!(
            classify(Some(Gesture::HandLeft), &buf),
            PositionTag::LeftStart
        );
        assert_eq!(classify(Some(Gesture::Palm), &buf), PositionTag::UpStart);
        assert_eq!(
            classify(Some(Gesture::Fist), &buf),
            PositionTag::ZoomInStart
        );
    }

    #[test]
    fn test_opposite_pose_closes_open_phase() {
        let mut buf = buffer();
        buf.append(obs(Gesture::HandRight));
        assert_eq!(classify(Some(Gesture::HandLeft), &buf), PositionTag::LeftEnd);
        // same pose again keeps opening, not closing
        assert_eq!(
            classify(Some(Gesture::HandRight), &buf),
            PositionTag::RightStart
        );
    }

    #[test]
    fn test_asymmetric_zoom_pairing() {
        let mut buf = buffer();
        buf.append(obs(Gesture::Fist));
        // fist opened ZoomInStart, thumb_index now closes the zoom-in phase
        assert_eq!(
            classify(Some(Gesture::ThumbIndex), &buf),
            PositionTag::ZoomInEnd
        );
        // ...and a second fist would still open another zoom-in phase
        assert_eq!(
            classify(Some(Gesture::Fist), &buf),
            PositionTag::ZoomInStart
        );
    }

    #[test]
    fn test_grabbing_always_marks_drag_start() {
        let mut buf = buffer();
        assert_eq!(
            classify(Some(Gesture::Grabbing), &buf),
            PositionTag::DragStart
        );
        buf.append(obs(Gesture::Grabbing));
        assert_eq!(
            classify(Some(Gesture::Grabbing), &buf),
            PositionTag::DragStart
        );
    }

    #[test]
    fn test_unmapped_gesture_is_unknown() {
        let buf = buffer();
        assert_eq!(classify(Some(Gesture::Rock), &buf), PositionTag::Unknown);
        assert_eq!(classify(None, &buf), PositionTag::Unknown);
    }
}
