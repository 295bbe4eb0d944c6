// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Compound gesture event emitted by the rule machine. The numbered variants
/// are the same motion performed with an alternate hand pose alphabet
/// (thumb poses for `*2`, two-finger poses for `*3`).
///
/// `Counterclock` and `Clockwise` are part of the consumer-facing vocabulary
/// for circular motions but no rule in this engine emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SwipeRight,
    SwipeLeft,
    SwipeUp,
    SwipeDown,
    Drag,
    Drop,
    FastSwipeDown,
    FastSwipeUp,
    ZoomIn,
    ZoomOut,
    SwipeRight2,
    SwipeLeft2,
    SwipeUp2,
    SwipeDown2,
    DoubleTap,
    SwipeRight3,
    SwipeLeft3,
    SwipeUp3,
    SwipeDown3,
    Drag2,
    Drop2,
    Drag3,
    Drop3,
    Tap,
    Counterclock,
    Clockwise,
}

impl Action {
    /// Continuous actions stay pending on the track until the matching drop
    /// rule releases them; everything else is consumed once handled.
    pub fn is_drag(self) -> bool {
        matches!(self, Action::Drag | Action::Drag2 | Action::Drag3)
    }

    pub fn is_drop(self) -> bool {
        matches!(self, Action::Drop | Action::Drop2 | Action::Drop3)
    }

    pub fn is_swipe(self) -> bool {
        matches!(
            self,
            Action::SwipeLeft
                | Action::SwipeRight
                | Action::SwipeUp
                | Action::SwipeDown
                | Action::SwipeLeft2
                | Action::SwipeRight2
                | Action::SwipeUp2
                | Action::SwipeDown2
                | Action::SwipeLeft3
                | Action::SwipeRight3
                | Action::SwipeUp3
                | Action::SwipeDown3
                | Action::FastSwipeUp
                | Action::FastSwipeDown
        )
    }
}

/// A recognized action stamped with the track that produced it and the frame
/// it fired on. This is the unit published on the dispatch bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub track_id: u32,
    pub frame: u64,
    pub action: Action,
}

#[cfg(test)]
mod tests {
    use super::Action;

    #[test]
    fn test_drag_family() {
        assert!(Action::Drag.is_drag());
        assert!(Action::Drag2.is_drag());
        assert!(Action::Drag3.is_drag());
        assert!(!Action::Drop.is_drag());
        assert!(!Action::Tap.is_drag());
    }

    #[test]
    fn test_swipe_family() {
        assert!(Action::SwipeLeft.is_swipe());
        assert!(Action::FastSwipeDown.is_swipe());
        assert!(!Action::ZoomIn.is_swipe());
        assert!(!Action::DoubleTap.is_swipe());
    }
}
