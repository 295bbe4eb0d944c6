// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Static hand poses produced by the gesture classifier, in model output
/// order. The engine never works with raw label indices; classifier outputs
/// are converted once at the boundary with [`Gesture::from_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    HandDown,
    HandRight,
    HandLeft,
    ThumbIndex,
    ThumbLeft,
    ThumbRight,
    ThumbDown,
    HalfUp,
    HalfLeft,
    HalfRight,
    HalfDown,
    PartHandHeart,
    PartHandHeart2,
    FistInverted,
    TwoLeft,
    TwoRight,
    TwoDown,
    Grabbing,
    Grip,
    Point,
    Call,
    Three3,
    LittleFinger,
    MiddleFinger,
    Dislike,
    Fist,
    Four,
    Like,
    Mute,
    Ok,
    One,
    Palm,
    Peace,
    PeaceInverted,
    Rock,
    Stop,
    StopInverted,
    Three,
    Three2,
    TwoUp,
    TwoUpInverted,
    ThreeGun,
    OneLeft,
    OneRight,
    OneDown,
}

impl Gesture {
    /// Number of labels in the classifier vocabulary.
    pub const COUNT: usize = 45;

    const ALL: [Gesture; Self::COUNT] = [
        Gesture::HandDown,
        Gesture::HandRight,
        Gesture::HandLeft,
        Gesture::ThumbIndex,
        Gesture::ThumbLeft,
        Gesture::ThumbRight,
        Gesture::ThumbDown,
        Gesture::HalfUp,
        Gesture::HalfLeft,
        Gesture::HalfRight,
        Gesture::HalfDown,
        Gesture::PartHandHeart,
        Gesture::PartHandHeart2,
        Gesture::FistInverted,
        Gesture::TwoLeft,
        Gesture::TwoRight,
        Gesture::TwoDown,
        Gesture::Grabbing,
        Gesture::Grip,
        Gesture::Point,
        Gesture::Call,
        Gesture::Three3,
        Gesture::LittleFinger,
        Gesture::MiddleFinger,
        Gesture::Dislike,
        Gesture::Fist,
        Gesture::Four,
        Gesture::Like,
        Gesture::Mute,
        Gesture::Ok,
        Gesture::One,
        Gesture::Palm,
        Gesture::Peace,
        Gesture::PeaceInverted,
        Gesture::Rock,
        Gesture::Stop,
        Gesture::StopInverted,
        Gesture::Three,
        Gesture::Three2,
        Gesture::TwoUp,
        Gesture::TwoUpInverted,
        Gesture::ThreeGun,
        Gesture::OneLeft,
        Gesture::OneRight,
        Gesture::OneDown,
    ];

    const LABELS: [&'static str; Self::COUNT] = [
        "hand_down",
        "hand_right",
        "hand_left",
        "thumb_index",
        "thumb_left",
        "thumb_right",
        "thumb_down",
        "half_up",
        "half_left",
        "half_right",
        "half_down",
        "part_hand_heart",
        "part_hand_heart2",
        "fist_inverted",
        "two_left",
        "two_right",
        "two_down",
        "grabbing",
        "grip",
        "point",
        "call",
        "three3",
        "little_finger",
        "middle_finger",
        "dislike",
        "fist",
        "four",
        "like",
        "mute",
        "ok",
        "one",
        "palm",
        "peace",
        "peace_inverted",
        "rock",
        "stop",
        "stop_inverted",
        "three",
        "three2",
        "two_up",
        "two_up_inverted",
        "three_gun",
        "one_left",
        "one_right",
        "one_down",
    ];

    /// Converts a raw classifier label index into a gesture. Returns `None`
    /// for indices outside the vocabulary.
    pub fn from_index(index: usize) -> Option<Gesture> {
        Self::ALL.get(index).copied()
    }

    /// The classifier label index of this gesture.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The classifier label name of this gesture.
    pub fn as_str(self) -> &'static str {
        Self::LABELS[self as usize]
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
