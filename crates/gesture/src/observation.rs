// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{Gesture, PositionTag};

/// Axis-aligned bounding box in corner form.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    /// left-most coordinate of the bounding box
    pub xmin: f32,
    /// top-most coordinate of the bounding box
    pub ymin: f32,
    /// right-most coordinate of the bounding box
    pub xmax: f32,
    /// bottom-most coordinate of the bounding box
    pub ymax: f32,
}

impl BBox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// A box is usable when its corners are finite and properly ordered.
    /// Anything else is treated as a missing detection downstream.
    pub fn is_valid(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
            && self.xmax >= self.xmin
            && self.ymax >= self.ymin
    }

    pub fn center(&self) -> [f32; 2] {
        [
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        ]
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

impl From<[f32; 4]> for BBox {
    fn from(arr: [f32; 4]) -> Self {
        BBox {
            xmin: arr[0],
            ymin: arr[1],
            xmax: arr[2],
            ymax: arr[3],
        }
    }
}

/// One frame's detection result for a track, or a recorded miss.
///
/// Immutable once constructed apart from the position tag, which the buffer
/// stamps during append. `center` and `size` are derived once at construction
/// when a valid box is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandObservation {
    bbox: Option<BBox>,
    gesture: Option<Gesture>,
    position: PositionTag,
    center: Option<[f32; 2]>,
    size: Option<f32>,
}

impl HandObservation {
    /// Builds an observation from a detection box and its gesture label.
    /// A degenerate box (inverted corners or non-finite coordinates) demotes
    /// the whole observation to a miss.
    pub fn new(bbox: Option<BBox>, gesture: Option<Gesture>) -> Self {
        match bbox {
            Some(b) if b.is_valid() => Self {
                bbox: Some(b),
                gesture,
                position: PositionTag::Unknown,
                center: Some(b.center()),
                size: Some(b.width()),
            },
            Some(_) => Self::miss(),
            None => Self {
                bbox: None,
                gesture,
                position: PositionTag::Unknown,
                center: None,
                size: None,
            },
        }
    }

    /// An observation recording that the track had no matching detection
    /// this frame.
    pub fn miss() -> Self {
        Self {
            bbox: None,
            gesture: None,
            position: PositionTag::Unknown,
            center: None,
            size: None,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.bbox.is_none()
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.bbox
    }

    pub fn gesture(&self) -> Option<Gesture> {
        self.gesture
    }

    pub fn position(&self) -> PositionTag {
        self.position
    }

    pub fn center(&self) -> Option<[f32; 2]> {
        self.center
    }

    pub fn size(&self) -> Option<f32> {
        self.size
    }

    pub(crate) fn set_position(&mut self, position: PositionTag) {
        self.position = position;
    }
}
