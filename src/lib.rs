//! Handwave - dynamic hand gesture recognition engine
//!
//! Turns a per-frame stream of hand detections and per-hand gesture labels
//! into discrete, timestamped UI actions. The [`Pipeline`] wires the external
//! detector and classifier into the track lifecycle manager and publishes
//! recognized actions on a bounded dispatch bus.

mod config;
mod dispatch;
mod error;
mod pipeline;

pub use config::{EngineBuilder, EngineConfig};
pub use dispatch::{ActionBus, ActionPublisher, ActionSubscriber};
pub use error::{Error, Result};
pub use pipeline::{Detection, GestureClassifier, HandDetector, Pipeline};

pub use handwave_gesture::{
    Action, ActionEvent, BBox, BufferConfig, Gesture, HandObservation, ObservationBuffer,
    PositionTag,
};
pub use handwave_tracker::{
    Associations, Associator, DetectionBox, HandTracker, MotionFilter, Track, TrackMotion,
    TrackOutput, TrackerConfig,
};
