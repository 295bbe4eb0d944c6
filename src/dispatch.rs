// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

//! Bounded dispatch bus bridging the frame-driven engine to external command
//! consumers (overlay renderer, web/voice command sinks).
//!
//! Single-writer, multiple-reader: the pipeline owns the one
//! [`ActionPublisher`]; subscribers clone freely. Queued events drop oldest
//! on overflow, and a separate observable slot always holds the most recent
//! event for consumers that only care about "the latest command".

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, trace};
use parking_lot::RwLock;

use handwave_gesture::ActionEvent;

type LatestSlot = Arc<RwLock<Option<ActionEvent>>>;

/// The bus before it is split into its writer and reader halves.
pub struct ActionBus {
    sender: Sender<ActionEvent>,
    receiver: Receiver<ActionEvent>,
    latest: LatestSlot,
    capacity: usize,
}

impl ActionBus {
    /// Creates a bus holding up to `capacity` undelivered events.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "action bus capacity must be positive");
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            latest: Arc::new(RwLock::new(None)),
            capacity,
        }
    }

    /// Splits the bus into the single publisher and the first subscriber.
    pub fn split(self) -> (ActionPublisher, ActionSubscriber) {
        let subscriber = ActionSubscriber {
            receiver: self.receiver.clone(),
            latest: Arc::clone(&self.latest),
        };
        let publisher = ActionPublisher {
            sender: self.sender,
            reclaim: self.receiver,
            latest: self.latest,
            capacity: self.capacity,
            dropped: 0,
        };
        (publisher, subscriber)
    }
}

/// Writer half of the bus, owned by the pipeline.
pub struct ActionPublisher {
    sender: Sender<ActionEvent>,
    reclaim: Receiver<ActionEvent>,
    latest: LatestSlot,
    capacity: usize,
    dropped: u64,
}

impl ActionPublisher {
    /// Publishes an event, evicting the oldest queued event when the bus is
    /// full. The latest-event slot is updated unconditionally.
    pub fn publish(&mut self, event: ActionEvent) {
        *self.latest.write() = Some(event);
        let mut pending = event;
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => {
                    trace!("published {:?}", event.action);
                    return;
                }
                Err(TrySendError::Full(back)) => {
                    if self.reclaim.try_recv().is_ok() {
                        self.dropped += 1;
                        debug!("bus full, dropped oldest event");
                    }
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Events evicted because no subscriber kept up.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Reader half of the bus. Clones share the same queue, so queued events go
/// to exactly one reader; the latest-event slot is visible to all.
#[derive(Clone)]
pub struct ActionSubscriber {
    receiver: Receiver<ActionEvent>,
    latest: LatestSlot,
}

impl ActionSubscriber {
    /// Takes the next queued event, if any. Never blocks.
    pub fn try_recv(&self) -> Option<ActionEvent> {
        self.receiver.try_recv().ok()
    }

    /// The most recently published event, independent of queue consumption.
    pub fn latest(&self) -> Option<ActionEvent> {
        *self.latest.read()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
